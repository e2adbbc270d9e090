//! Merges stored events, recurrence instances and course-derived events into
//! one list of [`UnifiedEvent`]s.
//!
//! Every record is parsed on its own. A bad date drops that record (or, for a
//! recurring event, only its expansion) and is reported in
//! [`Aggregation::skipped`]; it never fails the batch.

use super::models::{Course, PersistedEvent, UnifiedEvent};
use super::recurrence::RecurrenceExpander;
use super::time::parse_event_date;
use crate::error::Error;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use tracing::warn;

/// Kind of source record a warning refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Event,
    Recurrence,
    Assignment,
    Note,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Event => "event",
            Self::Recurrence => "recurrence of event",
            Self::Assignment => "assignment",
            Self::Note => "note",
        };
        f.write_str(name)
    }
}

/// A record left out of the aggregated view
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub source: RecordSource,
    pub id: String,
    pub reason: String,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} skipped: {}", self.source, self.id, self.reason)
    }
}

/// Output of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub events: Vec<UnifiedEvent>,
    pub skipped: Vec<SkippedRecord>,
}

impl Aggregation {
    fn skip(&mut self, source: RecordSource, id: &str, error: &Error) {
        let record = SkippedRecord {
            source,
            id: id.to_string(),
            reason: error.to_string(),
        };
        warn!("{}", record);
        self.skipped.push(record);
    }
}

/// Builds the unified event list from all calendar sources
#[derive(Debug, Clone, Copy)]
pub struct EventAggregator {
    expander: RecurrenceExpander,
}

impl EventAggregator {
    pub fn new(expander: RecurrenceExpander) -> Self {
        Self { expander }
    }

    fn tz(&self) -> Tz {
        self.expander.timezone()
    }

    /// Aggregate every source; `now` bounds open-ended recurrences
    pub fn aggregate(
        &self,
        events: &[PersistedEvent],
        courses: &[Course],
        now: DateTime<Utc>,
    ) -> Aggregation {
        let mut out = Aggregation::default();

        for event in events {
            self.push_persisted(&mut out, event, now);
        }

        for course in courses {
            self.push_course(&mut out, course);
        }

        out
    }

    fn push_persisted(&self, out: &mut Aggregation, event: &PersistedEvent, now: DateTime<Utc>) {
        let tz = self.tz();
        let date = match parse_event_date(&event.date, &tz, &format!("event {}", event.id)) {
            Ok(date) => date,
            Err(e) => {
                out.skip(RecordSource::Event, &event.id, &e);
                return;
            }
        };

        out.events.push(UnifiedEvent::from_persisted(event, date));

        if event.is_recurring {
            match self.expander.expand(event, now) {
                Ok(instances) => out
                    .events
                    .extend(instances.into_iter().map(UnifiedEvent::from_instance)),
                Err(e) => out.skip(RecordSource::Recurrence, &event.id, &e),
            }
        }
    }

    fn push_course(&self, out: &mut Aggregation, course: &Course) {
        let tz = self.tz();

        for assignment in &course.assignments {
            let record = format!("assignment {}", assignment.id);
            let parsed = match assignment.due_date.as_deref() {
                Some(due) => parse_event_date(due, &tz, &record),
                None => Err(Error::MalformedDate {
                    record,
                    value: String::new(),
                }),
            };
            match parsed {
                Ok(date) => out
                    .events
                    .push(UnifiedEvent::from_assignment(course, assignment, date)),
                Err(e) => out.skip(RecordSource::Assignment, &assignment.id, &e),
            }
        }

        for note in &course.notes {
            let record = format!("note {}", note.id);
            let parsed = match note.date_added.as_deref() {
                Some(added) => parse_event_date(added, &tz, &record),
                None => Err(Error::MalformedDate {
                    record,
                    value: String::new(),
                }),
            };
            match parsed {
                Ok(date) => out.events.push(UnifiedEvent::from_note(course, note, date)),
                Err(e) => out.skip(RecordSource::Note, &note.id, &e),
            }
        }
    }
}
