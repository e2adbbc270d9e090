//! Expansion of recurring base events into dated instances.
//!
//! Instances fall in `[start, end)` where `start` is the recurrence start date
//! (or the event date) and `end` is the recurrence end date (or `now` plus the
//! configured horizon). The anchor occurrence is never emitted and output is
//! capped at [`MAX_RECURRENCES`] per base event.

use super::models::{PersistedEvent, RecurrenceInstance, RecurrencePattern};
use super::time::{add_days, add_months, parse_event_date, parse_optional_date};
use crate::config::{DEFAULT_HORIZON_MONTHS, MAX_HORIZON_MONTHS};
use crate::error::{malformed_date, CalendarResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Hard limit of generated instances per base event
pub const MAX_RECURRENCES: usize = 100;

/// Expands recurring events in a fixed timezone
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    tz: Tz,
    horizon_months: u32,
}

impl RecurrenceExpander {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }

    /// Window length used when a base event has no end date, at most
    /// [`MAX_HORIZON_MONTHS`]
    pub fn with_horizon(mut self, months: u32) -> Self {
        self.horizon_months = months.min(MAX_HORIZON_MONTHS);
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Generate the instances of one base event
    ///
    /// Non-recurring events and unknown patterns produce nothing. A malformed
    /// event, start or end date fails this event only.
    pub fn expand(
        &self,
        event: &PersistedEvent,
        now: DateTime<Utc>,
    ) -> CalendarResult<Vec<RecurrenceInstance>> {
        if !event.is_recurring {
            return Ok(Vec::new());
        }

        let pattern = match event
            .recurrence_pattern
            .as_deref()
            .and_then(RecurrencePattern::parse)
        {
            Some(pattern) => pattern,
            None => {
                debug!(
                    "Event {} has unrecognized recurrence pattern {:?}, not expanding",
                    event.id, event.recurrence_pattern
                );
                return Ok(Vec::new());
            }
        };

        let record = format!("event {}", event.id);
        let anchor = parse_event_date(&event.date, &self.tz, &record)?;

        let start_date = event.recurrence_start_date.as_deref();
        let start = parse_optional_date(start_date, &self.tz, &record)?.unwrap_or(anchor);

        let end_date = event.recurrence_end_date.as_deref();
        let end = match parse_optional_date(end_date, &self.tz, &record)? {
            Some(end) => end,
            None => add_months(&now.with_timezone(&self.tz), self.horizon_months)
                .ok_or_else(|| malformed_date(&record, &now.to_rfc3339()))?,
        };

        // The anchor is already shown once, so a window opening on the anchor
        // day starts one step later.
        let first_step = if start.date_naive() == anchor.date_naive() {
            1
        } else {
            0
        };

        let mut instances = Vec::new();
        let mut step = first_step;

        while instances.len() < MAX_RECURRENCES {
            let cursor = match step_from(&start, pattern, step) {
                Some(cursor) => cursor,
                None => break,
            };
            if cursor >= end {
                break;
            }

            instances.push(RecurrenceInstance {
                id: RecurrenceInstance::instance_id(&event.id, &cursor),
                original_event_id: event.id.clone(),
                title: event.title.clone(),
                description: event.description.clone(),
                date: cursor,
            });
            step += 1;
        }

        if instances.len() == MAX_RECURRENCES {
            debug!(
                "Event {} reached the recurrence cap of {} instances",
                event.id, MAX_RECURRENCES
            );
        }

        Ok(instances)
    }
}

/// The `n`th occurrence counted from `start`
fn step_from(start: &DateTime<Tz>, pattern: RecurrencePattern, n: u32) -> Option<DateTime<Tz>> {
    match pattern {
        RecurrencePattern::Daily => add_days(start, n as u64),
        RecurrencePattern::Weekly => add_days(start, 7 * n as u64),
        RecurrencePattern::Monthly => add_months(start, n),
    }
}
