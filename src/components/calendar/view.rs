use super::aggregator::{Aggregation, SkippedRecord};
use super::index::DateBucketIndex;
use super::models::UnifiedEvent;
use chrono::{DateTime, NaiveDate, Utc};

/// Immutable snapshot of the aggregated calendar
///
/// A new view replaces the old one wholesale after every rebuild.
#[derive(Debug, Clone, Default)]
pub struct CalendarView {
    events: Vec<UnifiedEvent>,
    index: DateBucketIndex,
    skipped: Vec<SkippedRecord>,
    built_at: Option<DateTime<Utc>>,
}

impl CalendarView {
    pub fn new(aggregation: Aggregation, built_at: DateTime<Utc>) -> Self {
        let Aggregation { events, skipped } = aggregation;
        let index = DateBucketIndex::build(events.iter().cloned());

        Self {
            events,
            index,
            skipped,
            built_at: Some(built_at),
        }
    }

    /// View shown before the first successful load
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[UnifiedEvent] {
        &self.events
    }

    pub fn index(&self) -> &DateBucketIndex {
        &self.index
    }

    /// Records left out of this view, with reasons
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// `None` until a load has succeeded
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn events_on(&self, day: NaiveDate) -> &[UnifiedEvent] {
        self.index.events_on(day)
    }

    /// Up to `limit` events on or after `from`, earliest first
    pub fn upcoming(&self, from: NaiveDate, limit: usize) -> Vec<&UnifiedEvent> {
        let mut upcoming: Vec<&UnifiedEvent> = self
            .events
            .iter()
            .filter(|e| e.date.date_naive() >= from)
            .collect();
        upcoming.sort_by_key(|e| e.date);
        upcoming.truncate(limit);
        upcoming
    }

    /// Events on days in `[start, end)`, earliest first
    pub fn events_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&UnifiedEvent> {
        let mut events: Vec<&UnifiedEvent> = self
            .events
            .iter()
            .filter(|e| {
                let day = e.date.date_naive();
                day >= start && day < end
            })
            .collect();
        events.sort_by_key(|e| e.date);
        events
    }
}
