use super::models::UnifiedEvent;
use super::time::day_key;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Immutable day -> events lookup
///
/// Keys are local calendar days, so time of day never splits a bucket.
/// Within a day, events keep the order they were given in. Rebuild the index
/// whenever the event list changes; it has no mutating methods.
#[derive(Debug, Clone, Default)]
pub struct DateBucketIndex {
    buckets: BTreeMap<NaiveDate, Vec<UnifiedEvent>>,
    total: usize,
}

impl DateBucketIndex {
    /// Bucket every event by its local day
    pub fn build<I>(events: I) -> Self
    where
        I: IntoIterator<Item = UnifiedEvent>,
    {
        let mut buckets: BTreeMap<NaiveDate, Vec<UnifiedEvent>> = BTreeMap::new();
        let mut total = 0;

        for event in events {
            buckets
                .entry(event.date.date_naive())
                .or_default()
                .push(event);
            total += 1;
        }

        Self { buckets, total }
    }

    /// Events falling on `day`
    pub fn events_on(&self, day: NaiveDate) -> &[UnifiedEvent] {
        self.buckets.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lookup by canonical `YYYY-MM-DD` key; unparseable keys have no events
    pub fn events_for_key(&self, key: &str) -> &[UnifiedEvent] {
        match NaiveDate::parse_from_str(key, "%Y-%m-%d") {
            Ok(day) => self.events_on(day),
            Err(_) => &[],
        }
    }

    /// Total number of indexed events
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Canonical keys of the days that have events, in order
    pub fn day_keys(&self) -> Vec<String> {
        self.buckets.keys().copied().map(day_key).collect()
    }
}
