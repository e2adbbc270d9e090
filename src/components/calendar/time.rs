use crate::error::{malformed_date, CalendarResult};
use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone,
};
use chrono_tz::Tz;

/// Naive datetime layouts accepted besides RFC 3339
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Resolve a wall-clock time in the given zone
///
/// Ambiguous times take the earlier instant; times inside a DST gap move
/// forward by one hour.
pub fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        }
    }
}

/// Parse a boundary date string into an instant in the given zone
///
/// `record` names the owning record in the error.
pub fn parse_event_date(value: &str, tz: &Tz, record: &str) -> CalendarResult<DateTime<Tz>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(malformed_date(record, value));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(tz));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return resolve_local(tz, &naive).ok_or_else(|| malformed_date(record, value));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| resolve_local(tz, &midnight))
            .ok_or_else(|| malformed_date(record, value));
    }

    Err(malformed_date(record, value))
}

/// Parse an optional date; absent values stay `None`
pub fn parse_optional_date(
    value: Option<&str>,
    tz: &Tz,
    record: &str,
) -> CalendarResult<Option<DateTime<Tz>>> {
    value.map(|v| parse_event_date(v, tz, record)).transpose()
}

/// Shift a local time by whole calendar days, keeping the wall-clock time
pub fn add_days(dt: &DateTime<Tz>, days: u64) -> Option<DateTime<Tz>> {
    let naive = dt.naive_local().checked_add_days(Days::new(days))?;
    resolve_local(&dt.timezone(), &naive)
}

/// Shift a local time by calendar months, clamping to the last day of month
pub fn add_months(dt: &DateTime<Tz>, months: u32) -> Option<DateTime<Tz>> {
    let naive = dt.naive_local().checked_add_months(Months::new(months))?;
    resolve_local(&dt.timezone(), &naive)
}

/// Canonical day key for bucketing (`YYYY-MM-DD`)
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Number of days in a month, `None` for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Sunday-based weekday index (0 = Sunday .. 6 = Saturday)
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Get date range for the week containing `day` (Monday to Sunday)
pub fn week_range(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day
        .checked_sub_days(Days::new(day.weekday().num_days_from_monday() as u64))
        .unwrap_or(day);
    let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
    (monday, sunday)
}
