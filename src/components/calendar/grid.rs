//! Month view layout.
//!
//! A month grid is a run of blank cells, one per weekday before the 1st
//! (Sunday first), followed by one cell per day of the month.

use super::index::DateBucketIndex;
use super::models::UnifiedEvent;
use super::time::{days_in_month, weekday_index};
use crate::config::DEFAULT_PREVIEW_LIMIT;
use crate::error::{CalendarResult, Error};
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A calendar month, always valid once constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> CalendarResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month a day belongs to
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month).unwrap_or(0)
    }

    /// Following month; stays put at the end of the supported range
    pub fn next(&self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map(Self::containing)
            .unwrap_or(*self)
    }

    /// Previous month; stays put at the start of the supported range
    pub fn prev(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map(Self::containing)
            .unwrap_or(*self)
    }

    /// Heading such as "October 2026"
    pub fn title(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthCursor {
    type Err = Error;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidEvent(format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// One day of the month view
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_selected: bool,
    /// First events of the day, up to the preview limit
    pub preview: Vec<UnifiedEvent>,
    /// Events of the day not in the preview
    pub overflow: usize,
}

impl DayCell {
    pub fn has_overflow(&self) -> bool {
        self.overflow > 0
    }

    pub fn total_events(&self) -> usize {
        self.preview.len() + self.overflow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridCell {
    Blank,
    Day(DayCell),
}

impl GridCell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            Self::Blank => None,
            Self::Day(cell) => Some(cell),
        }
    }
}

/// Ordered cells of one month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    pub month: MonthCursor,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    pub fn leading_blanks(&self) -> usize {
        self.cells
            .iter()
            .take_while(|c| matches!(c, GridCell::Blank))
            .count()
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(GridCell::as_day)
    }

    /// Cell for a day of the month (1-based)
    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.days().find(|c| c.date.day() == day)
    }

    /// Cells split into week rows, Sunday first; the last row may be short
    pub fn rows(&self) -> Vec<&[GridCell]> {
        self.cells.chunks(7).collect()
    }
}

/// Builds month grids from a day index
#[derive(Debug, Clone, Copy)]
pub struct CalendarGridBuilder {
    preview_limit: usize,
}

impl Default for CalendarGridBuilder {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl CalendarGridBuilder {
    pub fn new(preview_limit: usize) -> Self {
        Self { preview_limit }
    }

    /// Lay out `year`-`month`; output depends only on the arguments
    pub fn build(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
        selected: Option<NaiveDate>,
        index: &DateBucketIndex,
    ) -> CalendarResult<MonthGrid> {
        let cursor = MonthCursor::new(year, month)?;
        Ok(self.build_month(cursor, today, selected, index))
    }

    pub fn build_month(
        &self,
        cursor: MonthCursor,
        today: NaiveDate,
        selected: Option<NaiveDate>,
        index: &DateBucketIndex,
    ) -> MonthGrid {
        let first = cursor.first_day();
        let blanks = weekday_index(first) as usize;
        let day_count = cursor.days_in_month();

        let mut cells = Vec::with_capacity(blanks + day_count as usize);
        cells.extend(std::iter::repeat(GridCell::Blank).take(blanks));

        for date in first.iter_days().take(day_count as usize) {
            let events = index.events_on(date);
            let shown = events.len().min(self.preview_limit);

            cells.push(GridCell::Day(DayCell {
                date,
                is_today: date == today,
                is_selected: selected == Some(date),
                preview: events[..shown].to_vec(),
                overflow: events.len() - shown,
            }));
        }

        MonthGrid {
            month: cursor,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::models::{EventKind, EventOrigin};
    use crate::components::calendar::time::parse_event_date;
    use chrono_tz::UTC;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn events_on(date: &str, count: usize) -> Vec<UnifiedEvent> {
        (0..count)
            .map(|i| UnifiedEvent {
                id: format!("{}-{}", date, i),
                title: format!("Event {}", i),
                description: String::new(),
                date: parse_event_date(date, &UTC, "test").unwrap(),
                kind: EventKind::Reminder,
                origin: EventOrigin::Persisted,
                course_id: None,
                course_name: None,
                color: None,
            })
            .collect()
    }

    #[test]
    fn test_month_starting_wednesday() {
        // May 2024 starts on a Wednesday
        let grid = CalendarGridBuilder::default()
            .build(2024, 5, day("2024-05-10"), None, &DateBucketIndex::default())
            .unwrap();

        assert_eq!(grid.leading_blanks(), 3);
        assert_eq!(grid.cells.len(), 3 + 31);
        assert_eq!(grid.days().count(), 31);
        assert!(grid.cells[..3].iter().all(|c| matches!(c, GridCell::Blank)));
        assert_eq!(grid.day(1).unwrap().date, day("2024-05-01"));
    }

    #[test]
    fn test_month_starting_sunday_has_no_blanks() {
        // September 2024 starts on a Sunday
        let grid = CalendarGridBuilder::default()
            .build(2024, 9, day("2024-09-01"), None, &DateBucketIndex::default())
            .unwrap();
        assert_eq!(grid.leading_blanks(), 0);
        assert_eq!(grid.cells.len(), 30);
        assert_eq!(grid.rows().len(), 5);
    }

    #[test]
    fn test_today_and_selected_flags() {
        let grid = CalendarGridBuilder::default()
            .build(
                2024,
                2,
                day("2024-02-14"),
                Some(day("2024-02-29")),
                &DateBucketIndex::default(),
            )
            .unwrap();

        assert_eq!(grid.days().count(), 29);
        assert!(grid.day(14).unwrap().is_today);
        assert!(!grid.day(14).unwrap().is_selected);
        assert!(grid.day(29).unwrap().is_selected);
        assert_eq!(grid.days().filter(|c| c.is_today).count(), 1);
        assert_eq!(grid.days().filter(|c| c.is_selected).count(), 1);
    }

    #[test]
    fn test_preview_is_capped_with_overflow() {
        let mut events = events_on("2024-03-05", 5);
        events.extend(events_on("2024-03-06", 2));
        let index = DateBucketIndex::build(events);

        let grid = CalendarGridBuilder::default()
            .build(2024, 3, day("2024-03-01"), None, &index)
            .unwrap();

        let busy = grid.day(5).unwrap();
        assert_eq!(busy.preview.len(), 3);
        assert_eq!(busy.preview[0].id, "2024-03-05-0");
        assert!(busy.has_overflow());
        assert_eq!(busy.overflow, 2);
        assert_eq!(busy.total_events(), 5);

        let light = grid.day(6).unwrap();
        assert_eq!(light.preview.len(), 2);
        assert!(!light.has_overflow());

        let custom = CalendarGridBuilder::new(1)
            .build(2024, 3, day("2024-03-01"), None, &index)
            .unwrap();
        assert_eq!(custom.day(6).unwrap().overflow, 1);
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let index = DateBucketIndex::build(events_on("2024-07-04", 4));
        let builder = CalendarGridBuilder::default();
        let a = builder.build(2024, 7, day("2024-07-01"), Some(day("2024-07-04")), &index).unwrap();
        let b = builder.build(2024, 7, day("2024-07-01"), Some(day("2024-07-04")), &index).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let result = CalendarGridBuilder::default().build(
            2024,
            13,
            day("2024-01-01"),
            None,
            &DateBucketIndex::default(),
        );
        assert!(matches!(result, Err(Error::InvalidMonth { year: 2024, month: 13 })));
    }

    #[test]
    fn test_month_cursor_navigation() {
        let dec = MonthCursor::new(2024, 12).unwrap();
        assert_eq!(dec.next(), MonthCursor::new(2025, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(MonthCursor::new(2024, 1).unwrap().prev().to_string(), "2023-12");
        assert_eq!(dec.title(), "December 2024");
        assert_eq!(MonthCursor::containing(day("2024-02-29")).days_in_month(), 29);
    }

    #[test]
    fn test_month_cursor_from_str() {
        assert_eq!("2026-10".parse::<MonthCursor>().unwrap(), MonthCursor::new(2026, 10).unwrap());
        assert!("2026-00".parse::<MonthCursor>().is_err());
        assert!("October".parse::<MonthCursor>().is_err());
    }
}
