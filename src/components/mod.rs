pub mod calendar;

pub use calendar::CalendarHandle;
