//! Calendar engine: recurrence expansion, aggregation, day index, month grid
//! and the write path for stored entries.

mod actor;
pub mod aggregator;
pub mod gateway;
pub mod grid;
mod handle;
pub mod index;
pub mod models;
pub mod persistence;
pub mod recurrence;
#[cfg(feature = "rest")]
pub mod rest;
pub mod time;
pub mod view;

pub use actor::{CalendarActor, CalendarActorHandle, CalendarCommand};
pub use aggregator::{Aggregation, EventAggregator, RecordSource, SkippedRecord};
pub use gateway::{EventMutationGateway, ViewInvalidator};
pub use grid::{CalendarGridBuilder, DayCell, GridCell, MonthCursor, MonthGrid};
pub use handle::CalendarHandle;
pub use index::DateBucketIndex;
pub use models::{
    Assignment, Course, EventKind, EventOrigin, EventPatch, EventRef, NewEvent, Note,
    PersistedEvent, RecurrenceInstance, RecurrencePattern, UnifiedEvent,
};
pub use persistence::{CourseSource, JsonFileStore, PersistenceService};
pub use recurrence::{RecurrenceExpander, MAX_RECURRENCES};
#[cfg(feature = "rest")]
pub use rest::RestClient;
pub use view::CalendarView;
