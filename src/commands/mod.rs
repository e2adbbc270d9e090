use chrono::NaiveDate;
use lukkari::components::CalendarHandle;
use lukkari::error::CalendarResult;
use lukkari::utils::TomlStateStore;

pub mod calendar;
pub mod util;

/// Shared context for all commands
pub struct CommandContext {
    pub calendar: CalendarHandle,
    pub state: TomlStateStore,
    /// Local date in the configured timezone
    pub today: NaiveDate,
}

impl CommandContext {
    pub fn new(calendar: CalendarHandle, state: TomlStateStore, today: NaiveDate) -> Self {
        Self {
            calendar,
            state,
            today,
        }
    }
}

/// Type alias for command result
pub type CommandResult = CalendarResult<()>;
