use super::util::{render_event_list, render_month};
use super::{CommandContext, CommandResult};
use chrono::{Datelike, Days, NaiveDate};
use lukkari::components::calendar::time::week_range;
use lukkari::components::calendar::{EventPatch, MonthCursor, NewEvent, RecurrencePattern};
use lukkari::error::Error;
use lukkari::utils::state::{KeyValueStore, VIEW_MONTH, VIEW_SELECTED};
use tracing::debug;

/// Number of events `upcoming` lists when no limit is given
const DEFAULT_UPCOMING: usize = 10;

fn parse_day(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::MalformedDate {
        record: "command line".to_string(),
        value: value.to_string(),
    })
}

/// Show a month grid
///
/// Without arguments the last viewed month is shown again, or the current
/// month on first use.
pub async fn month(
    ctx: &mut CommandContext,
    year: Option<i32>,
    month: Option<u32>,
) -> CommandResult {
    let cursor = match (year, month) {
        (Some(year), Some(month)) => MonthCursor::new(year, month)?,
        (None, Some(month)) => MonthCursor::new(ctx.today.year(), month)?,
        (Some(year), None) => MonthCursor::new(year, 1)?,
        (None, None) => ctx
            .state
            .get(VIEW_MONTH)
            .and_then(|saved| saved.parse::<MonthCursor>().ok())
            .unwrap_or_else(|| MonthCursor::containing(ctx.today)),
    };

    let selected = ctx
        .state
        .get(VIEW_SELECTED)
        .and_then(|saved| parse_day(saved).ok())
        .filter(|day| MonthCursor::containing(*day) == cursor);

    let grid = ctx.calendar.month_grid(cursor, ctx.today, selected).await?;
    print!("{}", render_month(&grid));

    ctx.state.set(VIEW_MONTH, cursor.to_string());
    Ok(())
}

/// List the events of one day and remember it as selected
pub async fn day(ctx: &mut CommandContext, date: &str) -> CommandResult {
    let day = parse_day(date)?;
    let view = ctx.calendar.view().await?;

    print!("{}", render_event_list(view.events_on(day)));

    ctx.state.set(VIEW_SELECTED, day.to_string());
    ctx.state
        .set(VIEW_MONTH, MonthCursor::containing(day).to_string());
    Ok(())
}

/// List the Monday to Sunday week around a day
pub async fn week(ctx: &CommandContext, date: Option<&str>) -> CommandResult {
    let day = match date {
        Some(date) => parse_day(date)?,
        None => ctx.today,
    };
    let (monday, sunday) = week_range(day);
    let end = sunday
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX);

    let view = ctx.calendar.view().await?;
    println!("Week of {}", monday.format("%Y-%m-%d"));
    print!("{}", render_event_list(view.events_between(monday, end)));
    Ok(())
}

pub async fn upcoming(ctx: &CommandContext, limit: Option<usize>) -> CommandResult {
    let view = ctx.calendar.view().await?;
    let events = view.upcoming(ctx.today, limit.unwrap_or(DEFAULT_UPCOMING));
    print!("{}", render_event_list(events));
    Ok(())
}

pub struct AddArgs {
    pub title: String,
    pub date: String,
    pub description: Option<String>,
    pub repeat: Option<String>,
    pub from: Option<String>,
    pub until: Option<String>,
}

pub async fn add(ctx: &CommandContext, args: AddArgs) -> CommandResult {
    let mut event = NewEvent::new(args.title, args.date);
    if let Some(description) = args.description {
        event = event.with_description(description);
    }

    if let Some(repeat) = args.repeat {
        let pattern = RecurrencePattern::parse(&repeat).ok_or_else(|| {
            Error::InvalidEvent(format!(
                "Unknown repeat '{}', expected daily, weekly or monthly",
                repeat
            ))
        })?;
        event = event.repeating(pattern, args.from, args.until);
    } else if args.from.is_some() || args.until.is_some() {
        return Err(Error::InvalidEvent(
            "--from and --until need --repeat".to_string(),
        ));
    }

    let created = ctx.calendar.create_event(event).await?;
    println!("Created event {} on {}", created.id, created.date);
    Ok(())
}

pub async fn edit(ctx: &CommandContext, id: &str, patch: EventPatch) -> CommandResult {
    if patch == EventPatch::default() {
        return Err(Error::InvalidEvent("Nothing to change".to_string()));
    }

    let updated = ctx.calendar.update_event(id, patch).await?;
    debug!("Updated event: {:?}", updated);
    println!("Updated event {}", updated.id);
    Ok(())
}

pub async fn delete(ctx: &CommandContext, id: &str) -> CommandResult {
    ctx.calendar.delete_event(id).await?;
    println!("Deleted event {}", id);
    Ok(())
}
