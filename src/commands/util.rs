use chrono::Datelike;
use lukkari::components::calendar::{DayCell, GridCell, MonthGrid, UnifiedEvent};
use std::fmt::Write;

const WEEKDAY_HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

/// Marker after a day number: today, selected, has events
fn day_marker(cell: &DayCell) -> char {
    if cell.is_today {
        '*'
    } else if cell.is_selected {
        '#'
    } else if cell.total_events() > 0 {
        '.'
    } else {
        ' '
    }
}

/// One event as `HH:MM  title [kind] (course)  id`
pub fn event_line(event: &UnifiedEvent) -> String {
    let mut line = format!(
        "{}  {} [{}]",
        event.date.format("%H:%M"),
        event.title,
        event.kind.as_str()
    );
    if let Some(course) = &event.course_name {
        let _ = write!(line, " ({})", course);
    }
    let _ = write!(line, "  {}", event.id);
    line
}

/// Month grid followed by the previews of every day with events
pub fn render_month(grid: &MonthGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:^28}", grid.month.title());
    let _ = writeln!(out, "{}", WEEKDAY_HEADER);

    for row in grid.rows() {
        let line: String = row
            .iter()
            .map(|cell| match cell {
                GridCell::Blank => "    ".to_string(),
                GridCell::Day(day) => format!("{:>3}{}", day.date.day(), day_marker(day)),
            })
            .collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let busy: Vec<&DayCell> = grid.days().filter(|d| d.total_events() > 0).collect();
    if !busy.is_empty() {
        let _ = writeln!(out);
    }
    for day in busy {
        let _ = writeln!(out, "{}", day.date.format("%a %d"));
        for event in &day.preview {
            let _ = writeln!(out, "  {}", event_line(event));
        }
        if day.has_overflow() {
            let _ = writeln!(out, "  ...and {} more", day.overflow);
        }
    }

    out
}

/// Events grouped under a date heading, in the given order
pub fn render_event_list<'a, I>(events: I) -> String
where
    I: IntoIterator<Item = &'a UnifiedEvent>,
{
    let mut out = String::new();
    let mut current = None;

    for event in events {
        let day = event.date.date_naive();
        if current != Some(day) {
            let _ = writeln!(out, "{}", day.format("%a %Y-%m-%d"));
            current = Some(day);
        }
        let _ = writeln!(out, "  {}", event_line(event));
    }

    if out.is_empty() {
        out.push_str("No events\n");
    }
    out
}
