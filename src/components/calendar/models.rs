use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Marker between a base id and the instant of a generated occurrence
pub const RECURRENCE_MARKER: &str = "-recurrence-";
/// Prefix of events derived from assignment due dates
pub const ASSIGNMENT_PREFIX: &str = "assignment-";
/// Prefix of events derived from lecture notes
pub const LECTURE_PREFIX: &str = "lecture-";

/// Calendar entry as stored by the persistence service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "eventDate")]
    pub date: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<String>,
}

/// Payload for creating a calendar entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    #[serde(rename = "eventDate")]
    pub date: String,
    pub is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<String>,
}

impl NewEvent {
    /// One-off entry on the given date
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Make the entry repeat with the given pattern
    pub fn repeating(
        mut self,
        pattern: RecurrencePattern,
        start: Option<String>,
        end: Option<String>,
    ) -> Self {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern.as_str().to_string());
        self.recurrence_start_date = start;
        self.recurrence_end_date = end;
        self
    }

    /// Attach a persistence id to the payload
    pub fn into_persisted(self, id: impl Into<String>) -> PersistedEvent {
        PersistedEvent {
            id: id.into(),
            title: self.title,
            description: self.description,
            date: self.date,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_start_date: self.recurrence_start_date,
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

/// Partial update of a calendar entry; `None` leaves a field unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "eventDate", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<String>,
}

impl EventPatch {
    /// Apply the present fields onto a stored event
    pub fn apply_to(&self, event: &mut PersistedEvent) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(date) = &self.date {
            event.date = date.clone();
        }
        if let Some(is_recurring) = self.is_recurring {
            event.is_recurring = is_recurring;
        }
        if let Some(pattern) = &self.recurrence_pattern {
            event.recurrence_pattern = Some(pattern.clone());
        }
        if let Some(start) = &self.recurrence_start_date {
            event.recurrence_start_date = Some(start.clone());
        }
        if let Some(end) = &self.recurrence_end_date {
            event.recurrence_end_date = Some(end.clone());
        }
    }
}

/// How often a base event repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    /// Parse a wire value; unknown patterns yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Generated, never persisted occurrence of a recurring base event
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceInstance {
    pub id: String,
    /// Lookup-only reference to the base event
    pub original_event_id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Tz>,
}

impl RecurrenceInstance {
    /// Build the instance id from the base id and the occurrence instant
    pub fn instance_id(base_id: &str, date: &DateTime<Tz>) -> String {
        format!("{}{}{}", base_id, RECURRENCE_MARKER, date.timestamp_millis())
    }
}

/// A course with the records that feed derived events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date_added: Option<String>,
}

/// Display category of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Assignment,
    Lecture,
    Reminder,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Lecture => "lecture",
            Self::Reminder => "reminder",
        }
    }
}

/// Where a unified event came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOrigin {
    Persisted,
    RecurrenceInstance { original_event_id: String },
    Assignment { assignment_id: String },
    Lecture { note_id: String },
}

/// Origin-agnostic event used by indexing and the grid
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Tz>,
    pub kind: EventKind,
    pub origin: EventOrigin,
    pub course_id: Option<String>,
    pub course_name: Option<String>,
    pub color: Option<String>,
}

impl UnifiedEvent {
    /// Stored entry mapped 1:1
    pub fn from_persisted(event: &PersistedEvent, date: DateTime<Tz>) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            date,
            kind: EventKind::Reminder,
            origin: EventOrigin::Persisted,
            course_id: None,
            course_name: None,
            color: None,
        }
    }

    pub fn from_instance(instance: RecurrenceInstance) -> Self {
        Self {
            id: instance.id,
            title: instance.title,
            description: instance.description,
            date: instance.date,
            kind: EventKind::Reminder,
            origin: EventOrigin::RecurrenceInstance {
                original_event_id: instance.original_event_id,
            },
            course_id: None,
            course_name: None,
            color: None,
        }
    }

    pub fn from_assignment(course: &Course, assignment: &Assignment, date: DateTime<Tz>) -> Self {
        Self {
            id: format!("{}{}", ASSIGNMENT_PREFIX, assignment.id),
            title: assignment.title.clone(),
            description: assignment.description.clone(),
            date,
            kind: EventKind::Assignment,
            origin: EventOrigin::Assignment {
                assignment_id: assignment.id.clone(),
            },
            course_id: Some(course.id.clone()),
            course_name: Some(course.name.clone()),
            color: course.color.clone(),
        }
    }

    pub fn from_note(course: &Course, note: &Note, date: DateTime<Tz>) -> Self {
        Self {
            id: format!("{}{}", LECTURE_PREFIX, note.id),
            title: note.title.clone(),
            description: note.content.clone(),
            date,
            kind: EventKind::Lecture,
            origin: EventOrigin::Lecture {
                note_id: note.id.clone(),
            },
            course_id: Some(course.id.clone()),
            course_name: Some(course.name.clone()),
            color: course.color.clone(),
        }
    }
}

/// Classification of an event id string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef<'a> {
    Persisted(&'a str),
    RecurrenceInstance { base_id: &'a str, epoch_millis: i64 },
    Assignment(&'a str),
    Lecture(&'a str),
}

impl<'a> EventRef<'a> {
    /// Classify an id by the synthetic id conventions
    pub fn parse(id: &'a str) -> Self {
        if let Some(rest) = id.strip_prefix(ASSIGNMENT_PREFIX) {
            return Self::Assignment(rest);
        }
        if let Some(rest) = id.strip_prefix(LECTURE_PREFIX) {
            return Self::Lecture(rest);
        }
        // Only marker + epoch millis is generated; any other tail is a stored id
        if let Some((base_id, millis)) = id.rsplit_once(RECURRENCE_MARKER) {
            if let Ok(epoch_millis) = millis.parse::<i64>() {
                return Self::RecurrenceInstance {
                    base_id,
                    epoch_millis,
                };
            }
        }
        Self::Persisted(id)
    }
}
