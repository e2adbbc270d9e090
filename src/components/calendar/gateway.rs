//! Write path for calendar entries.
//!
//! Only stored entries can be changed. Ids of generated recurrence instances
//! and of assignment or lecture events are rejected before the persistence
//! service is contacted.

use super::models::{EventPatch, EventRef, NewEvent, PersistedEvent, RecurrencePattern};
use super::persistence::PersistenceService;
use super::time::parse_event_date;
use crate::error::{invalid_target, CalendarResult, Error};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info};

/// Receiver of "the stored data changed" signals
#[async_trait]
pub trait ViewInvalidator: Send + Sync {
    async fn invalidate(&self);
}

/// Forwards create, update and delete of stored entries
#[derive(Clone)]
pub struct EventMutationGateway {
    persistence: Arc<dyn PersistenceService>,
    tz: Tz,
    invalidator: Option<Arc<dyn ViewInvalidator>>,
}

impl EventMutationGateway {
    pub fn new(persistence: Arc<dyn PersistenceService>, tz: Tz) -> Self {
        Self {
            persistence,
            tz,
            invalidator: None,
        }
    }

    /// Signal `invalidator` after every successful mutation
    pub fn with_invalidator(mut self, invalidator: Arc<dyn ViewInvalidator>) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    pub async fn create(&self, event: NewEvent) -> CalendarResult<PersistedEvent> {
        validate_title(Some(&event.title))?;
        self.validate_dates(
            Some(&event.date),
            event.recurrence_start_date.as_deref(),
            event.recurrence_end_date.as_deref(),
        )?;
        validate_pattern(event.recurrence_pattern.as_deref())?;

        let created = self.persistence.create(event).await.map_err(|e| {
            error!("Failed to create event: {}", e);
            e
        })?;

        info!("Created event {}", created.id);
        self.notify().await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: EventPatch) -> CalendarResult<PersistedEvent> {
        let target = persisted_target(id)?;

        validate_title(patch.title.as_deref())?;
        self.validate_dates(
            patch.date.as_deref(),
            patch.recurrence_start_date.as_deref(),
            patch.recurrence_end_date.as_deref(),
        )?;
        validate_pattern(patch.recurrence_pattern.as_deref())?;

        let updated = self.persistence.update(target, patch).await.map_err(|e| {
            error!("Failed to update event {}: {}", target, e);
            e
        })?;

        info!("Updated event {}", updated.id);
        self.notify().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> CalendarResult<()> {
        let target = persisted_target(id)?;

        self.persistence.delete(target).await.map_err(|e| {
            error!("Failed to delete event {}: {}", target, e);
            e
        })?;

        info!("Deleted event {}", target);
        self.notify().await;
        Ok(())
    }

    async fn notify(&self) {
        if let Some(invalidator) = &self.invalidator {
            invalidator.invalidate().await;
        }
    }

    fn validate_dates(
        &self,
        date: Option<&str>,
        recurrence_start: Option<&str>,
        recurrence_end: Option<&str>,
    ) -> CalendarResult<()> {
        let fields = [
            ("event date", date),
            ("recurrence start", recurrence_start),
            ("recurrence end", recurrence_end),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                parse_event_date(value, &self.tz, field)?;
            }
        }
        Ok(())
    }
}

fn validate_title(title: Option<&str>) -> CalendarResult<()> {
    match title {
        Some(title) if title.trim().is_empty() => {
            Err(Error::InvalidEvent("Title must not be empty".to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_pattern(pattern: Option<&str>) -> CalendarResult<()> {
    match pattern {
        Some(value) if RecurrencePattern::parse(value).is_none() => Err(Error::InvalidEvent(
            format!("Unknown recurrence pattern '{}'", value),
        )),
        _ => Ok(()),
    }
}

/// Resolve `id` to a stored entry id or reject it
fn persisted_target(id: &str) -> CalendarResult<&str> {
    match EventRef::parse(id) {
        EventRef::Persisted(target) => Ok(target),
        EventRef::RecurrenceInstance { base_id, .. } => Err(invalid_target(
            id,
            &format!("generated occurrence of event '{}'", base_id),
        )),
        EventRef::Assignment(assignment_id) => Err(invalid_target(
            id,
            &format!("derived from assignment '{}'", assignment_id),
        )),
        EventRef::Lecture(note_id) => Err(invalid_target(
            id,
            &format!("derived from lecture note '{}'", note_id),
        )),
    }
}
