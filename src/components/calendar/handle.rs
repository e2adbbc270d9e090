use super::actor::{CalendarActor, CalendarActorHandle};
use super::gateway::EventMutationGateway;
use super::grid::{CalendarGridBuilder, MonthCursor, MonthGrid};
use super::models::{EventPatch, NewEvent, PersistedEvent};
use super::persistence::{CourseSource, PersistenceService};
use super::view::CalendarView;
use crate::config::Config;
use crate::error::CalendarResult;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for reading and changing the calendar
///
/// Reads come from the actor's cached view. Writes go through the mutation
/// gateway, which asks the actor to rebuild after each success.
#[derive(Clone)]
pub struct CalendarHandle {
    config: Arc<RwLock<Config>>,
    actor_handle: CalendarActorHandle,
    gateway: EventMutationGateway,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor
    pub async fn new(
        config: Arc<RwLock<Config>>,
        persistence: Arc<dyn PersistenceService>,
        courses: Arc<dyn CourseSource>,
    ) -> CalendarResult<Self> {
        let tz = config.read().await.timezone()?;

        let (mut actor, handle) =
            CalendarActor::new(Arc::clone(&config), Arc::clone(&persistence), courses);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        let gateway =
            EventMutationGateway::new(persistence, tz).with_invalidator(Arc::new(handle.clone()));

        Ok(Self {
            config,
            actor_handle: handle,
            gateway,
            _actor_task: Arc::new(actor_task),
        })
    }

    /// Latest view; empty until the first successful refresh
    pub async fn view(&self) -> CalendarResult<Arc<CalendarView>> {
        self.actor_handle.get_view().await
    }

    /// Reload all sources
    pub async fn refresh(&self) -> CalendarResult<Arc<CalendarView>> {
        self.actor_handle.refresh().await
    }

    pub async fn create_event(&self, event: NewEvent) -> CalendarResult<PersistedEvent> {
        self.gateway.create(event).await
    }

    pub async fn update_event(
        &self,
        id: &str,
        patch: EventPatch,
    ) -> CalendarResult<PersistedEvent> {
        self.gateway.update(id, patch).await
    }

    pub async fn delete_event(&self, id: &str) -> CalendarResult<()> {
        self.gateway.delete(id).await
    }

    /// Month grid over the current view
    pub async fn month_grid(
        &self,
        month: MonthCursor,
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> CalendarResult<MonthGrid> {
        let preview_limit = self.config.read().await.preview_limit;
        let view = self.view().await?;

        Ok(CalendarGridBuilder::new(preview_limit).build_month(
            month,
            today,
            selected,
            view.index(),
        ))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> CalendarResult<()> {
        self.actor_handle.shutdown().await
    }
}
