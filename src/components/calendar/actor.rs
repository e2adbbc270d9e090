use super::aggregator::EventAggregator;
use super::gateway::ViewInvalidator;
use super::persistence::{CourseSource, PersistenceService};
use super::recurrence::RecurrenceExpander;
use super::view::CalendarView;
use crate::config::Config;
use crate::error::{other_error, CalendarResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};

/// The calendar actor that owns the current view
pub struct CalendarActor {
    config: Arc<RwLock<Config>>,
    persistence: Arc<dyn PersistenceService>,
    courses: Arc<dyn CourseSource>,
    view: Arc<CalendarView>,
    command_rx: mpsc::Receiver<CalendarCommand>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    GetView(mpsc::Sender<Arc<CalendarView>>),
    Refresh(mpsc::Sender<CalendarResult<Arc<CalendarView>>>),
    Invalidate,
    Shutdown,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    /// Current view; never waits for the data source
    pub async fn get_view(&self) -> CalendarResult<Arc<CalendarView>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::GetView(response_tx))
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))
    }

    /// Reload from the data source and return the new view
    pub async fn refresh(&self) -> CalendarResult<Arc<CalendarView>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::Refresh(response_tx))
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Queue a rebuild without waiting for it
    pub async fn invalidate(&self) -> CalendarResult<()> {
        self.command_tx
            .send(CalendarCommand::Invalidate)
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> CalendarResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl ViewInvalidator for CalendarActorHandle {
    async fn invalidate(&self) {
        if let Err(e) = CalendarActorHandle::invalidate(self).await {
            warn!("Could not invalidate calendar view: {}", e);
        }
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        persistence: Arc<dyn PersistenceService>,
        courses: Arc<dyn CourseSource>,
    ) -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config,
            persistence,
            courses,
            view: Arc::new(CalendarView::empty()),
            command_rx,
        };

        let handle = CalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CalendarCommand::GetView(response_tx) => {
                    let _ = response_tx.send(Arc::clone(&self.view)).await;
                }
                CalendarCommand::Refresh(response_tx) => {
                    let result = self.rebuild().await;
                    let _ = response_tx.send(result).await;
                }
                CalendarCommand::Invalidate => {
                    // Failure is logged in rebuild; the old view stays
                    let _ = self.rebuild().await;
                }
                CalendarCommand::Shutdown => {
                    info!("Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }

    /// Load all sources and swap in a new view
    ///
    /// On failure the last good view is kept and the error returned.
    async fn rebuild(&mut self) -> CalendarResult<Arc<CalendarView>> {
        match self.load().await {
            Ok(view) => {
                info!(
                    "Calendar view rebuilt with {} events ({} skipped)",
                    view.events().len(),
                    view.skipped().len()
                );
                self.view = Arc::new(view);
                Ok(Arc::clone(&self.view))
            }
            Err(e) => {
                error!("Failed to rebuild calendar view, keeping previous: {}", e);
                Err(e)
            }
        }
    }

    async fn load(&self) -> CalendarResult<CalendarView> {
        let expander = {
            let config = self.config.read().await;
            RecurrenceExpander::new(config.timezone()?)
                .with_horizon(config.recurrence_horizon_months)
        };

        let events = self.persistence.list().await?;
        let courses = self.courses.list_courses().await?;

        let now = Utc::now();
        let aggregation = EventAggregator::new(expander).aggregate(&events, &courses, now);
        Ok(CalendarView::new(aggregation, now))
    }
}
