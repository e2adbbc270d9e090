use super::models::{Course, EventPatch, NewEvent, PersistedEvent};
use crate::error::{persistence_error, CalendarResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Store that owns persisted calendar entries
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// All stored entries
    async fn list(&self) -> CalendarResult<Vec<PersistedEvent>>;

    /// Store a new entry and return it with its id
    async fn create(&self, event: NewEvent) -> CalendarResult<PersistedEvent>;

    /// Apply a patch to an existing entry
    async fn update(&self, id: &str, patch: EventPatch) -> CalendarResult<PersistedEvent>;

    async fn delete(&self, id: &str) -> CalendarResult<()>;
}

/// Read-only source of courses with their assignments and notes
#[async_trait]
pub trait CourseSource: Send + Sync {
    async fn list_courses(&self) -> CalendarResult<Vec<Course>>;
}

/// On-disk layout of [`JsonFileStore`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub events: Vec<PersistedEvent>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// Calendar entries and courses kept in one JSON file
///
/// A missing file reads as empty. Every write replaces the file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_snapshot(&self) -> CalendarResult<Snapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Snapshot::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                persistence_error(&format!(
                    "Failed to parse {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                Ok(Snapshot::default())
            }
            Err(e) => Err(persistence_error(&format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> CalendarResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await.map_err(|e| {
            persistence_error(&format!("Failed to write {}: {}", temp.display(), e))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            persistence_error(&format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    /// Sibling file the snapshot is written to before it replaces the original
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PersistenceService for JsonFileStore {
    async fn list(&self) -> CalendarResult<Vec<PersistedEvent>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_snapshot().await?.events)
    }

    async fn create(&self, event: NewEvent) -> CalendarResult<PersistedEvent> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.read_snapshot().await?;

        let created = event.into_persisted(uuid::Uuid::new_v4().to_string());
        snapshot.events.push(created.clone());
        self.write_snapshot(&snapshot).await?;

        info!("Stored event {} in {}", created.id, self.path.display());
        Ok(created)
    }

    async fn update(&self, id: &str, patch: EventPatch) -> CalendarResult<PersistedEvent> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.read_snapshot().await?;

        let event = snapshot
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| persistence_error(&format!("Event not found: {}", id)))?;
        patch.apply_to(event);
        let updated = event.clone();

        self.write_snapshot(&snapshot).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> CalendarResult<()> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.read_snapshot().await?;

        let before = snapshot.events.len();
        snapshot.events.retain(|e| e.id != id);
        if snapshot.events.len() == before {
            return Err(persistence_error(&format!("Event not found: {}", id)));
        }

        self.write_snapshot(&snapshot).await
    }
}

#[async_trait]
impl CourseSource for JsonFileStore {
    async fn list_courses(&self) -> CalendarResult<Vec<Course>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_snapshot().await?.courses)
    }
}
