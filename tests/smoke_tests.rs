use chrono::NaiveDate;
use lukkari::components::calendar::{
    CalendarHandle, CourseSource, EventKind, EventPatch, JsonFileStore, MonthCursor, NewEvent,
    PersistenceService, RecurrencePattern,
};
use lukkari::config::Config;
use lukkari::error::Error;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::RwLock;

const SNAPSHOT: &str = r##"{
  "events": [
    { "id": "e1", "title": "Study group", "description": "", "eventDate": "2024-05-06T16:00:00",
      "isRecurring": true, "recurrencePattern": "daily", "recurrenceEndDate": "2024-05-10" },
    { "id": "e2", "title": "Broken", "eventDate": "not a date" }
  ],
  "courses": [
    { "id": "c1", "name": "Operating Systems", "color": "#aa0000",
      "assignments": [
        { "id": "a1", "title": "Lab 1", "dueDate": "2024-05-08T12:00:00" },
        { "id": "a2", "title": "Lab 2", "dueDate": "2024-05-08T18:00:00" },
        { "id": "a3", "title": "Lab 3" }
      ],
      "notes": [
        { "id": "n1", "title": "Scheduling", "content": "Round robin", "dateAdded": "2024-05-08" }
      ]
    }
  ]
}"##;

/// Smoke test to verify that the config defaults are usable
#[tokio::test]
async fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.timezone().unwrap(), chrono_tz::UTC);
    assert_eq!(config.preview_limit, 3);
    assert!(config.api_url.is_none());
}

#[tokio::test]
async fn test_json_store_crud() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("data/calendar.json"));

    // A missing file reads as empty
    assert!(store.list().await.unwrap().is_empty());
    assert!(store.list_courses().await.unwrap().is_empty());

    let created = store
        .create(NewEvent::new("Exam", "2024-06-01T09:00:00").with_description("Hall B"))
        .await
        .unwrap();
    assert!(!created.id.is_empty());

    let repeating = store
        .create(NewEvent::new("Gym", "2024-06-01").repeating(
            RecurrencePattern::Weekly,
            None,
            Some("2024-07-01".to_string()),
        ))
        .await
        .unwrap();
    assert_ne!(created.id, repeating.id);

    let patch = EventPatch {
        title: Some("Final exam".to_string()),
        ..Default::default()
    };
    let updated = store.update(&created.id, patch).await.unwrap();
    assert_eq!(updated.title, "Final exam");
    assert_eq!(updated.description, "Hall B");

    // A second store over the same file sees the changes
    let reopened = JsonFileStore::new(store.path());
    let events = reopened.list().await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].recurrence_pattern.as_deref(), Some("weekly"));

    reopened.delete(&created.id).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);
    assert!(matches!(
        store.delete(&created.id).await,
        Err(Error::PersistenceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_json_store_wire_format() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("calendar.json"));
    store
        .create(NewEvent::new("Exam", "2024-06-01"))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"eventDate\""));
    assert!(raw.contains("\"isRecurring\""));
}

#[tokio::test]
async fn test_interrupted_write_leaves_snapshot_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calendar.json");
    let store = JsonFileStore::new(&path);
    store
        .create(NewEvent::new("Exam", "2024-06-01"))
        .await
        .unwrap();

    // A write that died halfway only ever touches the sibling file
    let temp = dir.path().join("calendar.json.tmp");
    std::fs::write(&temp, "{ \"events\": [ { \"id\"").unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);

    store
        .create(NewEvent::new("Retake", "2024-08-01"))
        .await
        .unwrap();
    assert!(!temp.exists());
    assert_eq!(JsonFileStore::new(&path).list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_corrupt_store_is_unavailable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calendar.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::new(&path);
    assert!(matches!(
        store.list().await,
        Err(Error::PersistenceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_file_backed_calendar_end_to_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calendar.json");
    std::fs::write(&path, SNAPSHOT).unwrap();

    let store = Arc::new(JsonFileStore::new(&path));
    let config = Arc::new(RwLock::new(Config::default()));
    let calendar = CalendarHandle::new(config, store.clone(), store)
        .await
        .unwrap();

    let view = calendar.refresh().await.unwrap();

    // e1 + 3 daily instances, 2 assignments, 1 lecture
    assert_eq!(view.events().len(), 7);
    // e2 and the undated assignment
    assert_eq!(view.skipped().len(), 2);

    let may8 = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
    let on_may8 = view.events_on(may8);
    assert_eq!(on_may8.len(), 4);
    assert!(on_may8.iter().any(|e| e.kind == EventKind::Lecture));

    let grid = calendar
        .month_grid(MonthCursor::new(2024, 5).unwrap(), may8, Some(may8))
        .await
        .unwrap();
    // May 2024 starts on a Wednesday
    assert_eq!(grid.leading_blanks(), 3);
    let cell = grid.day(8).unwrap();
    assert!(cell.is_today && cell.is_selected);
    assert_eq!(cell.preview.len(), 3);
    assert_eq!(cell.overflow, 1);

    let upcoming = view.upcoming(NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(), 10);
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].title, "Study group");

    calendar.shutdown().await.unwrap();
}
