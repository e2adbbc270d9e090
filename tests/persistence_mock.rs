use async_trait::async_trait;
use lukkari::components::calendar::{
    Assignment, CalendarHandle, Course, CourseSource, EventMutationGateway, EventPatch, EventRef,
    NewEvent, PersistedEvent, PersistenceService, ViewInvalidator,
};
use lukkari::config::Config;
use lukkari::error::{persistence_error, CalendarResult, Error};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// In-memory persistence that counts every call
#[derive(Default)]
pub struct MockPersistence {
    events: Mutex<Vec<PersistedEvent>>,
    calls: AtomicUsize,
    next_id: AtomicUsize,
    fail: AtomicBool,
}

impl MockPersistence {
    pub fn with_events(events: Vec<PersistedEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn enter(&self) -> CalendarResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(persistence_error("mock backend is down"));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceService for MockPersistence {
    async fn list(&self) -> CalendarResult<Vec<PersistedEvent>> {
        self.enter()?;
        Ok(self.events.lock().unwrap().clone())
    }

    async fn create(&self, event: NewEvent) -> CalendarResult<PersistedEvent> {
        self.enter()?;
        let id = format!("mock{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = event.into_persisted(id);
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, patch: EventPatch) -> CalendarResult<PersistedEvent> {
        self.enter()?;
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| persistence_error("not found"))?;
        patch.apply_to(event);
        Ok(event.clone())
    }

    async fn delete(&self, id: &str) -> CalendarResult<()> {
        self.enter()?;
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(persistence_error("not found"));
        }
        Ok(())
    }
}

/// Fixed list of courses
pub struct StaticCourses(pub Vec<Course>);

#[async_trait]
impl CourseSource for StaticCourses {
    async fn list_courses(&self) -> CalendarResult<Vec<Course>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct CountingInvalidator {
    count: AtomicUsize,
}

impl CountingInvalidator {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewInvalidator for CountingInvalidator {
    async fn invalidate(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

fn weekly_seminar() -> PersistedEvent {
    PersistedEvent {
        id: "seminar".to_string(),
        title: "Seminar".to_string(),
        date: "2024-01-01T10:00:00".to_string(),
        is_recurring: true,
        recurrence_pattern: Some("weekly".to_string()),
        recurrence_end_date: Some("2024-02-01".to_string()),
        ..Default::default()
    }
}

fn courses() -> Vec<Course> {
    vec![Course {
        id: "c1".to_string(),
        name: "Linear Algebra".to_string(),
        color: Some("#3366ff".to_string()),
        assignments: vec![Assignment {
            id: "123".to_string(),
            title: "Exercise 1".to_string(),
            description: String::new(),
            due_date: Some("2024-01-10T23:59:00".to_string()),
        }],
        notes: Vec::new(),
    }]
}

fn gateway(mock: &Arc<MockPersistence>) -> (EventMutationGateway, Arc<CountingInvalidator>) {
    let invalidator = Arc::new(CountingInvalidator::default());
    let gateway = EventMutationGateway::new(mock.clone(), chrono_tz::UTC)
        .with_invalidator(invalidator.clone());
    (gateway, invalidator)
}

async fn handle(mock: &Arc<MockPersistence>) -> CalendarHandle {
    let config = Arc::new(RwLock::new(Config::default()));
    CalendarHandle::new(config, mock.clone(), Arc::new(StaticCourses(courses())))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_synthetic_ids_never_reach_persistence() {
    let mock = Arc::new(MockPersistence::with_events(vec![weekly_seminar()]));
    let (gateway, invalidator) = gateway(&mock);

    for id in [
        "assignment-123",
        "lecture-n1",
        "seminar-recurrence-1704708000000",
    ] {
        let result = gateway.delete(id).await;
        assert!(
            matches!(result, Err(Error::InvalidMutationTarget { .. })),
            "{} was not rejected",
            id
        );

        let patch = EventPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            gateway.update(id, patch).await,
            Err(Error::InvalidMutationTarget { .. })
        ));
    }

    assert_eq!(mock.calls(), 0);
    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn test_generated_instance_ids_are_rejected() {
    let mock = Arc::new(MockPersistence::with_events(vec![weekly_seminar()]));
    let calendar = handle(&mock).await;
    let view = calendar.refresh().await.unwrap();
    let calls_after_load = mock.calls();

    let instance_ids: Vec<String> = view
        .events()
        .iter()
        .filter(|e| matches!(EventRef::parse(&e.id), EventRef::RecurrenceInstance { .. }))
        .map(|e| e.id.clone())
        .collect();
    assert_eq!(instance_ids.len(), 4);

    for id in &instance_ids {
        assert!(matches!(
            calendar.delete_event(id).await,
            Err(Error::InvalidMutationTarget { .. })
        ));
    }
    assert_eq!(mock.calls(), calls_after_load);

    calendar.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_successful_mutations_invalidate() {
    let mock = Arc::new(MockPersistence::default());
    let (gateway, invalidator) = gateway(&mock);

    let created = gateway
        .create(NewEvent::new("Exam", "2024-03-01T09:00:00"))
        .await
        .unwrap();
    assert_eq!(invalidator.count(), 1);

    let patch = EventPatch {
        date: Some("2024-03-02".to_string()),
        ..Default::default()
    };
    let updated = gateway.update(&created.id, patch).await.unwrap();
    assert_eq!(updated.date, "2024-03-02");
    assert_eq!(invalidator.count(), 2);

    gateway.delete(&created.id).await.unwrap();
    assert_eq!(invalidator.count(), 3);
    assert_eq!(mock.calls(), 3);
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected_before_persistence() {
    let mock = Arc::new(MockPersistence::default());
    let (gateway, invalidator) = gateway(&mock);

    assert!(matches!(
        gateway.create(NewEvent::new("   ", "2024-03-01")).await,
        Err(Error::InvalidEvent(_))
    ));
    assert!(matches!(
        gateway.create(NewEvent::new("Exam", "soon")).await,
        Err(Error::MalformedDate { .. })
    ));

    let mut repeating = NewEvent::new("Gym", "2024-03-01");
    repeating.is_recurring = true;
    repeating.recurrence_pattern = Some("hourly".to_string());
    assert!(matches!(
        gateway.create(repeating).await,
        Err(Error::InvalidEvent(_))
    ));

    let patch = EventPatch {
        recurrence_end_date: Some("2024-13-01".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        gateway.update("some-id", patch).await,
        Err(Error::MalformedDate { .. })
    ));

    assert_eq!(mock.calls(), 0);
    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn test_failed_mutation_does_not_invalidate() {
    let mock = Arc::new(MockPersistence::default());
    let (gateway, invalidator) = gateway(&mock);

    let result = gateway.delete("missing").await;
    assert!(matches!(result, Err(Error::PersistenceUnavailable(_))));
    assert_eq!(mock.calls(), 1);
    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn test_view_contains_all_origins() {
    let mock = Arc::new(MockPersistence::with_events(vec![weekly_seminar()]));
    let calendar = handle(&mock).await;

    let view = calendar.refresh().await.unwrap();

    // base + 4 weekly instances in January + 1 assignment
    assert_eq!(view.events().len(), 6);
    assert!(view.skipped().is_empty());
    assert!(view.built_at().is_some());

    let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let ids: Vec<&str> = view.events_on(day).iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["assignment-123"]);

    calendar.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mutation_rebuilds_view() {
    let mock = Arc::new(MockPersistence::default());
    let calendar = handle(&mock).await;
    assert_eq!(calendar.refresh().await.unwrap().events().len(), 1);

    let created = calendar
        .create_event(NewEvent::new("Office hours", "2024-01-15T14:00:00"))
        .await
        .unwrap();

    // The rebuild is queued ahead of this read
    let view = calendar.view().await.unwrap();
    assert!(view.events().iter().any(|e| e.id == created.id));

    calendar.delete_event(&created.id).await.unwrap();
    let view = calendar.view().await.unwrap();
    assert!(view.events().iter().all(|e| e.id != created.id));

    calendar.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_view() {
    let mock = Arc::new(MockPersistence::with_events(vec![weekly_seminar()]));
    let calendar = handle(&mock).await;

    let good = calendar.refresh().await.unwrap();
    let good_count = good.events().len();

    mock.set_failing(true);
    assert!(matches!(
        calendar.refresh().await,
        Err(Error::PersistenceUnavailable(_))
    ));

    let current = calendar.view().await.unwrap();
    assert_eq!(current.events().len(), good_count);
    assert_eq!(current.built_at(), good.built_at());

    calendar.shutdown().await.unwrap();
}
