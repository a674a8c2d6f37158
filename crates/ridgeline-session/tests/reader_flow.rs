//! End-to-end flows through the reader controller: enrollment, the identify
//! loop, registry CRUD and event emission, driven against the mock sensor
//! and a temp-file registry.

use std::path::PathBuf;
use std::time::Duration;

use ridgeline_core::{Error, FingerprintTemplate, UserId};
use ridgeline_sensor::{MockSensor, MockSensorHandle};
use ridgeline_session::{
    ControllerConfig, ReaderController, ReaderEvent, Registry, UserView,
};
use ridgeline_store::{EnrolledUser, JsonStore};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

struct Reader {
    registry: Registry,
    sensor: MockSensorHandle,
    store_path: PathBuf,
    _task: JoinHandle<ridgeline_core::Result<()>>,
}

fn template(bytes: &[u8]) -> FingerprintTemplate {
    FingerprintTemplate::new(bytes.to_vec())
}

fn spawn_reader(dir: &TempDir, seed: &[(&str, &str, &[u8])]) -> Reader {
    spawn_reader_with_config(dir, seed, ControllerConfig::default())
}

fn spawn_reader_with_config(
    dir: &TempDir,
    seed: &[(&str, &str, &[u8])],
    config: ControllerConfig,
) -> Reader {
    let store_path = dir.path().join("db.json");
    let mut store = JsonStore::open(&store_path);
    for (id, name, print) in seed {
        store
            .add(EnrolledUser::new(
                UserId::new(*id),
                json!({ "name": name }),
                template(print),
            ))
            .unwrap();
    }

    let (sensor, handle) = MockSensor::new();
    let (controller, registry) = ReaderController::with_config(sensor, store, config);
    let task = tokio::spawn(controller.run());

    Reader {
        registry,
        sensor: handle,
        store_path,
        _task: task,
    }
}

async fn wait_until(description: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {description}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn next_event(events: &mut broadcast::Receiver<ReaderEvent>) -> ReaderEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn enrolling_alice_persists_record_and_fires_user_add() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[]);
    let mut events = reader.registry.subscribe();

    let registry = reader.registry.clone();
    let add = tokio::spawn(async move { registry.add_user(json!({"name": "Alice"})).await });

    // Enrollment only starts once identify has been quiesced
    let sensor = reader.sensor.clone();
    wait_until("enroll session to arm", || sensor.enroll_sessions() == 1).await;

    reader.sensor.touch(template(&[0xAA, 0xBB])).await.unwrap();
    let created = add.await.unwrap().unwrap();

    assert_eq!(created.data, json!({"name": "Alice"}));
    assert!(created.fingerprint.is_none(), "response must be sanitized");

    match next_event(&mut events).await {
        ReaderEvent::UserAdd { user_id, user_data } => {
            assert_eq!(user_id, created.id);
            assert_eq!(user_data, json!({"name": "Alice"}));
        }
        other => panic!("expected user-add, got {other:?}"),
    }

    // Persisted store matches what the API returned, template included
    let on_disk = JsonStore::open(&reader.store_path);
    assert_eq!(on_disk.len(), 1);
    let record = on_disk.get(created.id.as_str()).unwrap();
    assert_eq!(record.data, json!({"name": "Alice"}));
    assert_eq!(record.fingerprint.as_bytes(), &[0xAA, 0xBB]);

    // Identify resumed with the new user in the gallery
    let sensor = reader.sensor.clone();
    wait_until("identify to resume", || sensor.last_gallery_len() == 1).await;
}

#[tokio::test]
async fn identify_match_fires_event_and_rearms() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[("u1", "Alice", &[1, 2, 3])]);
    let mut events = reader.registry.subscribe();

    let sensor = reader.sensor.clone();
    wait_until("identify to arm", || sensor.identify_sessions() >= 1).await;

    reader.sensor.touch(template(&[1, 2, 3])).await.unwrap();

    match next_event(&mut events).await {
        ReaderEvent::Identify { user_id, user_data } => {
            assert_eq!(user_id, UserId::new("u1"));
            assert_eq!(user_data, json!({"name": "Alice"}));
        }
        other => panic!("expected identify, got {other:?}"),
    }

    // The loop re-arms itself after every callback
    let sensor = reader.sensor.clone();
    wait_until("identify to re-arm", || sensor.identify_sessions() >= 2).await;
}

#[tokio::test]
async fn unknown_finger_rearms_without_event() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[("u1", "Alice", &[1])]);
    let mut events = reader.registry.subscribe();

    let sensor = reader.sensor.clone();
    wait_until("identify to arm", || sensor.identify_sessions() >= 1).await;

    reader.sensor.touch(template(&[9, 9, 9])).await.unwrap();

    let sensor = reader.sensor.clone();
    wait_until("identify to re-arm", || sensor.identify_sessions() >= 2).await;
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn deleting_sole_user_resumes_identify_with_empty_gallery() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[("u1", "Alice", &[1, 2, 3])]);
    let mut events = reader.registry.subscribe();

    let sensor = reader.sensor.clone();
    wait_until("identify to arm", || sensor.identify_sessions() >= 1).await;
    assert_eq!(reader.sensor.last_gallery_len(), 1);

    let deleted = reader.registry.delete_user("u1").await.unwrap();
    assert_eq!(deleted.id, UserId::new("u1"));

    match next_event(&mut events).await {
        ReaderEvent::UserDelete { user_id } => assert_eq!(user_id, UserId::new("u1")),
        other => panic!("expected user-delete, got {other:?}"),
    }

    // Identify restarted with zero candidates and survives a touch
    let sensor = reader.sensor.clone();
    wait_until("identify to restart empty", || {
        sensor.identify_sessions() >= 2 && sensor.last_gallery_len() == 0
    })
    .await;

    reader.sensor.touch(template(&[1, 2, 3])).await.unwrap();
    let sensor = reader.sensor.clone();
    wait_until("identify to re-arm again", || sensor.identify_sessions() >= 3).await;
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn deleting_missing_user_is_not_found_and_silent() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[]);
    let mut events = reader.registry.subscribe();

    let result = reader.registry.delete_user("missing-id").await;
    assert!(matches!(result, Err(Error::UserNotFound(id)) if id == "missing-id"));

    // Nothing persisted, nothing emitted
    assert!(!reader.store_path.exists());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn update_replaces_data_and_keeps_fingerprint() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[("u1", "Alice", &[1, 2, 3])]);
    let mut events = reader.registry.subscribe();

    let updated = reader
        .registry
        .update_user("u1", json!({"name": "Alicia", "badge": 7}))
        .await
        .unwrap();
    assert_eq!(updated.data, json!({"name": "Alicia", "badge": 7}));

    match next_event(&mut events).await {
        ReaderEvent::UserUpdate { user_id, user_data } => {
            assert_eq!(user_id, UserId::new("u1"));
            assert_eq!(user_data, json!({"name": "Alicia", "badge": 7}));
        }
        other => panic!("expected user-update, got {other:?}"),
    }

    let with_template = reader.registry.get_user("u1", true).await.unwrap();
    assert_eq!(
        with_template.fingerprint.map(|t| t.as_bytes().to_vec()),
        Some(vec![1, 2, 3])
    );
}

#[tokio::test]
async fn get_user_filters_fingerprint_per_request() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[("u1", "Alice", &[1, 2, 3])]);

    let sanitized = reader.registry.get_user("u1", false).await.unwrap();
    assert!(sanitized.fingerprint.is_none());

    let full = reader.registry.get_user("u1", true).await.unwrap();
    assert!(full.fingerprint.is_some());

    assert!(matches!(
        reader.registry.get_user("nope", false).await,
        Err(Error::UserNotFound(_))
    ));
}

#[tokio::test]
async fn list_users_keeps_store_order() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(
        &dir,
        &[("u1", "Alice", &[1]), ("u2", "Bob", &[2]), ("u3", "Carol", &[3])],
    );

    let users = reader.registry.users(false).await.unwrap();
    let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, ["u1", "u2", "u3"]);
    assert!(users.iter().all(|u: &UserView| u.fingerprint.is_none()));
}

#[tokio::test]
async fn failed_enrollment_leaves_registry_untouched() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[]);
    let mut events = reader.registry.subscribe();

    let registry = reader.registry.clone();
    let add = tokio::spawn(async move { registry.add_user(json!({"name": "Mallory"})).await });

    let sensor = reader.sensor.clone();
    wait_until("enroll session to arm", || sensor.enroll_sessions() == 1).await;

    reader.sensor.fault("enroll-failed").await.unwrap();
    let result = add.await.unwrap();
    assert!(matches!(result, Err(Error::EnrollFailed(_))));

    assert!(reader.registry.users(false).await.unwrap().is_empty());
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));

    // Identify resumed after the failure
    let sensor = reader.sensor.clone();
    wait_until("identify to resume", || sensor.identify_sessions() >= 2).await;
}

#[tokio::test]
async fn enrollment_times_out_without_touches() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader_with_config(
        &dir,
        &[],
        ControllerConfig {
            enroll_timeout: Duration::from_millis(50),
        },
    );

    let result = reader.registry.add_user(json!({"name": "Slow"})).await;
    assert!(matches!(result, Err(Error::EnrollTimeout { .. })));
    assert!(reader.registry.users(false).await.unwrap().is_empty());

    // The reader is still serviceable afterwards
    let sensor = reader.sensor.clone();
    wait_until("identify to resume", || sensor.identify_sessions() >= 2).await;
}

#[tokio::test]
async fn concurrent_enrollments_queue_fifo() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[]);

    let registry = reader.registry.clone();
    let first = tokio::spawn(async move { registry.add_user(json!({"name": "First"})).await });

    let sensor = reader.sensor.clone();
    wait_until("first enroll to arm", || sensor.enroll_sessions() == 1).await;

    // Issued mid-enrollment: must wait its turn, not interleave
    let registry = reader.registry.clone();
    let second = tokio::spawn(async move { registry.add_user(json!({"name": "Second"})).await });

    reader.sensor.touch(template(&[1])).await.unwrap();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.data, json!({"name": "First"}));

    let sensor = reader.sensor.clone();
    wait_until("second enroll to arm", || sensor.enroll_sessions() == 2).await;
    reader.sensor.touch(template(&[2])).await.unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(second.data, json!({"name": "Second"}));

    let users = reader.registry.users(false).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].data, json!({"name": "First"}));
    assert_eq!(users[1].data, json!({"name": "Second"}));
}

#[tokio::test]
async fn persisted_store_tracks_in_memory_registry() {
    let dir = TempDir::new().unwrap();
    let reader = spawn_reader(&dir, &[("u1", "Alice", &[1]), ("u2", "Bob", &[2])]);

    reader
        .registry
        .update_user("u1", json!({"name": "Alicia"}))
        .await
        .unwrap();
    reader.registry.delete_user("u2").await.unwrap();

    let in_memory = reader.registry.users(true).await.unwrap();
    let on_disk = JsonStore::open(&reader.store_path);

    assert_eq!(on_disk.len(), in_memory.len());
    for view in &in_memory {
        let record = on_disk.get(view.id.as_str()).unwrap();
        assert_eq!(record.data, view.data);
        assert_eq!(Some(&record.fingerprint), view.fingerprint.as_ref());
    }
}
