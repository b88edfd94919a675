//! End-to-end flows over the in-process backends.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use itemtrack::{
  MemoryCollection, MemoryStore, Record, Status, StatusFilter, Tracker, TrackerConfig,
  TrackerError,
};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

fn tracker(remote: Arc<MemoryCollection>, store: Arc<MemoryStore>) -> Tracker {
  Tracker::with_backends(remote, store, &TrackerConfig::for_embedded())
}

fn aged(char_name: &str, item: &str, status: Status, age_ms: i64) -> Record {
  let mut r = Record::new(char_name, item, status);
  r.created_at = Utc::now().timestamp_millis() - age_ms;
  r
}

#[tokio::test]
async fn full_session_create_search_filter_delete() {
  let remote = Arc::new(MemoryCollection::new());
  let store = Arc::new(MemoryStore::new());
  let t = tracker(remote.clone(), store.clone());

  // Establish a fresh mirror so initialize adopts it directly instead of
  // kicking off a background sync that would race the creates below.
  t.sync_from_remote().await.unwrap();
  t.initialize().await.unwrap();

  t.create("bertha", "crown armor", Status::Needs).await.unwrap();
  t.create("bertha", "crown legs", Status::Has).await.unwrap();
  t.create("aldo", "fire sword", Status::Has).await.unwrap();

  // ordering: char asc, needs before has, item asc
  let all = t.list_all().await.unwrap();
  let keys: Vec<(&str, &str)> = all
    .iter()
    .map(|r| (r.char_name.as_str(), r.item.as_str()))
    .collect();
  assert_eq!(
    keys,
    vec![
      ("Aldo", "Fire Sword"),
      ("Bertha", "Crown Armor"),
      ("Bertha", "Crown Legs"),
    ]
  );

  // filter narrows the projection without touching the remote
  let needs = t.set_status_filter(StatusFilter::Needs).await;
  assert_eq!(needs.len(), 1);
  assert_eq!(needs[0].item, "Crown Armor");

  t.set_status_filter(StatusFilter::All).await;
  let hits = t.search_by_char("BERTHA").await.unwrap();
  assert_eq!(hits.len(), 2);

  let report = t.delete("Bertha", "Crown Armor", Status::Needs).await.unwrap();
  assert_eq!(report.removed, 1);
  assert_eq!(t.list_all().await.unwrap().len(), 2);

  t.teardown().await;
}

#[tokio::test]
async fn second_session_starts_from_mirror() {
  let remote = Arc::new(MemoryCollection::new());
  let store = Arc::new(MemoryStore::new());

  let first = tracker(remote.clone(), store.clone());
  first.create("Gwyn", "Sword", Status::Has).await.unwrap();
  first.teardown().await;
  drop(first);

  // The fresh mirror means no network is needed (or attempted) on startup.
  let offline = Arc::new(MemoryCollection::new());
  offline.fail_next_query();
  let second = tracker(offline, store);
  second.initialize().await.unwrap();

  let view = second.current_view().await;
  assert_eq!(view.len(), 1);
  assert_eq!(view[0].char_name, "Gwyn");

  second.teardown().await;
}

#[tokio::test]
async fn corrupt_mirror_triggers_resync() {
  let remote = Arc::new(MemoryCollection::new());
  remote.seed(aged("Gwyn", "Sword", Status::Needs, 1000));

  let store = Arc::new(MemoryStore::new());
  itemtrack::KvStore::set_string(&*store, "itemtrack.records", "{{broken").unwrap();

  let t = tracker(remote, store);
  t.initialize().await.unwrap();

  // corrupt cache is treated as absent; the forced background sync fills in
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(t.current_view().await.len(), 1);

  t.teardown().await;
}

#[tokio::test]
async fn sync_expires_and_remote_deletes_old_needs() {
  let remote = Arc::new(MemoryCollection::new());
  remote.seed(aged("Gwyn", "Old Wish", Status::Needs, WEEK_MS + 60_000));
  remote.seed(aged("Gwyn", "Fresh Wish", Status::Needs, 60_000));

  let t = tracker(remote.clone(), Arc::new(MemoryStore::new()));
  t.sync_from_remote().await.unwrap();

  let view = t.current_view().await;
  assert_eq!(view.len(), 1);
  assert_eq!(view[0].item, "Fresh Wish");
  assert_eq!(remote.len(), 1);
}

#[tokio::test]
async fn delete_unknown_triple_is_not_found() {
  let t = tracker(Arc::new(MemoryCollection::new()), Arc::new(MemoryStore::new()));

  let err = t.delete("Nobody", "Nothing", Status::Needs).await.unwrap_err();
  assert!(matches!(err, TrackerError::NotFound { .. }));
}

#[tokio::test]
async fn validation_errors_carry_the_field() {
  let t = tracker(Arc::new(MemoryCollection::new()), Arc::new(MemoryStore::new()));

  match t.create("", "x", Status::Has).await.unwrap_err() {
    TrackerError::MissingField { field } => assert_eq!(field, "char"),
    other => panic!("unexpected error: {other}"),
  }
  match t.delete("x", "", Status::Has).await.unwrap_err() {
    TrackerError::MissingField { field } => assert_eq!(field, "item"),
    other => panic!("unexpected error: {other}"),
  }
}
