//! Mutation gateway: create and delete against the remote store with
//! local-mirror co-update, plus the in-memory searches.

use chrono::Utc;
use tracing::warn;

use crate::error::{Result, TrackerError};
use crate::record::{normalize_name, Record, Status};
use crate::sync::Tracker;
use crate::view::project;

/// Outcome of a batch delete. Remote deletes are best-effort: the batch never
/// aborts on an individual failure, and failed records are still dropped from
/// the local mirror so a user-requested delete is never resurrected locally.
#[derive(Debug, Default)]
pub struct DeleteReport {
  /// Records whose remote delete succeeded.
  pub removed: usize,
  /// Per-record failures, for the caller's logging.
  pub failures: Vec<DeleteFailure>,
}

#[derive(Debug)]
pub struct DeleteFailure {
  pub id: String,
  pub reason: String,
}

impl Tracker {
  /// Create a record: normalize names, stamp the creation time, insert
  /// remotely to obtain an id, and fold the result into the in-memory set
  /// and the mirror.
  pub async fn create(&self, char_name: &str, item: &str, status: Status) -> Result<Record> {
    if char_name.trim().is_empty() {
      return Err(TrackerError::MissingField { field: "char" });
    }
    if item.trim().is_empty() {
      return Err(TrackerError::MissingField { field: "item" });
    }

    let mut record = Record::new(char_name, item, status);
    let id = self.inner().remote.insert(&record).await?;
    record.id = Some(id);

    let mut state = self.inner().state.lock().await;
    state.records.push(record.clone());
    // The mirror now matches the remote state plus this insert, so the
    // staleness clock restarts.
    self
      .inner()
      .mirror
      .save(&state.records, Utc::now().timestamp_millis())?;
    state.view = project(&state.records, state.filter);

    Ok(record)
  }

  /// Delete every record matching the (char, item, status) triple.
  ///
  /// Matching zero remote records is a [`TrackerError::NotFound`] and changes
  /// nothing. Individual remote-delete failures are collected in the report;
  /// all matches are dropped from the local mirror regardless.
  pub async fn delete(&self, char_name: &str, item: &str, status: Status) -> Result<DeleteReport> {
    if char_name.trim().is_empty() {
      return Err(TrackerError::MissingField { field: "char" });
    }
    if item.trim().is_empty() {
      return Err(TrackerError::MissingField { field: "item" });
    }

    let char_name = normalize_name(char_name);
    let item = normalize_name(item);

    let matches = self
      .inner()
      .remote
      .query_where(&char_name, &item, status)
      .await?;

    if matches.is_empty() {
      return Err(TrackerError::NotFound {
        char_name,
        item,
        status: status.to_string(),
      });
    }

    let mut report = DeleteReport::default();
    for record in &matches {
      let Some(id) = record.id.as_deref() else {
        continue;
      };
      match self.inner().remote.delete_by_id(id).await {
        Ok(()) => report.removed += 1,
        Err(e) => {
          warn!(id, "Failed to delete record remotely: {}", e);
          report.failures.push(DeleteFailure {
            id: id.to_string(),
            reason: e.to_string(),
          });
        }
      }
    }

    let mut state = self.inner().state.lock().await;
    state
      .records
      .retain(|r| !r.matches_triple(&char_name, &item, status));
    self
      .inner()
      .mirror
      .save(&state.records, Utc::now().timestamp_millis())?;
    state.view = project(&state.records, state.filter);

    Ok(report)
  }

  /// Filter the currently held records by exact item match. Operates on the
  /// in-memory set; never forces a remote round trip.
  pub async fn search_by_item(&self, text: &str) -> Result<Vec<Record>> {
    if text.trim().is_empty() {
      return Err(TrackerError::MissingField { field: "item" });
    }
    let needle = normalize_name(text);
    self.search_with(|r| r.item == needle).await
  }

  /// Filter the currently held records by exact char match. Operates on the
  /// in-memory set; never forces a remote round trip.
  pub async fn search_by_char(&self, text: &str) -> Result<Vec<Record>> {
    if text.trim().is_empty() {
      return Err(TrackerError::MissingField { field: "char" });
    }
    let needle = normalize_name(text);
    self.search_with(|r| r.char_name == needle).await
  }

  async fn search_with(&self, pred: impl Fn(&Record) -> bool) -> Result<Vec<Record>> {
    let mut state = self.inner().state.lock().await;
    let hits: Vec<Record> = state.records.iter().filter(|r| pred(r)).cloned().collect();
    state.view = project(&hits, state.filter);
    Ok(state.view.clone())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::cache::MemoryStore;
  use crate::config::TrackerConfig;
  use crate::remote::MemoryCollection;
  use crate::view::StatusFilter;

  fn tracker(remote: Arc<MemoryCollection>) -> Tracker {
    Tracker::with_backends(remote, Arc::new(MemoryStore::new()), &TrackerConfig::for_embedded())
  }

  #[tokio::test]
  async fn test_create_validates_before_io() {
    let remote = Arc::new(MemoryCollection::new());
    let t = tracker(remote.clone());

    assert!(matches!(
      t.create("", "Sword", Status::Needs).await,
      Err(TrackerError::MissingField { field: "char" })
    ));
    assert!(matches!(
      t.create("Gwyn", "   ", Status::Needs).await,
      Err(TrackerError::MissingField { field: "item" })
    ));
    assert!(remote.is_empty());
  }

  #[tokio::test]
  async fn test_create_normalizes_and_appears_once() {
    let t = tracker(Arc::new(MemoryCollection::new()));

    let created = t.create("sir gwyn", "magic SWORD", Status::Needs).await.unwrap();
    assert_eq!(created.char_name, "Sir Gwyn");
    assert_eq!(created.item, "Magic Sword");
    assert!(created.id.is_some());

    let all = t.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], created);
  }

  #[tokio::test]
  async fn test_delete_not_found_changes_nothing() {
    let t = tracker(Arc::new(MemoryCollection::new()));
    t.create("Gwyn", "Sword", Status::Needs).await.unwrap();

    let result = t.delete("Gwyn", "Sword", Status::Has).await;
    assert!(matches!(result, Err(TrackerError::NotFound { .. })));
    assert_eq!(t.list_all().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_delete_removes_all_triple_matches() {
    let remote = Arc::new(MemoryCollection::new());
    let t = tracker(remote.clone());
    t.create("Gwyn", "Sword", Status::Needs).await.unwrap();
    t.create("gwyn", "sword", Status::Needs).await.unwrap();
    t.create("Gwyn", "Shield", Status::Needs).await.unwrap();

    let report = t.delete("GWYN", "SWORD", Status::Needs).await.unwrap();
    assert_eq!(report.removed, 2);
    assert!(report.failures.is_empty());

    let all = t.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].item, "Shield");
    assert_eq!(remote.len(), 1);
  }

  #[tokio::test]
  async fn test_delete_partial_failure_still_clears_mirror() {
    let remote = Arc::new(MemoryCollection::new());
    let t = tracker(remote.clone());
    let a = t.create("Gwyn", "Sword", Status::Needs).await.unwrap();
    t.create("Gwyn", "Sword", Status::Needs).await.unwrap();

    remote.fail_delete_of(a.id.as_deref().unwrap());

    let report = t.delete("Gwyn", "Sword", Status::Needs).await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, a.id.unwrap());

    // both matches are gone from the local mirror; the stuck one remains
    // remote until a later sync or retention pass
    assert!(t.current_view().await.is_empty());
    assert_eq!(remote.len(), 1);
  }

  #[tokio::test]
  async fn test_searches_use_held_set_only() {
    let remote = Arc::new(MemoryCollection::new());
    let t = tracker(remote.clone());
    t.create("Gwyn", "Sword", Status::Needs).await.unwrap();
    t.create("Ysolda", "Sword", Status::Has).await.unwrap();
    t.create("Gwyn", "Shield", Status::Has).await.unwrap();

    remote.fail_next_query();

    let by_item = t.search_by_item("sword").await.unwrap();
    assert_eq!(by_item.len(), 2);
    assert!(by_item.iter().all(|r| r.item == "Sword"));

    let by_char = t.search_by_char("gwyn").await.unwrap();
    assert_eq!(by_char.len(), 2);
    assert!(by_char.iter().all(|r| r.char_name == "Gwyn"));
  }

  #[tokio::test]
  async fn test_search_respects_status_filter() {
    let t = tracker(Arc::new(MemoryCollection::new()));
    t.create("Gwyn", "Sword", Status::Needs).await.unwrap();
    t.create("Gwyn", "Shield", Status::Has).await.unwrap();

    t.set_status_filter(StatusFilter::Needs).await;
    let hits = t.search_by_char("Gwyn").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].status, Status::Needs);
  }

  #[tokio::test]
  async fn test_blank_search_rejected() {
    let t = tracker(Arc::new(MemoryCollection::new()));
    assert!(t.search_by_item("  ").await.is_err());
    assert!(t.search_by_char("").await.is_err());
  }
}
