//! In-process remote collection. Backs the test suite and embedded demos.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, TrackerError};
use crate::record::{Record, Status};

use super::RemoteCollection;

/// Vec-backed collection with failure-injection hooks so tests can exercise
/// the best-effort paths.
#[derive(Default)]
pub struct MemoryCollection {
  docs: Mutex<Vec<Record>>,
  next_id: AtomicU64,
  /// Ids whose delete should fail.
  failing_deletes: Mutex<HashSet<String>>,
  /// When set, the next query_all/query_where fails.
  fail_next_query: AtomicBool,
}

impl MemoryCollection {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a record directly, bypassing the async API. Test seeding helper.
  pub fn seed(&self, mut record: Record) -> String {
    let id = self.fresh_id();
    record.id = Some(id.clone());
    self.docs.lock().expect("lock poisoned").push(record);
    id
  }

  /// Make every future delete of `id` fail.
  pub fn fail_delete_of(&self, id: &str) {
    self
      .failing_deletes
      .lock()
      .expect("lock poisoned")
      .insert(id.to_string());
  }

  /// Make the next query fail with a remote error.
  pub fn fail_next_query(&self) {
    self.fail_next_query.store(true, Ordering::SeqCst);
  }

  /// Current number of stored documents.
  pub fn len(&self) -> usize {
    self.docs.lock().expect("lock poisoned").len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn fresh_id(&self) -> String {
    format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
  }

  fn check_query_fault(&self) -> Result<()> {
    if self.fail_next_query.swap(false, Ordering::SeqCst) {
      return Err(TrackerError::Remote("injected query failure".into()));
    }
    Ok(())
  }

  fn docs(&self) -> Result<std::sync::MutexGuard<'_, Vec<Record>>> {
    self
      .docs
      .lock()
      .map_err(|e| TrackerError::Remote(format!("Lock poisoned: {}", e)))
  }
}

#[async_trait]
impl RemoteCollection for MemoryCollection {
  async fn insert(&self, record: &Record) -> Result<String> {
    let id = self.fresh_id();
    let mut stored = record.clone();
    stored.id = Some(id.clone());
    self.docs()?.push(stored);
    Ok(id)
  }

  async fn query_all(&self) -> Result<Vec<Record>> {
    self.check_query_fault()?;
    Ok(self.docs()?.clone())
  }

  async fn query_where(&self, char_name: &str, item: &str, status: Status) -> Result<Vec<Record>> {
    self.check_query_fault()?;
    Ok(
      self
        .docs()?
        .iter()
        .filter(|r| r.matches_triple(char_name, item, status))
        .cloned()
        .collect(),
    )
  }

  async fn delete_by_id(&self, id: &str) -> Result<()> {
    let failing = self
      .failing_deletes
      .lock()
      .map_err(|e| TrackerError::Remote(format!("Lock poisoned: {}", e)))?
      .contains(id);
    if failing {
      return Err(TrackerError::Remote(format!(
        "injected delete failure for {}",
        id
      )));
    }

    let mut docs = self.docs()?;
    let before = docs.len();
    docs.retain(|r| r.id.as_deref() != Some(id));

    if docs.len() == before {
      return Err(TrackerError::Remote(format!("no document with id {}", id)));
    }
    Ok(())
  }
}
