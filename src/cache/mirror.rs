//! The record mirror: serialized snapshot of the remote collection plus the
//! last-sync timestamp.

use std::sync::Arc;

use tracing::warn;

use crate::error::{Result, TrackerError};
use crate::record::Record;

use super::store::KvStore;

/// Key holding the serialized record mirror (JSON array).
const RECORDS_KEY: &str = "itemtrack.records";
/// Key holding the last sync time (string-encoded integer milliseconds).
const LAST_SYNC_KEY: &str = "itemtrack.last_sync";

/// A loaded mirror: the cached records in order, and when they were last
/// synced from the remote store.
#[derive(Debug, Clone)]
pub struct MirrorSnapshot {
  pub records: Vec<Record>,
  pub last_sync_at: Option<i64>,
}

/// Reads and writes the record mirror through a [`KvStore`].
#[derive(Clone)]
pub struct CacheMirror {
  store: Arc<dyn KvStore>,
  /// How long before the mirror is considered stale, in milliseconds.
  sync_interval_ms: i64,
}

impl CacheMirror {
  pub fn new(store: Arc<dyn KvStore>, sync_interval_ms: i64) -> Self {
    Self {
      store,
      sync_interval_ms,
    }
  }

  /// Load the mirror. A missing or corrupt mirror returns `None`; corruption
  /// is logged as a warning and otherwise treated like an absent cache so the
  /// caller forces a resync.
  pub fn load(&self) -> Result<Option<MirrorSnapshot>> {
    let raw = match self.store.get_string(RECORDS_KEY)? {
      Some(raw) => raw,
      None => return Ok(None),
    };

    let records: Vec<Record> = match serde_json::from_str(&raw) {
      Ok(records) => records,
      Err(e) => {
        warn!("Corrupt record mirror, forcing resync: {}", e);
        return Ok(None);
      }
    };

    let last_sync_at = self
      .store
      .get_string(LAST_SYNC_KEY)?
      .and_then(|s| s.parse::<i64>().ok());

    Ok(Some(MirrorSnapshot {
      records,
      last_sync_at,
    }))
  }

  /// Overwrite the mirror and the sync timestamp together.
  pub fn save(&self, records: &[Record], sync_ts: i64) -> Result<()> {
    let serialized = serde_json::to_string(records)
      .map_err(|e| TrackerError::Cache(format!("Failed to serialize mirror: {}", e)))?;
    let timestamp = sync_ts.to_string();

    self
      .store
      .set_many(&[
        (RECORDS_KEY, serialized.as_str()),
        (LAST_SYNC_KEY, timestamp.as_str()),
      ])
  }

  /// A mirror is stale if it is absent, has no sync timestamp, or its last
  /// sync is older than the configured interval.
  pub fn is_stale(&self, snapshot: Option<&MirrorSnapshot>, now: i64) -> bool {
    match snapshot.and_then(|s| s.last_sync_at) {
      Some(last_sync) => now - last_sync > self.sync_interval_ms,
      None => true,
    }
  }
}
