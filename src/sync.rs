//! Sync engine: reconciles the local mirror with the remote collection and
//! owns the periodic refresh.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::cache::{CacheMirror, KvStore, SqliteStore};
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::record::Record;
use crate::remote::{HttpCollection, RemoteCollection};
use crate::retention::RetentionPolicy;
use crate::view::{project, StatusFilter};

/// Handle to the tracker core. Cheap to clone; all clones share state.
///
/// The tracker exclusively owns the in-memory record set and all writes to
/// the local mirror. The presentation layer only calls the public surface and
/// reads projected views.
#[derive(Clone)]
pub struct Tracker {
  inner: Arc<TrackerInner>,
}

pub(crate) struct TrackerInner {
  pub(crate) remote: Arc<dyn RemoteCollection>,
  pub(crate) mirror: CacheMirror,
  pub(crate) policy: RetentionPolicy,
  sync_interval: Duration,
  pub(crate) state: Mutex<TrackerState>,
}

pub(crate) struct TrackerState {
  pub(crate) records: Vec<Record>,
  pub(crate) filter: StatusFilter,
  pub(crate) view: Vec<Record>,
  timer: Option<JoinHandle<()>>,
}

impl Tracker {
  /// Build a tracker against the configured HTTP document store and the
  /// SQLite cache.
  pub fn new(config: &TrackerConfig) -> Result<Self> {
    let remote = Arc::new(HttpCollection::new(&config.remote)?);
    let store: Arc<dyn KvStore> = match &config.cache_path {
      Some(path) => Arc::new(SqliteStore::open_at(path)?),
      None => Arc::new(SqliteStore::open()?),
    };
    Ok(Self::with_backends(remote, store, config))
  }

  /// Build a tracker over explicit backends. Used with the in-process
  /// backends in tests and embedded setups.
  pub fn with_backends(
    remote: Arc<dyn RemoteCollection>,
    store: Arc<dyn KvStore>,
    config: &TrackerConfig,
  ) -> Self {
    Self {
      inner: Arc::new(TrackerInner {
        remote,
        mirror: CacheMirror::new(store, config.sync_interval_ms()),
        policy: config.retention_policy(),
        sync_interval: Duration::from_secs(config.sync_interval_secs),
        state: Mutex::new(TrackerState {
          records: Vec::new(),
          filter: StatusFilter::All,
          view: Vec::new(),
          timer: None,
        }),
      }),
    }
  }

  /// Start the engine. Adopts the cached mirror if one is readable so the
  /// caller has data before any network round trip, kicks off a background
  /// sync when the mirror is absent, corrupt, or stale, and schedules the
  /// recurring resync timer.
  pub async fn initialize(&self) -> Result<()> {
    let snapshot = self.inner.mirror.load()?;
    let now = Utc::now().timestamp_millis();
    let stale = self.inner.mirror.is_stale(snapshot.as_ref(), now);

    {
      let mut state = self.inner.state.lock().await;
      if let Some(snapshot) = snapshot {
        debug!(records = snapshot.records.len(), "Adopting cached mirror");
        state.records = snapshot.records;
        state.view = project(&state.records, state.filter);
      }

      if let Some(old) = state.timer.take() {
        old.abort();
      }
      state.timer = Some(self.spawn_timer());
    }

    if stale {
      // Does not block the initial render; failures are logged and the next
      // scheduled tick retries.
      let tracker = self.clone();
      tokio::spawn(async move {
        if let Err(e) = tracker.sync_from_remote().await {
          error!("Initial sync failed: {}", e);
        }
      });
    }

    Ok(())
  }

  /// Stop the recurring resync timer.
  pub async fn teardown(&self) {
    let mut state = self.inner.state.lock().await;
    if let Some(timer) = state.timer.take() {
      timer.abort();
    }
  }

  /// Fetch the full remote collection, sweep out expired records (issuing
  /// best-effort remote deletes for them), overwrite the local mirror, and
  /// recompute the projected view.
  ///
  /// A failed fetch aborts the pass and leaves prior state in place.
  pub async fn sync_from_remote(&self) -> Result<()> {
    let fetched = self.inner.remote.query_all().await?;
    let now = Utc::now().timestamp_millis();

    let mut survivors = Vec::with_capacity(fetched.len());
    for record in fetched {
      if self
        .inner
        .policy
        .should_expire(record.status, record.created_at, now)
      {
        // Expired records are dropped from the snapshot either way; a failed
        // remote delete is retried on the next pass.
        if let Some(id) = record.id.as_deref() {
          if let Err(e) = self.inner.remote.delete_by_id(id).await {
            warn!(id, "Failed to delete expired record: {}", e);
          }
        }
        continue;
      }
      survivors.push(record);
    }

    let mut state = self.inner.state.lock().await;
    self.inner.mirror.save(&survivors, now)?;
    state.records = survivors;
    state.view = project(&state.records, state.filter);
    debug!(records = state.records.len(), "Sync complete");

    Ok(())
  }

  /// Project the full record set under the current filter. Forces a sync
  /// first when nothing is held in memory.
  pub async fn list_all(&self) -> Result<Vec<Record>> {
    let empty = self.inner.state.lock().await.records.is_empty();
    if empty {
      self.sync_from_remote().await?;
    }

    let mut state = self.inner.state.lock().await;
    state.view = project(&state.records, state.filter);
    Ok(state.view.clone())
  }

  /// Change the status filter and re-project the current data. No remote
  /// call.
  pub async fn set_status_filter(&self, filter: StatusFilter) -> Vec<Record> {
    let mut state = self.inner.state.lock().await;
    state.filter = filter;
    state.view = project(&state.records, state.filter);
    state.view.clone()
  }

  /// The most recently computed projection.
  pub async fn current_view(&self) -> Vec<Record> {
    self.inner.state.lock().await.view.clone()
  }

  pub(crate) fn inner(&self) -> &TrackerInner {
    &self.inner
  }

  /// Recurring resync loop. Holds only a weak handle so dropping the last
  /// external tracker handle ends the loop on its next tick.
  fn spawn_timer(&self) -> JoinHandle<()> {
    let weak: Weak<TrackerInner> = Arc::downgrade(&self.inner);
    let period = self.inner.sync_interval;

    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first tick completes immediately; initialize() already decided
      // whether an immediate sync is needed.
      ticker.tick().await;

      loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
          break;
        };
        let tracker = Tracker { inner };
        if let Err(e) = tracker.sync_from_remote().await {
          error!("Scheduled sync failed: {}", e);
        }
      }
    })
  }
}
