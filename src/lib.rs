//! itemtrack — local-first tracker core for a game-trading use case.
//!
//! Records which in-game character ("char") needs or already owns which item,
//! keeps a local mirror of a remote document store, ages stale records out
//! automatically, and serves a deterministically ordered, filterable view.
//!
//! This is an embedded library: a presentation shell drives it through
//! [`Tracker`] (`initialize`, `create`, `delete`, `search_by_item`,
//! `search_by_char`, `list_all`, `set_status_filter`, `teardown`) and renders
//! whatever [`Tracker::current_view`] returns.

mod cache;
mod config;
mod error;
mod mutate;
mod record;
mod remote;
mod retention;
mod sync;
mod view;

pub use cache::{CacheMirror, KvStore, MemoryStore, MirrorSnapshot, SqliteStore};
pub use config::{RemoteConfig, RetentionConfig, TrackerConfig};
pub use error::{Result, TrackerError};
pub use mutate::{DeleteFailure, DeleteReport};
pub use record::{normalize_name, Record, Status};
pub use remote::{HttpCollection, MemoryCollection, RemoteCollection};
pub use retention::RetentionPolicy;
pub use sync::Tracker;
pub use view::{project, StatusFilter};
