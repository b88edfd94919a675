//! Local cache: a persisted mirror of the remote collection plus staleness
//! bookkeeping.
//!
//! The cache exists so the tracker can render immediately on startup and
//! avoid remote reads between syncs. The remote store is the source of truth;
//! on any doubt the mirror is overwritten wholesale at sync time.

mod mirror;
mod store;

pub use mirror::{CacheMirror, MirrorSnapshot};
pub use store::{KvStore, MemoryStore, SqliteStore};
