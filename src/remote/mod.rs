//! Remote document collection capability.
//!
//! The core treats the remote store as an opaque networked collection with
//! four operations: insert, query-all, query-by-equality, delete-by-id. The
//! store's own internals (indexing, replication) are none of our business.

mod http;
mod memory;

use async_trait::async_trait;

pub use http::HttpCollection;
pub use memory::MemoryCollection;

use crate::error::Result;
use crate::record::{Record, Status};

/// Async handle to the remote collection. The remote store is the source of
/// truth; the local mirror is overwritten from it at sync time.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
  /// Insert a document and return the id the store assigned to it.
  async fn insert(&self, record: &Record) -> Result<String>;

  /// Fetch every document in the collection, ids populated.
  async fn query_all(&self) -> Result<Vec<Record>>;

  /// Fetch documents matching the (char, item, status) triple exactly.
  /// Inputs are expected to be normalized already.
  async fn query_where(&self, char_name: &str, item: &str, status: Status) -> Result<Vec<Record>>;

  /// Delete a single document by id.
  async fn delete_by_id(&self, id: &str) -> Result<()>;
}
