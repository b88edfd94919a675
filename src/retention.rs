//! Age-based retention: decides which records survive a sync sweep.

use crate::record::Status;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Per-status expiry windows, in milliseconds.
///
/// `needs` entries go stale quickly (the trade either happened or won't);
/// `has` entries are longer-lived inventory notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
  pub needs_ttl_ms: i64,
  pub has_ttl_ms: i64,
}

impl Default for RetentionPolicy {
  fn default() -> Self {
    Self {
      needs_ttl_ms: 7 * MS_PER_DAY,
      has_ttl_ms: 30 * MS_PER_DAY,
    }
  }
}

impl RetentionPolicy {
  pub fn from_days(needs_days: u32, has_days: u32) -> Self {
    Self {
      needs_ttl_ms: i64::from(needs_days) * MS_PER_DAY,
      has_ttl_ms: i64::from(has_days) * MS_PER_DAY,
    }
  }

  /// Pure expiry decision: a record is expired once its age strictly exceeds
  /// the window for its status. No side effects; deterministic in
  /// `(status, created_at, now)`.
  pub fn should_expire(&self, status: Status, created_at: i64, now: i64) -> bool {
    let ttl = match status {
      Status::Needs => self.needs_ttl_ms,
      Status::Has => self.has_ttl_ms,
    };
    now - created_at > ttl
  }
}
