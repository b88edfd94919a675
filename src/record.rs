//! The tracked record: one char/item/status/createdAt tuple.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Whether a char still needs an item or already has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Needs,
  Has,
}

impl Status {
  pub fn as_str(&self) -> &'static str {
    match self {
      Status::Needs => "needs",
      Status::Has => "has",
    }
  }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One tracked entry. Records are immutable once created; a status change is
/// modeled as delete-then-recreate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// Remote-assigned identifier; `None` until the record has been persisted.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  /// Normalized (Title Case) character name.
  #[serde(rename = "char")]
  pub char_name: String,
  /// Normalized (Title Case) item name.
  pub item: String,
  pub status: Status,
  /// Creation time in milliseconds since epoch. Set once, never updated.
  #[serde(rename = "createdAt")]
  pub created_at: i64,
}

impl Record {
  /// Build a new unpersisted record: normalizes both names and stamps the
  /// creation time.
  pub fn new(char_name: &str, item: &str, status: Status) -> Self {
    Self {
      id: None,
      char_name: normalize_name(char_name),
      item: normalize_name(item),
      status,
      created_at: Utc::now().timestamp_millis(),
    }
  }

  /// Exact match on the natural key used for delete and dedup. Inputs are
  /// expected to be normalized already.
  pub fn matches_triple(&self, char_name: &str, item: &str, status: Status) -> bool {
    self.char_name == char_name && self.item == item && self.status == status
  }
}

/// Normalize a display name to Title Case: lower-case everything, then
/// upper-case the first letter of every word. Word characters are the ASCII
/// `[A-Za-z0-9_]` set, so accented letters pass through untouched.
///
/// Empty input maps to empty output.
pub fn normalize_name(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut at_word_start = true;

  for c in text.to_lowercase().chars() {
    let is_word_char = c.is_ascii_alphanumeric() || c == '_';
    if at_word_start && is_word_char {
      out.push(c.to_ascii_uppercase());
    } else {
      out.push(c);
    }
    at_word_start = !is_word_char;
  }

  out
}
