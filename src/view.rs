//! View projection: the filtered, sorted list handed to the presentation
//! layer.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::record::{Record, Status};

/// Status filter applied to the projected view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
  #[default]
  All,
  Needs,
  Has,
}

impl StatusFilter {
  fn keeps(&self, status: Status) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Needs => status == Status::Needs,
      StatusFilter::Has => status == Status::Has,
    }
  }
}

/// Pure filter + sort. Order: char ascending, then needs before has within
/// the same char, then item ascending. The sort is stable, so records that
/// tie on all three keys keep their input order.
pub fn project(records: &[Record], filter: StatusFilter) -> Vec<Record> {
  let mut out: Vec<Record> = records
    .iter()
    .filter(|r| filter.keeps(r.status))
    .cloned()
    .collect();

  out.sort_by(|a, b| {
    name_cmp(&a.char_name, &b.char_name)
      .then_with(|| status_rank(a.status).cmp(&status_rank(b.status)))
      .then_with(|| name_cmp(&a.item, &b.item))
  });

  out
}

fn status_rank(status: Status) -> u8 {
  match status {
    Status::Needs => 0,
    Status::Has => 1,
  }
}

/// Case-insensitive name comparison with a case-sensitive tie-break so the
/// order stays total.
fn name_cmp(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}
