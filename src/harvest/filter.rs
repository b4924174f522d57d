//! Client-side incremental filtering.
//!
//! The registry has no "modified since" query, so every harvest walks the
//! full listing and drops old records afterwards. The listing is sorted by
//! name, not by date, which is why a dropped record never ends the walk.

use chrono::{DateTime, Utc};

use crate::model::CrateRecord;

/// Whether `record` passes the optional `checkpoint`.
///
/// Records modified exactly at the checkpoint are kept.
pub fn keep(record: &CrateRecord, checkpoint: Option<DateTime<Utc>>) -> bool {
    match checkpoint {
        None => true,
        Some(from) => record.updated_at() >= from,
    }
}
