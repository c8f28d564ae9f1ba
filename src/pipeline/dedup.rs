// src/pipeline/dedup.rs

//! Time-bounded record of already processed paste keys.
//!
//! Owned by the poll loop alone, so no locking is involved.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Default retention window.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Keys seen within the retention window, with first-processed timestamps.
#[derive(Debug, Clone)]
pub struct DedupCache {
    entries: HashMap<String, DateTime<Utc>>,
    retention: TimeDelta,
}

impl DedupCache {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            retention: TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Whether `key` was processed within the retention window.
    pub fn seen(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Record `key` as processed at `now`. An existing entry keeps its timestamp.
    pub fn mark_seen(&mut self, key: &str, now: DateTime<Utc>) {
        self.entries.entry(key.to_string()).or_insert(now);
    }

    /// Drop every entry older than `now - retention`. Returns how many were removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let Some(threshold) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|key, seen_at| {
            let keep = *seen_at >= threshold;
            if !keep {
                log::debug!("Deleting expired entry {key}");
            }
            keep
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}
