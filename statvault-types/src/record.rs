//! Plaintext statistics record.
//!
//! One `StatsRecord` exists per (instance, month). It carries two counters and
//! an itemized log of AP gains. The accumulator and the log must agree:
//! `akashi_ap` is always the sum of `amount` over `akashi_ap_entries`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single itemized AP gain.
///
/// `base`, `count` and `source` are opaque to the store; only `amount`
/// participates in the accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApEntry {
    pub amount: u64,
    pub base: u64,
    pub count: u64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl ApEntry {
    /// Creates an entry stamped with `timestamp`.
    pub fn new(
        amount: u64,
        base: u64,
        count: u64,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            base,
            count,
            source: source.into(),
            timestamp,
        }
    }
}

/// Aggregate statistics for one instance and one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    /// Number of recorded battles.
    pub battle_count: u64,
    /// Running total of `amount` across `akashi_ap_entries`.
    pub akashi_ap: u64,
    /// AP gains in insertion order.
    pub akashi_ap_entries: Vec<ApEntry>,
}

impl StatsRecord {
    /// Returns the zero record.
    ///
    /// Used both as the seed for a never-written key and as the fail-closed
    /// value for an unreadable one.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battle_count == 0 && self.akashi_ap == 0 && self.akashi_ap_entries.is_empty()
    }

    /// Increments the battle counter.
    pub fn record_battle(&mut self) {
        self.battle_count = self.battle_count.saturating_add(1);
    }

    /// Appends an AP entry and adds its amount to the accumulator.
    pub fn push_ap_entry(&mut self, entry: ApEntry) {
        self.akashi_ap = self.akashi_ap.saturating_add(entry.amount);
        self.akashi_ap_entries.push(entry);
    }

    /// Sum of `amount` over all entries, saturating.
    #[must_use]
    pub fn entries_total(&self) -> u64 {
        self.akashi_ap_entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.amount))
    }

    /// Returns true if the accumulator matches the itemized entries.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.akashi_ap == self.entries_total()
    }

    /// AP totals grouped by entry source.
    #[must_use]
    pub fn entries_by_source(&self) -> BTreeMap<&str, u64> {
        let mut totals = BTreeMap::new();
        for entry in &self.akashi_ap_entries {
            let total = totals.entry(entry.source.as_str()).or_insert(0u64);
            *total = total.saturating_add(entry.amount);
        }
        totals
    }
}
