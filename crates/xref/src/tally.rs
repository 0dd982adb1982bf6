//! Running frequency count of technique identifiers seen in text.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::extract::extract_ids;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub attack_id: String,
    pub count: u64,
}

/// The `n` most frequent ids plus the summed count of everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallySummary {
    pub top: Vec<TallyEntry>,
    pub others: u64,
}

/// Thread-safe technique counter. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct TechniqueTally {
    counts: Mutex<HashMap<String, u64>>,
}

impl TechniqueTally {
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        // A panicked writer can only have left a partially applied increment.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = self.counts();
        for id in ids {
            *counts.entry(id.into()).or_insert(0) += 1;
        }
    }

    /// Extract ids from `text` and count them. Returns the ids found.
    pub fn record_text(&self, text: &str) -> Vec<String> {
        let ids = extract_ids(text);
        self.record(ids.iter().cloned());
        ids
    }

    pub fn count(&self, id: &str) -> u64 {
        self.counts().get(id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts().values().sum()
    }

    /// All entries, most frequent first; ties ordered by id.
    pub fn snapshot(&self) -> Vec<TallyEntry> {
        let mut entries: Vec<TallyEntry> = self
            .counts()
            .iter()
            .map(|(id, &count)| TallyEntry {
                attack_id: id.clone(),
                count,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.attack_id.cmp(&b.attack_id)));
        entries
    }

    pub fn top(&self, n: usize) -> TallySummary {
        let mut entries = self.snapshot();
        let rest = entries.split_off(n.min(entries.len()));
        TallySummary {
            top: entries,
            others: rest.iter().map(|e| e.count).sum(),
        }
    }
}
