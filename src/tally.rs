use indexmap::IndexMap;
use std::hash::Hash;

/// Counts per key, remembering the order in which keys were first seen.
#[derive(Debug, Clone)]
pub struct Tally<K: Eq + Hash> {
    counts: IndexMap<K, u64>,
}

impl<K: Eq + Hash> Tally<K> {
    pub fn new() -> Self {
        Self {
            counts: IndexMap::new(),
        }
    }

    pub fn add(&mut self, key: K, amount: u64) {
        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(amount);
    }

    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Entries in first-seen order.
    pub fn into_entries(self) -> Vec<(K, u64)> {
        self.counts.into_iter().collect()
    }

    /// Entries by count descending; ties keep first-seen order.
    pub fn into_ranked(self) -> Vec<(K, u64)> {
        let mut entries = self.into_entries();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl<K: Eq + Hash> Default for Tally<K> {
    fn default() -> Self {
        Self::new()
    }
}
