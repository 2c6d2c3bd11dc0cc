//! In-process copy of the memory table.
//!
//! Filled once from the store and then updated by every facade write. Reads
//! never go back to the store, so rows changed by another process stay stale
//! until the next restart.

use std::collections::HashMap;

use super::types::MemoryEntry;

#[derive(Debug, Default)]
pub struct Mirror {
    slots: HashMap<String, Slot>,
    next_seq: u64,
}

#[derive(Debug)]
struct Slot {
    /// Write order; larger is newer.
    seq: u64,
    entry: MemoryEntry,
}

impl Mirror {
    /// Build from entries given oldest write first.
    pub fn from_entries(entries: impl IntoIterator<Item = MemoryEntry>) -> Self {
        let mut mirror = Self::default();
        for entry in entries {
            mirror.put(entry);
        }
        mirror
    }

    /// Insert or replace; the entry becomes the most recent.
    pub fn put(&mut self, entry: MemoryEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(entry.key.clone(), Slot { seq, entry });
    }

    pub fn get(&self, key: &str) -> Option<&MemoryEntry> {
        self.slots.get(key).map(|s| &s.entry)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The `n` most recently written entries, oldest of them first.
    pub fn recent(&self, n: usize) -> Vec<MemoryEntry> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|s| s.seq);
        let skip = slots.len().saturating_sub(n);
        slots
            .into_iter()
            .skip(skip)
            .map(|s| s.entry.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(key: &str) -> MemoryEntry {
        MemoryEntry {
            key: key.into(),
            value: json!(key),
            category: "general".into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn overwrite_moves_key_to_newest() {
        let mut mirror = Mirror::from_entries(["a", "b", "c"].map(entry));
        mirror.put(entry("a"));

        let keys: Vec<String> = mirror.recent(10).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
        assert_eq!(mirror.len(), 3);
    }

    #[test]
    fn recent_truncates_to_newest() {
        let mirror = Mirror::from_entries(["a", "b", "c", "d"].map(entry));
        let keys: Vec<String> = mirror.recent(2).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["c", "d"]);
        assert!(Mirror::default().recent(5).is_empty());
    }
}
