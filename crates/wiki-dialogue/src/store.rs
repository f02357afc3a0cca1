//! Concurrent character → lines accumulator.

use std::collections::BTreeMap;

use dashmap::DashMap;

/// Mapping from character name to the lines that character speaks.
///
/// Safe to share behind an `Arc` between crawl tasks. `append` takes the
/// shard lock for the key, so concurrent appends never lose an update.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    lines: DashMap<String, Vec<String>>,
}

impl TranscriptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, character: &str) -> bool {
        self.lines.contains_key(character)
    }

    /// Replace a character's lines. An empty list removes the character.
    pub fn set(&self, character: &str, lines: Vec<String>) {
        if lines.is_empty() {
            self.lines.remove(character);
        } else {
            self.lines.insert(character.to_string(), lines);
        }
    }

    /// Copy of a character's current lines.
    pub fn get(&self, character: &str) -> Option<Vec<String>> {
        self.lines.get(character).map(|entry| entry.value().clone())
    }

    /// Append a line, creating the character on first use.
    pub fn append(&self, character: &str, line: String) {
        self.lines
            .entry(character.to_string())
            .or_default()
            .push(line);
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of lines across all characters.
    pub fn total_lines(&self) -> usize {
        self.lines.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of lines per character, sorted by name.
    pub fn line_counts(&self) -> BTreeMap<String, usize> {
        self.lines
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect()
    }

    /// Sorted copy of the whole store, used for serialization.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.lines
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl From<BTreeMap<String, Vec<String>>> for TranscriptStore {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let store = Self::new();
        for (character, lines) in map {
            store.set(&character, lines);
        }
        store
    }
}
