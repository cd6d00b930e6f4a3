//! Session-scoped vocabulary for words that are not part of the knowledge base.
//!
//! Results of functions like `GROUP_CONCAT` produce new strings that have no
//! entry in the persistent vocabulary. They are added here and referenced via
//! `LocalVocabIndex` ids.

use crate::global::{LocalVocabIndex, ValueId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

/// Concurrently appendable word table.
#[derive(Debug, Default)]
pub struct LocalVocab {
    indices: DashMap<String, LocalVocabIndex>,
    words: RwLock<Vec<String>>,
}

impl LocalVocab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `word`, adding it first if it is not yet contained.
    pub fn get_index_and_add_if_not_contained(&self, word: &str) -> LocalVocabIndex {
        if let Some(index) = self.indices.get(word) {
            return *index;
        }
        // Lock order is always: shard of `indices`, then `words`.
        match self.indices.entry(word.to_string()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut words = self.words.write();
                let index = LocalVocabIndex::make(words.len() as u64);
                words.push(word.to_string());
                entry.insert(index);
                index
            }
        }
    }

    /// Same as `get_index_and_add_if_not_contained`, wrapped into a `ValueId`.
    pub fn get_id_and_add_if_not_contained(&self, word: &str) -> ValueId {
        ValueId::make_from_local_vocab_index(self.get_index_and_add_if_not_contained(word))
    }

    pub fn get_word(&self, index: LocalVocabIndex) -> Option<String> {
        let words = self.words.read();
        usize::try_from(index.get())
            .ok()
            .and_then(|pos| words.get(pos))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.words.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
