//! A vocabulary held completely in memory.

use crate::global::{ValueId, VocabIndex};
use crate::vocab::Vocabulary;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Sorted, deduplicated list of words. The id of a word is its position.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVocabulary {
    words: Vec<String>,
}

impl InMemoryVocabulary {
    /// Build a vocabulary from arbitrary words. Duplicates are removed.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = words.into_iter().map(Into::into).collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    /// Load a vocabulary from a file with one word per line. Empty lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary file {}", path.display()))?;
        let vocabulary = Self::new(contents.lines().filter(|line| !line.is_empty()));
        log::debug!(
            "Loaded vocabulary with {} words from {}",
            vocabulary.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Vocabulary for InMemoryVocabulary {
    fn get_id(&self, word: &str) -> Option<ValueId> {
        self.words
            .binary_search_by(|probe| probe.as_str().cmp(word))
            .ok()
            .map(|pos| ValueId::make_from_vocab_index(VocabIndex::make(pos as u64)))
    }

    fn index_to_string(&self, index: VocabIndex) -> Option<String> {
        usize::try_from(index.get())
            .ok()
            .and_then(|pos| self.words.get(pos))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_lookup_both_directions() {
        let vocab = InMemoryVocabulary::new(["<b>", "\"a\"", "<a>", "<b>"]);
        assert_eq!(vocab.len(), 3);

        let id = vocab.get_id("<b>").unwrap();
        let index = id.get_vocab_index().unwrap();
        assert_eq!(vocab.index_to_string(index), Some("<b>".to_string()));

        assert_eq!(vocab.get_id("<c>"), None);
        assert_eq!(vocab.index_to_string(VocabIndex::make(99)), None);
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "<http://example.org/x>")?;
        writeln!(file)?;
        writeln!(file, "\"literal\"")?;

        let vocab = InMemoryVocabulary::load(file.path())?;
        assert_eq!(vocab.len(), 2);
        assert!(vocab.get_id("\"literal\"").is_some());
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = InMemoryVocabulary::load("/definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("Failed to read vocabulary file"));
    }
}
