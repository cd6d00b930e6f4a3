//! Vocabularies that translate between lexical forms and identifiers.
//!
//! - **Vocabulary**: the read-only lookup service of the knowledge base
//! - **InMemoryVocabulary**: a sorted word list implementing `Vocabulary`
//! - **LocalVocab**: a session-scoped table for words created during a query

pub mod local;
pub mod memory;

pub use local::LocalVocab;
pub use memory::InMemoryVocabulary;

use crate::global::{ValueId, VocabIndex};

/// Lexical prefix of an IRI.
pub const IRI_PREFIX: &str = "<";
/// Lexical prefix of a blank node.
pub const BLANK_NODE_PREFIX: &str = "_:";
/// Lexical prefix of a literal.
pub const LITERAL_PREFIX: &str = "\"";

/// The vocabulary lookup service of the knowledge base.
///
/// Implementations must be safe to call from many evaluation threads at once.
pub trait Vocabulary: Send + Sync {
    /// Look up the id of a word in its lexical form, e.g. `<http://x>` or `"abc"`.
    fn get_id(&self, word: &str) -> Option<ValueId>;

    /// The lexical form of the entry at `index`.
    fn index_to_string(&self, index: VocabIndex) -> Option<String>;
}

pub fn is_iri(word: &str) -> bool {
    word.starts_with(IRI_PREFIX)
}

pub fn is_blank_node(word: &str) -> bool {
    word.starts_with(BLANK_NODE_PREFIX)
}

pub fn is_literal(word: &str) -> bool {
    word.starts_with(LITERAL_PREFIX)
}

/// The content of a literal without quotes, language tag or datatype, e.g.
/// `abc` for `"abc"@en`. Returns `None` if `word` is not a literal.
pub fn literal_content(word: &str) -> Option<&str> {
    let rest = word.strip_prefix(LITERAL_PREFIX)?;
    let end = rest.rfind('"')?;
    Some(&rest[..end])
}

/// The IRI without its angle brackets.
pub fn iri_content(word: &str) -> Option<&str> {
    word.strip_prefix('<')?.strip_suffix('>')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_classification() {
        assert!(is_iri("<http://example.org/a>"));
        assert!(is_blank_node("_:b0"));
        assert!(is_literal("\"text\"@en"));
        assert!(!is_literal("plain"));
        assert!(!is_iri("\"<not an iri>\""));
    }

    #[test]
    fn test_literal_content() {
        assert_eq!(literal_content("\"abc\""), Some("abc"));
        assert_eq!(literal_content("\"abc\"@en"), Some("abc"));
        assert_eq!(
            literal_content("\"42\"^^<http://www.w3.org/2001/XMLSchema#int>"),
            Some("42")
        );
        assert_eq!(literal_content("\"\""), Some(""));
        assert_eq!(literal_content("\""), None);
        assert_eq!(literal_content("<http://x>"), None);
    }

    #[test]
    fn test_iri_content() {
        assert_eq!(iri_content("<http://x>"), Some("http://x"));
        assert_eq!(iri_content("http://x"), None);
    }
}
