//! Typed indices for the different identifier spaces.
//!
//! A `TypedIndex<Tag>` is a plain `u64` at runtime. The tag only exists in the
//! type system, so an index into the main vocabulary can never be passed where
//! an index into the local vocabulary is expected.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker for an identifier space.
pub trait IndexTag {
    /// Human readable name of the identifier space.
    const NAME: &'static str;
}

/// An unsigned index that belongs to the identifier space `Tag`.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct TypedIndex<Tag> {
    value: u64,
    #[serde(skip)]
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> TypedIndex<Tag> {
    /// Creates an index with the given raw value.
    pub const fn make(value: u64) -> Self {
        Self {
            value,
            _tag: PhantomData,
        }
    }

    /// Returns the raw value.
    pub const fn get(&self) -> u64 {
        self.value
    }

    /// The smallest possible index.
    pub const fn min() -> Self {
        Self::make(0)
    }

    /// The largest possible index.
    pub const fn max() -> Self {
        Self::make(u64::MAX)
    }
}

// Manual impls: deriving would put the bounds on `Tag`, which is never instantiated.
impl<Tag> Clone for TypedIndex<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> Copy for TypedIndex<Tag> {}

impl<Tag> PartialEq for TypedIndex<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<Tag> Eq for TypedIndex<Tag> {}

impl<Tag> PartialOrd for TypedIndex<Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tag> Ord for TypedIndex<Tag> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<Tag> Hash for TypedIndex<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Tag: IndexTag> fmt::Debug for TypedIndex<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", Tag::NAME, self.value)
    }
}

impl<Tag> fmt::Display for TypedIndex<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

macro_rules! index_tag {
    ($(#[$meta:meta])* $tag:ident, $alias:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $tag {}

        impl IndexTag for $tag {
            const NAME: &'static str = stringify!($alias);
        }

        $(#[$meta])*
        pub type $alias = TypedIndex<$tag>;
    };
}

index_tag!(
    /// Entry of the persistent RDF vocabulary.
    VocabTag,
    VocabIndex
);
index_tag!(
    /// Entry of a session-scoped local vocabulary.
    LocalVocabTag,
    LocalVocabIndex
);
index_tag!(
    /// Record of the full-text index.
    TextRecordTag,
    TextRecordIndex
);
index_tag!(
    /// Entry of the word vocabulary of the full-text index.
    WordVocabTag,
    WordVocabIndex
);
