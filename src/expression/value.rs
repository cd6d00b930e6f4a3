//! Values flowing through an expression tree.

use crate::config::EngineConfig;
use crate::expression::error::{EvalResult, ExpressionError};
use crate::expression::variable::Variable;
use crate::global::ValueId;
use std::fmt;
use std::mem;

/// A single cell value: either an id or a string that is not in any vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdOrString {
    Id(ValueId),
    Str(String),
}

impl IdOrString {
    pub fn as_id(&self) -> Option<ValueId> {
        match self {
            IdOrString::Id(id) => Some(*id),
            IdOrString::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IdOrString::Id(_) => None,
            IdOrString::Str(s) => Some(s),
        }
    }
}

impl From<ValueId> for IdOrString {
    fn from(id: ValueId) -> Self {
        IdOrString::Id(id)
    }
}

impl From<String> for IdOrString {
    fn from(s: String) -> Self {
        IdOrString::Str(s)
    }
}

impl From<&str> for IdOrString {
    fn from(s: &str) -> Self {
        IdOrString::Str(s.to_string())
    }
}

impl fmt::Display for IdOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdOrString::Id(id) => write!(f, "{}", id),
            IdOrString::Str(s) => f.write_str(s),
        }
    }
}

/// The result of evaluating an expression over a slice of rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionResult {
    /// One value that applies to every row of the slice.
    Single(IdOrString),
    /// One value per row of the slice.
    Values(Vec<IdOrString>),
    /// One id per row of the slice.
    Ids(Vec<ValueId>),
    /// A variable whose values still have to be read from its column.
    Variable(Variable),
}

impl ExpressionResult {
    /// Whether the result is the same for every row.
    pub fn is_constant(&self) -> bool {
        matches!(self, ExpressionResult::Single(_))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            ExpressionResult::Variable(variable) => Some(variable),
            _ => None,
        }
    }
}

impl From<ValueId> for ExpressionResult {
    fn from(id: ValueId) -> Self {
        ExpressionResult::Single(IdOrString::Id(id))
    }
}

impl From<IdOrString> for ExpressionResult {
    fn from(value: IdOrString) -> Self {
        ExpressionResult::Single(value)
    }
}

/// A vector of ids with an upper bound on its memory footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedIdVector {
    ids: Vec<ValueId>,
    limit_bytes: usize,
}

impl LimitedIdVector {
    pub fn new(limit_bytes: usize) -> Self {
        Self {
            ids: Vec::new(),
            limit_bytes,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.id_vector_memory_limit)
    }

    /// Takes ownership of `ids` if they fit into `limit_bytes`.
    pub fn from_ids(ids: Vec<ValueId>, limit_bytes: usize) -> EvalResult<Self> {
        let requested = ids.len() * mem::size_of::<ValueId>();
        if requested > limit_bytes {
            return Err(ExpressionError::MemoryLimitExceeded {
                limit: limit_bytes,
                requested,
            });
        }
        Ok(Self { ids, limit_bytes })
    }

    pub fn try_push(&mut self, id: ValueId) -> EvalResult<()> {
        let requested = (self.ids.len() + 1) * mem::size_of::<ValueId>();
        if requested > self.limit_bytes {
            return Err(ExpressionError::MemoryLimitExceeded {
                limit: self.limit_bytes,
                requested,
            });
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn as_slice(&self) -> &[ValueId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.ids.len() * mem::size_of::<ValueId>()
    }
}
