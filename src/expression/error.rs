//! Error types for expression evaluation.

use thiserror::Error;

/// Raised when the cancellation handle of an evaluation was triggered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Evaluation was cancelled during {detail}")]
pub struct CancellationError {
    pub detail: String,
}

/// Errors that abort the evaluation of an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// The variable is not bound to any column of the input.
    #[error("Variable {variable} not found")]
    UnknownVariable { variable: String },

    /// A cache key was requested for an expression that must never be cached.
    #[error("Trying to get cache key for value that should not be cached: {expression}")]
    NotCacheable { expression: String },

    /// A regular expression could not be compiled.
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// The pattern of REGEX has to be the same for all rows.
    #[error("The pattern of REGEX must be a constant, got {expression}")]
    NonConstantPattern { expression: String },

    /// A grouped variable does not have the same value in every row of a group.
    #[error("Grouped variable {variable} is not constant within rows {begin}..{end}")]
    GroupedVariableNotConstant {
        variable: String,
        begin: usize,
        end: usize,
    },

    /// A vector literal grew beyond its memory limit.
    #[error("Memory limit of {limit} bytes exceeded, {requested} bytes requested")]
    MemoryLimitExceeded { limit: usize, requested: usize },

    /// An expression result does not have one value per row of the input.
    #[error("Expression result has {actual} values but the input has {expected} rows")]
    ResultSizeMismatch { expected: usize, actual: usize },

    /// The evaluation was cancelled. Not a failure of the query itself.
    #[error(transparent)]
    Cancelled(#[from] CancellationError),
}

impl ExpressionError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ExpressionError::Cancelled(_))
    }
}

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, ExpressionError>;
