//! Expression evaluation framework for SPARQL queries.
//!
//! This module provides:
//! - The expression tree with constants, variables, functions and aggregates
//! - Value getters that convert cells into the values a function works with
//! - Evaluation of a tree over a slice of rows of a result table
//! - Cooperative cancellation of long-running evaluations

pub mod aggregate;
pub mod cancellation;
pub mod context;
pub mod error;
pub mod eval;
pub mod expr;
pub mod getters;
pub mod literal;
pub mod value;
pub mod variable;

pub use aggregate::{make_aggregation_data, AggregationData};
pub use cancellation::CancellationHandle;
pub use context::EvaluationContext;
pub use error::{CancellationError, EvalResult, ExpressionError};
pub use eval::{evaluate_expression, evaluate_to_ids, expand_result, ExpressionEvaluator};
pub use expr::{AggregateFunction, LogicalOperator, SparqlExpression, UnaryFunction};
pub use getters::{EbvResult, NumericValue, ValueGetter};
pub use literal::{LiteralExpression, LiteralValue, StringLiteral};
pub use value::{ExpressionResult, IdOrString, LimitedIdVector};
pub use variable::{Variable, VariableToColumnMap};
