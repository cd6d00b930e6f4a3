//! Expression tree definitions.

use crate::expression::error::EvalResult;
use crate::expression::literal::{LiteralExpression, StringLiteral};
use crate::expression::variable::{Variable, VariableToColumnMap};
use std::fmt;

/// Built-in functions with a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryFunction {
    Not,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    Str,
    StrLen,
    Year,
    Month,
    Day,
}

impl UnaryFunction {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryFunction::Not => "!",
            UnaryFunction::IsIri => "isIRI",
            UnaryFunction::IsBlank => "isBlank",
            UnaryFunction::IsLiteral => "isLiteral",
            UnaryFunction::IsNumeric => "isNumeric",
            UnaryFunction::Str => "STR",
            UnaryFunction::StrLen => "STRLEN",
            UnaryFunction::Year => "YEAR",
            UnaryFunction::Month => "MONTH",
            UnaryFunction::Day => "DAY",
        }
    }
}

/// Binary operators of SPARQL's three-valued logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }
}

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// Counts the values that are neither undefined nor NaN
    Count,
    /// Sum of numeric values
    Sum,
    /// Average of numeric values
    Avg,
    Min,
    Max,
    /// Concatenates the string forms, joined by a separator
    GroupConcat,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::GroupConcat => "GROUP_CONCAT",
        }
    }
}

/// Default separator of GROUP_CONCAT.
pub const DEFAULT_SEPARATOR: &str = " ";

/// Expression tree node
#[derive(Debug, Clone)]
pub enum SparqlExpression {
    /// Constant or variable
    Literal(LiteralExpression),

    Unary {
        function: UnaryFunction,
        child: Box<SparqlExpression>,
    },

    Logical {
        op: LogicalOperator,
        left: Box<SparqlExpression>,
        right: Box<SparqlExpression>,
    },

    /// REGEX(text, pattern). The pattern has to be constant.
    Regex {
        text: Box<SparqlExpression>,
        pattern: Box<SparqlExpression>,
    },

    Aggregate {
        function: AggregateFunction,
        distinct: bool,
        child: Box<SparqlExpression>,
        /// Only used by GROUP_CONCAT
        separator: String,
    },
}

impl SparqlExpression {
    pub fn literal(literal: LiteralExpression) -> Self {
        SparqlExpression::Literal(literal)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::literal(LiteralExpression::variable(Variable::new(name)))
    }

    pub fn int(value: i64) -> Self {
        Self::literal(LiteralExpression::int(value))
    }

    pub fn double(value: f64) -> Self {
        Self::literal(LiteralExpression::double(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::literal(LiteralExpression::bool(value))
    }

    pub fn iri(iri: impl Into<String>) -> Self {
        Self::literal(LiteralExpression::iri(iri))
    }

    /// A plain string literal with the given content.
    pub fn string(content: &str) -> Self {
        Self::literal(LiteralExpression::literal(StringLiteral::from_content(content)))
    }

    pub fn unary(function: UnaryFunction, child: SparqlExpression) -> Self {
        SparqlExpression::Unary {
            function,
            child: Box::new(child),
        }
    }

    pub fn not(child: SparqlExpression) -> Self {
        Self::unary(UnaryFunction::Not, child)
    }

    pub fn logical(op: LogicalOperator, left: SparqlExpression, right: SparqlExpression) -> Self {
        SparqlExpression::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: SparqlExpression, right: SparqlExpression) -> Self {
        Self::logical(LogicalOperator::And, left, right)
    }

    pub fn or(left: SparqlExpression, right: SparqlExpression) -> Self {
        Self::logical(LogicalOperator::Or, left, right)
    }

    pub fn regex(text: SparqlExpression, pattern: SparqlExpression) -> Self {
        SparqlExpression::Regex {
            text: Box::new(text),
            pattern: Box::new(pattern),
        }
    }

    pub fn aggregate(function: AggregateFunction, distinct: bool, child: SparqlExpression) -> Self {
        SparqlExpression::Aggregate {
            function,
            distinct,
            child: Box::new(child),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    pub fn count(distinct: bool, child: SparqlExpression) -> Self {
        Self::aggregate(AggregateFunction::Count, distinct, child)
    }

    pub fn sum(distinct: bool, child: SparqlExpression) -> Self {
        Self::aggregate(AggregateFunction::Sum, distinct, child)
    }

    pub fn avg(distinct: bool, child: SparqlExpression) -> Self {
        Self::aggregate(AggregateFunction::Avg, distinct, child)
    }

    pub fn min(child: SparqlExpression) -> Self {
        Self::aggregate(AggregateFunction::Min, false, child)
    }

    pub fn max(child: SparqlExpression) -> Self {
        Self::aggregate(AggregateFunction::Max, false, child)
    }

    pub fn group_concat(
        distinct: bool,
        child: SparqlExpression,
        separator: impl Into<String>,
    ) -> Self {
        SparqlExpression::Aggregate {
            function: AggregateFunction::GroupConcat,
            distinct,
            child: Box::new(child),
            separator: separator.into(),
        }
    }

    /// Direct children of this node.
    pub fn children(&self) -> Vec<&SparqlExpression> {
        match self {
            SparqlExpression::Literal(_) => Vec::new(),
            SparqlExpression::Unary { child, .. } | SparqlExpression::Aggregate { child, .. } => {
                vec![child.as_ref()]
            }
            SparqlExpression::Logical { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            SparqlExpression::Regex { text, pattern } => vec![text.as_ref(), pattern.as_ref()],
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, SparqlExpression::Aggregate { .. })
    }

    /// Whether the result is the same for every row. Aggregates depend on
    /// the size of the group and are never constant.
    pub fn is_constant_expression(&self) -> bool {
        match self {
            SparqlExpression::Literal(literal) => literal.is_constant_expression(),
            SparqlExpression::Aggregate { .. } => false,
            _ => self
                .children()
                .iter()
                .all(|child| child.is_constant_expression()),
        }
    }

    /// All variables in the subtree.
    pub fn contained_variables(&self) -> Vec<&Variable> {
        match self {
            SparqlExpression::Literal(literal) => literal.contained_variables_non_recursive(),
            _ => self
                .children()
                .into_iter()
                .flat_map(|child| child.contained_variables())
                .collect(),
        }
    }

    /// Variables that are not below an aggregate.
    pub fn unaggregated_variables(&self) -> Vec<&Variable> {
        match self {
            SparqlExpression::Literal(literal) => literal.unaggregated_variables(),
            SparqlExpression::Aggregate { .. } => Vec::new(),
            _ => self
                .children()
                .into_iter()
                .flat_map(|child| child.unaggregated_variables())
                .collect(),
        }
    }

    /// Key for common subexpression elimination, built from the keys of the children.
    pub fn cache_key(&self, variable_columns: &VariableToColumnMap) -> EvalResult<String> {
        match self {
            SparqlExpression::Literal(literal) => literal.cache_key(variable_columns),
            SparqlExpression::Unary { function, child } => Ok(format!(
                "{}({})",
                function.name(),
                child.cache_key(variable_columns)?
            )),
            SparqlExpression::Logical { op, left, right } => Ok(format!(
                "({} {} {})",
                left.cache_key(variable_columns)?,
                op.as_str(),
                right.cache_key(variable_columns)?
            )),
            SparqlExpression::Regex { text, pattern } => Ok(format!(
                "REGEX({}, {})",
                text.cache_key(variable_columns)?,
                pattern.cache_key(variable_columns)?
            )),
            SparqlExpression::Aggregate {
                function,
                distinct,
                child,
                separator,
            } => {
                let mut key = format!(
                    "{}({}{}",
                    function.name(),
                    if *distinct { "DISTINCT " } else { "" },
                    child.cache_key(variable_columns)?
                );
                if *function == AggregateFunction::GroupConcat {
                    key.push_str(&format!("; SEPARATOR=\"{}\"", separator));
                }
                key.push(')');
                Ok(key)
            }
        }
    }
}

impl fmt::Display for SparqlExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparqlExpression::Literal(literal) => write!(f, "{}", literal.value()),
            SparqlExpression::Unary { function, child } => {
                write!(f, "{}({})", function.name(), child)
            }
            SparqlExpression::Logical { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            SparqlExpression::Regex { text, pattern } => write!(f, "REGEX({}, {})", text, pattern),
            SparqlExpression::Aggregate {
                function,
                distinct,
                child,
                ..
            } => write!(
                f,
                "{}({}{})",
                function.name(),
                if *distinct { "DISTINCT " } else { "" },
                child
            ),
        }
    }
}

impl From<LiteralExpression> for SparqlExpression {
    fn from(literal: LiteralExpression) -> Self {
        SparqlExpression::Literal(literal)
    }
}
