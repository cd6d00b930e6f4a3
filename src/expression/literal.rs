//! Leaves of the expression tree: constants and variables.

use crate::expression::context::EvaluationContext;
use crate::expression::error::{EvalResult, ExpressionError};
use crate::expression::value::{ExpressionResult, IdOrString, LimitedIdVector};
use crate::expression::variable::{Variable, VariableToColumnMap};
use crate::global::ValueId;
use crate::vocab;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// An RDF literal in its full lexical form, e.g. `"chat"@fr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringLiteral {
    raw: String,
}

impl StringLiteral {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Builds the literal `"content"` without language tag or datatype.
    pub fn from_content(content: &str) -> Self {
        Self {
            raw: format!("\"{}\"", content),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The text between the quotes.
    pub fn content(&self) -> &str {
        vocab::literal_content(&self.raw).unwrap_or(&self.raw)
    }
}

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The value a [`LiteralExpression`] holds.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Variable(Variable),
    Int(i64),
    Double(f64),
    Bool(bool),
    /// An IRI in angle brackets, e.g. `<http://example.org/x>`.
    Iri(String),
    Literal(StringLiteral),
    Id(ValueId),
    /// Evaluated exactly once in the context that created it, never cached.
    IdVector(LimitedIdVector),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Variable(variable) => write!(f, "{}", variable),
            LiteralValue::Int(i) => write!(f, "{}", i),
            LiteralValue::Double(d) => write!(f, "{:?}", d),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Iri(iri) => f.write_str(iri),
            LiteralValue::Literal(literal) => write!(f, "{}", literal),
            LiteralValue::Id(id) => write!(f, "{}", id),
            LiteralValue::IdVector(ids) => write!(f, "<{} ids>", ids.len()),
        }
    }
}

/// A leaf of the expression tree.
///
/// IRIs and string literals are looked up in the vocabulary on first use.
/// The outcome is stored in a once-cell: concurrent first evaluations may
/// all compute it, one of them wins the write, and the others drop theirs.
#[derive(Debug, Clone)]
pub struct LiteralExpression {
    value: LiteralValue,
    resolved: OnceLock<IdOrString>,
}

impl LiteralExpression {
    pub fn new(value: LiteralValue) -> Self {
        Self {
            value,
            resolved: OnceLock::new(),
        }
    }

    pub fn variable(variable: Variable) -> Self {
        Self::new(LiteralValue::Variable(variable))
    }

    pub fn int(value: i64) -> Self {
        Self::new(LiteralValue::Int(value))
    }

    pub fn double(value: f64) -> Self {
        Self::new(LiteralValue::Double(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(LiteralValue::Bool(value))
    }

    pub fn iri(iri: impl Into<String>) -> Self {
        Self::new(LiteralValue::Iri(iri.into()))
    }

    pub fn literal(literal: StringLiteral) -> Self {
        Self::new(LiteralValue::Literal(literal))
    }

    pub fn id(id: ValueId) -> Self {
        Self::new(LiteralValue::Id(id))
    }

    pub fn id_vector(ids: LimitedIdVector) -> Self {
        Self::new(LiteralValue::IdVector(ids))
    }

    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<ExpressionResult> {
        match &self.value {
            LiteralValue::Variable(variable) => evaluate_variable(variable, ctx),
            LiteralValue::Int(i) => Ok(ValueId::make_from_int(*i).into()),
            LiteralValue::Double(d) => Ok(ValueId::make_from_double(*d).into()),
            LiteralValue::Bool(b) => Ok(ValueId::make_from_bool(*b).into()),
            LiteralValue::Id(id) => Ok((*id).into()),
            LiteralValue::Iri(iri) => self.resolve_word(iri, ctx),
            LiteralValue::Literal(literal) => self.resolve_word(literal.raw(), ctx),
            LiteralValue::IdVector(ids) => Ok(ExpressionResult::Ids(ids.as_slice().to_vec())),
        }
    }

    fn resolve_word(&self, word: &str, ctx: &EvaluationContext<'_>) -> EvalResult<ExpressionResult> {
        if let Some(cached) = self.resolved.get() {
            return Ok(cached.clone().into());
        }

        let resolved = match ctx.vocabulary().get_id(word) {
            Some(id) => IdOrString::Id(id),
            None => IdOrString::Str(word.to_string()),
        };
        log::trace!("Resolved literal {} to {}", word, resolved);

        // Another evaluation may have won the race; both values are equal.
        let _ = self.resolved.set(resolved.clone());

        ctx.check_cancellation("resolving a literal in the vocabulary")?;
        Ok(resolved.into())
    }

    /// Key for common subexpression elimination. Variables are identified by
    /// their column, so differently named variables on the same column share a key.
    pub fn cache_key(&self, variable_columns: &VariableToColumnMap) -> EvalResult<String> {
        match &self.value {
            LiteralValue::Variable(variable) => {
                let column = variable_columns.column_index(variable).ok_or_else(|| {
                    ExpressionError::UnknownVariable {
                        variable: variable.name().to_string(),
                    }
                })?;
                Ok(format!("#column_{}#", column))
            }
            LiteralValue::Iri(iri) => Ok(iri.clone()),
            LiteralValue::Id(id) => Ok(format!("#valueId {}#", id.get_bits())),
            LiteralValue::Literal(literal) => Ok(format!("#literal: {}", literal.raw())),
            LiteralValue::IdVector(_) => Err(ExpressionError::NotCacheable {
                expression: self.value.to_string(),
            }),
            LiteralValue::Int(_) | LiteralValue::Double(_) | LiteralValue::Bool(_) => {
                Ok(self.value.to_string())
            }
        }
    }

    pub fn is_constant_expression(&self) -> bool {
        !matches!(self.value, LiteralValue::Variable(_))
    }

    pub fn contained_variables_non_recursive(&self) -> Vec<&Variable> {
        match &self.value {
            LiteralValue::Variable(variable) => vec![variable],
            _ => Vec::new(),
        }
    }

    pub fn unaggregated_variables(&self) -> Vec<&Variable> {
        self.contained_variables_non_recursive()
    }
}

impl From<LiteralValue> for LiteralExpression {
    fn from(value: LiteralValue) -> Self {
        Self::new(value)
    }
}

fn evaluate_variable(
    variable: &Variable,
    ctx: &EvaluationContext<'_>,
) -> EvalResult<ExpressionResult> {
    let mut variable = variable;
    let mut visited = HashSet::new();
    // `(?x AS ?y)`: follow renames until a value, an unaliased variable, or a
    // variable already seen on this chain.
    while !ctx.is_grouped(variable) {
        match ctx.result_from_previous_aggregate(variable) {
            None => break,
            Some(ExpressionResult::Variable(source)) => {
                visited.insert(variable);
                if visited.contains(source) {
                    log::debug!("Alias cycle through {}", source.name());
                    break;
                }
                variable = source;
            }
            Some(other) => return Ok(other.clone()),
        }
    }

    if ctx.is_grouped(variable) && !ctx.is_inside_aggregate() {
        let column = ctx.column_index_for_variable(variable)?;
        let values = ctx.input().column_values(column, ctx.begin(), ctx.end());
        if let Some(&first) = values.first() {
            if values.iter().any(|value| *value != first) {
                return Err(ExpressionError::GroupedVariableNotConstant {
                    variable: variable.name().to_string(),
                    begin: ctx.begin(),
                    end: ctx.end(),
                });
            }
            return Ok(first.into());
        }
    }

    Ok(ExpressionResult::Variable(variable.clone()))
}
