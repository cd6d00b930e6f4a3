//! Expression evaluation over a slice of rows.

use crate::expression::aggregate::make_aggregation_data;
use crate::expression::context::EvaluationContext;
use crate::expression::error::{EvalResult, ExpressionError};
use crate::expression::expr::{LogicalOperator, SparqlExpression, UnaryFunction};
use crate::expression::getters::{
    ActualValueGetter, DateValueGetter, EbvResult, EffectiveBooleanValueGetter,
    IsBlankNodeValueGetter, IsIriValueGetter, IsLiteralValueGetter, IsNumericValueGetter,
    LiteralFromIdGetter, RegexValueGetter, StringValueGetter, ValueGetter,
};
use crate::expression::literal::StringLiteral;
use crate::expression::value::{ExpressionResult, IdOrString};
use crate::global::{Date, ValueId};
use regex::Regex;
use std::collections::HashSet;

/// Evaluator for expressions
pub struct ExpressionEvaluator<'c, 'a> {
    ctx: &'c mut EvaluationContext<'a>,
}

impl<'c, 'a> ExpressionEvaluator<'c, 'a> {
    pub fn new(ctx: &'c mut EvaluationContext<'a>) -> Self {
        Self { ctx }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&mut self, expr: &SparqlExpression) -> EvalResult<ExpressionResult> {
        match expr {
            SparqlExpression::Literal(literal) => literal.evaluate(self.ctx),

            SparqlExpression::Unary { function, child } => {
                let child = self.evaluate(child)?;
                self.evaluate_unary(*function, child)
            }

            SparqlExpression::Logical { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.evaluate_logical(*op, left, right)
            }

            SparqlExpression::Regex { text, pattern } => {
                let regex = self.constant_regex(pattern)?;
                let text = self.evaluate(text)?;
                self.evaluate_regex(text, regex.as_ref())
            }

            SparqlExpression::Aggregate {
                function,
                distinct,
                child,
                separator,
            } => {
                // Grouped variables below an aggregate are read row by row.
                let was_inside = self.ctx.set_inside_aggregate(true);
                let child = self.evaluate(child);
                self.ctx.set_inside_aggregate(was_inside);
                let values = expand_result(&child?, self.ctx)?;

                let mut data = make_aggregation_data(*function, separator);
                let mut seen = HashSet::new();
                for (row, value) in values.iter().enumerate() {
                    self.poll_cancellation(row, function.name())?;
                    if *distinct && !seen.insert(ActualValueGetter.get(value, self.ctx)) {
                        continue;
                    }
                    data.add_value(value, self.ctx);
                }
                log::trace!(
                    "Aggregated {} values with {}",
                    values.len(),
                    function.name()
                );
                Ok(data.calculate_result(self.ctx.local_vocab()).into())
            }
        }
    }

    fn evaluate_unary(
        &self,
        function: UnaryFunction,
        child: ExpressionResult,
    ) -> EvalResult<ExpressionResult> {
        match function {
            UnaryFunction::Not => self.map_values(EffectiveBooleanValueGetter, child, |ebv| {
                let negated = match ebv {
                    EbvResult::True => EbvResult::False,
                    EbvResult::False => EbvResult::True,
                    EbvResult::Undef => EbvResult::Undef,
                };
                negated.to_id().into()
            }),
            UnaryFunction::IsIri => self.map_values(IsIriValueGetter::new(), child, IdOrString::Id),
            UnaryFunction::IsBlank => {
                self.map_values(IsBlankNodeValueGetter::new(), child, IdOrString::Id)
            }
            UnaryFunction::IsLiteral => {
                self.map_values(IsLiteralValueGetter::new(), child, IdOrString::Id)
            }
            UnaryFunction::IsNumeric => self.map_values(IsNumericValueGetter, child, IdOrString::Id),
            UnaryFunction::Str => self.map_values(StringValueGetter, child, |s| match s {
                Some(s) => IdOrString::Str(StringLiteral::from_content(&s).raw().to_string()),
                None => ValueId::make_undefined().into(),
            }),
            UnaryFunction::StrLen => self.map_values(LiteralFromIdGetter, child, |s| {
                s.map_or_else(ValueId::make_undefined, |s| {
                    ValueId::make_from_int(s.chars().count() as i64)
                })
                .into()
            }),
            UnaryFunction::Year => self.map_dates(child, |date| i64::from(date.year())),
            UnaryFunction::Month => self.map_dates(child, |date| i64::from(date.month())),
            UnaryFunction::Day => self.map_dates(child, |date| i64::from(date.day())),
        }
    }

    fn map_dates(
        &self,
        child: ExpressionResult,
        component: impl Fn(Date) -> i64,
    ) -> EvalResult<ExpressionResult> {
        self.map_values(DateValueGetter, child, |date| {
            date.map_or_else(ValueId::make_undefined, |date| {
                ValueId::make_from_int(component(date))
            })
            .into()
        })
    }

    /// Apply `getter` and then `f` to every value of `child`. A constant
    /// child gives a constant result.
    fn map_values<G: ValueGetter>(
        &self,
        getter: G,
        child: ExpressionResult,
        f: impl Fn(G::Output) -> IdOrString,
    ) -> EvalResult<ExpressionResult> {
        if let ExpressionResult::Single(value) = &child {
            return Ok(ExpressionResult::Single(f(getter.get(value, self.ctx))));
        }
        let values = expand_result(&child, self.ctx)?;
        let mut result = Vec::with_capacity(values.len());
        for (row, value) in values.iter().enumerate() {
            self.poll_cancellation(row, "a unary function")?;
            result.push(f(getter.get(value, self.ctx)));
        }
        Ok(ExpressionResult::Values(result))
    }

    fn evaluate_logical(
        &self,
        op: LogicalOperator,
        left: ExpressionResult,
        right: ExpressionResult,
    ) -> EvalResult<ExpressionResult> {
        let combine = |a: &IdOrString, b: &IdOrString| -> IdOrString {
            let a = EffectiveBooleanValueGetter.get(a, self.ctx);
            let b = EffectiveBooleanValueGetter.get(b, self.ctx);
            combine_ebv(op, a, b).to_id().into()
        };

        if let (ExpressionResult::Single(a), ExpressionResult::Single(b)) = (&left, &right) {
            return Ok(ExpressionResult::Single(combine(a, b)));
        }
        let left = expand_result(&left, self.ctx)?;
        let right = expand_result(&right, self.ctx)?;
        let mut result = Vec::with_capacity(left.len());
        for (row, (a, b)) in left.iter().zip(right.iter()).enumerate() {
            self.poll_cancellation(row, op.as_str())?;
            result.push(combine(a, b));
        }
        Ok(ExpressionResult::Values(result))
    }

    /// The pattern of REGEX, compiled once for the whole slice.
    fn constant_regex(&mut self, pattern: &SparqlExpression) -> EvalResult<Option<Regex>> {
        match self.evaluate(pattern)? {
            ExpressionResult::Single(value) => RegexValueGetter.get(&value, self.ctx),
            _ => Err(ExpressionError::NonConstantPattern {
                expression: pattern.to_string(),
            }),
        }
    }

    fn evaluate_regex(
        &self,
        text: ExpressionResult,
        regex: Option<&Regex>,
    ) -> EvalResult<ExpressionResult> {
        let Some(regex) = regex else {
            return Ok(ValueId::make_undefined().into());
        };
        self.map_values(StringValueGetter, text, |s| {
            s.map_or_else(ValueId::make_undefined, |s| {
                ValueId::make_from_bool(regex.is_match(&s))
            })
            .into()
        })
    }

    fn poll_cancellation(&self, row: usize, detail: &str) -> EvalResult<()> {
        if row % self.ctx.cancellation_check_interval().max(1) == 0 {
            self.ctx.check_cancellation(detail)?;
        }
        Ok(())
    }
}

/// SPARQL's three-valued AND and OR.
pub fn combine_ebv(op: LogicalOperator, a: EbvResult, b: EbvResult) -> EbvResult {
    match op {
        LogicalOperator::And => match (a, b) {
            (EbvResult::False, _) | (_, EbvResult::False) => EbvResult::False,
            (EbvResult::True, EbvResult::True) => EbvResult::True,
            _ => EbvResult::Undef,
        },
        LogicalOperator::Or => match (a, b) {
            (EbvResult::True, _) | (_, EbvResult::True) => EbvResult::True,
            (EbvResult::False, EbvResult::False) => EbvResult::False,
            _ => EbvResult::Undef,
        },
    }
}

/// Evaluate `expr` on the rows of `ctx`.
pub fn evaluate_expression(
    expr: &SparqlExpression,
    ctx: &mut EvaluationContext<'_>,
) -> EvalResult<ExpressionResult> {
    ExpressionEvaluator::new(ctx).evaluate(expr)
}

/// One value per row of the current slice.
pub fn expand_result(
    result: &ExpressionResult,
    ctx: &EvaluationContext<'_>,
) -> EvalResult<Vec<IdOrString>> {
    let size = ctx.size();
    let values = match result {
        ExpressionResult::Single(value) => vec![value.clone(); size],
        ExpressionResult::Values(values) => values.clone(),
        ExpressionResult::Ids(ids) => ids.iter().copied().map(IdOrString::Id).collect(),
        ExpressionResult::Variable(variable) => {
            let column = ctx.column_index_for_variable(variable)?;
            ctx.input()
                .column_values(column, ctx.begin(), ctx.end())
                .into_iter()
                .map(IdOrString::Id)
                .collect()
        }
    };
    if values.len() != size {
        return Err(ExpressionError::ResultSizeMismatch {
            expected: size,
            actual: values.len(),
        });
    }
    Ok(values)
}

/// Evaluate `expr` and turn the result into one id per row, e.g. for BIND.
/// Strings are added to the local vocabulary.
pub fn evaluate_to_ids(
    expr: &SparqlExpression,
    ctx: &mut EvaluationContext<'_>,
) -> EvalResult<Vec<ValueId>> {
    let result = evaluate_expression(expr, ctx)?;
    let values = expand_result(&result, ctx)?;
    Ok(values
        .into_iter()
        .map(|value| match value {
            IdOrString::Id(id) => id,
            IdOrString::Str(s) => ctx.local_vocab().get_id_and_add_if_not_contained(&s),
        })
        .collect())
}
