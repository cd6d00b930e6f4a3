//! Per-group accumulators for the aggregate functions.
//!
//! An accumulator consumes the values of one group one by one and produces a
//! single id at the end. They are used by aggregate expressions and can be
//! driven directly by a hash-based GROUP BY.

use crate::expression::context::EvaluationContext;
use crate::expression::expr::AggregateFunction;
use crate::expression::getters::{
    ActualValueGetter, IsValidValueGetter, NumericValue, NumericValueGetter, StringValueGetter,
    ValueGetter,
};
use crate::expression::value::IdOrString;
use crate::global::{Datatype, ValueId};
use crate::vocab::LocalVocab;
use std::borrow::Cow;
use std::cmp::Ordering;

/// State of one aggregate over one group.
pub trait AggregationData: Send {
    fn add_value(&mut self, value: &IdOrString, ctx: &EvaluationContext<'_>);

    /// The aggregate of all values added so far. Strings that are produced
    /// by the aggregate are stored in `local_vocab`.
    fn calculate_result(&self, local_vocab: &LocalVocab) -> ValueId;
}

/// Creates an empty accumulator for `function`.
pub fn make_aggregation_data(
    function: AggregateFunction,
    separator: &str,
) -> Box<dyn AggregationData> {
    match function {
        AggregateFunction::Count => Box::<CountAggregationData>::default(),
        AggregateFunction::Sum => Box::<SumAggregationData>::default(),
        AggregateFunction::Avg => Box::<AvgAggregationData>::default(),
        AggregateFunction::Min => Box::new(ExtremumAggregationData::min()),
        AggregateFunction::Max => Box::new(ExtremumAggregationData::max()),
        AggregateFunction::GroupConcat => Box::new(GroupConcatAggregationData::new(separator)),
    }
}

#[derive(Debug, Default, Clone)]
pub struct CountAggregationData {
    count: i64,
}

impl AggregationData for CountAggregationData {
    fn add_value(&mut self, value: &IdOrString, ctx: &EvaluationContext<'_>) {
        if IsValidValueGetter.get(value, ctx) {
            self.count += 1;
        }
    }

    fn calculate_result(&self, _local_vocab: &LocalVocab) -> ValueId {
        ValueId::make_from_int(self.count)
    }
}

/// Running sum that stays an integer as long as every input is one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Sum {
    Int(i64),
    Double(f64),
    Undefined,
}

impl Sum {
    fn add(self, value: NumericValue) -> Sum {
        match (self, value) {
            (Sum::Undefined, _) | (_, NumericValue::NotNumeric) => Sum::Undefined,
            (Sum::Int(a), NumericValue::Int(b)) => match a.checked_add(b) {
                Some(sum) => Sum::Int(sum),
                None => Sum::Double(a as f64 + b as f64),
            },
            (Sum::Int(a), NumericValue::Double(b)) => Sum::Double(a as f64 + b),
            (Sum::Double(a), NumericValue::Int(b)) => Sum::Double(a + b as f64),
            (Sum::Double(a), NumericValue::Double(b)) => Sum::Double(a + b),
        }
    }

    fn as_f64(self) -> Option<f64> {
        match self {
            Sum::Int(i) => Some(i as f64),
            Sum::Double(d) => Some(d),
            Sum::Undefined => None,
        }
    }
}

/// SUM: an `Int` if all inputs were `Int`, a `Double` otherwise, undefined
/// as soon as a non-numeric value is added. The empty sum is `0`.
#[derive(Debug, Clone)]
pub struct SumAggregationData {
    sum: Sum,
}

impl Default for SumAggregationData {
    fn default() -> Self {
        Self { sum: Sum::Int(0) }
    }
}

impl AggregationData for SumAggregationData {
    fn add_value(&mut self, value: &IdOrString, ctx: &EvaluationContext<'_>) {
        self.sum = self.sum.add(NumericValueGetter.get(value, ctx));
    }

    fn calculate_result(&self, _local_vocab: &LocalVocab) -> ValueId {
        match self.sum {
            Sum::Int(i) => ValueId::make_from_int(i),
            Sum::Double(d) => ValueId::make_from_double(d),
            Sum::Undefined => ValueId::make_undefined(),
        }
    }
}

/// AVG: always a `Double`, undefined as soon as a non-numeric value is added.
#[derive(Debug, Clone)]
pub struct AvgAggregationData {
    sum: Sum,
    count: i64,
}

impl Default for AvgAggregationData {
    fn default() -> Self {
        Self {
            sum: Sum::Int(0),
            count: 0,
        }
    }
}

impl AggregationData for AvgAggregationData {
    fn add_value(&mut self, value: &IdOrString, ctx: &EvaluationContext<'_>) {
        self.sum = self.sum.add(NumericValueGetter.get(value, ctx));
        self.count += 1;
    }

    fn calculate_result(&self, _local_vocab: &LocalVocab) -> ValueId {
        match self.sum.as_f64() {
            Some(_) if self.count == 0 => ValueId::make_from_double(0.0),
            Some(sum) => ValueId::make_from_double(sum / self.count as f64),
            None => ValueId::make_undefined(),
        }
    }
}

/// Order used by MIN and MAX.
///
/// Numbers compare by value across `Int` and `Double` and sort first. Then
/// come other ids without a string form, by datatype and payload. Vocabulary
/// ids, local vocabulary ids and strings sort last, by their lexical form.
pub fn compare_values(a: &IdOrString, b: &IdOrString, ctx: &EvaluationContext<'_>) -> Ordering {
    SortKey::of(a, ctx).cmp_key(&SortKey::of(b, ctx))
}

enum SortKey<'a> {
    Int(i64),
    Double(f64),
    Other(ValueId),
    Word(Cow<'a, str>),
}

impl<'a> SortKey<'a> {
    fn of(value: &'a IdOrString, ctx: &EvaluationContext<'_>) -> Self {
        match value {
            IdOrString::Str(s) => SortKey::Word(Cow::Borrowed(s)),
            IdOrString::Id(id) => match id.datatype() {
                Datatype::Int => id.get_int().map_or(SortKey::Other(*id), SortKey::Int),
                Datatype::Double => id.get_double().map_or(SortKey::Other(*id), SortKey::Double),
                _ => ctx
                    .word_for_id(*id)
                    .map_or(SortKey::Other(*id), |word| SortKey::Word(Cow::Owned(word))),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Int(_) | SortKey::Double(_) => 0,
            SortKey::Other(_) => 1,
            SortKey::Word(_) => 2,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            SortKey::Int(i) => Some(*i as f64),
            SortKey::Double(d) => Some(*d),
            _ => None,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Other(a), SortKey::Other(b)) => a.cmp(b),
            (SortKey::Word(a), SortKey::Word(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

/// MIN or MAX. Undefined values are skipped; an empty group yields undefined.
#[derive(Debug, Clone)]
pub struct ExtremumAggregationData {
    /// The ordering a new value must have relative to the current one to replace it.
    replace_if: Ordering,
    current: Option<IdOrString>,
}

impl ExtremumAggregationData {
    pub fn min() -> Self {
        Self {
            replace_if: Ordering::Less,
            current: None,
        }
    }

    pub fn max() -> Self {
        Self {
            replace_if: Ordering::Greater,
            current: None,
        }
    }
}

impl AggregationData for ExtremumAggregationData {
    fn add_value(&mut self, value: &IdOrString, ctx: &EvaluationContext<'_>) {
        if !IsValidValueGetter.get(value, ctx) {
            return;
        }
        let replace = match &self.current {
            None => true,
            Some(current) => compare_values(value, current, ctx) == self.replace_if,
        };
        if replace {
            self.current = Some(ActualValueGetter.get(value, ctx));
        }
    }

    fn calculate_result(&self, local_vocab: &LocalVocab) -> ValueId {
        match &self.current {
            None => ValueId::make_undefined(),
            Some(IdOrString::Id(id)) => *id,
            Some(IdOrString::Str(s)) => local_vocab.get_id_and_add_if_not_contained(s),
        }
    }
}

/// GROUP_CONCAT. Values without a string form are skipped.
#[derive(Debug, Clone)]
pub struct GroupConcatAggregationData {
    separator: String,
    result: String,
    is_first: bool,
}

impl GroupConcatAggregationData {
    pub fn new(separator: &str) -> Self {
        Self {
            separator: separator.to_string(),
            result: String::new(),
            is_first: true,
        }
    }
}

impl AggregationData for GroupConcatAggregationData {
    fn add_value(&mut self, value: &IdOrString, ctx: &EvaluationContext<'_>) {
        let Some(s) = StringValueGetter.get(value, ctx) else {
            return;
        };
        if !self.is_first {
            self.result.push_str(&self.separator);
        }
        self.result.push_str(&s);
        self.is_first = false;
    }

    fn calculate_result(&self, local_vocab: &LocalVocab) -> ValueId {
        local_vocab.get_id_and_add_if_not_contained(&format!("\"{}\"", self.result))
    }
}
