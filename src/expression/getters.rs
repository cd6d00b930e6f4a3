//! Value getters convert a single cell into the domain value an expression
//! works with: a number, a string, an effective boolean value, a date, ...
//!
//! Every getter handles the two cell kinds separately (`get_from_id` and
//! `get_from_str`). The dispatch over an [`IdOrString`] is implemented once, in
//! [`ValueGetter::get`], and shared by all getters.

use crate::expression::context::EvaluationContext;
use crate::expression::error::{EvalResult, ExpressionError};
use crate::expression::value::IdOrString;
use crate::global::{Datatype, Date, ValueId};
use crate::vocab::{self, BLANK_NODE_PREFIX, IRI_PREFIX, LITERAL_PREFIX};
use regex::Regex;
use std::marker::PhantomData;

/// Conversion of a cell into a domain value.
pub trait ValueGetter {
    type Output;

    fn get_from_id(&self, id: ValueId, ctx: &EvaluationContext<'_>) -> Self::Output;

    fn get_from_str(&self, s: &str, ctx: &EvaluationContext<'_>) -> Self::Output;

    fn get(&self, value: &IdOrString, ctx: &EvaluationContext<'_>) -> Self::Output {
        match value {
            IdOrString::Id(id) => self.get_from_id(*id, ctx),
            IdOrString::Str(s) => self.get_from_str(s, ctx),
        }
    }
}

/// Strip one leading and one trailing quote, but only if both are present.
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Input of numeric expressions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    NotNumeric,
    Int(i64),
    Double(f64),
}

impl NumericValue {
    /// Convert into an id. `NotNumeric` becomes undefined, and so does NaN if
    /// `nan_to_undef` is set.
    pub fn to_id(self, nan_to_undef: bool) -> ValueId {
        match self {
            NumericValue::NotNumeric => ValueId::make_undefined(),
            NumericValue::Int(i) => ValueId::make_from_int(i),
            NumericValue::Double(d) if nan_to_undef && d.is_nan() => ValueId::make_undefined(),
            NumericValue::Double(d) => ValueId::make_from_double(d),
        }
    }
}

/// Returns the number stored in an `Int` or `Double` id. Strings are never numeric.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericValueGetter;

impl ValueGetter for NumericValueGetter {
    type Output = NumericValue;

    fn get_from_id(&self, id: ValueId, _ctx: &EvaluationContext<'_>) -> NumericValue {
        match id.datatype() {
            Datatype::Int => id.get_int().map_or(NumericValue::NotNumeric, NumericValue::Int),
            Datatype::Double => id
                .get_double()
                .map_or(NumericValue::NotNumeric, NumericValue::Double),
            _ => NumericValue::NotNumeric,
        }
    }

    fn get_from_str(&self, _s: &str, _ctx: &EvaluationContext<'_>) -> NumericValue {
        NumericValue::NotNumeric
    }
}

/// Returns the value unchanged. Used where an aggregate needs the raw value,
/// e.g. to deduplicate for DISTINCT.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActualValueGetter;

impl ValueGetter for ActualValueGetter {
    type Output = IdOrString;

    fn get_from_id(&self, id: ValueId, _ctx: &EvaluationContext<'_>) -> IdOrString {
        IdOrString::Id(id)
    }

    fn get_from_str(&self, s: &str, _ctx: &EvaluationContext<'_>) -> IdOrString {
        IdOrString::Str(s.to_string())
    }
}

/// False for undefined values and NaN, true for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsValidValueGetter;

impl ValueGetter for IsValidValueGetter {
    type Output = bool;

    fn get_from_id(&self, id: ValueId, _ctx: &EvaluationContext<'_>) -> bool {
        match id.datatype() {
            Datatype::Undefined => false,
            Datatype::Double => !id.get_double().is_some_and(f64::is_nan),
            _ => true,
        }
    }

    fn get_from_str(&self, _s: &str, _ctx: &EvaluationContext<'_>) -> bool {
        true
    }
}

/// Three-valued effective boolean value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EbvResult {
    False,
    True,
    Undef,
}

impl EbvResult {
    pub fn from_bool(value: bool) -> Self {
        if value {
            EbvResult::True
        } else {
            EbvResult::False
        }
    }

    /// A boolean id, or undefined for `Undef`.
    pub fn to_id(self) -> ValueId {
        match self {
            EbvResult::False => ValueId::make_from_bool(false),
            EbvResult::True => ValueId::make_from_bool(true),
            EbvResult::Undef => ValueId::make_undefined(),
        }
    }
}

/// The effective boolean value (SPARQL 1.1, section 17.2.2) used by `&&`,
/// `||` and `!`. Terms without a boolean value (IRIs, blank nodes, dates,
/// undefined) yield `Undef`. A string cell is true unless it is empty; its
/// quotes are not stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveBooleanValueGetter;

impl ValueGetter for EffectiveBooleanValueGetter {
    type Output = EbvResult;

    fn get_from_id(&self, id: ValueId, ctx: &EvaluationContext<'_>) -> EbvResult {
        match id.datatype() {
            Datatype::Bool => EbvResult::from_bool(id.get_bool().unwrap_or(false)),
            Datatype::Int => EbvResult::from_bool(id.get_int().is_some_and(|i| i != 0)),
            Datatype::Double => {
                EbvResult::from_bool(id.get_double().is_some_and(|d| d != 0.0 && !d.is_nan()))
            }
            Datatype::VocabIndex | Datatype::LocalVocabIndex => {
                match ctx.word_for_id(id).as_deref().and_then(vocab::literal_content) {
                    Some(content) => EbvResult::from_bool(!content.is_empty()),
                    None => EbvResult::Undef,
                }
            }
            Datatype::Undefined
            | Datatype::Date
            | Datatype::TextRecordIndex
            | Datatype::WordVocabIndex => EbvResult::Undef,
        }
    }

    fn get_from_str(&self, s: &str, _ctx: &EvaluationContext<'_>) -> EbvResult {
        EbvResult::from_bool(!s.is_empty())
    }
}

/// The string form of a value, as produced by `STR()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValueGetter;

impl ValueGetter for StringValueGetter {
    type Output = Option<String>;

    fn get_from_id(&self, id: ValueId, ctx: &EvaluationContext<'_>) -> Option<String> {
        match id.datatype() {
            Datatype::Bool => id.get_bool().map(|b| b.to_string()),
            Datatype::Int => id.get_int().map(|i| i.to_string()),
            Datatype::Double => id.get_double().map(|d| d.to_string()),
            Datatype::Date => id.get_date().map(|date| date.to_string()),
            Datatype::VocabIndex | Datatype::LocalVocabIndex => {
                let word = ctx.word_for_id(id)?;
                let content = vocab::literal_content(&word)
                    .or_else(|| vocab::iri_content(&word))
                    .unwrap_or(&word);
                Some(content.to_string())
            }
            Datatype::Undefined | Datatype::TextRecordIndex | Datatype::WordVocabIndex => None,
        }
    }

    fn get_from_str(&self, s: &str, _ctx: &EvaluationContext<'_>) -> Option<String> {
        Some(strip_quotes(s).to_string())
    }
}

/// Predicate on the kind of an RDF term, checked via the lexical prefix for
/// strings and via the vocabulary for ids.
pub trait TermPredicate {
    const PREFIX: &'static str;

    fn matches_id(id: ValueId, ctx: &EvaluationContext<'_>) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct IriTerm;

impl TermPredicate for IriTerm {
    const PREFIX: &'static str = IRI_PREFIX;

    fn matches_id(id: ValueId, ctx: &EvaluationContext<'_>) -> bool {
        ctx.word_for_id(id).is_some_and(|word| vocab::is_iri(&word))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlankNodeTerm;

impl TermPredicate for BlankNodeTerm {
    const PREFIX: &'static str = BLANK_NODE_PREFIX;

    fn matches_id(id: ValueId, ctx: &EvaluationContext<'_>) -> bool {
        ctx.word_for_id(id).is_some_and(|word| vocab::is_blank_node(&word))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LiteralTerm;

impl TermPredicate for LiteralTerm {
    const PREFIX: &'static str = LITERAL_PREFIX;

    // Inlined values (numbers, booleans, dates) are literals as well.
    fn matches_id(id: ValueId, ctx: &EvaluationContext<'_>) -> bool {
        match id.datatype() {
            Datatype::Bool | Datatype::Int | Datatype::Double | Datatype::Date => true,
            Datatype::VocabIndex | Datatype::LocalVocabIndex => ctx
                .word_for_id(id)
                .is_some_and(|word| vocab::is_literal(&word)),
            Datatype::Undefined | Datatype::TextRecordIndex | Datatype::WordVocabIndex => false,
        }
    }
}

/// Getter for `isIRI`, `isBlank` and `isLiteral`. Produces a boolean id.
#[derive(Debug, Clone, Copy)]
pub struct IsSomethingValueGetter<P> {
    _predicate: PhantomData<fn() -> P>,
}

impl<P> IsSomethingValueGetter<P> {
    pub const fn new() -> Self {
        Self {
            _predicate: PhantomData,
        }
    }
}

impl<P> Default for IsSomethingValueGetter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: TermPredicate> ValueGetter for IsSomethingValueGetter<P> {
    type Output = ValueId;

    fn get_from_id(&self, id: ValueId, ctx: &EvaluationContext<'_>) -> ValueId {
        ValueId::make_from_bool(P::matches_id(id, ctx))
    }

    fn get_from_str(&self, s: &str, _ctx: &EvaluationContext<'_>) -> ValueId {
        ValueId::make_from_bool(s.starts_with(P::PREFIX))
    }
}

pub type IsIriValueGetter = IsSomethingValueGetter<IriTerm>;
pub type IsBlankNodeValueGetter = IsSomethingValueGetter<BlankNodeTerm>;
pub type IsLiteralValueGetter = IsSomethingValueGetter<LiteralTerm>;

/// Getter for `isNumeric`: true exactly for `Int` and `Double` ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsNumericValueGetter;

impl ValueGetter for IsNumericValueGetter {
    type Output = ValueId;

    fn get_from_id(&self, id: ValueId, _ctx: &EvaluationContext<'_>) -> ValueId {
        ValueId::make_from_bool(id.datatype().is_numeric())
    }

    fn get_from_str(&self, _s: &str, _ctx: &EvaluationContext<'_>) -> ValueId {
        ValueId::make_from_bool(false)
    }
}

/// The date stored in a `Date` id. Strings are not parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateValueGetter;

impl ValueGetter for DateValueGetter {
    type Output = Option<Date>;

    fn get_from_id(&self, id: ValueId, _ctx: &EvaluationContext<'_>) -> Option<Date> {
        id.get_date()
    }

    fn get_from_str(&self, _s: &str, _ctx: &EvaluationContext<'_>) -> Option<Date> {
        None
    }
}

/// The content of a literal, without quotes. Ids that do not point to a
/// literal (IRIs, numbers, ...) yield `None`, so that string functions can
/// tell real literals from values that were merely converted to a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralFromIdGetter;

impl ValueGetter for LiteralFromIdGetter {
    type Output = Option<String>;

    fn get_from_id(&self, id: ValueId, ctx: &EvaluationContext<'_>) -> Option<String> {
        match id.datatype() {
            Datatype::VocabIndex | Datatype::LocalVocabIndex => {
                let word = ctx.word_for_id(id)?;
                vocab::literal_content(&word).map(str::to_string)
            }
            _ => None,
        }
    }

    fn get_from_str(&self, s: &str, _ctx: &EvaluationContext<'_>) -> Option<String> {
        Some(strip_quotes(s).to_string())
    }
}

/// Compiles the string form of a value into a regular expression.
///
/// Values without a string form yield `Ok(None)`. A malformed pattern is a
/// static error of the query and is returned as `ExpressionError::InvalidRegex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexValueGetter;

impl RegexValueGetter {
    fn compile(pattern: Option<String>) -> EvalResult<Option<Regex>> {
        let Some(pattern) = pattern else {
            return Ok(None);
        };
        Regex::new(&pattern)
            .map(Some)
            .map_err(|err| ExpressionError::InvalidRegex {
                pattern,
                message: err.to_string(),
            })
    }
}

impl ValueGetter for RegexValueGetter {
    type Output = EvalResult<Option<Regex>>;

    fn get_from_id(&self, id: ValueId, ctx: &EvaluationContext<'_>) -> Self::Output {
        Self::compile(StringValueGetter.get_from_id(id, ctx))
    }

    fn get_from_str(&self, s: &str, ctx: &EvaluationContext<'_>) -> Self::Output {
        Self::compile(StringValueGetter.get_from_str(s, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ResultTable;
    use crate::expression::cancellation::CancellationHandle;
    use crate::expression::variable::VariableToColumnMap;
    use crate::vocab::{InMemoryVocabulary, LocalVocab, Vocabulary};
    use std::sync::Arc;

    struct Fixture {
        table: ResultTable,
        map: VariableToColumnMap,
        vocab: InMemoryVocabulary,
        local: LocalVocab,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                table: ResultTable::new(1),
                map: VariableToColumnMap::new(),
                vocab: InMemoryVocabulary::new([
                    "<http://example.org/x>",
                    "_:b1",
                    "\"hello\"",
                    "\"\"",
                    "\"bonjour\"@fr",
                ]),
                local: LocalVocab::new(),
            }
        }

        fn ctx(&self) -> EvaluationContext<'_> {
            EvaluationContext::new(
                &self.table,
                &self.map,
                &self.vocab,
                &self.local,
                Arc::new(CancellationHandle::new()),
            )
        }

        fn id(&self, word: &str) -> ValueId {
            self.vocab.get_id(word).unwrap()
        }
    }

    fn int(i: i64) -> IdOrString {
        IdOrString::Id(ValueId::make_from_int(i))
    }

    fn double(d: f64) -> IdOrString {
        IdOrString::Id(ValueId::make_from_double(d))
    }

    fn undef() -> IdOrString {
        IdOrString::Id(ValueId::make_undefined())
    }

    #[test]
    fn test_numeric_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let getter = NumericValueGetter;

        assert_eq!(getter.get(&int(3), &ctx), NumericValue::Int(3));
        assert_eq!(getter.get(&double(2.5), &ctx), NumericValue::Double(2.5));
        assert_eq!(getter.get(&undef(), &ctx), NumericValue::NotNumeric);
        assert_eq!(
            getter.get(&IdOrString::from("42"), &ctx),
            NumericValue::NotNumeric
        );
        let date = ValueId::make_from_date(Date::new(2000, 1, 1).unwrap());
        assert_eq!(getter.get_from_id(date, &ctx), NumericValue::NotNumeric);
    }

    #[test]
    fn test_numeric_value_to_id() {
        assert_eq!(NumericValue::Int(4).to_id(false), ValueId::make_from_int(4));
        assert!(NumericValue::Double(f64::NAN).to_id(true).is_undefined());
        assert_eq!(
            NumericValue::Double(f64::NAN).to_id(false).datatype(),
            Datatype::Double
        );
        assert!(NumericValue::NotNumeric.to_id(false).is_undefined());
    }

    #[test]
    fn test_actual_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert_eq!(ActualValueGetter.get(&int(1), &ctx), int(1));
        assert_eq!(
            ActualValueGetter.get(&IdOrString::from("\"x\""), &ctx),
            IdOrString::from("\"x\"")
        );
    }

    #[test]
    fn test_is_valid_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();
        assert!(!IsValidValueGetter.get(&undef(), &ctx));
        assert!(!IsValidValueGetter.get(&double(f64::NAN), &ctx));
        assert!(IsValidValueGetter.get(&double(0.0), &ctx));
        assert!(IsValidValueGetter.get(&int(0), &ctx));
        assert!(IsValidValueGetter.get(&IdOrString::from(""), &ctx));
    }

    #[test]
    fn test_effective_boolean_value() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let ebv = EffectiveBooleanValueGetter;

        assert_eq!(ebv.get(&undef(), &ctx), EbvResult::Undef);
        assert_eq!(ebv.get(&int(0), &ctx), EbvResult::False);
        assert_eq!(ebv.get(&int(-2), &ctx), EbvResult::True);
        assert_eq!(ebv.get(&double(0.0), &ctx), EbvResult::False);
        assert_eq!(ebv.get(&double(f64::NAN), &ctx), EbvResult::False);
        assert_eq!(ebv.get(&double(0.1), &ctx), EbvResult::True);
        assert_eq!(
            ebv.get_from_id(ValueId::make_from_bool(true), &ctx),
            EbvResult::True
        );
        assert_eq!(ebv.get(&IdOrString::from(""), &ctx), EbvResult::False);
        assert_eq!(ebv.get(&IdOrString::from("a"), &ctx), EbvResult::True);

        assert_eq!(ebv.get_from_id(f.id("\"hello\""), &ctx), EbvResult::True);
        assert_eq!(ebv.get_from_id(f.id("\"\""), &ctx), EbvResult::False);
        assert_eq!(
            ebv.get_from_id(f.id("<http://example.org/x>"), &ctx),
            EbvResult::Undef
        );
    }

    #[test]
    fn test_ebv_of_string_cells_keeps_quotes() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let ebv = EffectiveBooleanValueGetter;

        assert_eq!(ebv.get(&IdOrString::from("\"\""), &ctx), EbvResult::True);
        assert_eq!(ebv.get(&IdOrString::from("\"0\""), &ctx), EbvResult::True);
        assert_eq!(ebv.get(&IdOrString::from(""), &ctx), EbvResult::False);
    }

    #[test]
    fn test_ebv_to_id() {
        assert_eq!(EbvResult::True.to_id(), ValueId::make_from_bool(true));
        assert!(EbvResult::Undef.to_id().is_undefined());
    }

    #[test]
    fn test_string_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let getter = StringValueGetter;

        assert_eq!(getter.get_from_str("\"abc\"", &ctx), Some("abc".to_string()));
        assert_eq!(getter.get_from_str("\"abc", &ctx), Some("\"abc".to_string()));
        assert_eq!(getter.get_from_str("\"", &ctx), Some("\"".to_string()));
        assert_eq!(getter.get_from_str("plain", &ctx), Some("plain".to_string()));

        assert_eq!(getter.get(&int(12), &ctx), Some("12".to_string()));
        assert_eq!(getter.get(&undef(), &ctx), None);
        assert_eq!(
            getter.get_from_id(f.id("\"bonjour\"@fr"), &ctx),
            Some("bonjour".to_string())
        );
        assert_eq!(
            getter.get_from_id(f.id("<http://example.org/x>"), &ctx),
            Some("http://example.org/x".to_string())
        );
    }

    #[test]
    fn test_is_something_value_getters() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let yes = ValueId::make_from_bool(true);
        let no = ValueId::make_from_bool(false);

        let iri = IsIriValueGetter::new();
        assert_eq!(iri.get_from_id(f.id("<http://example.org/x>"), &ctx), yes);
        assert_eq!(iri.get(&IdOrString::from("<http://x>"), &ctx), yes);
        assert_eq!(iri.get(&IdOrString::from("plain"), &ctx), no);
        assert_eq!(iri.get_from_id(f.id("\"hello\""), &ctx), no);

        let blank = IsBlankNodeValueGetter::new();
        assert_eq!(blank.get_from_id(f.id("_:b1"), &ctx), yes);
        assert_eq!(blank.get(&IdOrString::from("_:x"), &ctx), yes);
        assert_eq!(blank.get(&IdOrString::from("<x>"), &ctx), no);

        let literal = IsLiteralValueGetter::new();
        assert_eq!(literal.get_from_id(f.id("\"hello\""), &ctx), yes);
        assert_eq!(literal.get(&int(5), &ctx), yes);
        assert_eq!(literal.get(&IdOrString::from("\"quoted\""), &ctx), yes);
        assert_eq!(literal.get(&undef(), &ctx), no);
    }

    #[test]
    fn test_is_numeric_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let yes = ValueId::make_from_bool(true);
        let no = ValueId::make_from_bool(false);

        assert_eq!(IsNumericValueGetter.get(&int(1), &ctx), yes);
        assert_eq!(IsNumericValueGetter.get(&double(1.0), &ctx), yes);
        let date = ValueId::make_from_date(Date::new(2000, 1, 1).unwrap());
        assert_eq!(IsNumericValueGetter.get_from_id(date, &ctx), no);
        assert_eq!(IsNumericValueGetter.get(&IdOrString::from("1"), &ctx), no);
    }

    #[test]
    fn test_date_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let date = Date::new(1990, 5, 17).unwrap();

        assert_eq!(
            DateValueGetter.get_from_id(ValueId::make_from_date(date), &ctx),
            Some(date)
        );
        assert_eq!(DateValueGetter.get(&int(1990), &ctx), None);
        assert_eq!(
            DateValueGetter.get(&IdOrString::from("1990-05-17"), &ctx),
            None
        );
    }

    #[test]
    fn test_literal_from_id_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();

        assert_eq!(
            LiteralFromIdGetter.get_from_id(f.id("\"hello\""), &ctx),
            Some("hello".to_string())
        );
        assert_eq!(
            LiteralFromIdGetter.get_from_id(f.id("<http://example.org/x>"), &ctx),
            None
        );
        assert_eq!(LiteralFromIdGetter.get(&int(3), &ctx), None);
        assert_eq!(
            LiteralFromIdGetter.get_from_str("\"x\"", &ctx),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_regex_value_getter() {
        let f = Fixture::new();
        let ctx = f.ctx();

        let regex = RegexValueGetter
            .get(&IdOrString::from("\"^h.*o$\""), &ctx)
            .unwrap()
            .unwrap();
        assert!(regex.is_match("hello"));

        assert!(RegexValueGetter.get(&undef(), &ctx).unwrap().is_none());

        let err = RegexValueGetter
            .get(&IdOrString::from("(unclosed"), &ctx)
            .unwrap_err();
        assert!(matches!(err, ExpressionError::InvalidRegex { ref pattern, .. } if pattern == "(unclosed"));
    }
}
