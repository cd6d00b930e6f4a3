//! Everything an expression needs to know while it is evaluated.

use crate::config::EngineConfig;
use crate::engine::ResultTable;
use crate::expression::cancellation::CancellationHandle;
use crate::expression::error::{EvalResult, ExpressionError};
use crate::expression::value::ExpressionResult;
use crate::expression::variable::{Variable, VariableToColumnMap};
use crate::global::{Datatype, ValueId};
use crate::vocab::{LocalVocab, Vocabulary};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A per-evaluation view on the rows `[begin, end)` of an input table.
///
/// The context borrows the input table, the variable mapping and the
/// vocabularies, and must not outlive the evaluation it was created for.
pub struct EvaluationContext<'a> {
    input: &'a ResultTable,
    begin: usize,
    end: usize,
    variable_columns: &'a VariableToColumnMap,
    /// Variables that are constant within the current slice due to GROUP BY.
    grouped_variables: HashSet<Variable>,
    inside_aggregate: bool,
    /// Values bound by earlier `(expression AS ?variable)` of the same SELECT clause.
    previous_results: HashMap<Variable, ExpressionResult>,
    cancellation: Arc<CancellationHandle>,
    vocabulary: &'a dyn Vocabulary,
    local_vocab: &'a LocalVocab,
    cancellation_check_interval: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a context over all rows of `input`.
    pub fn new(
        input: &'a ResultTable,
        variable_columns: &'a VariableToColumnMap,
        vocabulary: &'a dyn Vocabulary,
        local_vocab: &'a LocalVocab,
        cancellation: Arc<CancellationHandle>,
    ) -> Self {
        Self {
            input,
            begin: 0,
            end: input.row_count(),
            variable_columns,
            grouped_variables: HashSet::new(),
            inside_aggregate: false,
            previous_results: HashMap::new(),
            cancellation,
            vocabulary,
            local_vocab,
            cancellation_check_interval: EngineConfig::default().cancellation_check_interval,
        }
    }

    /// Restrict the context to the rows `[begin, end)`.
    pub fn with_range(mut self, begin: usize, end: usize) -> Self {
        self.set_range(begin, end);
        self
    }

    pub fn with_grouped_variables(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.grouped_variables = variables.into_iter().collect();
        self
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.cancellation_check_interval = config.cancellation_check_interval.max(1);
        self
    }

    /// Move the context to the rows `[begin, end)`, clamped to the input size.
    pub fn set_range(&mut self, begin: usize, end: usize) {
        let rows = self.input.row_count();
        self.end = end.min(rows);
        self.begin = begin.min(self.end);
    }

    pub fn input(&self) -> &'a ResultTable {
        self.input
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of rows in the current slice.
    pub fn size(&self) -> usize {
        self.end - self.begin
    }

    pub fn vocabulary(&self) -> &'a dyn Vocabulary {
        self.vocabulary
    }

    pub fn local_vocab(&self) -> &'a LocalVocab {
        self.local_vocab
    }

    pub fn cancellation(&self) -> &Arc<CancellationHandle> {
        &self.cancellation
    }

    pub fn cancellation_check_interval(&self) -> usize {
        self.cancellation_check_interval
    }

    pub fn is_grouped(&self, variable: &Variable) -> bool {
        self.grouped_variables.contains(variable)
    }

    pub fn is_inside_aggregate(&self) -> bool {
        self.inside_aggregate
    }

    /// Sets the inside-aggregate flag and returns its previous value.
    pub fn set_inside_aggregate(&mut self, inside: bool) -> bool {
        std::mem::replace(&mut self.inside_aggregate, inside)
    }

    /// Record the value an earlier alias of the same SELECT clause bound to `variable`.
    pub fn set_result_from_previous_aggregate(
        &mut self,
        variable: Variable,
        result: ExpressionResult,
    ) {
        self.previous_results.insert(variable, result);
    }

    pub fn result_from_previous_aggregate(&self, variable: &Variable) -> Option<&ExpressionResult> {
        self.previous_results.get(variable)
    }

    pub fn column_index_for_variable(&self, variable: &Variable) -> EvalResult<usize> {
        self.variable_columns
            .column_index(variable)
            .ok_or_else(|| ExpressionError::UnknownVariable {
                variable: variable.name().to_string(),
            })
    }

    /// Abort with `ExpressionError::Cancelled` if cancellation was requested.
    pub fn check_cancellation(&self, detail: &str) -> EvalResult<()> {
        self.cancellation
            .throw_if_cancelled(|| detail.to_string())
            .map_err(Into::into)
    }

    /// The lexical form of a vocabulary or local vocabulary id.
    pub fn word_for_id(&self, id: ValueId) -> Option<String> {
        match id.datatype() {
            Datatype::VocabIndex => self
                .vocabulary
                .index_to_string(id.get_vocab_index()?),
            Datatype::LocalVocabIndex => self.local_vocab.get_word(id.get_local_vocab_index()?),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::InMemoryVocabulary;

    #[test]
    fn test_range_is_clamped() {
        let table = ResultTable::new(1);
        for i in 0..5 {
            table.push_row(&[ValueId::make_from_int(i)]).unwrap();
        }
        let map = VariableToColumnMap::new();
        let vocab = InMemoryVocabulary::default();
        let local = LocalVocab::new();
        let cancel = Arc::new(CancellationHandle::new());

        let mut ctx = EvaluationContext::new(&table, &map, &vocab, &local, cancel);
        assert_eq!(ctx.size(), 5);

        ctx.set_range(2, 10);
        assert_eq!((ctx.begin(), ctx.end(), ctx.size()), (2, 5, 3));

        ctx.set_range(7, 9);
        assert_eq!(ctx.size(), 0);
    }

    #[test]
    fn test_unknown_variable() {
        let table = ResultTable::new(1);
        let map: VariableToColumnMap = [(Variable::new("?a"), 0)].into_iter().collect();
        let vocab = InMemoryVocabulary::default();
        let local = LocalVocab::new();
        let ctx = EvaluationContext::new(
            &table,
            &map,
            &vocab,
            &local,
            Arc::new(CancellationHandle::new()),
        );

        assert_eq!(ctx.column_index_for_variable(&Variable::new("?a")), Ok(0));
        assert_eq!(
            ctx.column_index_for_variable(&Variable::new("?b")),
            Err(ExpressionError::UnknownVariable {
                variable: "?b".to_string()
            })
        );
    }

    #[test]
    fn test_word_for_id() {
        let table = ResultTable::new(1);
        let map = VariableToColumnMap::new();
        let vocab = InMemoryVocabulary::new(["<a>"]);
        let local = LocalVocab::new();
        let local_id = local.get_id_and_add_if_not_contained("\"new\"");
        let ctx = EvaluationContext::new(
            &table,
            &map,
            &vocab,
            &local,
            Arc::new(CancellationHandle::new()),
        );

        let vocab_id = vocab.get_id("<a>").unwrap();
        assert_eq!(ctx.word_for_id(vocab_id), Some("<a>".to_string()));
        assert_eq!(ctx.word_for_id(local_id), Some("\"new\"".to_string()));
        assert_eq!(ctx.word_for_id(ValueId::make_from_int(0)), None);
    }
}
