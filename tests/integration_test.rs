use anyhow::Result;
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vibeql::engine::{Layout, ResultCache, ResultTable};
use vibeql::expression::getters::IsIriValueGetter;
use vibeql::expression::{
    evaluate_expression, CancellationHandle, EvaluationContext, ExpressionError, ExpressionResult,
    IdOrString, LimitedIdVector, LiteralExpression, SparqlExpression, StringLiteral, ValueGetter,
    Variable, VariableToColumnMap,
};
use vibeql::global::ValueId;
use vibeql::vocab::{InMemoryVocabulary, LocalVocab, Vocabulary};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int_id(i: i64) -> ValueId {
    ValueId::make_from_int(i)
}

#[test]
fn test_layout_independence_with_random_rows() -> Result<()> {
    init_logging();
    let mut rng = rand::thread_rng();

    for width in 1..=5 {
        let row_count = rng.gen_range(0..200);
        let compact = ResultTable::with_layout(width, Layout::Compact);
        let generic = ResultTable::with_layout(width, Layout::Generic);
        assert!(compact.is_compact());
        assert!(!generic.is_compact());

        for _ in 0..row_count {
            let row: Vec<ValueId> = (0..width)
                .map(|_| int_id(rng.gen_range(-1000..1000)))
                .collect();
            compact.push_row(&row)?;
            generic.push_row(&row)?;
        }
        compact.mark_finished();
        generic.mark_finished();

        assert_eq!(compact.row_count(), row_count);
        assert_eq!(compact.materialize_rows(), generic.materialize_rows());
    }
    Ok(())
}

#[test]
fn test_many_readers_await_producer() -> Result<()> {
    init_logging();
    let table = Arc::new(ResultTable::new(2));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                table.await_finished();
                (table.is_finished(), table.row_count())
            })
        })
        .collect();

    for i in 0..100 {
        table.push_row(&[int_id(i), int_id(i * 2)])?;
    }
    thread::sleep(Duration::from_millis(10));
    table.mark_finished();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), (true, 100));
    }
    Ok(())
}

#[test]
fn test_take_and_clone() -> Result<()> {
    let mut original = ResultTable::new(1);
    original.push_row(&[int_id(1)])?;
    original.push_row(&[int_id(2)])?;
    original.mark_finished();

    let copy = original.clone();
    let moved = original.take();

    assert_eq!(original.row_count(), 0);
    assert!(!original.is_finished());
    assert_eq!(moved.row_count(), 2);
    assert!(moved.is_finished());

    let mut copy = copy;
    copy.clear();
    copy.push_row(&[int_id(9)])?;
    assert_eq!(moved.materialize_rows(), vec![vec![int_id(1)], vec![int_id(2)]]);
    Ok(())
}

#[test]
fn test_result_cache_shares_finished_tables() {
    init_logging();
    let cache = Arc::new(ResultCache::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let entry = cache.try_emplace("#column_0#".to_string(), || {
                    let table = ResultTable::new(1);
                    let _ = table.push_row(&[int_id(42)]);
                    table.mark_finished();
                    table
                });
                entry.value.await_finished();
                (entry.inserted, entry.value.at(0, 0))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|(inserted, _)| *inserted).count(), 1);
    assert!(results.iter().all(|(_, value)| *value == Some(int_id(42))));
}

struct Query {
    table: ResultTable,
    columns: VariableToColumnMap,
    vocab: InMemoryVocabulary,
    local: LocalVocab,
}

impl Query {
    /// Rows of (?x, ?y, ?g) with ?g = 7 everywhere.
    fn new(rows: usize) -> Result<Self> {
        let table = ResultTable::new(3);
        for i in 0..rows as i64 {
            table.push_row(&[int_id(i), int_id(i + 100), int_id(7)])?;
        }
        table.mark_finished();
        Ok(Self {
            table,
            columns: [
                (Variable::new("?x"), 0),
                (Variable::new("?y"), 1),
                (Variable::new("?g"), 2),
            ]
            .into_iter()
            .collect(),
            vocab: InMemoryVocabulary::new(["<http://x>", "\"plain\""]),
            local: LocalVocab::new(),
        })
    }

    fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext::new(
            &self.table,
            &self.columns,
            &self.vocab,
            &self.local,
            Arc::new(CancellationHandle::new()),
        )
    }
}

#[test]
fn test_concurrent_literal_evaluation() -> Result<()> {
    init_logging();
    let query = Query::new(0)?;
    let expected: ExpressionResult = query.vocab.get_id("<http://x>").unwrap().into();

    for _ in 0..100 {
        let iri = LiteralExpression::iri("<http://x>");
        let missing = LiteralExpression::literal(StringLiteral::new("\"missing\""));
        thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        let ctx = query.context();
                        (iri.evaluate(&ctx).unwrap(), missing.evaluate(&ctx).unwrap())
                    })
                })
                .collect();
            for handle in handles {
                let (iri_result, missing_result) = handle.join().unwrap();
                assert_eq!(iri_result, expected);
                assert_eq!(
                    missing_result,
                    ExpressionResult::Single(IdOrString::from("\"missing\""))
                );
            }
        });
    }
    Ok(())
}

#[test]
fn test_alias_chain_collapses() -> Result<()> {
    let query = Query::new(3)?;
    let mut ctx = query.context();
    ctx.set_result_from_previous_aggregate(Variable::new("?x"), int_id(5).into());
    ctx.set_result_from_previous_aggregate(
        Variable::new("?y"),
        ExpressionResult::Variable(Variable::new("?x")),
    );
    ctx.set_result_from_previous_aggregate(
        Variable::new("?z"),
        ExpressionResult::Variable(Variable::new("?y")),
    );

    let result = evaluate_expression(&SparqlExpression::variable("z"), &mut ctx)?;
    assert_eq!(result, int_id(5).into());
    Ok(())
}

#[test]
fn test_grouped_variable_inside_and_outside_aggregate() -> Result<()> {
    let query = Query::new(4)?;
    let mut ctx = query
        .context()
        .with_grouped_variables([Variable::new("?g")]);

    let g = evaluate_expression(&SparqlExpression::variable("g"), &mut ctx)?;
    assert_eq!(g, int_id(7).into());

    let sum = evaluate_expression(
        &SparqlExpression::sum(false, SparqlExpression::variable("g")),
        &mut ctx,
    )?;
    assert_eq!(sum, int_id(28).into());
    Ok(())
}

#[test]
fn test_is_iri_on_ids_and_strings() -> Result<()> {
    let query = Query::new(0)?;
    let ctx = query.context();
    let getter = IsIriValueGetter::new();
    let yes = ValueId::make_from_bool(true);
    let no = ValueId::make_from_bool(false);

    let id = query.vocab.get_id("<http://x>").unwrap();
    assert_eq!(getter.get(&IdOrString::Id(id), &ctx), yes);
    assert_eq!(getter.get(&IdOrString::from("<http://x>"), &ctx), yes);
    assert_eq!(getter.get(&IdOrString::from("plain"), &ctx), no);
    Ok(())
}

#[test]
fn test_cache_keys() -> Result<()> {
    let mut query = Query::new(0)?;
    query.columns.insert(Variable::new("?renamed_x"), 0);

    let x = SparqlExpression::not(SparqlExpression::variable("x"));
    let renamed = SparqlExpression::not(SparqlExpression::variable("renamed_x"));
    assert_eq!(x.cache_key(&query.columns)?, renamed.cache_key(&query.columns)?);

    let vector = LimitedIdVector::from_ids(vec![int_id(1)], 1024)?;
    let err = LiteralExpression::id_vector(vector)
        .cache_key(&query.columns)
        .unwrap_err();
    assert!(matches!(err, ExpressionError::NotCacheable { .. }));
    Ok(())
}

#[test]
fn test_cancellation_is_distinct_from_errors() -> Result<()> {
    let query = Query::new(10)?;
    let cancellation = Arc::new(CancellationHandle::new());
    let mut ctx = EvaluationContext::new(
        &query.table,
        &query.columns,
        &query.vocab,
        &query.local,
        Arc::clone(&cancellation),
    );

    let expr = SparqlExpression::count(false, SparqlExpression::variable("x"));
    assert_eq!(evaluate_expression(&expr, &mut ctx)?, int_id(10).into());

    cancellation.cancel();
    let err = evaluate_expression(&expr, &mut ctx).unwrap_err();
    assert!(err.is_cancellation());
    Ok(())
}
