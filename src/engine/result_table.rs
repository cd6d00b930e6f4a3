//! The result table produced by query operators.
//!
//! A `ResultTable` is filled by exactly one producer and may be shared (e.g.
//! through an `Arc`) with consumers before it is complete. Consumers call
//! [`ResultTable::await_finished`] before reading. Once
//! [`ResultTable::mark_finished`] has been called the rows are immutable.

use crate::engine::status::CompletionStatus;
use crate::engine::storage::{RowStorage, MAX_FIXED_WIDTH};
use crate::global::ValueId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::mem;
use std::time::Duration;
use thiserror::Error;

/// How the ids of a column have to be interpreted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResultType {
    /// Ids of the knowledge base, resolved via the vocabulary.
    #[default]
    Kb,
    /// Verbatim values, e.g. counts.
    Verbatim,
    /// References into the full-text index.
    Text,
}

/// Storage layout requested at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed-size rows for 1 to 5 columns, generic rows otherwise.
    Compact,
    /// Always one vector per row.
    Generic,
}

/// Errors raised when writing to a result table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResultTableError {
    #[error("Cannot modify a result table that is already finished")]
    AlreadyFinished,

    #[error("Row has {actual} columns but the result table has {expected}")]
    RowWidthMismatch { expected: usize, actual: usize },
}

/// A computed (or still being computed) relation of `ValueId`s.
#[derive(Debug)]
pub struct ResultTable {
    column_count: usize,
    /// A value >= `column_count` means the rows are unsorted.
    sorted_by: usize,
    data: RwLock<RowStorage>,
    result_types: Vec<ResultType>,
    status: CompletionStatus,
}

impl ResultTable {
    /// Creates an empty, unfinished table with the compact layout for `column_count`.
    pub fn new(column_count: usize) -> Self {
        Self::with_layout(column_count, Layout::Compact)
    }

    pub fn with_layout(column_count: usize, layout: Layout) -> Self {
        let storage = match layout {
            Layout::Compact => RowStorage::for_width(column_count),
            Layout::Generic => RowStorage::generic(column_count),
        };
        Self {
            column_count,
            sorted_by: usize::MAX,
            data: RwLock::new(storage),
            result_types: Vec::new(),
            status: CompletionStatus::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Whether rows are stored with a fixed stride.
    pub fn is_compact(&self) -> bool {
        self.column_count <= MAX_FIXED_WIDTH && self.data.read().is_fixed()
    }

    /// The column the rows are sorted by, if any.
    pub fn sorted_by(&self) -> Option<usize> {
        (self.sorted_by < self.column_count).then_some(self.sorted_by)
    }

    /// Any value >= `column_count` marks the table as unsorted.
    pub fn set_sorted_by(&mut self, column: usize) {
        self.sorted_by = column;
    }

    /// The result type of `column`. Columns without an explicit type are `Kb`.
    pub fn result_type(&self, column: usize) -> ResultType {
        self.result_types.get(column).copied().unwrap_or_default()
    }

    pub fn set_result_types(&mut self, result_types: Vec<ResultType>) {
        self.result_types = result_types;
    }

    /// Appends a row. Only the producer may call this, and only before
    /// `mark_finished`.
    pub fn push_row(&self, row: &[ValueId]) -> Result<(), ResultTableError> {
        if row.len() != self.column_count {
            return Err(ResultTableError::RowWidthMismatch {
                expected: self.column_count,
                actual: row.len(),
            });
        }
        if self.status.is_finished() {
            return Err(ResultTableError::AlreadyFinished);
        }
        self.data.write().push(row);
        Ok(())
    }

    /// Appends many rows, see `push_row`.
    pub fn extend_rows<'r, I>(&self, rows: I) -> Result<(), ResultTableError>
    where
        I: IntoIterator<Item = &'r [ValueId]>,
    {
        for row in rows {
            self.push_row(row)?;
        }
        Ok(())
    }

    /// Marks the table as complete and wakes all threads in `await_finished`.
    pub fn mark_finished(&self) {
        if !self.status.is_finished() {
            log::debug!(
                "Result table with {} columns finished with {} rows",
                self.column_count,
                self.row_count()
            );
        }
        self.status.mark_finished();
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Blocks the calling thread until the table is finished.
    pub fn await_finished(&self) {
        self.status.await_finished();
    }

    /// Like `await_finished` with a timeout. Returns whether the table is finished.
    pub fn await_finished_for(&self, timeout: Duration) -> bool {
        self.status.await_finished_for(timeout)
    }

    /// Number of rows. Only stable once the table is finished.
    pub fn row_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// The id in `row` and `column`.
    pub fn at(&self, row: usize, column: usize) -> Option<ValueId> {
        self.data.read().get(row, column)
    }

    pub fn row(&self, index: usize) -> Option<Vec<ValueId>> {
        self.data.read().row(index).map(<[ValueId]>::to_vec)
    }

    /// The ids of `column` in the rows `[begin, end)`, clamped to the table size.
    pub fn column_values(&self, column: usize, begin: usize, end: usize) -> Vec<ValueId> {
        let data = self.data.read();
        let end = end.min(data.len());
        (begin.min(end)..end)
            .filter_map(|row| data.get(row, column))
            .collect()
    }

    /// Copies all rows into a vector of rows, independent of the storage layout.
    pub fn materialize_rows(&self) -> Vec<Vec<ValueId>> {
        self.data.read().to_rows()
    }

    /// Runs `f` with read access to the underlying storage.
    pub fn with_rows<R>(&self, f: impl FnOnce(&RowStorage) -> R) -> R {
        f(&self.data.read())
    }

    /// Releases all rows and resets the table to "in progress".
    pub fn clear(&mut self) {
        self.data.get_mut().clear();
        self.status.reset();
    }

    /// Moves the contents out and leaves an empty, unfinished table behind.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// The first `max_rows` rows, one line per row.
    pub fn as_debug_string(&self, max_rows: usize) -> String {
        let data = self.data.read();
        let mut out = format!(
            "ResultTable({} rows x {} columns, finished: {})\n",
            data.len(),
            self.column_count,
            self.is_finished()
        );
        for row in data.rows().take(max_rows) {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "{}", cells.join("\t"));
        }
        if data.len() > max_rows {
            let _ = writeln!(out, "... ({} more rows)", data.len() - max_rows);
        }
        out
    }
}

impl Default for ResultTable {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for ResultTable {
    /// A deep copy that shares no state with `self`.
    fn clone(&self) -> Self {
        Self {
            column_count: self.column_count,
            sorted_by: self.sorted_by,
            data: RwLock::new(self.data.read().clone()),
            result_types: self.result_types.clone(),
            status: self.status.clone(),
        }
    }
}
