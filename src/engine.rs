//! Containers for computed query results.
//!
//! An operator produces its result into a [`ResultTable`] while downstream
//! operators may already hold a reference to it and block in
//! [`ResultTable::await_finished`]. Finished tables can be shared through the
//! [`ResultCache`], keyed by the cache key of the computation.

pub mod cache;
pub mod result_table;
pub mod status;
pub mod storage;

pub use cache::{LruCache, ResultCache, TryEmplace};
pub use result_table::{Layout, ResultTable, ResultTableError, ResultType};
pub use status::CompletionStatus;
pub use storage::RowStorage;
