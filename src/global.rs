//! Global value types shared by every layer of the engine.
//!
//! - **TypedIndex**: strongly typed indices into the different identifier spaces
//! - **ValueId**: the compact tagged identifier stored in result tables
//! - **Date**: the date payload that fits into a `ValueId`

pub mod date;
pub mod id;
pub mod index;

pub use date::{Date, DateError};
pub use id::{Datatype, InvalidValueId, ValueId};
pub use index::{
    IndexTag, LocalVocabIndex, TextRecordIndex, TypedIndex, VocabIndex, WordVocabIndex,
};
