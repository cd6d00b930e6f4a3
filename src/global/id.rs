//! The compact identifier that is stored in every cell of a result table.
//!
//! A `ValueId` is 64 bits wide: the top 4 bits hold the [`Datatype`], the
//! remaining 60 bits hold the payload. Integers are stored as 60-bit two's
//! complement, doubles keep the upper 60 bits of their IEEE-754 pattern.

use crate::global::date::Date;
use crate::global::index::{LocalVocabIndex, TextRecordIndex, VocabIndex, WordVocabIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const NUM_DATATYPE_BITS: u32 = 4;
const NUM_PAYLOAD_BITS: u32 = 64 - NUM_DATATYPE_BITS;
const PAYLOAD_MASK: u64 = (1 << NUM_PAYLOAD_BITS) - 1;

/// Datatype tag of a `ValueId`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Datatype {
    Undefined = 0,
    Bool = 1,
    Int = 2,
    Double = 3,
    VocabIndex = 4,
    LocalVocabIndex = 5,
    TextRecordIndex = 6,
    WordVocabIndex = 7,
    Date = 8,
}

impl Datatype {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Datatype::Undefined),
            1 => Some(Datatype::Bool),
            2 => Some(Datatype::Int),
            3 => Some(Datatype::Double),
            4 => Some(Datatype::VocabIndex),
            5 => Some(Datatype::LocalVocabIndex),
            6 => Some(Datatype::TextRecordIndex),
            7 => Some(Datatype::WordVocabIndex),
            8 => Some(Datatype::Date),
            _ => None,
        }
    }

    /// Whether this datatype counts as numeric in SPARQL.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Datatype::Int | Datatype::Double)
    }
}

/// A bit pattern whose datatype bits are not a known tag.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid datatype tag {tag} in value id {bits:#018x}")]
pub struct InvalidValueId {
    pub bits: u64,
    pub tag: u8,
}

/// A tagged 64-bit identifier of an RDF term or value.
///
/// Serialized as its bit pattern. Deserialization rejects unknown tags.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ValueId(u64);

impl ValueId {
    /// The smallest integer that fits into the payload.
    pub const MIN_INT: i64 = -(1 << (NUM_PAYLOAD_BITS - 1));
    /// The largest integer that fits into the payload.
    pub const MAX_INT: i64 = (1 << (NUM_PAYLOAD_BITS - 1)) - 1;

    const fn from_datatype_and_payload(datatype: Datatype, payload: u64) -> Self {
        Self(((datatype as u64) << NUM_PAYLOAD_BITS) | (payload & PAYLOAD_MASK))
    }

    /// Reconstructs an id from its bit pattern. Returns `None` if the datatype
    /// bits are not a known tag.
    pub fn from_bits(bits: u64) -> Option<Self> {
        Datatype::from_u8((bits >> NUM_PAYLOAD_BITS) as u8).map(|_| Self(bits))
    }

    pub const fn get_bits(&self) -> u64 {
        self.0
    }

    pub fn datatype(&self) -> Datatype {
        // Every constructor writes a valid tag.
        Datatype::from_u8((self.0 >> NUM_PAYLOAD_BITS) as u8).unwrap_or(Datatype::Undefined)
    }

    fn payload(&self) -> u64 {
        self.0 & PAYLOAD_MASK
    }

    pub const fn make_undefined() -> Self {
        Self::from_datatype_and_payload(Datatype::Undefined, 0)
    }

    pub const fn make_from_bool(value: bool) -> Self {
        Self::from_datatype_and_payload(Datatype::Bool, value as u64)
    }

    /// Integers outside of `MIN_INT..=MAX_INT` wrap around.
    pub const fn make_from_int(value: i64) -> Self {
        Self::from_datatype_and_payload(Datatype::Int, value as u64)
    }

    /// The lowest 4 mantissa bits are dropped.
    pub fn make_from_double(value: f64) -> Self {
        Self::from_datatype_and_payload(Datatype::Double, value.to_bits() >> NUM_DATATYPE_BITS)
    }

    pub fn make_from_vocab_index(index: VocabIndex) -> Self {
        Self::from_datatype_and_payload(Datatype::VocabIndex, index.get())
    }

    pub fn make_from_local_vocab_index(index: LocalVocabIndex) -> Self {
        Self::from_datatype_and_payload(Datatype::LocalVocabIndex, index.get())
    }

    pub fn make_from_text_record_index(index: TextRecordIndex) -> Self {
        Self::from_datatype_and_payload(Datatype::TextRecordIndex, index.get())
    }

    pub fn make_from_word_vocab_index(index: WordVocabIndex) -> Self {
        Self::from_datatype_and_payload(Datatype::WordVocabIndex, index.get())
    }

    pub fn make_from_date(date: Date) -> Self {
        Self::from_datatype_and_payload(Datatype::Date, date.to_bits())
    }

    pub fn is_undefined(&self) -> bool {
        self.datatype() == Datatype::Undefined
    }

    pub fn get_bool(&self) -> Option<bool> {
        (self.datatype() == Datatype::Bool).then(|| self.payload() != 0)
    }

    pub fn get_int(&self) -> Option<i64> {
        // Shift the payload to the top and back to sign-extend it.
        (self.datatype() == Datatype::Int)
            .then(|| ((self.0 << NUM_DATATYPE_BITS) as i64) >> NUM_DATATYPE_BITS)
    }

    pub fn get_double(&self) -> Option<f64> {
        (self.datatype() == Datatype::Double)
            .then(|| f64::from_bits(self.payload() << NUM_DATATYPE_BITS))
    }

    pub fn get_vocab_index(&self) -> Option<VocabIndex> {
        (self.datatype() == Datatype::VocabIndex).then(|| VocabIndex::make(self.payload()))
    }

    pub fn get_local_vocab_index(&self) -> Option<LocalVocabIndex> {
        (self.datatype() == Datatype::LocalVocabIndex)
            .then(|| LocalVocabIndex::make(self.payload()))
    }

    pub fn get_text_record_index(&self) -> Option<TextRecordIndex> {
        (self.datatype() == Datatype::TextRecordIndex)
            .then(|| TextRecordIndex::make(self.payload()))
    }

    pub fn get_word_vocab_index(&self) -> Option<WordVocabIndex> {
        (self.datatype() == Datatype::WordVocabIndex)
            .then(|| WordVocabIndex::make(self.payload()))
    }

    pub fn get_date(&self) -> Option<Date> {
        if self.datatype() != Datatype::Date {
            return None;
        }
        Date::from_bits(self.payload()).ok()
    }
}

impl TryFrom<u64> for ValueId {
    type Error = InvalidValueId;

    fn try_from(bits: u64) -> Result<Self, Self::Error> {
        ValueId::from_bits(bits).ok_or(InvalidValueId {
            bits,
            tag: (bits >> NUM_PAYLOAD_BITS) as u8,
        })
    }
}

impl From<ValueId> for u64 {
    fn from(id: ValueId) -> Self {
        id.0
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.datatype() {
            Datatype::Undefined => write!(f, "U"),
            Datatype::Bool => write!(f, "B:{}", self.payload() != 0),
            Datatype::Int => write!(f, "I:{}", self.get_int().unwrap_or_default()),
            Datatype::Double => write!(f, "D:{}", self.get_double().unwrap_or_default()),
            Datatype::VocabIndex => write!(f, "V:{}", self.payload()),
            Datatype::LocalVocabIndex => write!(f, "L:{}", self.payload()),
            Datatype::TextRecordIndex => write!(f, "T:{}", self.payload()),
            Datatype::WordVocabIndex => write!(f, "W:{}", self.payload()),
            Datatype::Date => match self.get_date() {
                Some(date) => write!(f, "DA:{}", date),
                None => write!(f, "DA:invalid({})", self.payload()),
            },
        }
    }
}
