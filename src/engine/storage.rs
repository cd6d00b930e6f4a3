//! Row storage of a result table.
//!
//! Narrow results (1 to 5 columns) are stored as vectors of fixed-size arrays,
//! which keeps rows contiguous with a constant stride. Wider results fall back
//! to one vector per row. Every representation hands out rows as `&[ValueId]`.

use crate::global::ValueId;

/// Widest row that gets a fixed-size representation.
pub const MAX_FIXED_WIDTH: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum RowStorage {
    Fixed1(Vec<[ValueId; 1]>),
    Fixed2(Vec<[ValueId; 2]>),
    Fixed3(Vec<[ValueId; 3]>),
    Fixed4(Vec<[ValueId; 4]>),
    Fixed5(Vec<[ValueId; 5]>),
    Generic { width: usize, rows: Vec<Vec<ValueId>> },
}

// Runs `$body` with `$rows` bound to the row vector of whichever fixed variant
// is active, or evaluates `$generic` for the generic one.
macro_rules! dispatch {
    ($storage:expr, $rows:ident => $body:expr, generic $grows:ident => $generic:expr) => {
        match $storage {
            RowStorage::Fixed1($rows) => $body,
            RowStorage::Fixed2($rows) => $body,
            RowStorage::Fixed3($rows) => $body,
            RowStorage::Fixed4($rows) => $body,
            RowStorage::Fixed5($rows) => $body,
            RowStorage::Generic { rows: $grows, .. } => $generic,
        }
    };
}

impl RowStorage {
    /// The compact representation for `width` columns.
    pub fn for_width(width: usize) -> Self {
        match width {
            1 => RowStorage::Fixed1(Vec::new()),
            2 => RowStorage::Fixed2(Vec::new()),
            3 => RowStorage::Fixed3(Vec::new()),
            4 => RowStorage::Fixed4(Vec::new()),
            5 => RowStorage::Fixed5(Vec::new()),
            _ => Self::generic(width),
        }
    }

    /// The variable-width representation, valid for every width.
    pub fn generic(width: usize) -> Self {
        RowStorage::Generic {
            width,
            rows: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            RowStorage::Fixed1(_) => 1,
            RowStorage::Fixed2(_) => 2,
            RowStorage::Fixed3(_) => 3,
            RowStorage::Fixed4(_) => 4,
            RowStorage::Fixed5(_) => 5,
            RowStorage::Generic { width, .. } => *width,
        }
    }

    pub fn is_fixed(&self) -> bool {
        !matches!(self, RowStorage::Generic { .. })
    }

    pub fn len(&self) -> usize {
        dispatch!(self, rows => rows.len(), generic rows => rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a row. Returns `false` and leaves the storage untouched if the
    /// row does not have exactly `width()` entries.
    pub fn push(&mut self, row: &[ValueId]) -> bool {
        if row.len() != self.width() {
            return false;
        }
        dispatch!(
            self,
            rows => match row.try_into() {
                Ok(array) => {
                    rows.push(array);
                    true
                }
                Err(_) => false,
            },
            generic rows => {
                rows.push(row.to_vec());
                true
            }
        )
    }

    /// Row `index` as a slice.
    pub fn row(&self, index: usize) -> Option<&[ValueId]> {
        dispatch!(
            self,
            rows => rows.get(index).map(|row| row.as_slice()),
            generic rows => rows.get(index).map(|row| row.as_slice())
        )
    }

    pub fn get(&self, row: usize, column: usize) -> Option<ValueId> {
        self.row(row).and_then(|row| row.get(column)).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[ValueId]> + '_ {
        (0..self.len()).filter_map(move |index| self.row(index))
    }

    /// Copies all rows into a uniform vector-of-rows representation.
    pub fn to_rows(&self) -> Vec<Vec<ValueId>> {
        match self {
            RowStorage::Generic { rows, .. } => rows.clone(),
            _ => self.rows().map(<[ValueId]>::to_vec).collect(),
        }
    }

    /// Releases all rows, keeping the representation.
    pub fn clear(&mut self) {
        let width = self.width();
        *self = if self.is_fixed() {
            Self::for_width(width)
        } else {
            Self::generic(width)
        };
    }
}

impl Default for RowStorage {
    fn default() -> Self {
        Self::generic(0)
    }
}
