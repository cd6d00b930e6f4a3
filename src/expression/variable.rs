//! SPARQL variables and their mapping to result columns.

use std::collections::HashMap;
use std::fmt;

/// A SPARQL variable such as `?x`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(String);

impl Variable {
    /// Creates a variable. A missing `?` prefix is added.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('?') || name.starts_with('$') {
            Self(name)
        } else {
            Self(format!("?{}", name))
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps every visible variable to the column of the input that holds its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableToColumnMap {
    columns: HashMap<Variable, usize>,
}

impl VariableToColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: Variable, column: usize) {
        self.columns.insert(variable, column);
    }

    pub fn column_index(&self, variable: &Variable) -> Option<usize> {
        self.columns.get(variable).copied()
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.columns.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(Variable, usize)> for VariableToColumnMap {
    fn from_iter<T: IntoIterator<Item = (Variable, usize)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
