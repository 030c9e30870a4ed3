use std::collections::BTreeSet;

use crate::core::types::{ColumnDescriptor, TableSchema};
use crate::error::{AppError, AppResult};

/// Base tables of the working schema, fetched in the current request.
///
/// This and [`is_known_column`] are the only gates an identifier passes
/// before it is interpolated into SQL text.
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    tables: BTreeSet<String>,
}

impl TableCatalog {
    pub fn new<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    pub fn is_known_table(&self, name: &str) -> bool {
        self.tables.contains(name)
    }

    /// Returns the catalog's own copy of the name, or `NotFound`.
    pub fn resolve(&self, name: &str) -> AppResult<&str> {
        self.tables
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub fn is_known_column(schema: &TableSchema, name: &str) -> bool {
    known_column(schema, name).is_some()
}

/// The inspected column called exactly `name`. Its `name` field, not the
/// caller's string, is what goes into SQL.
pub fn known_column<'s>(schema: &'s TableSchema, name: &str) -> Option<&'s ColumnDescriptor> {
    schema.column(name)
}
