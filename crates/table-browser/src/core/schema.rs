use crate::core::{
    backend::Backend,
    types::{CatalogColumn, ColumnDescriptor, TableSchema},
    validate::TableCatalog,
};
use crate::error::{AppError, AppResult};

/// Fresh base-table listing for the working schema.
pub async fn table_catalog(backend: &dyn Backend) -> AppResult<TableCatalog> {
    Ok(TableCatalog::new(backend.base_tables().await?))
}

/// Loads the columns and primary key of `table`. `NotFound` unless the table
/// is in the base-table listing fetched by this call.
pub async fn inspect(backend: &dyn Backend, table: &str) -> AppResult<TableSchema> {
    let catalog = table_catalog(backend).await?;
    inspect_in(backend, &catalog, table).await
}

pub async fn inspect_in(
    backend: &dyn Backend,
    catalog: &TableCatalog,
    table: &str,
) -> AppResult<TableSchema> {
    let table = catalog.resolve(table)?;

    let columns = backend.table_columns(table).await?;
    if columns.is_empty() && !table_catalog(backend).await?.is_known_table(table) {
        // Dropped between the listing and this query.
        return Err(AppError::NotFound(table.to_string()));
    }
    let primary_key = backend.primary_key_columns(table).await?;
    if primary_key.len() > 1 {
        tracing::debug!(
            table,
            key_columns = primary_key.len(),
            "composite primary key; treating table as keyless"
        );
    }

    Ok(TableSchema {
        table: table.to_string(),
        columns: describe(columns, &primary_key),
    })
}

/// Orders catalog rows by ordinal position and marks the key column.
///
/// Only a single-column key is marked; a composite key marks nothing.
pub fn describe(mut columns: Vec<CatalogColumn>, primary_key: &[String]) -> Vec<ColumnDescriptor> {
    columns.sort_by_key(|c| c.ordinal);
    let key = match primary_key {
        [only] => Some(only.as_str()),
        _ => None,
    };
    columns
        .into_iter()
        .map(|c| ColumnDescriptor {
            is_primary_key: key == Some(c.name.as_str()),
            name: c.name,
            sql_type: c.sql_type,
            nullable: c.nullable,
        })
        .collect()
}
