use std::sync::Arc;

use crate::core::{
    backend::Backend,
    delete, filter,
    limits::{PageLimits, Pagination},
    planner, schema,
    types::{BindValue, ColumnDescriptor, DeleteResult, TableRows},
};
use crate::error::AppResult;

/// The operations the routing layer calls.
///
/// Holds no per-table state: every call re-reads the catalog, so schema
/// changes show up on the next request.
#[derive(Clone)]
pub struct TableEngine {
    backend: Arc<dyn Backend>,
    limits: PageLimits,
}

impl TableEngine {
    pub fn new(backend: Arc<dyn Backend>, limits: PageLimits) -> Self {
        Self { backend, limits }
    }

    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    pub async fn list_tables(&self) -> AppResult<Vec<String>> {
        self.backend.base_tables().await
    }

    pub async fn table_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        Ok(schema::inspect(self.backend.as_ref(), table).await?.into_columns())
    }

    /// One page of `table` under the filters in `raw_params`, plus the total
    /// row count under the same filters.
    pub async fn get_table_rows(
        &self,
        table: &str,
        raw_params: &[(String, String)],
        pagination: Pagination,
    ) -> AppResult<TableRows> {
        let schema = schema::inspect(self.backend.as_ref(), table).await?;
        let conditions = filter::parse(raw_params, &schema);
        let plan = planner::plan(&schema, &conditions, pagination, self.backend.dialect())?;
        tracing::debug!(
            table = schema.table(),
            filters = conditions.len(),
            select = %plan.select.sql,
            count = %plan.count.sql,
            "page query"
        );

        // COUNT and SELECT are separate statements; a write in between can
        // make `total` and `rows` disagree by that write.
        let total = self.backend.fetch_count(plan.count.statement()).await?;
        let offset = plan.select.offset.unwrap_or_default();
        let rows = if offset >= total {
            Vec::new()
        } else {
            self.backend
                .fetch_rows(plan.select.statement(), plan.select.order_by.as_deref())
                .await?
        };

        Ok(TableRows {
            columns: schema.into_columns(),
            rows,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        })
    }

    pub async fn delete_rows(&self, table: &str, ids: &[BindValue]) -> AppResult<DeleteResult> {
        let deleted = delete::delete(self.backend.as_ref(), table, ids).await?;
        tracing::info!(table, requested = ids.len(), deleted, "rows deleted");
        Ok(DeleteResult { deleted })
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }
}
