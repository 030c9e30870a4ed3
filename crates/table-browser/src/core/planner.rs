use crate::core::{
    dialect::{quote_ident, Dialect},
    limits::Pagination,
    types::{BindValue, FilterCondition, FilterOperator, Statement, TableSchema},
    validate::known_column,
};
use crate::error::{AppError, AppResult};

/// One executable statement of a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub sql: String,
    pub where_clause: Option<String>,
    pub bound_values: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Quoted key column the rows are ordered by, if any.
    pub order_by: Option<String>,
}

impl QueryPlan {
    pub fn statement(&self) -> Statement {
        Statement {
            sql: self.sql.clone(),
            params: self.bound_values.iter().cloned().map(BindValue::Text).collect(),
        }
    }
}

/// Row fetch and row count for the same filter set.
///
/// Both share one WHERE clause and bound-value list. They still run as two
/// statements, so a concurrent write can land between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub select: QueryPlan,
    pub count: QueryPlan,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    pub sql: Option<String>,
    pub bound_values: Vec<String>,
}

pub fn plan(
    schema: &TableSchema,
    conditions: &[FilterCondition],
    pagination: Pagination,
    dialect: Dialect,
) -> AppResult<PagePlan> {
    let filter = compile_where(schema, conditions, dialect)?;
    let offset = pagination.offset();
    let table = quote_ident(schema.table());
    let where_sql = filter
        .sql
        .as_deref()
        .map(|w| format!(" WHERE {w}"))
        .unwrap_or_default();

    let key = schema.primary_key().map(|pk| quote_ident(&pk.name));
    let order_by = key
        .as_deref()
        .map(|k| format!(" ORDER BY {k}"))
        .unwrap_or_default();

    let select = QueryPlan {
        sql: format!(
            "SELECT * FROM {table}{where_sql}{order_by} LIMIT {} OFFSET {offset}",
            pagination.page_size
        ),
        where_clause: filter.sql.clone(),
        bound_values: filter.bound_values.clone(),
        limit: Some(pagination.page_size),
        offset: Some(offset),
        order_by: key,
    };
    let count = QueryPlan {
        sql: format!("SELECT COUNT(*) AS total FROM {table}{where_sql}"),
        where_clause: filter.sql,
        bound_values: filter.bound_values,
        limit: None,
        offset: None,
        order_by: None,
    };
    Ok(PagePlan { select, count })
}

/// AND of all conditions, in order, with placeholders numbered from 1.
pub fn compile_where(
    schema: &TableSchema,
    conditions: &[FilterCondition],
    dialect: Dialect,
) -> AppResult<WhereClause> {
    let mut predicates = Vec::with_capacity(conditions.len());
    let mut bound_values = Vec::new();

    for cond in conditions {
        let column = known_column(schema, &cond.column)
            .ok_or_else(|| AppError::SchemaViolation(format!("unknown column {}", cond.column)))?;
        let quoted = quote_ident(&column.name);

        let bound = match (cond.operator, cond.value.as_deref()) {
            (FilterOperator::IsNull, _) => {
                predicates.push(format!("{quoted} IS NULL"));
                continue;
            }
            (FilterOperator::IsNotNull, _) => {
                predicates.push(format!("{quoted} IS NOT NULL"));
                continue;
            }
            (op, None) => {
                return Err(AppError::InvalidArgument(format!(
                    "filter {}__{op} needs a value",
                    column.name
                )))
            }
            (FilterOperator::Equals, Some(v)) => v.to_string(),
            (FilterOperator::Contains, Some(v)) => format!("%{v}%"),
            (FilterOperator::StartsWith, Some(v)) => format!("{v}%"),
            (FilterOperator::EndsWith, Some(v)) => format!("%{v}"),
        };

        bound_values.push(bound);
        let placeholder = dialect.placeholder(bound_values.len());
        let lhs = dialect.text_cast(&quoted);
        let op = if cond.operator == FilterOperator::Equals {
            "="
        } else {
            dialect.ilike()
        };
        predicates.push(format!("{lhs} {op} {placeholder}"));
    }

    Ok(WhereClause {
        sql: (!predicates.is_empty()).then(|| predicates.join(" AND ")),
        bound_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColumnDescriptor;

    fn column(name: &str, pk: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.into(),
            sql_type: "text".into(),
            nullable: !pk,
            is_primary_key: pk,
        }
    }

    fn orders() -> TableSchema {
        TableSchema {
            table: "orders".into(),
            columns: vec![column("id", true), column("status", false), column("amount", false)],
        }
    }

    fn cond(column: &str, operator: FilterOperator, value: Option<&str>) -> FilterCondition {
        FilterCondition {
            column: column.into(),
            operator,
            value: value.map(str::to_string),
        }
    }

    fn first_page() -> Pagination {
        Pagination { page: 1, page_size: 50 }
    }

    #[test]
    fn contains_scenario_on_postgres() {
        let plan = plan(
            &orders(),
            &[cond("status", FilterOperator::Contains, Some("pend"))],
            first_page(),
            Dialect::Postgres,
        )
        .unwrap();
        assert_eq!(
            plan.select.where_clause.as_deref(),
            Some(r#""status"::text ILIKE $1"#)
        );
        assert_eq!(plan.select.bound_values, vec!["%pend%"]);
        assert_eq!(
            plan.select.sql,
            r#"SELECT * FROM "orders" WHERE "status"::text ILIKE $1 ORDER BY "id" LIMIT 50 OFFSET 0"#
        );
        assert_eq!(
            plan.count.sql,
            r#"SELECT COUNT(*) AS total FROM "orders" WHERE "status"::text ILIKE $1"#
        );
    }

    #[test]
    fn operator_table_on_postgres() {
        let cases = [
            (FilterOperator::Equals, Some("x"), r#""status"::text = $1"#, Some("x")),
            (FilterOperator::Contains, Some("x"), r#""status"::text ILIKE $1"#, Some("%x%")),
            (FilterOperator::StartsWith, Some("x"), r#""status"::text ILIKE $1"#, Some("x%")),
            (FilterOperator::EndsWith, Some("x"), r#""status"::text ILIKE $1"#, Some("%x")),
            (FilterOperator::IsNull, None, r#""status" IS NULL"#, None),
            (FilterOperator::IsNotNull, None, r#""status" IS NOT NULL"#, None),
        ];
        for (op, value, predicate, bound) in cases {
            let w = compile_where(&orders(), &[cond("status", op, value)], Dialect::Postgres).unwrap();
            assert_eq!(w.sql.as_deref(), Some(predicate), "{op}");
            let expected: Vec<String> = bound.into_iter().map(str::to_string).collect();
            assert_eq!(w.bound_values, expected, "{op}");
        }
    }

    #[test]
    fn placeholders_skip_valueless_predicates() {
        let w = compile_where(
            &orders(),
            &[
                cond("status", FilterOperator::StartsWith, Some("pe")),
                cond("amount", FilterOperator::IsNull, None),
                cond("id", FilterOperator::Equals, Some("7")),
            ],
            Dialect::Postgres,
        )
        .unwrap();
        assert_eq!(
            w.sql.as_deref(),
            Some(r#""status"::text ILIKE $1 AND "amount" IS NULL AND "id"::text = $2"#)
        );
        assert_eq!(w.bound_values, vec!["pe%", "7"]);
    }

    #[test]
    fn sqlite_rendering() {
        let w = compile_where(
            &orders(),
            &[
                cond("status", FilterOperator::Contains, Some("pend")),
                cond("id", FilterOperator::Equals, Some("1")),
            ],
            Dialect::Sqlite,
        )
        .unwrap();
        assert_eq!(
            w.sql.as_deref(),
            Some(r#"CAST("status" AS TEXT) LIKE ?1 AND CAST("id" AS TEXT) = ?2"#)
        );
    }

    #[test]
    fn count_and_select_share_filtering() {
        let conditions = [
            cond("status", FilterOperator::EndsWith, Some("ing")),
            cond("amount", FilterOperator::IsNotNull, None),
        ];
        let plan = plan(
            &orders(),
            &conditions,
            Pagination { page: 4, page_size: 25 },
            Dialect::Postgres,
        )
        .unwrap();
        assert_eq!(plan.select.where_clause, plan.count.where_clause);
        assert_eq!(plan.select.bound_values, plan.count.bound_values);
        assert_eq!(plan.select.statement().params, plan.count.statement().params);
        assert_eq!(plan.select.limit, Some(25));
        assert_eq!(plan.select.offset, Some(75));
        assert_eq!(plan.select.order_by.as_deref(), Some(r#""id""#));
        assert_eq!(plan.count.limit, None);
        assert_eq!(plan.count.order_by, None);
        assert!(!plan.count.sql.contains("LIMIT"));
        assert!(!plan.count.sql.contains("ORDER BY"));
    }

    #[test]
    fn no_conditions_no_where() {
        let plan = plan(&orders(), &[], first_page(), Dialect::Postgres).unwrap();
        assert_eq!(plan.select.where_clause, None);
        assert_eq!(plan.count.sql, r#"SELECT COUNT(*) AS total FROM "orders""#);
        assert!(plan.select.bound_values.is_empty());
    }

    #[test]
    fn keyless_tables_are_not_ordered() {
        let schema = TableSchema {
            table: "events".into(),
            columns: vec![column("kind", false)],
        };
        let plan = plan(&schema, &[], first_page(), Dialect::Sqlite).unwrap();
        assert_eq!(plan.select.sql, r#"SELECT * FROM "events" LIMIT 50 OFFSET 0"#);
        assert_eq!(plan.select.order_by, None);
    }

    #[test]
    fn far_pages_stay_within_signed_offset() {
        let plan = plan(
            &orders(),
            &[],
            Pagination { page: (i64::MAX / 2) as u64, page_size: 4 },
            Dialect::Postgres,
        )
        .unwrap();
        assert_eq!(plan.select.offset, Some(i64::MAX as u64));
        assert!(plan.select.sql.ends_with(&format!("OFFSET {}", i64::MAX)));
    }

    #[test]
    fn unknown_column_is_schema_violation() {
        let err = plan(
            &orders(),
            &[cond("status\" OR 1=1 --", FilterOperator::Equals, Some("x"))],
            first_page(),
            Dialect::Postgres,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::SchemaViolation(_)));
    }

    #[test]
    fn values_never_reach_sql_text() {
        let w = compile_where(
            &orders(),
            &[cond("status", FilterOperator::Equals, Some("'; DROP TABLE orders; --"))],
            Dialect::Postgres,
        )
        .unwrap();
        assert!(!w.sql.unwrap().contains("DROP"));
        assert_eq!(w.bound_values, vec!["'; DROP TABLE orders; --"]);
    }

    #[test]
    fn value_operator_without_value_is_rejected() {
        let err = compile_where(
            &orders(),
            &[cond("status", FilterOperator::Contains, None)],
            Dialect::Postgres,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
