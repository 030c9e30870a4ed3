use crate::core::{
    backend::Backend,
    dialect::{quote_ident, Dialect},
    schema,
    types::{BindValue, Statement, TableSchema},
};
use crate::error::{AppError, AppResult};

/// `DELETE ... WHERE <pk> IN (...)` with one placeholder per id, in order.
///
/// Integer keys compare natively, so numeric strings are bound as integers.
/// Every other key type is compared through its text form with text ids,
/// which is how a uuid or an enum arrives from a browsed row.
pub fn plan_delete(schema: &TableSchema, ids: &[BindValue], dialect: Dialect) -> AppResult<Statement> {
    if ids.is_empty() {
        return Err(AppError::InvalidArgument("ids must not be empty".into()));
    }
    let pk = schema
        .primary_key()
        .ok_or_else(|| AppError::NoPrimaryKey(schema.table().to_string()))?;

    let integer_key = dialect.is_integer_type(&pk.sql_type);
    let params = ids
        .iter()
        .map(|id| key_param(id, integer_key))
        .collect::<AppResult<Vec<_>>>()?;

    let column = quote_ident(&pk.name);
    let lhs = if integer_key {
        column
    } else {
        dialect.text_cast(&column)
    };
    let placeholders = (1..=params.len())
        .map(|n| dialect.placeholder(n))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Statement {
        sql: format!(
            "DELETE FROM {} WHERE {lhs} IN ({placeholders})",
            quote_ident(schema.table())
        ),
        params,
    })
}

fn key_param(id: &BindValue, integer_key: bool) -> AppResult<BindValue> {
    match (id, integer_key) {
        (BindValue::Int(n), true) => Ok(BindValue::Int(*n)),
        (BindValue::Text(s), true) => s
            .trim()
            .parse::<i64>()
            .map(BindValue::Int)
            .map_err(|_| AppError::InvalidArgument(format!("id {s:?} is not an integer"))),
        (BindValue::Int(n), false) => Ok(BindValue::Text(n.to_string())),
        (BindValue::Text(s), false) => Ok(BindValue::Text(s.clone())),
    }
}

/// Deletes the rows of `table` whose primary key is in `ids` and returns how
/// many the database removed. Ids that match nothing are not an error.
pub async fn delete(backend: &dyn Backend, table: &str, ids: &[BindValue]) -> AppResult<u64> {
    if ids.is_empty() {
        return Err(AppError::InvalidArgument("ids must not be empty".into()));
    }
    let schema = schema::inspect(backend, table).await?;
    let stmt = plan_delete(&schema, ids, backend.dialect())?;
    tracing::debug!(table = schema.table(), sql = %stmt.sql, ids = ids.len(), "delete");
    backend.execute(stmt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColumnDescriptor;

    fn table(name: &str, key_type: &str, cols: &[(&str, bool)]) -> TableSchema {
        TableSchema {
            table: name.into(),
            columns: cols
                .iter()
                .map(|(n, pk)| ColumnDescriptor {
                    name: n.to_string(),
                    sql_type: if *pk { key_type.into() } else { "text".into() },
                    nullable: !pk,
                    is_primary_key: *pk,
                })
                .collect(),
        }
    }

    #[test]
    fn orders_scenario() {
        let schema = table("orders", "integer", &[("id", true), ("status", false)]);
        let stmt = plan_delete(&schema, &[BindValue::Int(5), BindValue::Int(9)], Dialect::Postgres)
            .unwrap();
        assert_eq!(stmt.sql, r#"DELETE FROM "orders" WHERE "id" IN ($1, $2)"#);
        assert_eq!(stmt.params, vec![BindValue::Int(5), BindValue::Int(9)]);
    }

    #[test]
    fn string_ids_on_integer_keys_bind_as_integers() {
        let schema = table("orders", "bigint", &[("id", true)]);
        let stmt = plan_delete(&schema, &[BindValue::from("4"), BindValue::Int(7)], Dialect::Postgres)
            .unwrap();
        assert_eq!(stmt.sql, r#"DELETE FROM "orders" WHERE "id" IN ($1, $2)"#);
        assert_eq!(stmt.params, vec![BindValue::Int(4), BindValue::Int(7)]);
    }

    #[test]
    fn non_numeric_id_on_integer_key_is_invalid() {
        let schema = table("orders", "integer", &[("id", true)]);
        let err = plan_delete(&schema, &[BindValue::from("four")], Dialect::Postgres).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn uuid_keys_compare_as_text() {
        let schema = table("tokens", "uuid", &[("id", true), ("label", false)]);
        let id = "11111111-1111-1111-1111-111111111111";
        let stmt = plan_delete(&schema, &[BindValue::from(id)], Dialect::Postgres).unwrap();
        assert_eq!(stmt.sql, r#"DELETE FROM "tokens" WHERE "id"::text IN ($1)"#);
        assert_eq!(stmt.params, vec![BindValue::from(id)]);
    }

    #[test]
    fn keeps_caller_order_and_renders_ints_as_text() {
        let schema = table("users", "TEXT", &[("uid", true)]);
        let ids = [BindValue::from("b"), BindValue::Int(3), BindValue::from("a")];
        let stmt = plan_delete(&schema, &ids, Dialect::Sqlite).unwrap();
        assert_eq!(
            stmt.sql,
            r#"DELETE FROM "users" WHERE CAST("uid" AS TEXT) IN (?1, ?2, ?3)"#
        );
        assert_eq!(
            stmt.params,
            vec![BindValue::from("b"), BindValue::from("3"), BindValue::from("a")]
        );
    }

    #[test]
    fn keyless_table_is_rejected() {
        let schema = table("log", "integer", &[("line", false)]);
        let err = plan_delete(&schema, &[BindValue::Int(1)], Dialect::Postgres).unwrap_err();
        assert!(matches!(err, AppError::NoPrimaryKey(t) if t == "log"));
    }

    #[test]
    fn empty_ids_are_rejected() {
        let schema = table("orders", "integer", &[("id", true)]);
        let err = plan_delete(&schema, &[], Dialect::Postgres).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
