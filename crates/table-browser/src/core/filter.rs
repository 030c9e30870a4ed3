use crate::core::{
    types::{FilterCondition, FilterOperator, TableSchema},
    validate::known_column,
};

pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "pageSize";

const OPERATOR_SEPARATOR: &str = "__";

/// Turns request parameters into filter conditions for `schema`.
///
/// Keys are `<column>__<operator>` or, for plain equality, just `<column>`.
/// Anything that names no column of `schema` (or no known operator) is
/// dropped, as are the pagination keys. Conditions keep parameter order.
pub fn parse(raw: &[(String, String)], schema: &TableSchema) -> Vec<FilterCondition> {
    let mut out = Vec::new();
    for (key, value) in raw {
        if key == PAGE_KEY || key == PAGE_SIZE_KEY {
            continue;
        }
        let Some((column, operator)) = classify(key, schema) else {
            continue;
        };
        if operator.requires_value() && value.is_empty() {
            continue;
        }
        out.push(FilterCondition {
            column: column.to_string(),
            operator,
            value: operator.requires_value().then(|| value.clone()),
        });
    }
    out
}

/// Column name (as the catalog spells it) and operator for one key.
fn classify<'s>(key: &str, schema: &'s TableSchema) -> Option<(&'s str, FilterOperator)> {
    if let Some((column, op)) = key.rsplit_once(OPERATOR_SEPARATOR) {
        if let (Some(c), Some(op)) = (known_column(schema, column), FilterOperator::parse(op)) {
            return Some((c.name.as_str(), op));
        }
    }
    known_column(schema, key).map(|c| (c.name.as_str(), FilterOperator::Equals))
}
