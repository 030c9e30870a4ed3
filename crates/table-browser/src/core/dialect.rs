/// SQL rendering differences between the supported backends.
///
/// Callers must only pass identifiers that already passed the allow-list in
/// [`crate::core::validate`]; quoting here keeps case and reserved words
/// intact, it is not what makes an identifier safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// 1-based placeholder for the `n`th bound value of a statement.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite => format!("?{n}"),
        }
    }

    /// `quoted` compared as text, whatever its declared type.
    pub fn text_cast(self, quoted: &str) -> String {
        match self {
            Dialect::Postgres => format!("{quoted}::text"),
            Dialect::Sqlite => format!("CAST({quoted} AS TEXT)"),
        }
    }

    /// Whether a column of declared type `sql_type` compares as an integer.
    pub fn is_integer_type(self, sql_type: &str) -> bool {
        let t = sql_type.trim().to_ascii_lowercase();
        match self {
            Dialect::Postgres => matches!(t.as_str(), "smallint" | "integer" | "bigint"),
            // SQLite's affinity rule: any declared type containing "INT".
            Dialect::Sqlite => t.contains("int"),
        }
    }

    pub fn ilike(self) -> &'static str {
        match self {
            Dialect::Postgres => "ILIKE",
            // ASCII-case-insensitive by default.
            Dialect::Sqlite => "LIKE",
        }
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
