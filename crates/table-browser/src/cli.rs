use std::time::Duration;

use clap::Parser;

use crate::core::{backend::ConnectOptions, limits::PageLimits};

#[derive(Parser, Debug, Clone)]
#[command(name = "table-browser", version, about = "Browse, filter and delete rows of any table")]
pub struct Args {
    /// Database to introspect: postgres://..., postgresql://... or sqlite:<path>.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Schema whose base tables are exposed (PostgreSQL only).
    #[arg(long, env = "DATABASE_SCHEMA", default_value = "public")]
    pub schema: String,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Page size used when a request gives none, or an unusable one.
    #[arg(long, default_value_t = 50)]
    pub default_page_size: u64,

    /// Upper bound for a requested page size.
    #[arg(long, default_value_t = 1000)]
    pub max_page_size: u64,

    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,

    /// Wait for a pooled connection (SQLite: busy timeout).
    #[arg(long, default_value_t = 30_000)]
    pub acquire_timeout_ms: u64,

    /// Server-side statement timeout (PostgreSQL only).
    #[arg(long)]
    pub statement_timeout_ms: Option<u64>,
}

impl Args {
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            schema: self.schema.clone(),
            max_connections: self.max_connections.max(1),
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            statement_timeout: self.statement_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size.max(1),
            max_page_size: self.max_page_size.max(1),
        }
    }
}
