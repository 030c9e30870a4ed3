pub mod backend;
pub mod connection;
pub mod delete;
pub mod dialect;
pub mod filter;
pub mod limits;
pub mod planner;
pub mod postgres;
pub mod query;
pub mod schema;
pub mod types;
pub mod validate;
