pub mod adapters;
pub mod cli;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;

pub use crate::core::types::{
    BindValue, ColumnDescriptor, DeleteResult, FilterCondition, FilterOperator, TableRows,
};
pub use crate::engine::TableEngine;
pub use crate::error::{AppError, AppResult};
