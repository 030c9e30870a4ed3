use serde::{Deserialize, Serialize};

use crate::core::types::BindValue;
use crate::error::{AppError, AppResult};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BridgeRequest {
    pub v: u32,
    pub id: String,
    pub cmd: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse<T> {
    pub v: u32,
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl<T> BridgeResponse<T> {
    pub fn ok(v: u32, id: String, data: T) -> Self {
        Self {
            v,
            id,
            status: "ok",
            data: Some(data),
            error: None,
            code: None,
            http_status: None,
        }
    }

    pub fn err(v: u32, id: String, e: &AppError) -> Self {
        Self {
            v,
            id,
            status: "error",
            data: None,
            error: Some(e.to_string()),
            code: Some(e.code()),
            http_status: Some(e.http_status()),
        }
    }
}

// Payloads

#[derive(Debug, Deserialize)]
pub struct ColumnsPayload {
    pub table: String,
}

#[derive(Debug, Deserialize)]
pub struct RowsPayload {
    pub table: String,
    #[serde(default)]
    pub params: RawParams,
}

/// Filter and pagination parameters, either as ordered `[key, value]` pairs
/// (repeated keys allowed) or as an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawParams {
    Pairs(Vec<(String, String)>),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl Default for RawParams {
    fn default() -> Self {
        RawParams::Pairs(Vec::new())
    }
}

impl RawParams {
    pub fn into_pairs(self) -> AppResult<Vec<(String, String)>> {
        match self {
            RawParams::Pairs(pairs) => Ok(pairs),
            RawParams::Object(map) => map
                .into_iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => Ok((k, s)),
                    serde_json::Value::Number(n) => Ok((k, n.to_string())),
                    serde_json::Value::Bool(b) => Ok((k, b.to_string())),
                    serde_json::Value::Null => Ok((k, String::new())),
                    _ => Err(AppError::InvalidArgument(format!(
                        "parameter {k} must be a scalar"
                    ))),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeletePayload {
    pub table: String,
    #[serde(default)]
    pub ids: Vec<serde_json::Value>,
}

impl DeletePayload {
    /// Strings and integers only; anything else would bind with a type the
    /// key column cannot compare against.
    pub fn bind_ids(&self) -> AppResult<Vec<BindValue>> {
        self.ids
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Ok(BindValue::Text(s.clone())),
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(BindValue::Int)
                    .ok_or_else(|| AppError::InvalidArgument(format!("id {n} is not an integer"))),
                other => Err(AppError::InvalidArgument(format!(
                    "ids must be strings or integers, got {other}"
                ))),
            })
            .collect()
    }
}
