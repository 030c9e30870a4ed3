use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    core::limits::Pagination,
    engine::TableEngine,
    error::{AppError, AppResult},
};

use super::protocol::*;

pub struct BridgeHandler {
    engine: TableEngine,
}

impl BridgeHandler {
    pub fn new(engine: TableEngine) -> Self {
        Self { engine }
    }

    pub async fn handle(&self, req: BridgeRequest) -> BridgeResponse<Value> {
        let (v, id) = (req.v, req.id.clone());
        if v != PROTOCOL_VERSION {
            let e = AppError::InvalidArgument(format!("unsupported protocol version: {v}"));
            return BridgeResponse::err(v, id, &e);
        }

        let cmd = req.cmd.clone();
        let res = match cmd.as_str() {
            "tables" => self.handle_tables().await,
            "columns" => self.handle_columns(req.payload).await,
            "rows" => self.handle_rows(req.payload).await,
            "delete" => self.handle_delete(req.payload).await,
            other => Err(AppError::InvalidArgument(format!("unknown cmd: {other}"))),
        };

        match res {
            Ok(data) => BridgeResponse::ok(v, id, data),
            Err(e) => {
                match &e {
                    AppError::BackendUnavailable(detail) => {
                        tracing::error!(%cmd, %detail, "database request failed")
                    }
                    AppError::Internal(_) | AppError::Io(_) => {
                        tracing::error!(%cmd, error=%e, "request failed")
                    }
                    _ => tracing::debug!(%cmd, error=%e, "request rejected"),
                }
                BridgeResponse::err(v, id, &e)
            }
        }
    }

    async fn handle_tables(&self) -> AppResult<Value> {
        let tables = self.engine.list_tables().await?;
        Ok(serde_json::json!({ "tables": tables }))
    }

    async fn handle_columns(&self, payload: Value) -> AppResult<Value> {
        let p: ColumnsPayload = payload_of(payload)?;
        let columns = self.engine.table_columns(&p.table).await?;
        Ok(serde_json::json!({ "columns": columns }))
    }

    async fn handle_rows(&self, payload: Value) -> AppResult<Value> {
        let p: RowsPayload = payload_of(payload)?;
        let raw = p.params.into_pairs()?;
        let pagination = Pagination::from_params(&raw, self.engine.limits());
        let out = self.engine.get_table_rows(&p.table, &raw, pagination).await?;
        Ok(serde_json::to_value(out)?)
    }

    async fn handle_delete(&self, payload: Value) -> AppResult<Value> {
        let p: DeletePayload = payload_of(payload)?;
        let ids = p.bind_ids()?;
        let out = self.engine.delete_rows(&p.table, &ids).await?;
        Ok(serde_json::to_value(out)?)
    }
}

fn payload_of<T: DeserializeOwned>(payload: Value) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|e| AppError::InvalidArgument(e.to_string()))
}
