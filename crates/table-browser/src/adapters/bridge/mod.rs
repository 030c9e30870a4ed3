mod handler;
mod io;
mod protocol;

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

use crate::{engine::TableEngine, error::AppResult};

pub use handler::BridgeHandler;
pub use io::NdjsonIo;
pub use protocol::{BridgeRequest, BridgeResponse, PROTOCOL_VERSION};

/// Serves requests from stdin until it closes. Responses go to stdout; logs
/// must stay on stderr.
pub async fn run(engine: TableEngine) -> AppResult<()> {
    let io = NdjsonIo::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    serve(engine, io).await.map(|_| ())
}

pub async fn serve<R, W>(engine: TableEngine, mut io: NdjsonIo<R, W>) -> AppResult<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let handler = BridgeHandler::new(engine);

    loop {
        let req: BridgeRequest = {
            let Some(line) = io.read_line().await? else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(r) => r,
                Err(e) => {
                    // Unknown id; answer anyway so the client is not left waiting.
                    io.protocol_error(format!("malformed request: {e}")).await?;
                    continue;
                }
            }
        };

        let resp = handler.handle(req).await;
        io.write_json_line(&resp).await?;
    }

    tracing::info!("input closed; bridge stopped");
    Ok(io.into_writer())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusqlite::Connection;
    use serde_json::Value;

    use super::*;
    use crate::core::{
        backend::ConnectOptions, connection::SqliteBackend, limits::PageLimits,
    };

    async fn run_script(script: &str) -> Vec<Value> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE orders (id INTEGER PRIMARY KEY, status TEXT);
                 INSERT INTO orders VALUES (1, 'pending'), (2, 'pending'), (3, 'shipped');",
            )
            .unwrap();
        let backend = SqliteBackend::open(&path, &ConnectOptions::default()).unwrap();
        let engine = TableEngine::new(Arc::new(backend), PageLimits::default());

        let io = NdjsonIo::new(script.as_bytes(), Vec::new());
        let out = serve(engine, io).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn serves_each_command() {
        let script = r#"{"v":1,"id":"a","cmd":"tables"}
{"v":1,"id":"b","cmd":"columns","payload":{"table":"orders"}}
{"v":1,"id":"c","cmd":"rows","payload":{"table":"orders","params":[["status__contains","PEND"],["pageSize","1"]]}}
{"v":1,"id":"d","cmd":"delete","payload":{"table":"orders","ids":[3, 99]}}
"#;
        let out = run_script(script).await;
        assert_eq!(out.len(), 4);

        assert_eq!(out[0]["data"]["tables"], serde_json::json!(["orders"]));
        assert_eq!(out[1]["data"]["columns"][0]["isPrimaryKey"], true);
        assert_eq!(out[1]["data"]["columns"][1]["type"], "TEXT");

        assert_eq!(out[2]["id"], "c");
        assert_eq!(out[2]["data"]["total"], 2);
        assert_eq!(out[2]["data"]["pageSize"], 1);
        assert_eq!(out[2]["data"]["rows"].as_array().unwrap().len(), 1);

        assert_eq!(out[3]["data"]["deleted"], 1);
    }

    #[tokio::test]
    async fn errors_are_structured_and_loop_continues() {
        let script = r#"not json
{"v":2,"id":"old","cmd":"tables"}
{"v":1,"id":"x","cmd":"drop_everything"}
{"v":1,"id":"y","cmd":"rows","payload":{"table":"ghost"}}
{"v":1,"id":"z","cmd":"delete","payload":{"table":"orders","ids":[]}}

{"v":1,"id":"last","cmd":"tables"}
"#;
        let out = run_script(script).await;
        assert_eq!(out.len(), 6);

        assert_eq!(out[0]["status"], "error");
        assert_eq!(out[0]["code"], "INVALID_ARGUMENT");
        assert_eq!(out[1]["code"], "INVALID_ARGUMENT");
        assert_eq!(out[2]["code"], "INVALID_ARGUMENT");

        assert_eq!(out[3]["id"], "y");
        assert_eq!(out[3]["code"], "NOT_FOUND");
        assert_eq!(out[3]["httpStatus"], 404);

        assert_eq!(out[4]["code"], "INVALID_ARGUMENT");
        assert_eq!(out[4]["httpStatus"], 400);

        assert_eq!(out[5]["status"], "ok");
    }
}
