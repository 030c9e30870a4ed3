use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, AppResult};

use super::protocol::{BridgeResponse, PROTOCOL_VERSION};

/// Newline-delimited JSON over any async reader/writer pair.
pub struct NdjsonIo<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R, W> NdjsonIo<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Next line without its terminator; `None` at end of input.
    pub async fn read_line(&mut self) -> AppResult<Option<&str>> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(&['\r', '\n'][..])))
    }

    pub async fn write_json_line<T: serde::Serialize>(&mut self, v: &T) -> AppResult<()> {
        let mut buf = serde_json::to_vec(v)?;
        buf.push(b'\n');
        self.writer.write_all(&buf).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Answers a line that did not decode as a request.
    pub async fn protocol_error(&mut self, msg: String) -> AppResult<()> {
        let e = AppError::InvalidArgument(msg);
        let resp: BridgeResponse<()> = BridgeResponse::err(PROTOCOL_VERSION, String::new(), &e);
        self.write_json_line(&resp).await
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}
