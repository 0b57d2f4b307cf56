// Newline-delimited JSON-RPC over stdio

use crate::protocol::{JsonRpcError, JsonRpcResponse};
use crate::server::McpServer;
use anyhow::{Context, Result};
use bytes::{Buf, BytesMut};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec};

/// Longest request line accepted before the line is discarded
pub const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// One newline-terminated unit of input
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Message(BytesMut),
    /// A line longer than the limit; its bytes have been dropped
    Oversized,
}

/// Splits input on `\n` without decoding it, dropping lines over `max_length`.
///
/// Never fails on content: invalid UTF-8 passes through as bytes and an
/// overlong line becomes `Frame::Oversized`.
struct MessageCodec {
    max_length: usize,
    next_index: usize,
    discarding: bool,
}

impl MessageCodec {
    fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, std::io::Error> {
        loop {
            let read_to = buf.len().min(self.max_length.saturating_add(1));
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match (self.discarding, newline) {
                (true, Some(end)) => {
                    buf.advance(end + 1);
                    self.discarding = false;
                    self.next_index = 0;
                    return Ok(Some(Frame::Oversized));
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(end)) => {
                    self.next_index = 0;
                    let mut line = buf.split_to(end + 1);
                    line.truncate(end);
                    return Ok(Some(Frame::Message(line)));
                }
                (false, None) if buf.len() > self.max_length => {
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, std::io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        if self.discarding {
            self.discarding = false;
            buf.clear();
            return Ok(Some(Frame::Oversized));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(Frame::Message(buf.split())))
    }
}

/// Serve requests from stdin, writing responses to stdout.
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<()> {
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve one JSON-RPC message per line until `reader` reaches EOF.
///
/// Each line is dispatched on its own task; responses are written as they
/// complete, so callers correlate them by id. Returns once every in-flight
/// request has been answered.
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    serve_with_limit(server, reader, writer, MAX_MESSAGE_BYTES).await
}

async fn serve_with_limit<R, W>(
    server: Arc<McpServer>,
    reader: R,
    writer: W,
    max_length: usize,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut frames = FramedRead::new(reader, MessageCodec::new(max_length));
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let writer_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            sink.send(line).await.context("Failed to write response")?;
        }
        Ok::<_, anyhow::Error>(())
    });

    tracing::info!("MCP server listening on stdio");

    while let Some(frame) = frames.next().await {
        let line = match frame.context("Failed to read request")? {
            Frame::Message(line) => line,
            Frame::Oversized => {
                tracing::warn!(max_length, "Discarding oversized request line");
                let response = JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request(format!(
                        "Request exceeds {} bytes",
                        max_length
                    )),
                );
                send_response(&tx, &response).await;
                continue;
            }
        };
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let server = server.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = match serde_json::from_slice::<Value>(&line) {
                Ok(message) => server.handle_message(message).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse request line");
                    Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
                }
            };

            if let Some(response) = response {
                send_response(&tx, &response).await;
            }
        });
    }

    tracing::info!("Input closed, draining in-flight requests");
    drop(tx);
    writer_task.await.context("Writer task failed")??;

    Ok(())
}

async fn send_response(tx: &mpsc::Sender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(encoded) => {
            if tx.send(encoded).await.is_err() {
                tracing::warn!("Response dropped, writer closed");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_post, FakeSource};
    use crate::tools::{register_reddit_tools, ToolRegistry};
    use reddit_mcp_core::PostSource;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_server() -> Arc<McpServer> {
        let source: Arc<dyn PostSource> =
            Arc::new(FakeSource::with_posts(vec![sample_post("over stdio")]));
        let mut registry = ToolRegistry::new();
        register_reddit_tools(&mut registry, source);
        Arc::new(McpServer::new(registry))
    }

    async fn run_session(input: &str) -> Vec<Value> {
        run_raw_session(input.as_bytes(), MAX_MESSAGE_BYTES).await
    }

    async fn run_raw_session(input: &[u8], max_length: usize) -> Vec<Value> {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);

        client_in.write_all(input).await.unwrap();
        drop(client_in);

        serve_with_limit(create_server(), server_in, server_out, max_length)
            .await
            .unwrap();

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_session() {
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "search_reddit", "arguments": {"query": "rust"}}}),
        ]
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("\n");

        let mut responses = run_session(&format!("{}\n", input)).await;
        responses.sort_by_key(|r| r["id"].as_i64());

        // The notification gets no reply
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 3);

        let text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
        let posts: Value = serde_json::from_str(text).unwrap();
        assert_eq!(posts[0]["title"], "over stdio");
    }

    #[tokio::test]
    async fn test_parse_error_and_blank_lines() {
        let responses = run_session("\n   \n{not json}\n").await;

        assert_eq!(responses.len(), 1);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(run_session("").await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let input = b"{\"id\":1,\"method\":\"ping\"}\n{\"id\":2,\"method\":\"\xff\xfe\"}\n{\"id\":3,\"method\":\"ping\"}\n";
        let responses = run_raw_session(input, MAX_MESSAGE_BYTES).await;

        assert_eq!(responses.len(), 3);
        let parse_errors: Vec<_> = responses
            .iter()
            .filter(|r| r["error"]["code"] == -32700)
            .collect();
        assert_eq!(parse_errors.len(), 1);
        assert!(parse_errors[0]["id"].is_null());

        let mut ids: Vec<_> = responses.iter().filter_map(|r| r["id"].as_i64()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_oversized_line_is_rejected_and_skipped() {
        let long = format!(
            "{{\"id\":1,\"method\":\"ping\",\"params\":{{\"pad\":\"{}\"}}}}",
            "x".repeat(512)
        );
        let input = format!("{}\n{{\"id\":2,\"method\":\"ping\"}}\n", long);
        let responses = run_raw_session(input.as_bytes(), 128).await;

        assert_eq!(responses.len(), 2);
        let rejected = responses.iter().find(|r| r["id"].is_null()).unwrap();
        assert_eq!(rejected["error"]["code"], -32600);
        assert!(responses.iter().any(|r| r["id"] == 2 && r["result"] == json!({})));
    }

    #[tokio::test]
    async fn test_unterminated_final_line() {
        let responses = run_session("{\"id\":9,\"method\":\"ping\"}").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 9);
    }

    #[test]
    fn test_codec_splits_and_discards() {
        let mut codec = MessageCodec::new(8);
        let mut buf = BytesMut::from(&b"abc\r\n0123456789abc\nxyz"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Message(BytesMut::from(&b"abc\r"[..])))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Oversized));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some(Frame::Message(BytesMut::from(&b"xyz"[..])))
        );
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_codec_discards_across_reads() {
        let mut codec = MessageCodec::new(4);
        let mut buf = BytesMut::from(&b"0123456"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        buf.extend_from_slice(b"89\nok\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Oversized));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Message(BytesMut::from(&b"ok"[..])))
        );
    }
}
