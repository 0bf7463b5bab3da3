use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info};

use super::dispatcher::Dispatcher;
use super::error::ServerError;
use super::Request;

pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Serves newline-delimited JSON-RPC on one duplex stream at a time.
///
/// Each request is read, dispatched and fully answered before the next line is
/// read, so responses leave in request order. The dispatcher (and with it the
/// gamepad state) outlives a connection; calling [`RpcServer::run`] again with a
/// new stream continues where the last one stopped.
#[derive(Debug)]
pub struct RpcServer {
    dispatcher: Dispatcher,
    max_line_length: usize,
}

impl RpcServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Lines longer than this terminate the connection
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves `stream` until EOF (`Ok` with the number of answered requests) or
    /// until a transport fault. Dispatch faults are answered and do not stop the loop.
    pub async fn run<S>(&mut self, stream: S) -> Result<u64, ServerError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(self.max_line_length));
        let mut answered = 0u64;

        while let Some(line) = framed.next().await {
            let line = line.map_err(ServerError::Read)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request: Request =
                serde_json::from_str(line).map_err(|source| ServerError::MalformedRequest {
                    line: line.to_string(),
                    source,
                })?;
            let response = self.dispatcher.dispatch(&request);
            let encoded = serde_json::to_string(&response).map_err(ServerError::Encode)?;

            // send() flushes, the next read only starts once the peer has the answer
            framed.send(encoded).await.map_err(ServerError::Write)?;
            answered += 1;
        }

        debug!("Peer closed the stream");
        info!("Connection finished after {} requests", answered);
        Ok(answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::{Gamepad, LayoutKind, RecordingSink};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

    fn server() -> (RpcServer, RecordingSink) {
        let sink = RecordingSink::new();
        let gamepad = Gamepad::with_kind(LayoutKind::Custom, Box::new(sink.clone())).unwrap();
        (RpcServer::new(Dispatcher::new(gamepad)), sink)
    }

    /// Feeds `input` as one burst, closes the write side and collects every response
    async fn exchange(server: &mut RpcServer, input: &str) -> (Result<u64, ServerError>, String) {
        let (mut client, server_end) = tokio::io::duplex(64 * 1024);
        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();
        let result = server.run(server_end).await;
        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        (result, output)
    }

    #[tokio::test]
    async fn set_axis_then_read_it_back() {
        let (mut server, _) = server();
        let input = concat!(
            r#"{"id":1,"method":"SetAxis","params":{"index":2,"value":-500}}"#,
            "\n",
            r#"{"id":2,"method":"Axis","params":{"index":2}}"#,
            "\n",
        );
        let (result, output) = exchange(&mut server, input).await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(
            output,
            "{\"id\":1,\"result\":true}\n{\"id\":2,\"result\":-500}\n"
        );
    }

    #[tokio::test]
    async fn unknown_method_keeps_connection_open() {
        let (mut server, _) = server();
        let input = concat!(
            r#"{"id":1,"jsonrpc":"2.0","method":"Rumble","params":{}}"#,
            "\n",
            r#"{"id":2,"jsonrpc":"2.0","method":"Button","params":{"index":0}}"#,
            "\n",
        );
        let (result, output) = exchange(&mut server, input).await;
        assert_eq!(result.unwrap(), 2);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"id":1,"error":{"code":-32603,"message":"method not found: Rumble"}}"#,
                r#"{"id":2,"result":false}"#,
            ]
        );
    }

    #[tokio::test]
    async fn blank_lines_and_crlf_are_ignored() {
        let (mut server, sink) = server();
        let input = "\n   \r\n{\"id\":9,\"method\":\"SendState\"}\r\n\n";
        let (result, output) = exchange(&mut server, input).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(output, "{\"id\":9,\"result\":true}\n");
        assert_eq!(sink.reports().len(), 1);
    }

    #[tokio::test]
    async fn final_line_without_newline_is_answered() {
        let (mut server, _) = server();
        let (result, output) =
            exchange(&mut server, r#"{"id":3,"method":"Hat","params":{"index":0}}"#).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(output, "{\"id\":3,\"result\":8}\n");
    }

    #[tokio::test]
    async fn malformed_line_terminates_the_connection() {
        let (mut server, _) = server();
        let input = concat!(
            r#"{"id":1,"method":"SetButton","params":{"index":0,"push":true}}"#,
            "\n",
            "not json\n",
            r#"{"id":2,"method":"Button","params":{"index":0}}"#,
            "\n",
        );
        let (result, output) = exchange(&mut server, input).await;
        match result {
            Err(ServerError::MalformedRequest { line, .. }) => assert_eq!(line, "not json"),
            other => panic!("expected malformed request, got {other:?}"),
        }
        assert_eq!(output, "{\"id\":1,\"result\":true}\n");
    }

    #[tokio::test]
    async fn line_without_id_or_method_terminates_the_connection() {
        for junk in ["{}", "[]", r#"{"foo":1}"#, r#"{"method":"SendState"}"#] {
            let (mut server, sink) = server();
            let input = format!("{junk}\n{{\"id\":1,\"method\":\"SendState\"}}\n");
            let (result, output) = exchange(&mut server, &input).await;
            match result {
                Err(ServerError::MalformedRequest { line, .. }) => assert_eq!(line, junk),
                other => panic!("expected malformed request for {junk}, got {other:?}"),
            }
            assert!(output.is_empty(), "{junk} was answered: {output}");
            assert!(sink.reports().is_empty());
        }
    }

    #[tokio::test]
    async fn overlong_line_is_a_read_fault() {
        let (server, _) = server();
        let mut server = server.with_max_line_length(32);
        let input = format!("{{\"id\":1,\"method\":\"{}\"}}\n", "x".repeat(64));
        let (result, output) = exchange(&mut server, &input).await;
        assert!(matches!(result, Err(ServerError::Read(_))));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn state_survives_reconnects() {
        let (mut server, _) = server();
        let (result, _) = exchange(
            &mut server,
            "{\"id\":1,\"method\":\"SetButton\",\"params\":{\"index\":4,\"push\":true}}\n",
        )
        .await;
        assert_eq!(result.unwrap(), 1);
        let (_, output) = exchange(
            &mut server,
            "{\"id\":1,\"method\":\"Button\",\"params\":{\"index\":4}}\n",
        )
        .await;
        assert_eq!(output, "{\"id\":1,\"result\":true}\n");
        assert_eq!(server.dispatcher().gamepad().button(4), Ok(true));
    }

    #[tokio::test]
    async fn answers_each_request_before_reading_the_next() {
        let (mut server, _) = server();
        let (client, server_end) = tokio::io::duplex(1024);
        let task = tokio::spawn(async move { server.run(server_end).await });

        let (read_half, mut write_half) = tokio::io::split(client);
        let mut responses = BufReader::new(read_half).lines();
        for id in 1..=3 {
            let request = format!(
                "{{\"id\":{id},\"method\":\"SetAxis\",\"params\":{{\"index\":0,\"value\":{}}}}}\n",
                id * 100
            );
            write_half.write_all(request.as_bytes()).await.unwrap();
            let line = responses.next_line().await.unwrap().unwrap();
            assert_eq!(line, format!("{{\"id\":{id},\"result\":true}}"));
        }
        write_half.shutdown().await.unwrap();
        assert_eq!(responses.next_line().await.unwrap(), None);
        assert_eq!(task.await.unwrap().unwrap(), 3);
    }
}
