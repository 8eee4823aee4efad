//! Scripted in-process WebSocket synthesis server.
//!
//! Binds an ephemeral port, accepts one connection, reads the synthesis
//! command, and plays back a configured script: optional start marker,
//! binary audio chunks, then a terminal marker, an error marker, or an
//! abrupt drop.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// How the scripted stream ends.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Send `{"type":"end","request_id":...}` echoing the command's id
    End,
    /// Send an error marker instead of finishing
    Error { message: String, code: String },
    /// Close the socket without any terminal marker
    Drop,
}

/// One-connection synthesis server.
pub struct MockSynthesisServer {
    pub url: Url,
    handle: JoinHandle<()>,
}

impl MockSynthesisServer {
    /// Starts a server that streams `chunks` and finishes with `outcome`.
    /// When `send_start` is set, a start marker precedes the audio.
    pub async fn start(chunks: Vec<Vec<u8>>, send_start: bool, outcome: Outcome) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let url = Url::parse(&format!("ws://{addr}/synthesis")).expect("mock url");

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");

            // First inbound text frame is the synthesis command.
            let request_id = loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let command: Value =
                            serde_json::from_str(&text).expect("command is JSON");
                        break command["request_id"]
                            .as_str()
                            .unwrap_or("missing")
                            .to_string();
                    }
                    Some(Ok(_)) => continue,
                    other => panic!("expected synthesis command, got {other:?}"),
                }
            };

            if send_start {
                let start = json!({"type": "start", "request_id": request_id, "status": 200});
                ws.send(Message::Text(start.to_string().into()))
                    .await
                    .expect("send start");
            }

            for chunk in chunks {
                ws.send(Message::Binary(chunk.into()))
                    .await
                    .expect("send chunk");
            }

            match outcome {
                Outcome::End => {
                    let end = json!({"type": "end", "request_id": request_id, "status": 200});
                    ws.send(Message::Text(end.to_string().into()))
                        .await
                        .expect("send end");
                }
                Outcome::Error { message, code } => {
                    let error = json!({"type": "error", "message": message, "code": code});
                    ws.send(Message::Text(error.to_string().into()))
                        .await
                        .expect("send error");
                }
                Outcome::Drop => {}
            }

            let _ = ws.close(None).await;
        });

        Self { url, handle }
    }

    /// Waits for the scripted connection to finish.
    pub async fn finish(self) {
        let _ = self.handle.await;
    }
}
