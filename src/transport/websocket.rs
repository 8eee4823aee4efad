//! WebSocket transport backed by tokio-tungstenite.
//!
//! Builds the upgrade request by hand so callers can attach arbitrary
//! authentication headers, and maps tungstenite's message and close-frame
//! vocabulary onto the crate's [`Frame`] / [`TransportError`] model.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Error as WsError, Message,
        handshake::client::generate_key,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tracing::{debug, warn};
use url::Url;

use super::{Connection, Frame, Transport, TransportError};

/// Opens WebSocket connections over TCP/TLS.
#[derive(Debug, Clone, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<Box<dyn Connection>, TransportError> {
        let request = build_upgrade_request(url, headers)?;

        debug!(url = %url, "opening websocket connection");
        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        debug!(status = %response.status(), "websocket handshake complete");

        Ok(Box::new(WsConnection { inner: stream }))
    }
}

/// Builds the HTTP upgrade request, carrying both the standard WebSocket
/// handshake headers and any caller-supplied ones.
fn build_upgrade_request(
    url: &Url,
    headers: &[(String, String)],
) -> Result<http::Request<()>, TransportError> {
    let host = url
        .host_str()
        .ok_or_else(|| TransportError::Handshake(format!("url has no host: {url}")))?;
    let host_header = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut builder = http::Request::builder()
        .method("GET")
        .uri(url.as_str())
        .header("Host", host_header)
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Sec-WebSocket-Version", "13")
        .header("Sec-WebSocket-Key", generate_key());

    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(())
        .map_err(|e| TransportError::Handshake(format!("invalid handshake request: {e}")))
}

/// One open WebSocket. Ping/pong is handled transparently; only text and
/// binary frames surface to the session core.
struct WsConnection {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data),
        };
        self.inner
            .send(message)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn receive(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.to_string()))),
                Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                // tungstenite answers pings itself; both directions are noise
                // to the session core.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Ok(Message::Close(close_frame)) => {
                    return match close_frame {
                        Some(cf) if cf.code != CloseCode::Normal => {
                            warn!(code = %cf.code, reason = %cf.reason, "abnormal close frame");
                            Some(Err(TransportError::AbnormalClose {
                                code: u16::from(cf.code),
                                reason: cf.reason.to_string(),
                            }))
                        }
                        _ => None,
                    };
                }
                Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let result = self
            .inner
            .close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "client shutdown".into(),
            }))
            .await;
        match result {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_request_headers() {
        let url = Url::parse("wss://api.example.com/v1/realtime?model=gpt-4o").unwrap();
        let headers = vec![("Authorization".to_string(), "Bearer sk-test".to_string())];
        let request = build_upgrade_request(&url, &headers).unwrap();

        assert_eq!(request.headers()["Host"], "api.example.com");
        assert_eq!(request.headers()["Upgrade"], "websocket");
        assert_eq!(request.headers()["Sec-WebSocket-Version"], "13");
        assert_eq!(request.headers()["Authorization"], "Bearer sk-test");
        assert!(request.headers().contains_key("Sec-WebSocket-Key"));
    }

    #[test]
    fn test_upgrade_request_host_includes_explicit_port() {
        let url = Url::parse("ws://127.0.0.1:9090/socket").unwrap();
        let request = build_upgrade_request(&url, &[]).unwrap();
        assert_eq!(request.headers()["Host"], "127.0.0.1:9090");
    }
}
