//! WebSocket client used by the feed transport.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::HeaderName;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::{StreamError, StreamResult};

/// WebSocket message types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Text message.
    Text(String),
    /// Binary message.
    Binary(Vec<u8>),
    /// Ping message.
    Ping(Vec<u8>),
    /// Pong message.
    Pong(Vec<u8>),
    /// Close message.
    Close(Option<WsCloseFrame>),
}

impl WsMessage {
    /// Create a text message.
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    /// Check if this is a close message.
    #[must_use]
    pub const fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Get text data if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Message> for WsMessage {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Text(s) => Self::Text(s.to_string()),
            Message::Binary(b) => Self::Binary(b.to_vec()),
            Message::Ping(b) => Self::Ping(b.to_vec()),
            Message::Pong(b) => Self::Pong(b.to_vec()),
            Message::Close(frame) => Self::Close(frame.map(|f| WsCloseFrame {
                code: f.code.into(),
                reason: f.reason.to_string(),
            })),
            Message::Frame(_) => Self::Binary(vec![]),
        }
    }
}

impl From<WsMessage> for Message {
    fn from(msg: WsMessage) -> Self {
        match msg {
            WsMessage::Text(s) => Self::Text(s.into()),
            WsMessage::Binary(b) => Self::Binary(b.into()),
            WsMessage::Ping(b) => Self::Ping(b.into()),
            WsMessage::Pong(b) => Self::Pong(b.into()),
            WsMessage::Close(frame) => {
                use tokio_tungstenite::tungstenite::protocol::CloseFrame;
                use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
                Self::Close(frame.map(|f| CloseFrame {
                    code: CloseCode::from(f.code),
                    reason: f.reason.into(),
                }))
            }
        }
    }
}

/// WebSocket close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsCloseFrame {
    /// Close code.
    pub code: u16,
    /// Close reason.
    pub reason: String,
}

/// WebSocket connection settings.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Upper bound on the TCP/TLS/upgrade exchange.
    pub connect_timeout: Duration,
    /// Extra request headers sent with the upgrade request.
    pub headers: Vec<(String, String)>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}

impl WsConfig {
    /// Create new configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Add a header. Later values for the same name are appended.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// WebSocket client.
#[derive(Debug, Clone)]
pub struct WsClient {
    url: Url,
    config: WsConfig,
}

impl WsClient {
    /// Create with configuration.
    #[must_use]
    pub const fn with_config(url: Url, config: WsConfig) -> Self {
        Self { url, config }
    }

    /// Open the WebSocket, sending the configured headers with the upgrade.
    ///
    /// # Errors
    /// Returns an error if a header is invalid or the connection attempt
    /// fails or times out.
    pub async fn connect(&self) -> StreamResult<WsConnection> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;

        for (name, value) in &self.config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| StreamError::ConnectionFailed(format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| StreamError::ConnectionFailed(format!("invalid header value: {e}")))?;
            request.headers_mut().append(name, value);
        }

        let Ok(ws_result) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(request)).await
        else {
            return Err(StreamError::Timeout(self.config.connect_timeout));
        };

        let (ws_stream, _response) =
            ws_result.map_err(|e| StreamError::WebSocketError(e.to_string()))?;

        Ok(WsConnection::new(ws_stream))
    }
}

/// Active WebSocket connection.
pub struct WsConnection {
    inner: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    closed: bool,
}

impl WsConnection {
    const fn new(stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>) -> Self {
        Self {
            inner: stream,
            closed: false,
        }
    }

    /// Send a message.
    ///
    /// # Errors
    /// Returns a stream error if the message cannot be sent.
    pub async fn send(&mut self, message: WsMessage) -> StreamResult<()> {
        if self.closed {
            return Err(StreamError::InvalidState("Connection is closed".into()));
        }

        self.inner
            .send(message.into())
            .await
            .map_err(|e| StreamError::WebSocketError(e.to_string()))
    }

    /// Send a text message.
    ///
    /// # Errors
    /// Returns a stream error if the message cannot be sent.
    pub async fn send_text(&mut self, text: impl Into<String>) -> StreamResult<()> {
        self.send(WsMessage::text(text)).await
    }

    /// Receive the next message. `Ok(None)` once the peer has gone away.
    ///
    /// # Errors
    /// Returns a stream error if the underlying socket fails.
    pub async fn recv(&mut self) -> StreamResult<Option<WsMessage>> {
        if self.closed {
            return Ok(None);
        }

        match self.inner.next().await {
            Some(Ok(msg)) => {
                let ws_msg: WsMessage = msg.into();
                if ws_msg.is_close() {
                    self.closed = true;
                }
                Ok(Some(ws_msg))
            }
            Some(Err(e)) => Err(StreamError::WebSocketError(e.to_string())),
            None => {
                self.closed = true;
                Ok(None)
            }
        }
    }

    /// Close the connection.
    ///
    /// # Errors
    /// Returns a stream error if the close frame fails to send.
    pub async fn close(&mut self) -> StreamResult<()> {
        if !self.closed {
            self.closed = true;
            self.inner
                .close(None)
                .await
                .map_err(|e| StreamError::WebSocketError(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_frame_conversion() {
        let msg: WsMessage = Message::Close(None).into();
        assert!(msg.is_close());
        assert_eq!(msg.as_text(), None);
    }

    #[test]
    fn text_roundtrip_through_tungstenite() {
        let tungstenite: Message = WsMessage::text("42[]").into();
        let back: WsMessage = tungstenite.into();
        assert_eq!(back.as_text(), Some("42[]"));
    }

    #[test]
    fn config_headers_keep_order() {
        let config = WsConfig::new()
            .with_connect_timeout(Duration::from_secs(5))
            .with_header("Cookie", "a=1")
            .with_header("User-Agent", "callwatch");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.headers[0], ("Cookie".to_string(), "a=1".to_string()));
        assert_eq!(config.headers[1].0, "User-Agent");
    }
}
