//! Socket.IO feed transport.
//!
//! [`SocketIoTransport::connect`] performs the whole handshake (WebSocket
//! upgrade, Engine.IO open, Socket.IO namespace connect) before returning, so
//! a returned [`FeedConnection`] is always live. A background task then owns
//! the socket: it keeps the Engine.IO ping cycle going and forwards every
//! configured event as a [`FeedEvent::Snapshot`]. The event channel closes
//! when the session ends; the task's result says why.

use std::time::Duration;

use async_trait::async_trait;
use cw_core::Credentials;
use cw_core::engine::text_excerpt;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::packet::{ENGINE_IO_VERSION, EnginePacket, OpenInfo, SocketPacket};
use crate::websocket::{WsClient, WsConfig, WsConnection, WsMessage};
use crate::{StreamError, StreamResult};

/// Default browser user agent presented to the feed.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Default name of the snapshot event.
pub const DEFAULT_EVENT: &str = "call";

/// Settings for the Socket.IO feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket endpoint without auth query parameters.
    pub url: String,
    /// Event name carrying snapshots.
    pub event: String,
    /// Bound on the full handshake.
    pub connect_timeout: Duration,
    /// User agent header.
    pub user_agent: String,
    /// Optional `Origin` header.
    pub origin: Option<String>,
    /// Capacity of the event channel.
    pub channel_capacity: usize,
}

impl FeedConfig {
    /// Configuration for `url` with defaults for everything else.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            event: DEFAULT_EVENT.to_string(),
            connect_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin: None,
            channel_capacity: 64,
        }
    }

    /// Set the snapshot event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Set the handshake timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Endpoint URL with the auth and transport query parameters.
    ///
    /// # Errors
    /// Returns [`StreamError::InvalidUrl`] when the base URL does not parse.
    pub fn session_url(&self, credentials: &Credentials) -> StreamResult<Url> {
        let mut url = Url::parse(&self.url)?;
        url.query_pairs_mut()
            .append_pair("token", &credentials.token)
            .append_pair("user", &credentials.user)
            .append_pair("EIO", ENGINE_IO_VERSION)
            .append_pair("transport", "websocket");
        Ok(url)
    }

    fn ws_config(&self, credentials: &Credentials) -> WsConfig {
        let mut config = WsConfig::new()
            .with_connect_timeout(self.connect_timeout)
            .with_header("User-Agent", self.user_agent.clone());
        let cookie = credentials.cookie_header();
        if !cookie.is_empty() {
            config = config.with_header("Cookie", cookie);
        }
        if let Some(origin) = &self.origin {
            config = config.with_header("Origin", origin.clone());
        }
        config
    }
}

/// Event delivered by a live feed session.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Raw snapshot payload.
    Snapshot(Value),
}

/// A live feed session.
pub struct FeedConnection {
    /// Inbound events; closes when the session ends.
    pub events: mpsc::Receiver<FeedEvent>,
    /// Session task; its result says why the session ended.
    pub join_handle: tokio::task::JoinHandle<StreamResult<()>>,
    /// Session id from the open packet.
    pub session_id: String,
    close_tx: watch::Sender<bool>,
}

impl FeedConnection {
    /// Assemble a connection from its parts.
    ///
    /// The session task is expected to stop when `close_tx` flips to `true`.
    #[must_use]
    pub const fn new(
        events: mpsc::Receiver<FeedEvent>,
        join_handle: tokio::task::JoinHandle<StreamResult<()>>,
        session_id: String,
        close_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            events,
            join_handle,
            session_id,
            close_tx,
        }
    }

    /// Ask the session task to say goodbye and close the socket.
    pub fn request_close(&self) {
        let _ = self.close_tx.send(true);
    }

    /// Close and wait for the session task to finish.
    pub async fn close(self) -> StreamResult<()> {
        self.request_close();
        match self.join_handle.await {
            Ok(result) => result,
            Err(e) => Err(StreamError::InvalidState(format!("session task failed: {e}"))),
        }
    }
}

/// Opens feed sessions. Implemented by [`SocketIoTransport`]; tests supply fakes.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Open a session with `credentials`.
    async fn connect(&self, credentials: &Credentials) -> StreamResult<FeedConnection>;
}

/// Socket.IO over WebSocket.
#[derive(Debug, Clone)]
pub struct SocketIoTransport {
    config: FeedConfig,
}

impl SocketIoTransport {
    /// Create a transport.
    #[must_use]
    pub const fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[async_trait]
impl FeedTransport for SocketIoTransport {
    #[instrument(skip_all, fields(user = %credentials.user))]
    async fn connect(&self, credentials: &Credentials) -> StreamResult<FeedConnection> {
        let url = self.config.session_url(credentials)?;
        let client = WsClient::with_config(url, self.config.ws_config(credentials));

        let timeout = self.config.connect_timeout;
        let (ws, open) = tokio::time::timeout(timeout, handshake(&client))
            .await
            .map_err(|_| StreamError::Timeout(timeout))??;

        info!(sid = %open.sid, ping_interval_ms = open.ping_interval, "Feed session established");

        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity);
        let (close_tx, close_rx) = watch::channel(false);
        let event = self.config.event.clone();
        let session_id = open.sid.clone();
        let join_handle =
            tokio::spawn(async move { run_session(ws, open, event, event_tx, close_rx).await });

        Ok(FeedConnection::new(event_rx, join_handle, session_id, close_tx))
    }
}

async fn handshake(client: &WsClient) -> StreamResult<(WsConnection, OpenInfo)> {
    let mut ws = client.connect().await?;

    let mut open = None;
    loop {
        let Some(msg) = ws.recv().await? else {
            return Err(StreamError::Handshake("socket closed during handshake".into()));
        };
        let Some(text) = msg.as_text() else {
            if msg.is_close() {
                return Err(StreamError::Handshake("server closed during handshake".into()));
            }
            continue;
        };

        match EnginePacket::decode(text)? {
            EnginePacket::Open(info) => open = Some(info),
            EnginePacket::Message(SocketPacket::Connect) => {
                let Some(info) = open else {
                    return Err(StreamError::Handshake("connect before open packet".into()));
                };
                return Ok((ws, info));
            }
            EnginePacket::Message(packet @ SocketPacket::Error(_)) => {
                let reason = packet.error_message().unwrap_or_default();
                let _ = ws.close().await;
                return Err(StreamError::AuthRejected(reason));
            }
            EnginePacket::Ping(data) => ws.send_text(EnginePacket::Pong(data).encode()).await?,
            EnginePacket::Close => {
                return Err(StreamError::Handshake("server closed during handshake".into()));
            }
            other => debug!(?other, "Ignoring packet during handshake"),
        }
    }
}

async fn run_session(
    mut ws: WsConnection,
    open: OpenInfo,
    event: String,
    event_tx: mpsc::Sender<FeedEvent>,
    mut close_rx: watch::Receiver<bool>,
) -> StreamResult<()> {
    let mut ping = tokio::time::interval(open.ping_interval());
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ping.tick().await;
    let mut pong_deadline = Instant::now() + open.pong_deadline();

    loop {
        tokio::select! {
            _ = close_rx.changed() => {
                info!(sid = %open.sid, "Closing feed session");
                let _ = ws.send_text(EnginePacket::Message(SocketPacket::Disconnect).encode()).await;
                let _ = ws.close().await;
                return Ok(());
            }
            _ = ping.tick() => {
                ws.send_text(EnginePacket::Ping(String::new()).encode()).await?;
            }
            () = sleep_until(pong_deadline) => {
                warn!(sid = %open.sid, "No pong from feed server");
                let _ = ws.close().await;
                return Err(StreamError::Timeout(open.pong_deadline()));
            }
            msg = ws.recv() => {
                let Some(msg) = msg? else {
                    return Err(StreamError::ConnectionClosed {
                        reason: "socket closed".into(),
                        code: None,
                    });
                };
                match msg {
                    WsMessage::Text(text) => match EnginePacket::decode(&text) {
                        Ok(EnginePacket::Pong(_)) => {
                            pong_deadline = Instant::now() + open.pong_deadline();
                        }
                        Ok(EnginePacket::Ping(data)) => {
                            ws.send_text(EnginePacket::Pong(data).encode()).await?;
                            pong_deadline = Instant::now() + open.pong_deadline();
                        }
                        Ok(EnginePacket::Message(SocketPacket::Event { name, mut args })) => {
                            if name != event {
                                debug!(event = %name, "Ignoring feed event");
                                continue;
                            }
                            let payload = if args.is_empty() { Value::Null } else { args.swap_remove(0) };
                            if event_tx.send(FeedEvent::Snapshot(payload)).await.is_err() {
                                info!("Event receiver dropped, closing feed session");
                                let _ = ws.close().await;
                                return Ok(());
                            }
                        }
                        Ok(EnginePacket::Message(packet @ SocketPacket::Error(_))) => {
                            let reason = packet.error_message().unwrap_or_default();
                            warn!(reason = %reason, "Feed rejected the session; refresh credentials with /update");
                            let _ = ws.close().await;
                            return Err(StreamError::AuthRejected(reason));
                        }
                        Ok(EnginePacket::Message(SocketPacket::Disconnect) | EnginePacket::Close) => {
                            let _ = ws.close().await;
                            return Err(StreamError::ConnectionClosed {
                                reason: "server disconnect".into(),
                                code: None,
                            });
                        }
                        Ok(other) => debug!(?other, "Ignoring feed packet"),
                        Err(e) => warn!(error = %e, excerpt = %text_excerpt(&text), "Undecodable feed frame"),
                    },
                    WsMessage::Close(frame) => {
                        return Err(StreamError::ConnectionClosed {
                            reason: frame.as_ref().map_or_else(|| "closed".to_string(), |f| f.reason.clone()),
                            code: frame.map(|f| f.code),
                        });
                    }
                    WsMessage::Ping(data) => ws.send(WsMessage::Pong(data)).await?,
                    WsMessage::Binary(_) | WsMessage::Pong(_) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_url_carries_auth_and_transport() {
        let config = FeedConfig::new("wss://feed.example.com/socket.io/?room=live");
        let creds = Credentials::new("tok en", "42", "sid=1");
        let url = config.session_url(&creds).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("room".to_string(), "live".to_string()),
                ("token".to_string(), "tok en".to_string()),
                ("user".to_string(), "42".to_string()),
                ("EIO".to_string(), "3".to_string()),
                ("transport".to_string(), "websocket".to_string()),
            ]
        );
    }

    #[test]
    fn ws_headers_include_cookie_and_agent() {
        let config = FeedConfig::new("ws://localhost/")
            .with_user_agent("agent/1")
            .with_origin("https://panel.example.com");
        let creds = Credentials::new("t", "u", "a=1; b=2");
        let ws = config.ws_config(&creds);
        let names: Vec<&str> = ws.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["User-Agent", "Cookie", "Origin"]);
        assert_eq!(ws.headers[1].1, "a=1; b=2");
    }

    #[test]
    fn empty_cookie_sends_no_header() {
        let config = FeedConfig::new("ws://localhost/");
        let ws = config.ws_config(&Credentials::new("t", "u", ""));
        assert!(ws.headers.iter().all(|(k, _)| k != "Cookie"));
    }

    #[test]
    fn invalid_base_url() {
        let config = FeedConfig::new("::nope");
        let err = config.session_url(&Credentials::new("t", "u", "c=1")).unwrap_err();
        assert!(matches!(err, StreamError::InvalidUrl(_)));
    }
}
