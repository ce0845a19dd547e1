//! Feed transport for callwatch.
//!
//! Speaks Engine.IO v3 / Socket.IO over a WebSocket and hands the supervisor
//! a typed event channel per session.

#![forbid(unsafe_code)]

pub mod error;
pub mod packet;
pub mod socketio;
pub mod websocket;

pub use error::{StreamError, StreamResult};
pub use packet::{EnginePacket, OpenInfo, SocketPacket};
pub use socketio::{FeedConfig, FeedConnection, FeedEvent, FeedTransport, SocketIoTransport};
pub use websocket::{WsClient, WsConfig, WsConnection, WsMessage};
