//! WebSocket transport adapter for the wiki relay.
//!
//! The session layer only needs a message-oriented duplex channel:
//! [`OtSyncClient::send_message`] and [`OtSyncClient::receive_message`].
//! Frames are JSON text messages in the shapes defined by
//! [`crate::protocol::message`]; everything websocket-specific (ping/pong,
//! close frames, the upgrade handshake) stays in this module.

use async_tungstenite::tokio::connect_async;
use async_tungstenite::tungstenite::client::IntoClientRequest;
use async_tungstenite::tungstenite::Message as WsMessage;
use async_tungstenite::WebSocketStream;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::error::{OtSyncError, Result};
use crate::protocol::{ClientMessage, ServerMessage};

/// Type alias for the WebSocket stream returned by connect_async.
type WsStream = WebSocketStream<async_tungstenite::tokio::ConnectStream>;

/// Configuration for connecting to a relay endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL to connect to (e.g. `ws://localhost:8080/api/pages/Home/edits`).
    pub url: String,
    /// Optional authentication token, appended as a query parameter.
    pub token: Option<String>,
    /// User agent string sent with the upgrade request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            user_agent: String::from("wiki-otsync/0.1"),
        }
    }

    /// Sets the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the WebSocket URL with the optional token.
    fn build_url(&self) -> String {
        match &self.token {
            Some(token) => {
                if self.url.contains('?') {
                    format!("{}&token={}", self.url, token)
                } else {
                    format!("{}?token={}", self.url, token)
                }
            }
            None => self.url.clone(),
        }
    }
}

/// A message-oriented connection to the relay.
pub struct OtSyncClient {
    stream: WsStream,
}

impl OtSyncClient {
    /// Connects to a relay using the given configuration.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let url = config.build_url();

        let mut request = url
            .into_client_request()
            .map_err(|e| OtSyncError::Protocol(format!("Failed to build request: {}", e)))?;

        if let Ok(value) = config.user_agent.parse() {
            request.headers_mut().insert("User-Agent", value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| OtSyncError::Protocol(format!("Failed to connect: {}", e)))?;
        debug!(url = %config.url, "websocket connected");

        Ok(Self { stream })
    }

    /// Sends a client message as one text frame.
    pub async fn send_message(&mut self, msg: &ClientMessage) -> Result<()> {
        let frame = msg.encode()?;
        self.stream
            .send(WsMessage::Text(frame.into()))
            .await
            .map_err(|e| OtSyncError::Protocol(format!("Failed to send message: {}", e)))?;
        Ok(())
    }

    /// Receives the next server message.
    ///
    /// Returns `Ok(None)` once the relay closes the connection. Decode
    /// failures (including unknown message tags) are returned as errors
    /// and should be treated as fatal for the connection.
    pub async fn receive_message(&mut self) -> Result<Option<ServerMessage>> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(frame))) => {
                    return ServerMessage::decode(&frame).map(Some);
                }
                Some(Ok(WsMessage::Close(_))) => return Ok(None),
                Some(Ok(WsMessage::Ping(data))) => {
                    self.stream
                        .send(WsMessage::Pong(data))
                        .await
                        .map_err(|e| {
                            OtSyncError::Protocol(format!("Failed to send pong: {}", e))
                        })?;
                }
                Some(Ok(WsMessage::Pong(_))) => {
                    // Ignore, continue receiving.
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    // The edit stream is text-only.
                    warn!("ignoring unexpected binary frame");
                }
                Some(Ok(WsMessage::Frame(_))) => {
                    // Raw frame, continue receiving.
                }
                Some(Err(e)) => {
                    return Err(OtSyncError::Protocol(format!("WebSocket error: {}", e)));
                }
                None => return Ok(None),
            }
        }
    }

    /// Closes the connection gracefully.
    pub async fn close(mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| OtSyncError::Protocol(format!("Failed to close connection: {}", e)))?;
        Ok(())
    }
}

/// Builds the WebSocket URL for a page's edit stream.
pub fn build_page_url(base_url: &str, page: &str, token: Option<&str>) -> String {
    let ws_url = base_url
        .replace("http://", "ws://")
        .replace("https://", "wss://");

    let url = format!(
        "{}/api/pages/{}/edits",
        ws_url.trim_end_matches('/'),
        page
    );

    match token {
        Some(t) => format!("{}?token={}", url, t),
        None => url,
    }
}
