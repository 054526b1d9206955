//! WebSocket push transport
//!
//! Concrete `PushTransport` over tokio-tungstenite. Read errors are folded
//! into a terminal abnormal close, so the connection layer only ever sees a
//! frame or a close.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use bz_core::error::ChannelError;
use bz_core::traits::{PushStream, PushTransport, StreamEvent};

/// Connects to the server's push endpoint
pub struct WsTransport {
    url: String,
}

impl WsTransport {
    /// Create a transport targeting `url` (a ws:// or wss:// endpoint)
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    type Stream = WsStream;

    async fn connect(&self) -> Result<WsStream, ChannelError> {
        tracing::debug!(url = %self.url, "Dialing push endpoint");
        let (ws, _response) = connect_async(&self.url)
            .await
            .map_err(|e| ChannelError::ConnectFailed(e.to_string()))?;
        Ok(WsStream { ws, done: false })
    }
}

/// A live websocket stream
pub struct WsStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    done: bool,
}

#[async_trait]
impl PushStream for WsStream {
    async fn next_event(&mut self) -> StreamEvent {
        if self.done {
            return StreamEvent::Closed { normal: false };
        }
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return StreamEvent::Frame(text),
                Some(Ok(Message::Close(frame))) => {
                    let normal = frame
                        .as_ref()
                        .map(|f| f.code == CloseCode::Normal)
                        .unwrap_or(false);
                    self.done = true;
                    return StreamEvent::Closed { normal };
                }
                // Control frames and binary payloads carry no push events
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!("Push socket read error: {}", e);
                    self.done = true;
                    return StreamEvent::Closed { normal: false };
                }
                None => {
                    self.done = true;
                    return StreamEvent::Closed { normal: false };
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.ws
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "client teardown".into(),
            })))
            .await
            .map_err(|e| ChannelError::CloseFailed(e.to_string()))
    }
}
