//! WebSocket transport for the tuner socket.
//!
//! The node speaks JSON text and MessagePack binary on the same socket and
//! the frame type carries no meaning, so [`TunerSocket`] hands every data
//! frame up as plain payload bytes. Classification happens in
//! [`crate::protocol`].
//!
//! [`connect`] returns a ([`SocketWriter`], [`TunerSocket`]) pair ready for
//! use in a `tokio::select!` loop. Pongs are swallowed by the reader; pings
//! are surfaced because only the writer can answer them.

// Rust guideline compliant 2026-02

use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;

use crate::protocol::OutboundFrame;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Close code reported when the peer closed without one.
const NO_STATUS: u16 = 1005;

/// Something that arrived on the socket.
#[derive(Debug, PartialEq, Eq)]
pub enum SocketEvent {
    /// Payload of a text or binary frame.
    Frame(Vec<u8>),
    /// Ping the writer has to answer.
    Ping(Vec<u8>),
    /// The peer closed the connection.
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Write half of the tuner socket.
#[derive(Debug)]
pub struct SocketWriter {
    sink: SplitSink<WsStream, Message>,
}

impl SocketWriter {
    /// Send an encoded outbound message in the frame type it asks for.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is gone.
    pub async fn send(&mut self, frame: OutboundFrame) -> Result<()> {
        let message = match frame {
            OutboundFrame::Text(text) => Message::Text(text),
            OutboundFrame::Binary(data) => Message::Binary(data),
        };
        self.sink.send(message).await.context("WebSocket send failed")
    }

    /// Answer a ping.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is gone.
    pub async fn pong(&mut self, data: Vec<u8>) -> Result<()> {
        self.sink
            .send(Message::Pong(data))
            .await
            .context("WebSocket pong failed")
    }

    /// Flush pending writes and send a close frame.
    ///
    /// # Errors
    ///
    /// Returns an error if closing fails.
    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await.context("WebSocket close failed")
    }
}

/// Read half of the tuner socket.
#[derive(Debug)]
pub struct TunerSocket {
    stream: SplitStream<WsStream>,
}

impl TunerSocket {
    /// Next event, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<SocketEvent>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(anyhow::anyhow!("WebSocket read error: {e}"))),
            };
            let event = match message {
                Message::Text(text) => {
                    log::trace!("[Socket] Text frame, {} bytes", text.len());
                    SocketEvent::Frame(text.into_bytes())
                }
                Message::Binary(data) => {
                    log::trace!("[Socket] Binary frame, {} bytes", data.len());
                    SocketEvent::Frame(data)
                }
                Message::Ping(data) => SocketEvent::Ping(data),
                Message::Close(frame) => {
                    let (code, reason) = frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((NO_STATUS, String::new()));
                    SocketEvent::Closed { code, reason }
                }
                Message::Pong(_) | Message::Frame(_) => continue,
            };
            return Some(Ok(event));
        }
    }
}

/// Open the tuner socket at `url`.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the handshake fails.
pub async fn connect(url: &str) -> Result<(SocketWriter, TunerSocket)> {
    let request = url
        .into_client_request()
        .with_context(|| format!("invalid WebSocket URL: {url}"))?;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .with_context(|| format!("WebSocket connect to {url} failed"))?;

    let (sink, stream) = ws_stream.split();
    Ok((SocketWriter { sink }, TunerSocket { stream }))
}

/// Turn a configured endpoint into a WebSocket URL.
///
/// `http(s)://` becomes `ws(s)://`; a bare `host:port/path` gets `ws://`.
#[must_use]
pub fn endpoint_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if url.starts_with("ws://") || url.starts_with("wss://") {
        url.to_string()
    } else {
        format!("ws://{url}")
    }
}
