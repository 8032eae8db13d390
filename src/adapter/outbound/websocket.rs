//! WebSocket transport over tokio-tungstenite.
//!
//! # Frame handling
//!
//! - **Text**: passed up as [`Frame::Text`].
//! - **Binary**: passed up as text when valid UTF-8, otherwise as
//!   [`Frame::Undecodable`].
//! - **Ping/Pong**: protocol-level keepalive. tungstenite queues the pong
//!   reply itself and flushes it on the next read, so nothing is awaited
//!   here and `recv` stays cancel-safe.
//! - **Close / error / end of stream**: reported once as [`Frame::Closed`].
//!
//! The JSON `ping`/`pong` heartbeat rides on text frames and is handled by
//! the manager, not here.

use std::borrow::Cow;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{error, info, trace, warn};

use crate::domain::CloseInfo;
use crate::error::Result;
use crate::port::{Channel, ChannelProbe, Frame, Transport};

/// Close code reported when the server sends a close frame with no status.
const NO_STATUS_RECEIVED: u16 = 1005;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket channels. Uses TLS when the URL scheme is `wss://`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn Channel>> {
        info!(url = %url, "Connecting to WebSocket");

        let (ws_stream, response) = connect_async(url).await?;

        info!(status = %response.status(), "WebSocket connected");

        Ok(Box::new(WebSocketChannel::new(ws_stream)))
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

/// One open WebSocket connection.
pub struct WebSocketChannel {
    ws: WsStream,
    probe: ChannelProbe,
}

impl WebSocketChannel {
    #[must_use]
    pub fn new(ws: WsStream) -> Self {
        Self {
            ws,
            probe: ChannelProbe::new(),
        }
    }

    fn closed(&self, info: CloseInfo) -> Frame {
        self.probe.mark_closed();
        Frame::Closed(info)
    }
}

#[async_trait]
impl Channel for WebSocketChannel {
    async fn send(&mut self, text: String) -> Result<()> {
        trace!(bytes = text.len(), "Sending WebSocket text frame");
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Frame {
        loop {
            let Some(next) = self.ws.next().await else {
                warn!("WebSocket stream ended");
                return self.closed(CloseInfo::abnormal("stream ended"));
            };

            match next {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    return Frame::Text(text);
                }
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Frame::Text(text),
                    Err(e) => {
                        warn!(bytes = e.as_bytes().len(), "Received non-UTF-8 binary frame");
                        return Frame::Undecodable(format!(
                            "binary frame is not valid UTF-8: {}",
                            e.utf8_error()
                        ));
                    }
                },
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    let info = frame.map_or_else(
                        || CloseInfo::new(NO_STATUS_RECEIVED, ""),
                        |f| CloseInfo::new(u16::from(f.code), f.reason.into_owned()),
                    );
                    return self.closed(info);
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    return self.closed(CloseInfo::abnormal(e.to_string()));
                }
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        self.probe.mark_closed();
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_owned()),
        };
        self.ws.close(Some(frame)).await?;
        Ok(())
    }

    fn probe(&self) -> ChannelProbe {
        self.probe.clone()
    }
}
