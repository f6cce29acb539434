//! Live channel client: the persistent WebSocket event stream.
//!
//! Speaks the server's Socket.IO-v1 dialect: an HTTP handshake that hands
//! out a session id, then a WebSocket carrying the text frames of
//! [`codec`]. Heartbeats and event acks are answered inside `recv_event`
//! so callers only ever see decoded [`ChatEvent`]s.

pub mod codec;
pub mod event;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

pub use event::ChatEvent;

use crate::error::ChatError;
use crate::room::compose::{OutboundMessage, TypingSignal};
use codec::Frame;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub struct ChatSocket {
    stream: WsStream,
    pending: PendingIo,
}

/// Work owed from frames already consumed off the stream: reply frames not
/// yet sent and a decoded event not yet handed to the caller.
///
/// `recv_event` runs inside a `tokio::select!` loop, so any of its awaits
/// can be cancelled. Keeping this state on the socket instead of in the
/// future means a cancelled poll re-enters with nothing lost: the stashed
/// event is delivered and owed replies are flushed on the next call.
#[derive(Debug, Default)]
struct PendingIo {
    /// Replies owed to the server (heartbeat echoes, event acks, pongs).
    outbox: VecDeque<WsMessage>,
    /// Decoded event awaiting delivery.
    ready: Option<ChatEvent>,
}

impl PendingIo {
    /// Absorb one parsed frame. Returns false on a server disconnect.
    fn ingest(&mut self, frame: Frame) -> bool {
        match frame {
            Frame::Heartbeat => {
                self.outbox
                    .push_back(WsMessage::Text(codec::HEARTBEAT.to_string()));
            }
            Frame::Event {
                name,
                payload,
                ack_id,
            } => {
                // Without acks the server retries and stalls new events.
                if let Some(id) = ack_id {
                    self.outbox.push_back(WsMessage::Text(codec::encode_ack(id)));
                }
                self.ready = ChatEvent::decode(&name, payload);
            }
            Frame::Disconnect => return false,
            Frame::Handshake | Frame::Ack => {}
            Frame::Other(raw) => {
                tracing::debug!("Unhandled frame: {}", raw);
            }
        }
        true
    }
}

impl ChatSocket {
    /// Connect the live channel for the given server base URL.
    ///
    /// Performs the Socket.IO v1 handshake (HTTP GET for a session id),
    /// opens the WebSocket, and waits for the `1::` connect frame before
    /// returning, so the socket is ready to emit on.
    pub async fn connect(http: &reqwest::Client, base_url: &str) -> Result<Self> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let handshake_url = format!("{}/socket.io/1/?t={}", base_url.trim_end_matches('/'), now_ms);

        tracing::debug!("Socket handshake GET {}", handshake_url);
        let body = http
            .get(&handshake_url)
            .send()
            .await
            .context("Socket handshake request failed")?
            .error_for_status()
            .context("Socket handshake rejected")?
            .text()
            .await
            .context("Failed to read handshake body")?;

        // Handshake body: "SID:HEARTBEAT_SECS:CLOSE_SECS:TRANSPORTS"
        let session_id = body
            .split(':')
            .next()
            .filter(|s| !s.is_empty())
            .context("Handshake body missing session id")?;

        let ws_url = format!(
            "{}/socket.io/1/websocket/{}",
            base_url.trim_end_matches('/'),
            session_id
        )
        .replace("https://", "wss://")
        .replace("http://", "ws://");

        tracing::info!("Connecting WebSocket to {}", ws_url);
        let (stream, response) = connect_async(&ws_url)
            .await
            .context("WebSocket connection failed")?;
        tracing::info!("WebSocket connected (status={})", response.status());

        let mut socket = Self {
            stream,
            pending: PendingIo::default(),
        };

        // The server confirms the session with a 1:: frame before events flow.
        match socket.recv_frame().await? {
            Some(frame) if frame.starts_with("1::") => {
                tracing::debug!("Received connect frame");
            }
            Some(frame) => {
                tracing::warn!("Expected 1:: connect frame, got: {}", frame);
            }
            None => bail!("Connection closed before connect frame"),
        }

        Ok(socket)
    }

    /// Send a text frame. A send on a dead channel is terminal; nothing is
    /// queued for redelivery.
    async fn send_text(&mut self, msg: &str) -> Result<()> {
        tracing::debug!("WS send: {}", msg);
        self.send_msg(WsMessage::Text(msg.to_string())).await
    }

    async fn send_msg(&mut self, msg: WsMessage) -> Result<()> {
        self.stream
            .send(msg)
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))
            .context("Failed to send WebSocket message")
    }

    /// Receive the next text frame. None means closed.
    ///
    /// Read-only: pings are answered by queueing a pong on the outbox, not
    /// by sending here, so there is no await between consuming a frame and
    /// returning.
    async fn recv_frame(&mut self) -> Result<Option<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    tracing::debug!("WS recv: {}", text);
                    return Ok(Some(text));
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    self.pending.outbox.push_back(WsMessage::Pong(data));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::info!("WebSocket closed: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(other)) => {
                    tracing::debug!("WS frame (ignored): {:?}", other);
                }
                Some(Err(e)) => {
                    return Err(e).context("WebSocket receive error");
                }
                None => {
                    return Ok(None);
                }
            }
        }
    }

    /// Receive the next decoded chat event.
    ///
    /// Heartbeats are echoed, event acks are sent, and undecodable events
    /// are skipped here. `Ok(None)` means the server closed the channel.
    ///
    /// Cancellation-safe: a consumed frame's work (owed replies, the
    /// decoded event) is parked in [`PendingIo`] before any send is
    /// awaited, so dropping an in-flight poll and calling again never
    /// loses an event.
    pub async fn recv_event(&mut self) -> Result<Option<ChatEvent>> {
        loop {
            // Settle owed work before reading more input. A poll cancelled
            // mid-send re-enters here with the event still stashed.
            while let Some(reply) = self.pending.outbox.front().cloned() {
                self.send_msg(reply).await?;
                self.pending.outbox.pop_front();
            }
            if let Some(event) = self.pending.ready.take() {
                return Ok(Some(event));
            }

            let Some(text) = self.recv_frame().await? else {
                return Ok(None);
            };

            let frame = match codec::parse_frame(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!("Unparseable frame: {:#}", e);
                    continue;
                }
            };

            if !self.pending.ingest(frame) {
                tracing::info!("Server sent disconnect frame");
                return Ok(None);
            }
        }
    }

    /// Emit an event with an arbitrary payload.
    pub async fn emit(&mut self, name: &str, payload: &Value) -> Result<()> {
        self.send_text(&codec::encode_event(name, payload)).await
    }

    /// Send the periodic client heartbeat.
    pub async fn send_heartbeat(&mut self) -> Result<()> {
        self.send_text(codec::HEARTBEAT).await
    }

    /// Announce presence in a room.
    pub async fn join(&mut self, room: &str, user_id: &str) -> Result<()> {
        self.emit(
            "join",
            &serde_json::json!({ "room": room, "user_id": user_id }),
        )
        .await
    }

    /// Withdraw from a room. Also sent on tab-hide/exit by the original
    /// client; here it runs when the interactive loop ends.
    pub async fn leave(&mut self, room: &str, user_id: &str) -> Result<()> {
        self.emit(
            "leave",
            &serde_json::json!({ "room": room, "user_id": user_id }),
        )
        .await
    }

    /// Emit a composed message envelope.
    pub async fn send_message(&mut self, envelope: &OutboundMessage) -> Result<()> {
        let payload = serde_json::to_value(envelope).context("Failed to encode message")?;
        self.emit("message", &payload).await
    }

    /// Emit a typing-state transition.
    pub async fn send_typing(&mut self, signal: &TypingSignal) -> Result<()> {
        let payload = serde_json::to_value(signal).context("Failed to encode typing signal")?;
        self.emit("typing", &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_frame(raw: &str) -> Frame {
        codec::parse_frame(raw).unwrap()
    }

    fn front_text(pending: &PendingIo) -> Option<&str> {
        match pending.outbox.front() {
            Some(WsMessage::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_ingest_queues_heartbeat_echo() {
        let mut pending = PendingIo::default();
        assert!(pending.ingest(event_frame("2::")));
        assert_eq!(front_text(&pending), Some(codec::HEARTBEAT));
        assert!(pending.ready.is_none());
    }

    #[test]
    fn test_ingest_stashes_event_and_owes_ack() {
        let raw = concat!(
            r#"5:7+::{"name":"message","args":[{"id":"m1","user_id":"bob","#,
            r#""message":"hi","timestamp":1,"date":"Jan 1","time":"1:00 PM"}]}"#
        );
        let mut pending = PendingIo::default();
        assert!(pending.ingest(event_frame(raw)));

        // The ack goes out before the event is handed over.
        assert_eq!(front_text(&pending), Some("6:7::"));
        assert!(matches!(pending.ready, Some(ChatEvent::Message(_))));
    }

    #[test]
    fn test_stashed_event_survives_interleaved_control_frames() {
        let raw = r#"5:::{"name":"online_count","args":[{"room":"12345","count":2}]}"#;
        let mut pending = PendingIo::default();
        pending.ingest(event_frame(raw));

        // A heartbeat absorbed while the event sits undelivered (e.g. after
        // a cancelled poll) must not displace it.
        pending.ingest(event_frame("2::"));
        assert!(matches!(
            pending.ready.take(),
            Some(ChatEvent::OnlineCount { count: 2, .. })
        ));
        assert_eq!(pending.outbox.len(), 1);
    }

    #[test]
    fn test_ingest_reports_disconnect() {
        let mut pending = PendingIo::default();
        assert!(!pending.ingest(event_frame("0::")));
    }

    #[test]
    fn test_undecodable_event_still_owes_its_ack() {
        let mut pending = PendingIo::default();
        assert!(pending.ingest(event_frame(r#"5:3::{"name":"nonsense","args":[{}]}"#)));
        assert_eq!(front_text(&pending), Some("6:3::"));
        assert!(pending.ready.is_none());
    }
}
