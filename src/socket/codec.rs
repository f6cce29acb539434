//! Socket.IO v1 text framing.
//!
//! Frame grammar: `TYPE:ACK_ID:ENDPOINT[:DATA]`.
//!
//! ```text
//! 0::            disconnect
//! 1::            handshake / connect confirmation
//! 2::            heartbeat (both directions)
//! 5:ACK?::{json} event; JSON body is {"name": ..., "args": [payload]}
//! 6:ACK::        ack
//! ```
//!
//! Only the frame types the chat server uses are modeled; anything else
//! surfaces as `Frame::Other` for the caller to log.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Disconnect,
    Handshake,
    Heartbeat,
    /// Event with its decoded body and the ack id to answer, if any.
    Event { name: String, payload: Value, ack_id: Option<u64> },
    Ack,
    Other(String),
}

#[derive(Serialize, Deserialize)]
struct EventBody {
    name: String,
    #[serde(default)]
    args: Vec<Value>,
}

/// Parse one text frame.
pub fn parse_frame(frame: &str) -> Result<Frame> {
    if frame.starts_with("0::") || frame == "0" {
        return Ok(Frame::Disconnect);
    }
    if frame.starts_with("1::") {
        return Ok(Frame::Handshake);
    }
    if frame.starts_with("2::") || frame == "2" {
        return Ok(Frame::Heartbeat);
    }
    if frame.starts_with("6:") {
        return Ok(Frame::Ack);
    }

    if let Some(rest) = frame.strip_prefix("5:") {
        // 5:ACK_ID:ENDPOINT:JSON — ack id and endpoint may both be empty.
        let (ack_part, rest) = rest
            .split_once(':')
            .context("Event frame missing ack separator")?;
        let (_endpoint, json_str) = rest
            .split_once(':')
            .context("Event frame missing endpoint separator")?;

        let ack_id = if ack_part.is_empty() {
            None
        } else {
            // A trailing '+' requests a data ack; the id itself precedes it.
            Some(
                ack_part
                    .trim_end_matches('+')
                    .parse()
                    .context("Bad event ack id")?,
            )
        };

        let body: EventBody = serde_json::from_str(json_str)
            .with_context(|| format!("Bad event JSON: {json_str}"))?;
        let payload = body.args.into_iter().next().unwrap_or(Value::Null);

        return Ok(Frame::Event {
            name: body.name,
            payload,
            ack_id,
        });
    }

    Ok(Frame::Other(frame.to_string()))
}

/// Encode an outbound event frame.
pub fn encode_event(name: &str, payload: &Value) -> String {
    let body = EventBody {
        name: name.to_string(),
        args: vec![payload.clone()],
    };
    // EventBody has no non-serializable fields; this cannot fail.
    let json = serde_json::to_string(&body).unwrap_or_default();
    format!("5:::{json}")
}

/// Encode the ack for an event frame that requested one.
pub fn encode_ack(ack_id: u64) -> String {
    format!("6:{ack_id}::")
}

/// The heartbeat frame, sent periodically and echoed on receipt.
pub const HEARTBEAT: &str = "2::";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_control_frames() {
        assert_eq!(parse_frame("1::").unwrap(), Frame::Handshake);
        assert_eq!(parse_frame("2::").unwrap(), Frame::Heartbeat);
        assert_eq!(parse_frame("0::").unwrap(), Frame::Disconnect);
        assert_eq!(parse_frame("6:12::").unwrap(), Frame::Ack);
    }

    #[test]
    fn test_parse_event_without_ack() {
        let frame = r#"5:::{"name":"online_count","args":[{"room":"general","count":2}]}"#;
        match parse_frame(frame).unwrap() {
            Frame::Event {
                name,
                payload,
                ack_id,
            } => {
                assert_eq!(name, "online_count");
                assert_eq!(payload["count"], 2);
                assert_eq!(ack_id, None);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_event_with_ack_id() {
        let frame = r#"5:7+::{"name":"message","args":[{"room":"general"}]}"#;
        match parse_frame(frame).unwrap() {
            Frame::Event { ack_id, .. } => assert_eq!(ack_id, Some(7)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_event_with_empty_args() {
        let frame = r#"5:::{"name":"ping"}"#;
        match parse_frame(frame).unwrap() {
            Frame::Event { name, payload, .. } => {
                assert_eq!(name, "ping");
                assert!(payload.is_null());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_event_json_is_an_error() {
        assert!(parse_frame("5:::not json").is_err());
    }

    #[test]
    fn test_unrecognized_frame_passes_through() {
        match parse_frame("7:::oops").unwrap() {
            Frame::Other(raw) => assert_eq!(raw, "7:::oops"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_encode_event_round_trips() {
        let payload = json!({"room": "general", "user_id": "alice", "is_typing": true});
        let frame = encode_event("typing", &payload);
        match parse_frame(&frame).unwrap() {
            Frame::Event { name, payload: p, .. } => {
                assert_eq!(name, "typing");
                assert_eq!(p, payload);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_encode_ack() {
        assert_eq!(encode_ack(42), "6:42::");
    }
}
