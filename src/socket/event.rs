//! Typed inbound events from the live channel.
//!
//! Event names and payload shapes follow the server's emit contract. An
//! event with an unknown name, or a payload that fails to decode, is
//! logged and skipped; it never tears down the connection.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{FileNotice, Reactions, WireMessage};

/// One decoded event from the live channel.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A chat message broadcast to the room.
    Message(WireMessage),
    /// Full replacement of the room's online count.
    OnlineCount { room: String, count: u32 },
    /// Full replacement of the room's typing set.
    TypingStatus {
        room: String,
        typing_users: Vec<String>,
    },
    /// Wholesale replacement of one message's reaction tallies.
    ReactionUpdate {
        message_id: String,
        reactions: Reactions,
    },
    /// Soft-delete notification.
    MessageDeleted { message_id: String },
    /// A file landed in the room's server-side store.
    FileUploaded(FileNotice),
    /// Transient room notice ("x has joined the room").
    Status { msg: String },
}

#[derive(Deserialize)]
struct OnlineCountPayload {
    room: String,
    count: u32,
}

#[derive(Deserialize)]
struct TypingStatusPayload {
    room: String,
    #[serde(default)]
    typing_users: Vec<String>,
}

#[derive(Deserialize)]
struct ReactionUpdatePayload {
    message_id: String,
    #[serde(default)]
    reactions: Reactions,
}

#[derive(Deserialize)]
struct MessageDeletedPayload {
    message_id: String,
}

#[derive(Deserialize)]
struct StatusPayload {
    msg: String,
}

impl ChatEvent {
    /// Decode an event by name. Returns None for unknown or undecodable
    /// events (logged at debug).
    pub fn decode(name: &str, payload: Value) -> Option<Self> {
        let decoded = match name {
            "message" => serde_json::from_value(payload).map(ChatEvent::Message),
            "online_count" => serde_json::from_value(payload)
                .map(|p: OnlineCountPayload| ChatEvent::OnlineCount {
                    room: p.room,
                    count: p.count,
                }),
            "typing_status" => serde_json::from_value(payload).map(|p: TypingStatusPayload| {
                ChatEvent::TypingStatus {
                    room: p.room,
                    typing_users: p.typing_users,
                }
            }),
            "reaction_update" => serde_json::from_value(payload).map(
                |p: ReactionUpdatePayload| ChatEvent::ReactionUpdate {
                    message_id: p.message_id,
                    reactions: p.reactions,
                },
            ),
            "message_deleted" => serde_json::from_value(payload)
                .map(|p: MessageDeletedPayload| ChatEvent::MessageDeleted {
                    message_id: p.message_id,
                }),
            "file_uploaded" => serde_json::from_value(payload).map(ChatEvent::FileUploaded),
            "status" => {
                serde_json::from_value(payload).map(|p: StatusPayload| ChatEvent::Status {
                    msg: p.msg,
                })
            }
            // Sent once on join; the TUI builds its file view lazily instead.
            "files_list" | "file_deleted" | "messages_read" => return None,
            other => {
                tracing::debug!("Ignoring unknown event '{}'", other);
                return None;
            }
        };

        match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!("Failed to decode '{}' payload: {}", name, e);
                None
            }
        }
    }
}
