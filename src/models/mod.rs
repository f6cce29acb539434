//! Data models for chat entities.
//!
//! `WireMessage` mirrors the server JSON (history fetch and the live
//! `message` event share one shape). `Message` is the domain record the
//! conversation view keeps; it carries the ephemeral per-message state
//! (reactions, soft-delete flag) that the wire shape does not.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Inline media attachment, transmitted inside the message envelope.
///
/// `data` is a self-describing data URL (`data:<mime>;base64,<payload>`);
/// the same encoding is used on send and on receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub data: String,
    pub name: String,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.media_type.starts_with("video/")
    }
}

/// A message as the server sends it (history fetch or live `message` event).
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    /// Server-assigned id. Absent on a client-optimistic echo.
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Milliseconds since epoch. Doubles as the id fallback.
    pub timestamp: i64,
    /// Calendar-day display string (e.g. "Jan 1").
    pub date: String,
    /// Clock display string (e.g. "9:15 AM").
    pub time: String,
    #[serde(default)]
    pub media: Option<Media>,
}

impl WireMessage {
    /// Stable identifier: the server id, or the timestamp when none was
    /// assigned yet.
    pub fn display_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

/// Reaction tallies: reaction symbol -> ids of users who reacted.
pub type Reactions = BTreeMap<String, BTreeSet<String>>;

/// A message as held by the conversation view.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    /// None for media-only messages; they render with empty text, not a
    /// placeholder.
    pub text: Option<String>,
    pub media: Option<Media>,
    pub date: String,
    pub time: String,
    pub sent_by_local_user: bool,
    /// Soft-delete flag. Content is retained; rendering substitutes a
    /// placeholder.
    pub deleted: bool,
    pub reactions: Reactions,
}

impl Message {
    /// Build the domain record from the wire shape, deriving ownership from
    /// the local user id.
    pub fn from_wire(wire: WireMessage, local_user_id: &str) -> Self {
        let id = wire.display_id();
        let sent_by_local_user = wire.user_id == local_user_id;
        let text = if wire.message.trim().is_empty() {
            None
        } else {
            Some(wire.message)
        };
        Self {
            id,
            sender_name: wire.username.unwrap_or_else(|| wire.user_id.clone()),
            sender_id: wire.user_id,
            text,
            media: wire.media,
            date: wire.date,
            time: wire.time,
            sent_by_local_user,
            deleted: false,
            reactions: Reactions::new(),
        }
    }
}

/// A server-stored file referenced by the `file_uploaded` event.
///
/// Unlike inline media this carries no bytes, only metadata pointing at the
/// room's file store.
#[derive(Debug, Clone, Deserialize)]
pub struct FileNotice {
    pub filename: String,
    #[serde(default)]
    pub stored_filename: Option<String>,
    pub size: u64,
    pub uploaded_by: String,
    /// RFC 3339 timestamp from the server.
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl FileNotice {
    /// Local clock time for display, falling back to the raw string.
    pub fn display_time(&self) -> String {
        let Some(raw) = self.uploaded_at.as_deref() else {
            return String::new();
        };
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| {
                dt.with_timezone(&chrono::Local)
                    .format("%I:%M %p")
                    .to_string()
            })
            .unwrap_or_else(|_| raw.to_string())
    }
}
