//! Outbound message assembly and the typing-indicator debounce.
//!
//! The composer is a pure admission/encoding step in front of the
//! transport: attachments over the size limit are rejected before any
//! encoding happens, and a compose with neither text nor attachment yields
//! nothing to send.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::error::ChatError;
use crate::models::Media;

/// Client-side admission limit for inline attachments.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Idle window after the last keystroke before typing stops.
pub const TYPING_IDLE: Duration = Duration::from_millis(1000);

/// Raw attachment picked by the user, prior to encoding.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub name: String,
    pub media_type: String,
}

/// The `message` event envelope emitted on the live channel.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub room: String,
    pub user_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
}

/// Assembles outbound envelopes for one room/user pair.
#[derive(Debug, Clone)]
pub struct OutboundComposer {
    room: String,
    user_id: String,
}

impl OutboundComposer {
    pub fn new(room: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            user_id: user_id.into(),
        }
    }

    /// Build the envelope for a send.
    ///
    /// Returns `Ok(None)` when there is nothing to send (empty text, no
    /// attachment). Attachment bytes beyond the 5 MiB limit are rejected
    /// here and never reach the transport. Accepted attachments are
    /// encoded as a data URL, the same representation inbound media uses.
    pub fn compose(
        &self,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<Option<OutboundMessage>, ChatError> {
        let text = text.trim();
        if text.is_empty() && attachment.is_none() {
            return Ok(None);
        }

        let media = match attachment {
            Some(att) => {
                if att.bytes.len() > MAX_ATTACHMENT_BYTES {
                    return Err(ChatError::AttachmentTooLarge {
                        name: att.name,
                        size: att.bytes.len(),
                        limit: MAX_ATTACHMENT_BYTES,
                    });
                }
                Some(Media {
                    data: format!("data:{};base64,{}", att.media_type, BASE64.encode(&att.bytes)),
                    media_type: att.media_type,
                    name: att.name,
                })
            }
            None => None,
        };

        Ok(Some(OutboundMessage {
            room: self.room.clone(),
            user_id: self.user_id.clone(),
            message: text.to_string(),
            media,
        }))
    }
}

/// Typing-indicator state machine: idle -> typing on the first keystroke,
/// typing -> idle after 1000 ms of silence.
///
/// One timer, re-armed (not accumulated) on every keystroke. Each state
/// transition yields exactly one emission; holding a key down does not
/// re-emit `typing: true`. Time is injected so the machine is testable
/// without a runtime; the interactive loop drives `poll` from a sleep.
#[derive(Debug, Default)]
pub struct TypingDebounce {
    /// When typing lapses back to idle; None while idle.
    deadline: Option<Instant>,
}

impl TypingDebounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keystroke. Returns `Some(true)` only on the idle -> typing
    /// transition.
    pub fn keystroke(&mut self, now: Instant) -> Option<bool> {
        let was_idle = self.deadline.is_none();
        self.deadline = Some(now + TYPING_IDLE);
        was_idle.then_some(true)
    }

    /// Check for the typing -> idle transition. Returns `Some(false)` once
    /// when the idle window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<bool> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(false)
            }
            _ => None,
        }
    }

    /// End the typing window early (the message was sent). Returns
    /// `Some(false)` when a stop emission is owed.
    pub fn cancel(&mut self) -> Option<bool> {
        self.deadline.take().map(|_| false)
    }

    /// Deadline for the next `poll`, for the caller's timer.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_typing(&self) -> bool {
        self.deadline.is_some()
    }
}

/// The `typing` event envelope.
#[derive(Debug, Clone, Serialize)]
pub struct TypingSignal {
    pub room: String,
    pub user_id: String,
    pub is_typing: bool,
}
