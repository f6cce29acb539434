//! Client error taxonomy.
//!
//! Distinguishes locally-rejected actions from transport and HTTP failures
//! so callers can report "server said no" separately from "server
//! unreachable". All of these are terminal to the current user action; the
//! client never retries on its own.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// A required field was missing or invalid before anything left the
    /// machine (user id, room id, password).
    #[error("invalid input: {0}")]
    LocalValidation(String),

    /// An attachment exceeded the inline size limit. Checked before any
    /// encoding or transport work.
    #[error("attachment '{name}' is {size} bytes, over the {limit} byte limit")]
    AttachmentTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    /// The live channel was not usable at send time. The message is not
    /// queued for later delivery.
    #[error("not connected: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server rejected request (HTTP {status}): {body}")]
    Request { status: u16, body: String },

    /// The request never got an answer (DNS, refused connection, TLS...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
