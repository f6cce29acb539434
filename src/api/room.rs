//! Room create/join endpoint.
//!
//! The server treats create and join as one call: posting an existing room
//! id with the right password joins it.

use anyhow::{bail, Result};
use serde::Deserialize;

use super::client::{decode_json, ApiClient};
use crate::error::ChatError;

#[derive(Debug, Deserialize)]
struct RoomResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client-side mirror of the server's admission rules, so obvious mistakes
/// never leave the machine.
fn validate(room_id: &str, password: &str) -> Result<(), ChatError> {
    if room_id.trim().is_empty() || password.is_empty() {
        return Err(ChatError::LocalValidation(
            "room id and password are required".to_string(),
        ));
    }
    if room_id.len() != 5 || !room_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChatError::LocalValidation(
            "room id must be a 5-digit number".to_string(),
        ));
    }
    if password.len() < 8 {
        return Err(ChatError::LocalValidation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Create or join a room.
pub async fn create_room(client: &ApiClient, room_id: &str, password: &str) -> Result<()> {
    validate(room_id, password)?;

    let body = serde_json::json!({
        "room_id": room_id,
        "password": password,
    });

    let resp = client.post_json("/room/create", &body).await?;
    let decoded: RoomResponse = decode_json(resp).await?;

    if !decoded.success {
        bail!(
            "Room create/join failed: {}",
            decoded.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_inputs() {
        assert!(validate("12345", "longenough").is_ok());
        assert!(matches!(
            validate("", "longenough"),
            Err(ChatError::LocalValidation(_))
        ));
        assert!(matches!(
            validate("abcde", "longenough"),
            Err(ChatError::LocalValidation(_))
        ));
        assert!(matches!(
            validate("1234", "longenough"),
            Err(ChatError::LocalValidation(_))
        ));
        assert!(matches!(
            validate("12345", "short"),
            Err(ChatError::LocalValidation(_))
        ));
    }
}
