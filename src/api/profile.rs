//! Profile creation endpoint.

use anyhow::{bail, Result};
use serde::Deserialize;

use super::client::{decode_json, ApiClient};
use crate::error::ChatError;

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Create (or refresh) the user's profile on the server.
///
/// The avatar, when present, is a data URL produced the same way as inline
/// media.
pub async fn create_profile(
    client: &ApiClient,
    user_id: &str,
    username: &str,
    avatar: Option<&str>,
) -> Result<()> {
    if user_id.trim().is_empty() || username.trim().is_empty() {
        return Err(
            ChatError::LocalValidation("user id and display name are required".to_string()).into(),
        );
    }

    let body = serde_json::json!({
        "user_id": user_id,
        "username": username,
        "avatar": avatar,
    });

    let resp = client.post_json("/user/profile", &body).await?;
    let decoded: ProfileResponse = decode_json(resp).await?;

    if !decoded.success {
        bail!(
            "Profile creation failed: {}",
            decoded.error.as_deref().unwrap_or("unknown error")
        );
    }

    tracing::info!(
        "{}",
        decoded.message.as_deref().unwrap_or("Profile created")
    );
    Ok(())
}
