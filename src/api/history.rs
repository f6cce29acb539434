//! Message history endpoint.

use anyhow::Result;

use super::client::{decode_json, ApiClient};
use crate::models::WireMessage;

/// Fetch a room's message history, oldest first (server order).
///
/// `user_id` lets the server stamp per-user flags; `password` covers the
/// case where this client's address was not the one that created the room.
pub async fn fetch_history(
    client: &ApiClient,
    room_id: &str,
    user_id: &str,
    password: Option<&str>,
) -> Result<Vec<WireMessage>> {
    let mut query: Vec<(&str, &str)> = vec![("user_id", user_id)];
    if let Some(password) = password {
        query.push(("password", password));
    }

    let resp = client
        .get_with_query(&format!("/chat/{room_id}/messages"), &query)
        .await?;
    let messages: Vec<WireMessage> = decode_json(resp).await?;
    tracing::debug!("Fetched {} history messages for {}", messages.len(), room_id);
    Ok(messages)
}
