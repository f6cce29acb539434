//! HTTP client for the chat server's request/response surface.
//!
//! Wraps reqwest::Client with the base URL and uniform status checking.
//! Failures split into two cases the UI reports differently: the server
//! answered with an error status, or the network never delivered an
//! answer.

use anyhow::{Context, Result};

use crate::error::ChatError;

/// Client for the profile/room/history endpoints.
///
/// Cheap to clone (reqwest::Client is a handle), so it can move into a
/// spawned task while the caller keeps using it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// The shared reqwest client (also used for the socket handshake).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a path relative to the server base.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let resp = self.http.get(&url).send().await?;
        check_response(resp).await
    }

    /// GET with query parameters. reqwest percent-encodes the values, so
    /// user-supplied strings (passwords with `&`, `#`...) survive intact.
    pub async fn get_with_query<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        query: &T,
    ) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let resp = self.http.get(&url).query(query).send().await?;
        check_response(resp).await
    }

    /// POST a JSON body to a path relative to the server base.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let resp = self.http.post(&url).json(body).send().await?;
        check_response(resp).await
    }
}

/// Turn a non-success status into `ChatError::Request`, carrying the body
/// for the user-facing report.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ChatError::Request {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

/// Decode a JSON response body with a uniform context message.
pub async fn decode_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    resp.json().await.context("Failed to parse server response")
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_query_values_are_percent_encoded() {
        // Reserved characters in a room password must not break the query
        // string apart.
        let query: Vec<(&str, &str)> = vec![("user_id", "alice"), ("password", "p&ss#word")];
        let req = reqwest::Client::new()
            .get("http://localhost:5000/chat/12345/messages")
            .query(&query)
            .build()
            .unwrap();
        assert_eq!(
            req.url().query(),
            Some("user_id=alice&password=p%26ss%23word")
        );
    }
}
