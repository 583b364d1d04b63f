//! HTTP client for a GitHub Gist.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Serialize)]
struct GistUpdate<'a> {
    files: BTreeMap<&'a str, GistFile<'a>>,
}

#[derive(Serialize)]
struct GistFile<'a> {
    content: &'a str,
}

/// Reads the published raw file and updates it through the REST API.
#[derive(Debug, Clone)]
pub struct GistClient {
    client: reqwest::Client,
    config: SyncConfig,
}

impl GistClient {
    /// Creates a client using the timeout and user agent from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] if the HTTP client cannot be built.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SyncError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn fetch_url(&self) -> String {
        if !self.config.cache_bust {
            return self.config.raw_url.clone();
        }
        let sep = if self.config.raw_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}t={}",
            self.config.raw_url,
            sep,
            chrono::Utc::now().timestamp_millis()
        )
    }

    fn headers(credential: &str) -> SyncResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let auth_value = HeaderValue::from_str(&format!("token {credential}"))
            .map_err(|_| SyncError::InvalidCredential)?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!(%status, bytes = body.len(), "gist response");
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!(%status, body = %preview, "gist error response");
    }
}

/// Extracts a readable message from an error response.
///
/// Prefers the JSON `message` field GitHub returns, then the raw body, then
/// the status reason phrase.
pub(crate) fn error_message_for_response(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    trimmed.to_string()
}

#[async_trait]
impl RemoteStore for GistClient {
    async fn fetch_latest(&self) -> SyncResult<String> {
        let url = self.fetch_url();
        debug!(%url, "fetching gist content");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::network(e.to_string()))?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(SyncError::unavailable(format!(
                "{}: {}",
                status.as_u16(),
                error_message_for_response(status, &body)
            )));
        }
        if body.is_empty() {
            return Err(SyncError::unavailable("empty response body"));
        }

        Ok(body)
    }

    async fn push_snapshot(&self, text: &str, credential: &str) -> SyncResult<()> {
        let url = self.config.update_url();
        let mut files = BTreeMap::new();
        files.insert(
            self.config.file_name.as_str(),
            GistFile { content: text },
        );
        let payload = GistUpdate { files };

        debug!(%url, bytes = text.len(), "updating gist");

        let response = self
            .client
            .patch(&url)
            .headers(Self::headers(credential)?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "gist updated");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Self::log_response(status, &body);
        let message = error_message_for_response(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized(message));
        }
        Err(SyncError::rejected(status.as_u16(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_message() {
        let cases = [
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"message":"Validation Failed","documentation_url":"x"}"#,
                "Validation Failed",
            ),
            (StatusCode::NOT_FOUND, "  ", "Not Found"),
            (StatusCode::BAD_GATEWAY, "upstream broke", "upstream broke"),
            (StatusCode::BAD_REQUEST, r#"{"error":"nope"}"#, r#"{"error":"nope"}"#),
        ];

        for (status, body, expected) in cases {
            assert_eq!(error_message_for_response(status, body), expected);
        }
    }

    #[test]
    fn fetch_url_cache_bust() {
        let client = GistClient::new(SyncConfig::new("id", "f.txt", "http://raw/file")).unwrap();
        let url = client.fetch_url();
        assert!(url.starts_with("http://raw/file?t="));
        assert!(url["http://raw/file?t=".len()..].parse::<i64>().is_ok());

        let client =
            GistClient::new(SyncConfig::new("id", "f.txt", "http://raw/file?x=1")).unwrap();
        assert!(client.fetch_url().starts_with("http://raw/file?x=1&t="));

        let client = GistClient::new(
            SyncConfig::new("id", "f.txt", "http://raw/file").with_cache_bust(false),
        )
        .unwrap();
        assert_eq!(client.fetch_url(), "http://raw/file");
    }

    #[test]
    fn headers_carry_token_scheme() {
        let headers = GistClient::headers("ghp_abc").unwrap();
        assert_eq!(headers[AUTHORIZATION], "token ghp_abc");
        assert_eq!(headers[ACCEPT], GITHUB_ACCEPT);
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        assert!(matches!(
            GistClient::headers("bad\ntoken"),
            Err(SyncError::InvalidCredential)
        ));
    }

    #[test]
    fn update_body_shape() {
        let mut files = BTreeMap::new();
        files.insert("license_pig.txt", GistFile { content: "DEVICE_HASH=A" });
        let json = serde_json::to_value(GistUpdate { files }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"files": {"license_pig.txt": {"content": "DEVICE_HASH=A"}}})
        );
    }
}
