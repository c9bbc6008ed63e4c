//! HTTP identity check against the `/api/auth/me` endpoint.
//!
//! Thin `reqwest` wrapper. Status and body classification lives in
//! `parse_me_response` so it can be tested without a server.

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE};

use crate::config::{ConfigError, SessionConfig};
use crate::identity::{IdentityCheck, IdentityCheckError, IdentityRecord};

/// Longest response body kept on a `Status` error.
const MAX_ERROR_BODY_CHARS: usize = 512;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpIdentityCheck {
    http: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl HttpIdentityCheck {
    /// Build a client for the configured identity endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: config.me_url(), cookie: config.cookie.clone() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IdentityCheck for HttpIdentityCheck {
    async fn fetch_current_identity(&self) -> Result<Option<IdentityRecord>, IdentityCheckError> {
        let mut request = self.http.get(&self.url).header(ACCEPT, "application/json");
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityCheckError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityCheckError::Transport(e.to_string()))?;

        tracing::debug!(url = %self.url, status, "identity check response");
        parse_me_response(status, &text)
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Classify an identity endpoint response.
///
/// - 401/403: the session is not authenticated.
/// - 2xx with an empty body or JSON `null`: success without an identity.
/// - 2xx with a JSON object: the identity.
pub(crate) fn parse_me_response(status: u16, body: &str) -> Result<Option<IdentityRecord>, IdentityCheckError> {
    match status {
        401 | 403 => Err(IdentityCheckError::Unauthorized { status }),
        200..=299 => {
            if body.trim().is_empty() {
                return Ok(None);
            }
            let parsed: Option<IdentityRecord> =
                serde_json::from_str(body).map_err(|e| IdentityCheckError::Decode(e.to_string()))?;
            match parsed {
                Some(record) if !record.as_json().is_object() => {
                    Err(IdentityCheckError::Decode("expected a JSON object".to_owned()))
                }
                other => Ok(other),
            }
        }
        _ => Err(IdentityCheckError::Status { status, body: truncate_body(body) }),
    }
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}
