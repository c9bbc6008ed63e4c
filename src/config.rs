//! Identity endpoint configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_ME_PATH: &str = "/api/auth/me";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Errors produced while building the identity client.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub base_url: String,
    pub me_path: String,
    /// Raw `Cookie` header value carrying the session token, if any.
    pub cookie: Option<String>,
    pub timeouts: Timeouts,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            me_path: DEFAULT_ME_PATH.to_owned(),
            cookie: None,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `SESSION_BASE_URL`: default `http://localhost:3000`
    /// - `SESSION_ME_PATH`: default `/api/auth/me`
    /// - `SESSION_COOKIE`: raw cookie header, e.g. `session_token=...`
    /// - `SESSION_REQUEST_TIMEOUT_SECS`: default 10
    /// - `SESSION_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigParse`] if the base URL is not http(s) or
    /// the path is not absolute.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("SESSION_BASE_URL").as_deref())?;
        let me_path = parse_me_path(lookup("SESSION_ME_PATH").as_deref())?;
        let cookie = lookup("SESSION_COOKIE")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("SESSION_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("SESSION_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, me_path, cookie, timeouts })
    }

    /// Full URL of the identity endpoint.
    #[must_use]
    pub fn me_url(&self) -> String {
        format!("{}{}", self.base_url, self.me_path)
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_BASE_URL).trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ConfigParse(format!(
            "unsupported SESSION_BASE_URL '{url}' (expected http:// or https://)"
        )));
    }
    Ok(url.to_owned())
}

fn parse_me_path(raw: Option<&str>) -> Result<String, ConfigError> {
    let path = raw.unwrap_or(DEFAULT_ME_PATH).trim();
    if !path.starts_with('/') {
        return Err(ConfigError::ConfigParse(format!("SESSION_ME_PATH must start with '/': {path}")));
    }
    Ok(path.to_owned())
}
