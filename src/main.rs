//! `session-status`: check the current session once and print the settled
//! status as JSON.
//!
//! Exit code 0 when authenticated, 1 when settled unauthenticated, 2 when the
//! configuration is invalid.

use std::process::ExitCode;
use std::sync::Arc;

use session_status::{ConfigError, HttpIdentityCheck, SessionCache, SessionConfig, SessionStatusResolver};

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

const EXIT_UNAUTHENTICATED: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

/// Parse config and build the HTTP check. Any failure here is a configuration error.
fn startup<F>(lookup: F) -> Result<(SessionConfig, HttpIdentityCheck), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = SessionConfig::from_lookup(lookup)?;
    let check = HttpIdentityCheck::new(&config)?;
    Ok((config, check))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let (config, check) = match startup(|key| std::env::var(key).ok()) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "invalid session configuration");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    tracing::info!(url = check.url(), cookie = config.cookie.is_some(), "checking session");

    let resolver = SessionStatusResolver::mount(SessionCache::new(), Arc::new(check));
    resolver.resolve();
    let status = resolver.wait_settled().await;

    tracing::info!(authenticated = status.is_authenticated(), "session settled");
    println!("{}", serde_json::to_string_pretty(&status).expect("status serializes"));

    if status.is_authenticated() { ExitCode::SUCCESS } else { ExitCode::from(EXIT_UNAUTHENTICATED) }
}
