//! Shared HTTP client construction for consistent timeout configuration.

use std::time::Duration;

use crate::error::Result;

/// Connect timeout applied to every outbound call; doubles as the liveness probe budget.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single embedding round trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the HTTP client used by the embedding backends.
///
/// Config: 5s connect timeout, 30s request timeout, `hotctx/{version}` user-agent.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn default_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("hotctx/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
