//! Installation token exchange
//!
//! Trades a signed App assertion for an installation access token:
//! resolve the repository's installation, then mint a token for it.

use std::fmt;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::github::api::{AccessToken, ApiClient, InstallationContext, Method};
use crate::github::auth::SignedAssertion;
use crate::platform::{Clock, HttpClient, JwtSigner};

/// What a single invocation produces
#[derive(Debug)]
pub enum Output {
    Assertion(SignedAssertion),
    Token(AccessToken),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Assertion(assertion) => f.write_str(assertion.as_str()),
            Output::Token(token) => f.write_str(&token.token),
        }
    }
}

/// Sign the assertion, then either stop (jwt-only) or exchange it
pub async fn run(
    config: &Config,
    signer: &dyn JwtSigner,
    http: &dyn HttpClient,
    clock: &dyn Clock,
) -> Result<Output> {
    let assertion = mint_only(signer, clock).await?;

    if config.jwt_only {
        info!(app_id = %config.app_id, "jwt-only mode, skipping token exchange");
        return Ok(Output::Assertion(assertion));
    }

    let token = exchange(config, &assertion, http).await?;

    if let Some(expires_in) = token
        .expires_at
        .as_deref()
        .and_then(|expires_at| calculate_expires_in(expires_at, clock))
    {
        info!(expires_in, "installation token issued");
    } else {
        info!("installation token issued");
    }

    Ok(Output::Token(token))
}

/// Sign an App assertion at the current time without touching the network
pub async fn mint_only(signer: &dyn JwtSigner, clock: &dyn Clock) -> Result<SignedAssertion> {
    let now = i64::try_from(clock.now_secs())
        .map_err(|_| Error::signing("system clock is out of range"))?;
    signer.sign_app_jwt(now).await
}

/// Resolve the repository's installation and exchange the assertion for a token
///
/// Both calls reuse `assertion`; the first failure aborts the exchange.
pub async fn exchange(
    config: &Config,
    assertion: &SignedAssertion,
    http: &dyn HttpClient,
) -> Result<AccessToken> {
    let repository = config
        .repository
        .as_ref()
        .ok_or_else(|| Error::configuration("repo is required for token exchange"))?;

    let api = ApiClient::new(config, http);

    let installation: InstallationContext = api
        .request_as(
            Method::Get,
            &format!("/repos/{}/installation", repository),
            None,
            assertion,
        )
        .await?;

    debug!(installation_id = installation.id, repo = %repository, "resolved installation");

    api.request_as(
        Method::Post,
        &format!("/app/installations/{}/access_tokens", installation.id),
        None,
        assertion,
    )
    .await
}

fn calculate_expires_in(expires_at: &str, clock: &dyn Clock) -> Option<u64> {
    let now_secs = i64::try_from(clock.now_secs()).ok()?;
    calculate_expires_in_from_now(expires_at, now_secs)
}

/// Seconds until an ISO 8601 `expires_at`, `None` if unparseable or past
fn calculate_expires_in_from_now(expires_at: &str, now_secs: i64) -> Option<u64> {
    use chrono::{DateTime, Utc};

    let expires_dt: DateTime<Utc> = expires_at.parse().ok()?;
    let diff = expires_dt.timestamp() - now_secs;

    if diff > 0 {
        Some(diff as u64)
    } else {
        None
    }
}
