//! Platform abstraction traits
//!
//! These traits define the boundary between the platform-agnostic core logic
//! and the concrete transport, clock, and signing implementations.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::github::auth::SignedAssertion;

/// HTTP transport for outbound requests to the GitHub API
///
/// Implementations follow redirects themselves and must re-send every header
/// of the original request on each hop.
#[async_trait(?Send)]
pub trait HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request, body fully read
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body as UTF-8, replacing invalid sequences
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Clock for current time (enables testing with deterministic timestamps)
pub trait Clock {
    fn now_secs(&self) -> u64;
}

/// Produces the signed App assertion
#[async_trait(?Send)]
pub trait JwtSigner {
    async fn sign_app_jwt(&self, now_secs: i64) -> Result<SignedAssertion>;
}
