//! Native platform implementations
//!
//! Implements the core platform traits using native Rust libraries:
//! - HttpClient: reqwest, with a manual redirect follower
//! - Clock: std::time::SystemTime

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Method, StatusCode};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use url::Url;

use gh_app_token_core::error::{Error, Result};
use gh_app_token_core::platform::{Clock, HttpClient, HttpResponse};

/// Redirects followed before giving up
pub const MAX_REDIRECTS: usize = 15;

/// Dial timeout, also bounds the TLS handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// reqwest-based HTTP client
///
/// reqwest strips `Authorization` when a redirect crosses hosts, which breaks
/// the flow behind proxies that bounce API calls to another host. Redirects
/// are therefore followed here, re-sending the original headers on every hop.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn execute(
        &self,
        mut method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse> {
        let mut url = Url::parse(url)
            .map_err(|e| Error::transport(format!("invalid request URL '{}': {}", url, e)))?;
        let mut body = (method != Method::GET).then(|| body.to_vec());
        let mut redirects = 0;

        loop {
            let mut builder = self.client.request(method.clone(), url.clone());
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            if let Some(body) = &body {
                builder = builder.body(body.clone());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Error::transport(format!("HTTP {} {} failed: {}", method, url, e)))?;

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);

            // Always drain, so the connection goes back to the pool
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::transport(format!("failed to read response: {}", e)))?;

            let location = match location {
                Some(location) if is_followable(status) => location,
                _ => {
                    return Ok(HttpResponse {
                        status: status.as_u16(),
                        body: bytes.to_vec(),
                    });
                }
            };

            redirects += 1;
            if redirects > MAX_REDIRECTS {
                return Err(Error::redirect_loop(redirects));
            }

            let next = url.join(&location).map_err(|e| {
                Error::transport(format!("invalid redirect location '{}': {}", location, e))
            })?;

            if matches!(
                status,
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
            ) && method != Method::GET
                && method != Method::HEAD
            {
                method = Method::GET;
                body = None;
            }

            debug!(
                status = status.as_u16(),
                from = %url,
                to = %next,
                redirects,
                headers = ?headers.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
                "following redirect with original headers"
            );

            url = next;
        }
    }
}

fn is_followable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

#[async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.execute(Method::GET, url, headers, &[]).await
    }

    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
        self.execute(Method::POST, url, headers, body).await
    }
}

/// System clock using std::time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}
