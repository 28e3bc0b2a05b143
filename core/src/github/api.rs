//! GitHub API client
//!
//! Issues assertion-authenticated requests and validates the responses.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::platform::HttpClient;

use super::auth::SignedAssertion;

const USER_AGENT: &str = "gh-app-token";

/// Request method used against the GitHub API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Result of `GET /repos/{owner}/{name}/installation`
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct InstallationContext {
    pub id: u64,
}

/// Result of `POST /app/installations/{id}/access_tokens`
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Client bound to one API base URL and one transport
pub struct ApiClient<'a> {
    http: &'a dyn HttpClient,
    base_url: &'a str,
    accept: &'a str,
    host_header: Option<&'a str>,
}

impl<'a> ApiClient<'a> {
    pub fn new(config: &'a Config, http: &'a dyn HttpClient) -> Self {
        Self {
            http,
            base_url: &config.base_url,
            accept: &config.accept,
            host_header: config.host_header.as_deref(),
        }
    }

    /// Send a request and return the response body as a JSON object
    ///
    /// `path` is appended to the base URL verbatim and must start with `/`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        assertion: &SignedAssertion,
    ) -> Result<Map<String, Value>> {
        let url = format!("{}{}", self.base_url, path);

        let auth_header = format!("Bearer {}", assertion.as_str());
        let mut headers = vec![
            ("Authorization", auth_header.as_str()),
            ("Accept", self.accept),
            ("User-Agent", USER_AGENT),
        ];
        if let Some(host) = self.host_header {
            headers.push(("Host", host));
        }

        debug!(
            %method,
            %url,
            headers = ?redact(&headers),
            "sending GitHub API request"
        );

        let response = match method {
            Method::Get => self.http.get(&url, &headers).await?,
            Method::Post => self.http.post(&url, &headers, body.unwrap_or_default()).await?,
        };

        if response.status != 200 && response.status != 201 {
            return Err(Error::api(
                format!("{} {}", method, path),
                response.status,
                response.text_lossy(),
            ));
        }

        let value: Value = response
            .json()
            .map_err(|e| Error::decode(format!("{} {}: {}", method, path, e)))?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(Error::decode(format!(
                "{} {}: expected a JSON object, got {}",
                method,
                path,
                json_kind(&other)
            ))),
        }
    }

    /// Send a request and decode the JSON object into a typed record
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        assertion: &SignedAssertion,
    ) -> Result<T> {
        let map = self.request(method, path, body, assertion).await?;
        serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::protocol(format!("{} {}: {}", method, path, e)))
    }
}

fn redact<'h>(headers: &[(&'h str, &'h str)]) -> Vec<(&'h str, &'h str)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("authorization") {
                (*name, "Bearer <redacted>")
            } else {
                (*name, *value)
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
