//! Configuration handed to the core
//!
//! Raw flag values arrive as a [`ConfigInput`] and are validated exactly once
//! into an immutable [`Config`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Media type sent in the `Accept` header
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.machine-man-preview+json";

/// Unvalidated configuration values as collected from flags or environment
#[derive(Debug, Default, Clone)]
pub struct ConfigInput {
    pub private_key_pem: Option<Vec<u8>>,
    pub app_id: Option<String>,
    pub git_url: Option<String>,
    pub repo: Option<String>,
    pub jwt_only: bool,
    pub host_header: Option<String>,
    pub accept: Option<String>,
}

/// Validated, immutable configuration
#[derive(Clone)]
pub struct Config {
    /// GitHub App private key (PEM format)
    pub private_key_pem: Vec<u8>,
    /// GitHub App numeric ID
    pub app_id: AppId,
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Target repository, absent only in assertion-only mode
    pub repository: Option<Repository>,
    /// Print the assertion and skip all network calls
    pub jwt_only: bool,
    /// Explicit `Host` header for virtual-host routing
    pub host_header: Option<String>,
    pub accept: String,
}

impl Config {
    /// Validate raw input into a configuration
    pub fn from_input(input: ConfigInput) -> Result<Self> {
        let private_key_pem = input
            .private_key_pem
            .filter(|pem| !pem.is_empty())
            .ok_or_else(|| Error::configuration("private-key-file is required"))?;

        let app_id: AppId = input
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::configuration("app-id is required"))?
            .parse()?;

        let git_url = input
            .git_url
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let base_url = validate_base_url(git_url.trim())?;

        let repository = match input.repo.as_deref().map(str::trim) {
            Some(repo) if !repo.is_empty() => Some(repo.parse::<Repository>()?),
            _ if input.jwt_only => None,
            _ => return Err(Error::configuration("repo is required unless jwt-only is set")),
        };

        let host_header = match input.host_header.as_deref().map(str::trim) {
            Some(host) if host.contains(char::is_whitespace) || host.contains('/') => {
                return Err(Error::configuration(format!("invalid host header '{}'", host)));
            }
            Some(host) if !host.is_empty() => Some(host.to_string()),
            _ => None,
        };

        let accept = input
            .accept
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACCEPT.to_string());

        Ok(Self {
            private_key_pem,
            app_id,
            base_url,
            repository,
            jwt_only: input.jwt_only,
            host_header,
            accept,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("private_key_pem", &"<redacted>")
            .field("app_id", &self.app_id)
            .field("base_url", &self.base_url)
            .field("repository", &self.repository)
            .field("jwt_only", &self.jwt_only)
            .field("host_header", &self.host_header)
            .field("accept", &self.accept)
            .finish()
    }
}

/// Accept only absolute http(s) URLs; a single trailing slash is dropped so
/// that request paths can be appended verbatim.
fn validate_base_url(raw: &str) -> Result<String> {
    let url = url::Url::parse(raw)
        .map_err(|e| Error::configuration(format!("invalid git-url '{}': {}", raw, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(Error::configuration(format!(
            "git-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::configuration(
            "git-url must not have a query string or fragment",
        ));
    }

    Ok(raw.strip_suffix('/').unwrap_or(raw).to_string())
}

/// GitHub App numeric ID, always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppId(u64);

impl AppId {
    pub fn new(id: u64) -> Result<Self> {
        if id == 0 {
            return Err(Error::configuration("app-id must be a positive integer"));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for AppId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.parse::<u64>().map_err(|_| {
            Error::configuration(format!("app-id must be a positive integer, got '{}'", s))
        })?;
        Self::new(id)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Repository in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid =
            || Error::configuration(format!("repo must be in format owner/name, got '{}'", s));

        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        let valid_part =
            |p: &str| !p.is_empty() && !p.contains('/') && !p.contains(char::is_whitespace);
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
