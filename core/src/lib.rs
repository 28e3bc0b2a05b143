//! gh-app-token-core: platform-agnostic core for GitHub App installation tokens
//!
//! This crate signs the App assertion, resolves the installation for a
//! repository, and exchanges the assertion for an installation access token.
//! It depends only on abstract platform traits (HttpClient, Clock, JwtSigner)
//! and never imports a concrete transport.

pub mod config;
pub mod error;
pub mod github;
pub mod platform;
pub mod sts;

#[cfg(test)]
pub mod test_support;
