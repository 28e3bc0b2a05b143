//! GitHub API module
//!
//! Handles GitHub App assertions and the authenticated API calls made with them.

pub mod api;
pub mod auth;
