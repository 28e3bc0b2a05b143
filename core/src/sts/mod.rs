//! Token exchange module
//!
//! Sequences assertion signing and the installation token exchange.

pub mod exchange;
