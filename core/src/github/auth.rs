//! GitHub App authentication
//!
//! Generates the short-lived App JWT (the assertion) that authenticates the
//! installation lookup and the token exchange.

use std::fmt;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use crate::config::{AppId, Config};
use crate::error::{Error, Result};
use crate::platform::JwtSigner;

/// Lifetime of an assertion, measured from `iat`
///
/// GitHub rejects App JWTs that expire more than ten minutes out, so the
/// window stays a minute short of that to absorb clock drift.
pub const ASSERTION_TTL_SECS: i64 = 540;

/// GitHub App JWT claims
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iat: i64,
    pub exp: i64,
    /// App ID, serialized as a JSON number
    pub iss: u64,
}

/// Signed, self-contained App JWT
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAssertion(String);

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedAssertion(<redacted>)")
    }
}

/// JWT signer that uses a local PEM private key
///
/// The key is parsed on construction so a malformed key is reported before
/// any request is attempted.
pub struct PemJwtSigner {
    app_id: AppId,
    key: EncodingKey,
}

impl PemJwtSigner {
    pub fn from_pem(app_id: AppId, pem: &[u8]) -> Result<Self> {
        Ok(Self {
            app_id,
            key: parse_private_key(pem)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_pem(config.app_id, &config.private_key_pem)
    }
}

#[async_trait(?Send)]
impl JwtSigner for PemJwtSigner {
    async fn sign_app_jwt(&self, now_secs: i64) -> Result<SignedAssertion> {
        sign_with_key(&self.key, self.app_id.get(), now_secs)
    }
}

/// Sign an assertion for `app_id` issued at `now_secs`
pub fn sign_app_jwt(pem: &[u8], app_id: AppId, now_secs: i64) -> Result<SignedAssertion> {
    let key = parse_private_key(pem)?;
    sign_with_key(&key, app_id.get(), now_secs)
}

/// Parse and fully decode an RSA private key (PKCS#1 or PKCS#8 PEM)
///
/// `EncodingKey::from_rsa_pem` only checks the PEM armor, so the key
/// material is decoded here first; a corrupt body or a public key must
/// fail as a key error, not later at signing time.
fn parse_private_key(pem: &[u8]) -> Result<EncodingKey> {
    let text = std::str::from_utf8(pem)
        .map_err(|e| Error::key_parse(format!("PEM is not valid UTF-8: {}", e)))?;

    RsaPrivateKey::from_pkcs1_pem(text)
        .map(|_| ())
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(text).map(|_| ()))
        .map_err(|e| Error::key_parse(format!("not an RSA private key (PKCS#1 or PKCS#8): {}", e)))?;

    EncodingKey::from_rsa_pem(pem).map_err(|e| Error::key_parse(e.to_string()))
}

fn sign_with_key(key: &EncodingKey, issuer: u64, now_secs: i64) -> Result<SignedAssertion> {
    if issuer == 0 {
        return Err(Error::signing("issuer must be a positive app ID"));
    }

    let claims = AssertionClaims {
        iat: now_secs,
        exp: now_secs + ASSERTION_TTL_SECS,
        iss: issuer,
    };

    let header = Header::new(Algorithm::RS256);

    encode(&header, &claims, key)
        .map(SignedAssertion)
        .map_err(|e| Error::signing(format!("failed to encode JWT: {}", e)))
}
