//! Mock implementations of platform traits for testing

use async_trait::async_trait;
use std::sync::{Mutex, OnceLock};

use crate::config::AppId;
use crate::error::{Error, Result};
use crate::github::auth::{sign_app_jwt, SignedAssertion};
use crate::platform::{Clock, HttpClient, HttpResponse};

/// PEM encoded RSA key pair generated once per test binary (never touches disk)
pub struct TestKeypair {
    pub private_pem: String,
    pub public_pem: String,
}

fn generate_rsa_keypair() -> TestKeypair {
    use rand::rngs::OsRng;
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
    use rsa::RsaPrivateKey;

    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation failed");
    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("private key PEM export failed")
        .to_string();
    let public_pem = private_key
        .to_public_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("public key PEM export failed");
    TestKeypair {
        private_pem,
        public_pem,
    }
}

pub fn test_keypair() -> &'static TestKeypair {
    static KEYPAIR: OnceLock<TestKeypair> = OnceLock::new();
    KEYPAIR.get_or_init(generate_rsa_keypair)
}

/// A second, unrelated key pair
pub fn wrong_keypair() -> &'static TestKeypair {
    static KEYPAIR: OnceLock<TestKeypair> = OnceLock::new();
    KEYPAIR.get_or_init(generate_rsa_keypair)
}

pub fn test_assertion() -> SignedAssertion {
    sign_app_jwt(
        test_keypair().private_pem.as_bytes(),
        AppId::new(12345).expect("positive app id"),
        1706900000,
    )
    .expect("test assertion should sign")
}

/// One request observed by [`MockHttp`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Mock HTTP client with pre-configured responses, matched by URL suffix
pub struct MockHttp {
    responses: Vec<(String, u16, Vec<u8>)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHttp {
    pub fn new(responses: Vec<(&str, u16, &str)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(pattern, status, body)| (pattern.to_string(), status, body.as_bytes().to_vec()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, method: &str, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.to_vec(),
        });

        for (pattern, status, response_body) in &self.responses {
            if url.ends_with(pattern.as_str()) {
                return Ok(HttpResponse {
                    status: *status,
                    body: response_body.clone(),
                });
            }
        }
        Err(Error::transport(format!("no mock response for {} {}", method, url)))
    }
}

#[async_trait(?Send)]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.respond("GET", url, headers, &[])
    }

    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
        self.respond("POST", url, headers, body)
    }
}

/// Mock clock with a fixed timestamp
pub struct MockClock(pub u64);

impl Clock for MockClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}
