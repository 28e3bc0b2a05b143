//! Error types and exit-code mapping

use thiserror::Error;

/// Result type alias for token exchange operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one step of the assertion / exchange pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid private key: {message}")]
    KeyParse { message: String },

    #[error("failed to sign assertion: {message}")]
    Signing { message: String },

    #[error("GitHub API error on {request} ({status}): {body}")]
    Api {
        request: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from GitHub: {message}")]
    Protocol { message: String },

    #[error("stopped after {count} redirects")]
    RedirectLoop { count: usize },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn key_parse(message: impl Into<String>) -> Self {
        Self::KeyParse {
            message: message.into(),
        }
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    pub fn api(request: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            request: request.into(),
            status,
            body: body.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn redirect_loop(count: usize) -> Self {
        Self::RedirectLoop { count }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Process exit code for this failure kind
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } => 2,
            Self::KeyParse { .. } | Self::Signing { .. } => 3,
            Self::Transport { .. } | Self::RedirectLoop { .. } => 4,
            Self::Api { .. } => 5,
            Self::Protocol { .. } | Self::Decode { .. } => 6,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::KeyParse { .. } => "key_parse_error",
            Self::Signing { .. } => "signing_error",
            Self::Api { .. } => "api_error",
            Self::Protocol { .. } => "protocol_error",
            Self::RedirectLoop { .. } => "redirect_loop",
            Self::Decode { .. } => "decode_error",
            Self::Transport { .. } => "transport_error",
        }
    }
}
