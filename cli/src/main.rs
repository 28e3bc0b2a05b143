//! gh-app-token: exchange a GitHub App private key for an installation token
//!
//! Signs a short-lived App JWT and, unless `--jwt-only` is given, trades it
//! for an installation access token of the target repository. The result is
//! the only thing written to stdout; logs go to stderr.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use gh_app_token_core::config::{Config, ConfigInput, DEFAULT_ACCEPT, DEFAULT_API_BASE};
use gh_app_token_core::error::{Error, Result};
use gh_app_token_core::github::auth::PemJwtSigner;
use gh_app_token_core::sts::exchange::{self, Output};

mod platform;

use platform::{ReqwestHttpClient, SystemClock};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "gh-app-token")]
#[command(about = "Exchange a GitHub App private key for an installation access token")]
struct Args {
    /// Path to file containing the GitHub App private key PEM
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_FILE")]
    private_key_file: Option<PathBuf>,

    /// GitHub App ID
    #[arg(long, env = "GITHUB_APP_ID")]
    app_id: Option<String>,

    /// GitHub API base URL (enterprise: https://github.example.com/api/v3)
    #[arg(long, default_value = DEFAULT_API_BASE, env = "GITHUB_API_URL")]
    git_url: String,

    /// GitHub repository (owner/name)
    #[arg(long, env = "GITHUB_APP_REPO")]
    repo: Option<String>,

    /// Print the signed App JWT and skip the token exchange
    #[arg(long, alias = "assertion-only")]
    jwt_only: bool,

    /// Explicit Host header for virtual-host routed deployments
    #[arg(long, env = "GITHUB_HOST_HEADER")]
    host_header: Option<String>,

    /// Accept header media type
    #[arg(long, default_value = DEFAULT_ACCEPT)]
    accept: String,

    /// Enable verbose logging
    #[arg(short, long, env = "GH_APP_TOKEN_VERBOSE")]
    verbose: bool,
}

impl Args {
    /// Collect raw configuration, reading the key file if one was given
    fn into_input(self) -> Result<ConfigInput> {
        let private_key_pem = self
            .private_key_file
            .as_deref()
            .map(read_private_key)
            .transpose()?;

        Ok(ConfigInput {
            private_key_pem,
            app_id: self.app_id,
            git_url: Some(self.git_url),
            repo: self.repo,
            jwt_only: self.jwt_only,
            host_header: self.host_header,
            accept: Some(self.accept),
        })
    }
}

fn read_private_key(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        Error::configuration(format!(
            "failed to read private key file {}: {}",
            path.display(),
            e
        ))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},gh_app_token_core={}",
            env!("CARGO_CRATE_NAME"),
            log_level,
            log_level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, kind = e.error_key(), "gh-app-token failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<Output> {
    let config = Config::from_input(args.into_input()?)?;
    debug!(?config, "configuration loaded");

    let signer = PemJwtSigner::from_config(&config)?;
    let http = ReqwestHttpClient::new()?;

    exchange::run(&config, &signer, &http, &SystemClock).await
}
