//! issue-token - Mint a bearer token for local testing
//!
//! Signs an identity with the configured private key and prints the token
//! on stdout, standing in for the login service during development.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use receipt_common::auth::TokenAuthority;
use receipt_common::config::{CliOverrides, ServiceConfig};
use receipt_common::Identity;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "issue-token")]
#[command(about = "Issue a signed identity token")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Private key (PEM); overrides config
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Subject identifier
    #[arg(long)]
    uid: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, default_value = "")]
    nickname: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::resolve(&CliOverrides {
        config_path: args.config,
        private_key_path: args.private_key,
        ..Default::default()
    })?;

    let Some(private_key) = config.private_key_path.as_deref() else {
        bail!("No private key configured. Pass --private-key or set RECEIPT_PRIVATE_KEY_PATH");
    };

    let authority = TokenAuthority::from_files(Some(private_key), &config.public_key_path)
        .context("Failed to load key pair")?;

    let identity = Identity::new(args.uid, args.email, args.nickname);
    let token = authority.issue(&identity)?;
    info!(uid = %identity.uid, "Token issued");

    println!("{}", token);
    Ok(())
}
