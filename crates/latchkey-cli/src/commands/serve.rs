//! Serve command for starting the MCP server.
//!
//! `latchkey serve` - Run the MCP server and its authorization callback.

use anyhow::Context;
use clap::Args;
use latchkey_core::{LatchkeyConfig, Transport};
use latchkey_mcp::{McpServer, SecretStore};
use latchkey_token::{SecretKey, TokenAuthority};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments for `latchkey serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Configuration file path.
    #[arg(short, long, default_value = "latchkey.yaml")]
    pub config: PathBuf,

    /// Transport type (stdio or http). Overrides config file.
    #[arg(long)]
    pub transport: Option<Transport>,

    /// HTTP bind host. Overrides config file.
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port. Overrides config file.
    #[arg(long)]
    pub port: Option<u16>,

    /// Secret key file. Overrides config file.
    #[arg(long)]
    pub secret_key_file: Option<PathBuf>,
}

/// Run the server until the transport closes.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let authority = build_authority(&config)?;

    info!(
        transport = ?config.mcp.transport,
        addr = %config.mcp.bind_addr(),
        identity_header = %config.identity.header,
        "Configuration loaded"
    );

    let server = McpServer::new(
        config.mcp,
        Arc::new(SecretStore::new()),
        Arc::new(authority),
    )
    .with_identity(config.identity);

    server.run().await.context("MCP server failed")
}

/// Load the config file (if present) and apply command-line overrides.
pub fn resolve_config(args: &ServeArgs) -> anyhow::Result<LatchkeyConfig> {
    let mut config = if args.config.exists() {
        LatchkeyConfig::load_with_context(&args.config)
            .with_context(|| format!("Failed to load config file: {}", args.config.display()))?
    } else {
        warn!(config = %args.config.display(), "Config file not found, using defaults");
        LatchkeyConfig::default()
    };

    if let Some(transport) = args.transport {
        config.mcp.transport = transport;
    }
    if let Some(host) = &args.host {
        config.mcp.host = host.clone();
    }
    if let Some(port) = args.port {
        config.mcp.port = port;
    }
    if let Some(path) = &args.secret_key_file {
        config.token.secret_key_file = Some(path.clone());
    }

    Ok(config)
}

/// Build the token authority from the configured key, or an ephemeral one
/// when no key source is configured at all.
pub fn build_authority(config: &LatchkeyConfig) -> anyhow::Result<TokenAuthority> {
    let key = config
        .token
        .resolve_secret_key()
        .context("Failed to read secret key")?;

    match key {
        Some(hex) => {
            let key = SecretKey::from_hex(&hex).context("Failed to parse secret key")?;
            Ok(TokenAuthority::new(&key)?)
        }
        None => {
            warn!(
                "No secret key configured; using an ephemeral key. \
                 Outstanding authorization tokens will not survive a restart"
            );
            Ok(TokenAuthority::ephemeral()?)
        }
    }
}
