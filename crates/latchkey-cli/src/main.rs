use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "latchkey", version, about = "Latchkey MCP server")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the MCP server.
    Serve(commands::serve::ServeArgs),

    /// Secret key management.
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Authorization token utilities.
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new token secret key.
    Generate {
        /// Directory to write `secret.key` into. Prints to stdout if omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint the authorization token for a caller.
    Mint {
        /// Caller identity the token is bound to.
        #[arg(long)]
        user: String,

        /// Secret key file or hex-encoded key.
        #[arg(long, env = "LATCHKEY_SECRET_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Callback endpoint; prints the full authorization URL as well.
        #[arg(long)]
        base_url: Option<url::Url>,
    },

    /// Check a token against a caller identity.
    Verify {
        /// Caller identity the token should be bound to.
        #[arg(long)]
        user: String,

        /// Token to check.
        #[arg(long)]
        token: String,

        /// Secret key file or hex-encoded key.
        #[arg(long, env = "LATCHKEY_SECRET_KEY", hide_env_values = true)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries JSON-RPC on the stdio transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve(args) => commands::serve::run(args).await?,

        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output } => commands::keys::generate(output)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Mint {
                user,
                key,
                base_url,
            } => commands::token::mint(key, &user, base_url.as_ref())?,
            TokenCommand::Verify { user, token, key } => {
                if !commands::token::verify(key, &user, &token)? {
                    std::process::exit(1);
                }
            }
        },
    }

    Ok(())
}
