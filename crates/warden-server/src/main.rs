use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use warden_core::WardenConfig;
use warden_server::{AppState, create_router};
use warden_token::TokenService;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Warden access-control service")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Override `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Session token utilities.
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token with the configured secret.
    Mint {
        #[arg(long)]
        user_id: String,

        /// Role value: 1 = normal, 2 = admin.
        #[arg(long, default_value_t = 1)]
        user_type: i32,
    },

    /// Verify a token and print the identity it carries.
    Parse { token: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = WardenConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.cmd.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(cfg, bind).await,
        Command::Token { cmd } => token(&cfg, cmd),
    }
}

async fn serve(cfg: WardenConfig, bind: Option<String>) -> anyhow::Result<()> {
    let state = AppState::init(&cfg).await?;
    let app = create_router(state);

    let addr = bind.unwrap_or_else(|| cfg.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("warden listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("warden stopped");
    Ok(())
}

fn token(cfg: &WardenConfig, cmd: TokenCommand) -> anyhow::Result<()> {
    let tokens = TokenService::from_config(&cfg.token)?;
    match cmd {
        TokenCommand::Mint { user_id, user_type } => {
            let issued = tokens.create_token(&user_id, user_type)?;
            println!("{}", issued.token);
            eprintln!("expires at {}", issued.expires_at.to_rfc3339());
        }
        TokenCommand::Parse { token } => {
            let claims = tokens.parse_claims(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
