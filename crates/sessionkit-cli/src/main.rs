//! sessionkit - command-line driver for the authenticated session client.
//!
//! Logs in, registers, updates the profile and inspects the persisted
//! session the same way the mobile app does, which makes it handy for
//! poking at a backend by hand.

mod commands;

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sessionkit_core::{AuthenticatedClient, Config, SessionStore, StoreBackend};

#[derive(Parser, Debug)]
#[command(name = "sessionkit", version, about = "Authenticated session client")]
struct Cli {
    /// Backend base URL (overrides SESSIONKIT_API_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Where the session is persisted
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account (does not log in)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Change the display name of the logged-in user
    UpdateProfile {
        #[arg(long)]
        username: String,
    },
    /// Clear the persisted session
    Logout,
    /// Show the current session
    Status,
    /// Authenticated GET against any backend path
    Get { path: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    File,
    Keyring,
    Memory,
}

impl From<Backend> for StoreBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::File => StoreBackend::File,
            Backend::Keyring => StoreBackend::Keyring,
            Backend::Memory => StoreBackend::Memory,
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    // --base-url wins over the environment and the config file
    let base_url = cli.base_url.unwrap_or_else(|| config.base_url());
    let backend = cli.backend.map(StoreBackend::from).unwrap_or(config.backend);

    let data_dir = Config::data_dir().context("Failed to locate data directory")?;
    let client = AuthenticatedClient::builder()
        .config(&config)
        .base_url(base_url.as_str())
        .store(SessionStore::for_backend(backend, &data_dir))
        .build()
        .context("Failed to create API client")?;
    info!(base_url = %base_url, backend = ?backend, "sessionkit starting");

    match cli.command {
        Command::Login { email } => commands::login(&client, &mut config, email).await,
        Command::Register { username, email } => {
            commands::register(&client, &username, &email).await
        }
        Command::UpdateProfile { username } => commands::update_profile(&client, &username).await,
        Command::Logout => commands::logout(&client),
        Command::Status => commands::status(&client),
        Command::Get { path } => commands::get(&client, &path).await,
    }
}
