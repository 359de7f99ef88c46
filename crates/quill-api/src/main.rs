//! Quill API server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `QUILL_*` environment variables, opens the SQLite document store and
//! identity directory, and serves the JSON API over HTTP.
//!
//! # Registering users
//!
//! ```
//! cargo run -p quill-api --bin server -- add-user alice --preferred-username Alicia
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use quill_api::{AppState, ServerConfig};
use quill_core::directory::{IdentityDirectory, PREFERRED_USERNAME, UserAttribute};
use quill_store_sqlite::{SqliteDirectory, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Quill blogging API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Register a user in the identity directory and print its subject id.
  AddUser {
    username: String,
    /// Use this subject id instead of generating one.
    #[arg(long)]
    subject_id: Option<String>,
    #[arg(long)]
    preferred_username: Option<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = load_config(&cli.config)?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg).await,
    Command::AddUser {
      username,
      subject_id,
      preferred_username,
    } => add_user(&server_cfg, &username, subject_id, preferred_username).await,
  }
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 3000)?
    .set_default("store_path", "quill.db")?
    .set_default("directory_path", "quill-directory.db")?
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("QUILL")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if let Err(e) = server_cfg.api.allow_origin() {
    let origin = &server_cfg.api.cors_allow_origin;
    anyhow::bail!("invalid cors_allow_origin {origin:?}: {e}");
  }

  Ok(server_cfg)
}

async fn open_directory(server_cfg: &ServerConfig) -> anyhow::Result<SqliteDirectory> {
  let path = expand_tilde(&server_cfg.directory_path);
  SqliteDirectory::open(&path)
    .await
    .with_context(|| format!("failed to open directory at {path:?}"))
}

async fn serve(server_cfg: ServerConfig) -> anyhow::Result<()> {
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let directory = open_directory(&server_cfg).await?;

  let state = AppState {
    store:     Arc::new(store),
    directory: Arc::new(directory),
    config:    Arc::new(server_cfg.api.clone()),
  };

  let app = quill_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn add_user(
  server_cfg: &ServerConfig,
  username: &str,
  subject_id: Option<String>,
  preferred_username: Option<String>,
) -> anyhow::Result<()> {
  let directory = open_directory(server_cfg).await?;
  let record = directory
    .add_user(username, subject_id)
    .await
    .with_context(|| format!("failed to add user {username}"))?;

  if let Some(name) = preferred_username {
    directory
      .update_attributes(username, vec![UserAttribute::new(PREFERRED_USERNAME, name)])
      .await
      .context("failed to set preferred_username")?;
  }

  let sub = record.subject_id().unwrap_or_default();
  tracing::info!(username, subject_id = sub, "user added");
  println!("{sub}");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
