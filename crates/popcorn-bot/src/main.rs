//! popcorn-bot server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `POPCORN_*` environment variables, opens the SQLite store and serves the
//! Telegram webhook over HTTP.
//!
//! # Staff enrolment
//!
//! Sellers are ordinary users with a `seller_<station>` role. After they have
//! sent `/start` once, grant the role with:
//!
//! ```text
//! popcorn-bot grant-role 123456789 seller_left
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use popcorn_bot::{
  AppState, Error, ServerConfig,
  action::Action,
  bot::Bot,
  catalog::CatalogCache,
  telegram::TelegramClient,
};
use popcorn_core::{
  profile::{Role, UserId},
  store::ShopStore,
};
use popcorn_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Popcorn Shop ordering bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the webhook (default).
  Serve,
  /// Assign a role (`customer`, `seller_<station>`) to a known user.
  GrantRole { user_id: UserId, role: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("POPCORN"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::GrantRole { user_id, role } => grant_role(&store, user_id, &role).await,
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  if server_cfg.webhook_secret.is_empty() {
    anyhow::bail!("webhook_secret must be set; refusing to accept unauthenticated updates");
  }
  if let Some(point) = server_cfg
    .pickup_points
    .iter()
    .find(|p| !Action::Confirm(p.code.clone()).fits_button())
  {
    anyhow::bail!("pickup point code {:?} is too long for a button", point.code);
  }

  let messenger = TelegramClient::new(&server_cfg.telegram_api_url, &server_cfg.bot_token)
    .context("failed to build Bot API client")?;

  // Build application state.
  let state = AppState {
    bot:       Arc::new(Bot::new(
      Arc::new(store),
      Arc::new(CatalogCache::new(server_cfg.catalog_ttl())),
      server_cfg.bot_settings(),
    )),
    messenger: Arc::new(messenger),
    config:    Arc::new(server_cfg.clone()),
  };

  let app = popcorn_bot::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn grant_role(store: &SqliteStore, user_id: UserId, role: &str) -> anyhow::Result<()> {
  let role = Role::parse(role);
  if let Role::Other(tag) = &role {
    tracing::warn!(%tag, "unrecognised role; the user will be treated as a customer");
  }

  let updated = store
    .set_profile_role(user_id, role.clone())
    .await
    .map_err(Error::store)?;
  if !updated {
    return Err(Error::NotFound(format!("profile {user_id}; ask the user to send /start first")).into());
  }

  tracing::info!(user_id, %role, "role granted");
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
