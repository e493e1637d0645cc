use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quotes_server::config::{AppConfig, CliConfig, FileConfig};
use quotes_server::user::TokenService;
use quotes_server::{
    run_server, RequestsLoggingLevel, ServerConfig, SqliteQuoteStore, SqliteUserStore,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the directory holding the SQLite database files.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Secret used to sign session tokens.
    #[clap(long)]
    pub token_secret: Option<String>,

    /// Path to a TOML config file. Values there override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        token_secret: cli_args.token_secret,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening user database at {:?}...", app_config.user_db_path());
    let user_store = Arc::new(SqliteUserStore::new(app_config.user_db_path())?);

    info!(
        "Opening quote database at {:?}...",
        app_config.quotes_db_path()
    );
    let quote_store = Arc::new(SqliteQuoteStore::new(app_config.quotes_db_path())?);

    let token_service = TokenService::new(&app_config.token_secret);

    let server_config = ServerConfig {
        port: app_config.port,
        requests_logging_level: app_config.logging_level.clone(),
    };

    info!("Starting server on port {}...", server_config.port);
    run_server(server_config, user_store, quote_store, token_service).await
}
