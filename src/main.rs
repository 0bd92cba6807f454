use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use newsroom::config::{Config, DEFAULT_CONFIG_PATH};
use newsroom::db::SqliteStorage;
use newsroom::logging;
use newsroom::notify::{NoopNotifier, ShareNotifier, WebhookNotifier};
use newsroom::server;
use newsroom::service::NewsService;
use newsroom::storage::Storage;

#[derive(Parser)]
#[command(name = "newsroom")]
#[command(about = "Role-based news publishing service")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
        /// SQLite database path (overrides the config file)
        #[arg(long)]
        db: Option<String>,
    },
    /// Apply database migrations and exit
    Migrate {
        /// SQLite database path (overrides the config file)
        #[arg(long)]
        db: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    logging::init_logging(&config.logging.dir);

    match cli.command {
        Commands::Serve { port, db } => {
            let port = port.unwrap_or(config.server.port);
            let db_path = db.unwrap_or(config.storage.db_path);

            info!("Opening database at {}", db_path);
            let sqlite = SqliteStorage::open(&db_path)?;
            // Schema setup is idempotent, so serve always runs it
            sqlite.migrate()?;
            let storage: Arc<dyn Storage> = Arc::new(sqlite);

            let notifier: Arc<dyn ShareNotifier> = match &config.share.webhook_url {
                Some(url) => {
                    info!("Share hook enabled: {}", url);
                    Arc::new(WebhookNotifier::new(url.clone()))
                }
                None => Arc::new(NoopNotifier),
            };

            let service = Arc::new(NewsService::new(storage, notifier));
            server::start_server(service, port).await?;
        }
        Commands::Migrate { db } => {
            let db_path = db.unwrap_or(config.storage.db_path);
            println!("🔧 Applying migrations to {db_path}...");
            let sqlite = SqliteStorage::open(&db_path)?;
            sqlite.migrate()?;
            println!("✅ Migrations applied");
        }
    }
    Ok(())
}
