use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paynotify::application::event_bus::EventBus;
use paynotify::application::pipeline::NotificationPipeline;
use paynotify::application::union_id::UnionIdReactor;
use paynotify::config::AppConfig;
use paynotify::domain::event::OutcomeKind;
use paynotify::domain::notification::{InboundNotification, NotifyHeaders};
use paynotify::domain::ports::{NotificationStoreBox, UserStoreArc};
use paynotify::infrastructure::identity_http::HttpIdentityResolver;
use paynotify::infrastructure::in_memory::{InMemoryNotificationStore, InMemoryUserStore};
use paynotify::infrastructure::provider_sdk::ProviderSdk;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file with accounts and pipeline settings
    #[arg(long)]
    config: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one notification through the pipeline and print the reply
    Ingest {
        /// Account the notification is addressed to
        #[arg(long)]
        account: String,
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        nonce: String,
        /// Hex request signature
        #[arg(long)]
        signature: String,
        #[arg(long)]
        serial: Option<String>,
        /// Notification body file, or `-` for stdin
        payload: PathBuf,
    },
}

type Stores = (NotificationStoreBox, UserStoreArc);

fn in_memory_stores() -> Stores {
    (
        Box::new(InMemoryNotificationStore::new()),
        Arc::new(InMemoryUserStore::new()),
    )
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_stores(path: &Path) -> Result<Stores> {
    use paynotify::infrastructure::rocksdb::RocksDBStore;

    let store = RocksDBStore::open(path).into_diagnostic()?;
    Ok((Box::new(store.clone()), Arc::new(store)))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_stores(path: &Path) -> Result<Stores> {
    tracing::warn!(
        path = %path.display(),
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
    );
    Ok(in_memory_stores())
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    if path.as_os_str() == "-" {
        std::io::stdin().read_to_end(&mut body).into_diagnostic()?;
    } else {
        body = std::fs::read(path).into_diagnostic()?;
    }
    Ok(body)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config).into_diagnostic()?;

    let (records, users) = match &cli.db_path {
        Some(path) => persistent_stores(path)?,
        None => in_memory_stores(),
    };

    let endpoints = config
        .accounts
        .iter()
        .filter_map(|a| a.identity.clone().map(|i| (a.id.clone(), i)))
        .collect();
    let resolver = Arc::new(HttpIdentityResolver::new(endpoints, config.identity_timeout()));

    let mut bus = EventBus::new();
    bus.subscribe(
        OutcomeKind::Success,
        Arc::new(UnionIdReactor::new(users, resolver)),
    );

    let pipeline = NotificationPipeline::new(
        records,
        Box::new(ProviderSdk::new()),
        config.accounts.clone(),
        bus,
        config.pipeline.clone(),
    );

    match cli.command {
        Command::Ingest {
            account,
            timestamp,
            nonce,
            signature,
            serial,
            payload,
        } => {
            let body = read_payload(&payload)?;
            let headers = NotifyHeaders {
                timestamp,
                nonce,
                signature,
                serial,
            };
            let response = pipeline
                .reply(InboundNotification::new(account, headers, body))
                .await;

            println!("HTTP {}", response.status);
            println!("{}", response.body());

            if response.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
