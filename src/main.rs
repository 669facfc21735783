use clap::Parser;
use legisync::{run_sync, FileCatalog, FsStore, JsonlLedger, LegiscanClient, SyncConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "legisync")]
#[command(about = "Synchronize legislative session datasets from Legiscan into file/object storage", long_about = None)]
#[command(version)]
struct Args {
    /// Invoke the Legiscan API (without this, only report on stored files)
    #[arg(long)]
    api: bool,

    /// Process a single state, e.g. AZ or OH
    #[arg(long)]
    state: Option<String>,

    /// Days since the last DatasetList request before fetching a new one
    #[arg(long, default_value_t = 7)]
    frequency: i64,

    /// Skip sessions that ended before this year
    #[arg(long, default_value_t = 2018)]
    from_year: i32,

    /// Directory used as file/object storage
    #[arg(long, default_value = "fob")]
    storage_dir: PathBuf,

    /// Path of the append-only hash ledger
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Legiscan API base URL
    #[arg(long, default_value = "https://api.legiscan.com/")]
    api_url: String,

    /// Legiscan API key
    #[arg(long, env = "LEGISCAN_API_KEY", default_value = "")]
    api_key: String,

    /// Remote fetches allowed in this run
    #[arg(long, default_value_t = 100)]
    quota: u32,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("legisync={}", log_level))
        .init();

    info!("LegiSync - Legislative Dataset Synchronizer");
    info!("Storage directory: {:?}", args.storage_dir);
    if let Some(state) = &args.state {
        info!("Restricted to state: {}", state);
    }

    let store = FsStore::new(&args.storage_dir)?;
    let api = LegiscanClient::new(args.api_url, args.api_key, args.quota);
    let catalog = FileCatalog::new(args.storage_dir.join("regions.json"));
    let ledger_path = args
        .ledger
        .unwrap_or_else(|| args.storage_dir.join("hashes.jsonl"));
    let ledger = JsonlLedger::new(ledger_path);

    let config = SyncConfig {
        use_api: args.api,
        state: args.state.map(|s| s.to_uppercase()),
        frequency_days: args.frequency,
        from_year: args.from_year,
        ..SyncConfig::default()
    };

    let today = chrono::Utc::now().date_naive();
    match run_sync(&config, &store, &api, &catalog, &ledger, today).await {
        Ok(()) => {
            info!("Synchronization completed");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
