//! LORD Ingest - RIDB facility ingestion tool

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lord_common::logging::{init_logging, LogConfig, LogLevel};
use lord_ingest::config::parse_key_value;
use lord_ingest::{
    CsvExporter, IngestionOrchestrator, ListingRequest, NormalizeOptions, Normalizer,
    RelatedResource, RidbClient, RidbConfig, RidbConfigBuilder, Snapshot,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lord-ingest")]
#[command(author, version, about = "RIDB facility ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Snapshot file written by fetch and read by normalize
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch facilities and related records into a snapshot
    Fetch(FetchArgs),

    /// Flatten a snapshot into CSV tables
    Normalize(NormalizeArgs),

    /// Fetch, then normalize the fresh snapshot
    Run {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        normalize: NormalizeArgs,
    },
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// RIDB API key
    #[arg(long, env = "RIDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// RIDB API root
    #[arg(long)]
    base_url: Option<String>,

    /// State codes to list, one paginated walk each
    #[arg(long, value_delimiter = ',', default_value = "AZ,UT,OR")]
    states: Vec<String>,

    /// Stop after this many facilities across all states
    #[arg(long)]
    max_records: Option<usize>,

    /// Related collections attached to each facility
    #[arg(long, value_enum, value_delimiter = ',', default_value = "campsites")]
    related: Vec<RelatedResource>,

    /// Extra listing parameter (repeatable)
    #[arg(long = "param", value_parser = parse_key_value, default_value = "lastupdated=10-01-2018")]
    params: Vec<(String, String)>,

    /// Keep only the first record per FacilityID
    #[arg(long)]
    dedupe: bool,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Directory receiving the CSV tables
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip facilities without coordinates or at (0, 0)
    #[arg(long)]
    drop_unknown_locations: bool,

    /// Keep only ADA-accessible facilities
    #[arg(long)]
    ada_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("lord-ingest")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let mut builder = RidbConfigBuilder::from_config(RidbConfig::from_env()?);
    if let Some(path) = &cli.snapshot {
        builder = builder.snapshot_path(path);
    }

    match cli.command {
        Command::Fetch(fetch) => {
            let config = apply_fetch_args(builder, &fetch).build();
            let snapshot = fetch_snapshot(config.clone(), &fetch).await?;
            let path = &config.snapshot_path;
            snapshot
                .write(path)
                .with_context(|| format!("Failed to save snapshot to {}", path.display()))?;
        },
        Command::Normalize(normalize) => {
            let config = apply_normalize_args(builder, &normalize).build();
            let snapshot = Snapshot::read(&config.snapshot_path)?;
            export(&config, &snapshot, &normalize)?;
        },
        Command::Run { fetch, normalize } => {
            let builder = apply_fetch_args(builder, &fetch);
            let config = apply_normalize_args(builder, &normalize).build();
            let snapshot = fetch_snapshot(config.clone(), &fetch).await?;

            if let Err(e) = snapshot.write(&config.snapshot_path) {
                warn!(
                    path = %config.snapshot_path.display(),
                    error = %e,
                    "Failed to save snapshot, normalizing in-memory data"
                );
            }

            export(&config, &snapshot, &normalize)?;
        },
    }

    info!("Done");
    Ok(())
}

fn apply_fetch_args(mut builder: RidbConfigBuilder, args: &FetchArgs) -> RidbConfigBuilder {
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(url) = &args.base_url {
        builder = builder.base_url(url);
    }
    builder
}

fn apply_normalize_args(builder: RidbConfigBuilder, args: &NormalizeArgs) -> RidbConfigBuilder {
    match &args.output_dir {
        Some(dir) => builder.csv_dir(dir),
        None => builder,
    }
}

async fn fetch_snapshot(config: RidbConfig, args: &FetchArgs) -> Result<Snapshot> {
    let client = RidbClient::new(config)?;
    let orchestrator = IngestionOrchestrator::new(client)
        .with_related(args.related.clone())
        .with_dedupe(args.dedupe)
        .with_progress(true);

    let request = ListingRequest::facilities()
        .with_partitions(args.states.iter().map(|s| s.trim().to_uppercase()))
        .with_params(args.params.clone())
        .with_max_records(args.max_records);

    info!(states = ?request.partitions, max_records = ?request.max_records, "Fetching facilities");
    let (snapshot, report) = orchestrator.ingest(&request).await;

    for partition in &report.partitions {
        info!(
            state = %partition.partition,
            requests = partition.requests,
            records = partition.records,
            stop = ?partition.stop,
            "Partition summary"
        );
    }

    Ok(snapshot)
}

fn export(config: &RidbConfig, snapshot: &Snapshot, args: &NormalizeArgs) -> Result<()> {
    let normalizer = Normalizer::new(NormalizeOptions {
        drop_unknown_locations: args.drop_unknown_locations,
        ada_only: args.ada_only,
    });
    let tables = normalizer.normalize(snapshot.facilities());

    let written = CsvExporter::new(&config.csv_dir).write_all(&tables)?;
    info!(dir = %config.csv_dir.display(), files = written.len(), "CSV export complete");
    Ok(())
}
