use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pricewatch_core::{config::ExportConfig, db, pipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export cleaned crowd-sourced price data as CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean, aggregate and write the per-marketplace CSV files
    Export(ExportArgs),
    /// Run the pipeline without writing and list what would be exported
    Summary(SourceArgs),
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// TOML file overriding the cleaning thresholds and exchange rates
    #[arg(long)]
    config: Option<PathBuf>,
    /// Observation database, e.g. sqlite://data/db/prices.sqlite
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Directory to (re)create with the exported CSV files
    out_dir: PathBuf,
    #[command(flatten)]
    source: SourceArgs,
    /// Run every stage but write nothing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Export(args) => handle_export(args).await,
        Command::Summary(args) => handle_summary(args).await,
    }
}

async fn handle_export(args: ExportArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let pool = connect_pool(&args.source, &config).await?;

    let summary = pipeline::run_export(&pool, &config, &args.out_dir, args.dry_run)
        .await
        .with_context(|| format!("failed to export to {}", args.out_dir.display()))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(out_dir = %args.out_dir.display(), "Exported data");
    Ok(())
}

async fn handle_summary(args: SourceArgs) -> Result<()> {
    let config = load_config(&args)?;
    let pool = connect_pool(&args, &config).await?;

    let output = pipeline::run(&pool, &config)
        .await
        .context("failed to run the cleaning pipeline")?;

    if output.summary.marketplaces.is_empty() {
        println!("No observations survived cleaning.");
        return Ok(());
    }
    for entry in &output.summary.marketplaces {
        let latest = entry
            .latest_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}: {} products, {} days, latest {}",
            entry.marketplace, entry.products, entry.days, latest
        );
    }
    println!(
        "{} observations, {} of {} product/day groups accepted, {} outliers removed",
        output.summary.observations,
        output.summary.cleaning.accepted,
        output.summary.cleaning.groups,
        output.summary.outliers_removed
    );
    Ok(())
}

fn load_config(args: &SourceArgs) -> Result<ExportConfig> {
    match &args.config {
        Some(path) => ExportConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ExportConfig::default()),
    }
}

async fn connect_pool(args: &SourceArgs, config: &ExportConfig) -> Result<db::DbPool> {
    let database_url = args
        .database_url
        .clone()
        .or_else(|| env::var("DATABASE_URL").ok())
        .or_else(|| env::var("PRICEWATCH_DATABASE_URL").ok())
        .or_else(|| config.database_url.clone())
        .context("--database-url, DATABASE_URL, PRICEWATCH_DATABASE_URL or database_url in the config must be set")?;
    db::connect(&database_url)
        .await
        .context("failed to open the observation database")
}
