use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ispb_registry::logging::init_logging;
use ispb_registry::{
    InstitutionRegistry, Pipeline, PipelineConfig, ReqwestClient, SnapshotStore, SourceOutcomeSummary,
};

#[derive(Parser, Debug)]
#[command(name = "ispb-registry", version, about = "Brazilian ISPB participant registry")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding ispbs.json and last_update.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download both feeds, reconcile and persist a new snapshot
    Update,
    /// Print the record for one ISPB
    Lookup { ispb: String },
    /// Print aggregate counts over the current snapshot
    Stats,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Command::Update => run_update(config),
        Command::Lookup { ispb } => run_lookup(&config, &ispb),
        Command::Stats => run_stats(&config),
    }
}

fn run_update(config: PipelineConfig) -> Result<()> {
    println!("🏦 ISPB Registry - Update");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let client = ReqwestClient::new(&config.http.user_agent)?;
    let pipeline = Pipeline::new(config, client);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(pipeline.run())?;

    println!("\n📥 Sources");
    print_source("PIX", &report.pix);
    print_source("STR", &report.str_participants);

    println!("\n⚖️  Reconciliation");
    println!("✓ PIX only:     {}", report.pix_only_count);
    println!("✓ STR only:     {}", report.str_only_count);
    println!("✓ In both:      {}", report.merged_count);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✅ {} institutions written to {}",
        report.total(),
        pipeline.store().records_path().display()
    );

    Ok(())
}

fn print_source(label: &str, outcome: &SourceOutcomeSummary) {
    match outcome {
        SourceOutcomeSummary::Ingested(summary) => println!("✓ {}", summary),
        SourceOutcomeSummary::Failed(error) => println!("⚠️  {} skipped: {}", label, error),
    }
}

fn load_registry(config: &PipelineConfig) -> Result<InstitutionRegistry> {
    let snapshot = SnapshotStore::new(config.storage.data_dir.clone()).load()?;
    Ok(InstitutionRegistry::from_snapshot(snapshot))
}

fn run_lookup(config: &PipelineConfig, ispb: &str) -> Result<()> {
    let registry = load_registry(config)?;

    match registry.lookup(ispb) {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(record)?);
            Ok(())
        }
        None => anyhow::bail!("ISPB {} not found", ispb.trim()),
    }
}

fn run_stats(config: &PipelineConfig) -> Result<()> {
    let registry = load_registry(config)?;
    let stats = registry.stats(chrono::Utc::now());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
