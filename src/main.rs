//! # site-enricher CLI
//!
//! Command-line front end for the enrichment pipeline.
//!
//! ## Subcommands
//!
//! - `enrich`: Fetch and classify every URL of an input CSV into an output CSV
//! - `stale`: List rows of an enriched CSV that are due for re-enrichment
//! - `rules`: Print the built-in rule set as JSON, to customize and pass back
//!   with `enrich --rules`
//!
//! ## Features
//!
//! - Bounded concurrency with an optional global request rate
//! - Progress bar with per-row updates
//! - Console logging via `RUST_LOG`, optional rolling log file and OTLP export

mod telemetry;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use site_enricher::classifier::{RuleSet, DEFAULT_INDUSTRY_THRESHOLD};
use site_enricher::fetcher::{FetcherConfig, DEFAULT_TIMEOUT_SECS};
use site_enricher::pipeline::{
    needs_reenrichment, EnrichConfig, EnrichJob, RowProgress, DEFAULT_CONCURRENCY,
    DEFAULT_MAX_AGE_DAYS,
};
use site_enricher::table::{read_enriched_rows, write_url_list};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Enrich a list of websites with platform, industry, tag and color signals", long_about = None)]
struct Cli {
    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Export traces and metrics over OTLP/HTTP
    #[arg(long, global = true)]
    otlp: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enrich every website_url of a CSV file
    Enrich(EnrichArgs),

    /// List rows of an enriched CSV that need re-enrichment
    Stale(StaleArgs),

    /// Print the built-in rule set as JSON
    Rules(RulesArgs),
}

#[derive(Args, Debug)]
struct EnrichArgs {
    /// Input CSV with a website_url column
    #[arg(required = true)]
    input: PathBuf,

    /// Output CSV
    #[arg(short, long, default_value = "enriched.csv")]
    output: PathBuf,

    /// JSON rule set replacing the built-in tables
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Number of sites fetched concurrently
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Maximum requests per second across all workers (0 for no limit)
    #[arg(long, default_value = "0")]
    rps: u32,

    /// Minimum industry confidence
    #[arg(long, default_value_t = DEFAULT_INDUSTRY_THRESHOLD)]
    threshold: f64,

    /// Maximum tags per site
    #[arg(long, default_value = "10")]
    max_tags: usize,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,
}

#[derive(Args, Debug)]
struct StaleArgs {
    /// CSV written by a previous enrich run
    #[arg(required = true)]
    input: PathBuf,

    /// Age in days after which a row is stale
    #[arg(short, long, default_value_t = DEFAULT_MAX_AGE_DAYS)]
    days: i64,

    /// Write stale URLs to this CSV instead of printing them
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RulesArgs {
    /// Write the rule set to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber(cli.log_dir.as_deref(), cli.otlp)?;

    match cli.command {
        Commands::Enrich(args) => enrich_command(args).await?,
        Commands::Stale(args) => stale_command(args)?,
        Commands::Rules(args) => rules_command(args).await?,
    }

    Ok(())
}

#[instrument]
async fn enrich_command(args: EnrichArgs) -> anyhow::Result<()> {
    let rules = match &args.rules {
        Some(path) => RuleSet::from_path(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => RuleSet::builtin(),
    };

    let mut fetcher = FetcherConfig::builder()
        .timeout_secs(args.timeout)
        .requests_per_second(args.rps);
    if let Some(user_agent) = &args.user_agent {
        fetcher = fetcher.user_agent(user_agent.clone());
    }

    let job = EnrichJob {
        input: args.input.clone(),
        output: args.output.clone(),
        rules,
        fetcher: fetcher.build(),
        enrich: EnrichConfig::builder()
            .concurrency(args.concurrency)
            .industry_threshold(args.threshold)
            .max_tags(args.max_tags)
            .build(),
    };

    let rows = job.load()?;
    println!("Enriching {} sites from {}...", rows.len(), args.input.display());

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel::<RowProgress>(100);

    let progress_bar = ProgressBar::new(rows.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Enriching sites...");

    // Ends once every sender is dropped
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            let mut degraded = 0;
            while let Some(event) = progress_receiver.recv().await {
                progress_bar.inc(1);
                if event.degraded {
                    degraded += 1;
                }
                progress_bar.set_message(format!("{} ({} degraded)", event.url, degraded));
            }
            progress_bar.finish_with_message("Enrichment completed");
        }
    });

    let summary = job.run(rows, Some(progress_sender)).await?;
    if let Err(e) = progress_handle.await {
        warn!("Progress task failed: {}", e);
    }

    println!("Enriched {}", summary);
    println!("Wrote {}", args.output.display());

    Ok(())
}

#[instrument]
fn stale_command(args: StaleArgs) -> anyhow::Result<()> {
    let rows = read_enriched_rows(&args.input)?;
    let now = Utc::now();
    let max_age = chrono::Duration::days(args.days);

    let stale: Vec<String> = rows
        .into_iter()
        .filter(|row| needs_reenrichment(row.last_enriched_at, now, max_age))
        .map(|row| row.website_url)
        .collect();
    info!("{} stale rows older than {} days", stale.len(), args.days);

    match args.output {
        Some(output) => {
            write_url_list(&output, &stale)?;
            println!("Wrote {} stale URLs to {}", stale.len(), output.display());
        }
        None => {
            for url in &stale {
                println!("{}", url);
            }
        }
    }

    Ok(())
}

#[instrument]
async fn rules_command(args: RulesArgs) -> anyhow::Result<()> {
    let json = RuleSet::builtin().to_json_pretty()?;

    match args.output {
        Some(output) => {
            tokio::fs::write(&output, json).await?;
            println!("Saved built-in rules to {}", output.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
