//! Article-Harvest main entry point
//!
//! This is the command-line interface for the Article-Harvest news crawler.

use anyhow::Context;
use article_harvest::config::{lint_config, load_config_with_hash, Config};
use article_harvest::crawler::{Coordinator, RunOutcome};
use article_harvest::output::{print_statistics, ArticleSink, JsonLinesSink};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl-C
const EXIT_CANCELLED: u8 = 130;

/// Article-Harvest: a focused news crawler
///
/// Article-Harvest crawls one news site from a seed page, follows navigation
/// pages within scope and appends every article it finds to a JSON Lines
/// file.
#[derive(Parser, Debug)]
#[command(name = "article-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A focused news crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and report blacklist findings without crawling
    #[arg(long)]
    check_config: bool,

    /// Write articles here instead of the configured output path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::Cancelled) => ExitCode::from(EXIT_CANCELLED),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunOutcome> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }

    if cli.check_config {
        handle_check_config(&config);
        return Ok(RunOutcome::Completed);
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("article_harvest=info,warn"),
            1 => EnvFilter::new("article_harvest=debug,info"),
            2 => EnvFilter::new("article_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --check-config mode: shows what would be crawled
fn handle_check_config(config: &Config) {
    println!("=== Article-Harvest Configuration ===\n");

    println!("Site:");
    println!("  Host: {}", config.site.host);
    println!("  Seed: {}", config.site.seed);
    for secondary in &config.site.secondary_hosts {
        println!("  Skipped host: {}", secondary);
    }

    println!("\nCrawler:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agents:");
    match &config.user_agent.agents {
        Some(agents) => println!("  {} configured", agents.len()),
        None => println!("  built-in pool"),
    }
    println!("  Fallback: {}", config.user_agent.fallback);

    println!("\nExtraction:");
    println!("  Heading selector: {}", config.extraction.heading_selector);
    println!("  Content selector: {}", config.extraction.content_selector);

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Date format: {}", config.output.date_format);

    println!("\nScope:");
    println!("  Article suffix: {}", config.scope.article_suffix);
    println!("  Blacklist patterns: {}", config.scope.blacklist.len());

    let issues = lint_config(config);
    if issues.is_empty() {
        println!("\n✓ No suspicious blacklist patterns");
    } else {
        println!("\nSuspicious blacklist patterns ({}):", issues.len());
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<RunOutcome> {
    let output_path = PathBuf::from(&config.output.path);
    let sink: Arc<dyn ArticleSink> = Arc::new(
        JsonLinesSink::open(&output_path)
            .with_context(|| format!("Failed to open output {}", output_path.display()))?,
    );

    let coordinator = Coordinator::new(config, sink)?;

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });

    let report = coordinator.run().await?;
    tracing::info!("Articles written to {}", output_path.display());

    println!();
    print_statistics(&report.statistics);

    Ok(report.outcome)
}
