//! Sumi-Harvest main entry point
//!
//! Crawls the configured seeds, following links that stay on the same host,
//! and prints the title of every page that survives the configured pipeline.

use clap::Parser;
use futures::{stream, StreamExt};
use std::path::PathBuf;
use std::rc::Rc;
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::crawler::{Callback, Emit, SpiderBuilder};
use sumi_harvest::http::{Request, Response};
use sumi_harvest::pipeline::StageRegistry;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a crawl-and-extract engine
///
/// Sumi-Harvest fetches pages in waves, extracts page titles and runs them
/// through the stages named in the configuration.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A wave-based crawl-and-extract engine", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Items go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    let registry = StageRegistry::<String>::with_builtins();

    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Track URLs: {}", config.crawler.track_urls);
    match config.crawler.max_wave_size {
        Some(size) => println!("  Max wave size: {}", size),
        None => println!("  Max wave size: unbounded"),
    }
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nPipeline ({} stages):", config.crawler.pipeline.len());
    for key in &config.crawler.pipeline {
        let marker = if registry.contains(key) { "✓" } else { "✗ unknown" };
        println!("  - {} {}", key, marker);
    }
    println!("Available stages: {}", registry.keys().join(", "));

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  * {}", seed);
    }

    if !config.context.is_empty() {
        println!("\nContext values:");
        for (key, value) in &config.context {
            println!("  {} = {}", key, value);
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.crawler.seeds.is_empty() {
        tracing::error!("No seeds configured, nothing to crawl");
        return Err("no seeds configured in [crawler] seeds".into());
    }

    let spider = SpiderBuilder::<String>::from_config(config)
        .registry(StageRegistry::with_builtins())
        .parse(harvest_titles())
        .build()?;

    tracing::info!("Total seed URLs: {}", config.crawler.seeds.len());

    let items = spider.crawl_urls(&config.crawler.seeds)?;
    futures::pin_mut!(items);
    while let Some(item) = items.next().await {
        match item {
            Ok(title) => println!("{}", title),
            Err(e) => {
                tracing::error!("Crawl failed: {}", e);
                return Err(e.into());
            }
        }
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}

/// Emits the page title and a request for every same-host link
fn harvest_titles() -> Callback<String> {
    Callback::stream(|response: Rc<Response>| {
        let mut emitted: Vec<anyhow::Result<Emit<String>>> = Vec::new();
        if let Some(title) = response.title() {
            emitted.push(Ok(Emit::Item(title)));
        }

        let host = response.url().host_str();
        for link in response.links() {
            if link.host_str() == host {
                emitted.push(Ok(Emit::Request(Request::new(link))));
            }
        }
        stream::iter(emitted)
    })
}
