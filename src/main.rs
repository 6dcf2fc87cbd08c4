//! Mobile-Harvest main entry point
//!
//! This is the command-line interface for the mobile phone listing harvester.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use mobile_harvest::config::{load_config_or_default, load_credentials, validate, Config};
use mobile_harvest::crawler::{seed_urls, Harvester, RunRequest, Source};
use mobile_harvest::menu::{parse_page_count, Menu, MenuAction, DEFAULT_PAGES};
use mobile_harvest::output::print_report;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Mobile-Harvest: mobile phone listings from Dubizzle and MobileMasr
///
/// Without --source an interactive menu is shown. Results are saved as JSON
/// files in the output directory.
#[derive(Parser, Debug)]
#[command(name = "mobile-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Harvests mobile phone listings into one JSON format", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Source to harvest; omit to use the interactive menu
    #[arg(short, long, value_enum)]
    source: Option<SourceArg>,

    /// Search term; omit for the full catalog
    #[arg(long, requires = "source")]
    query: Option<String>,

    /// Maximum listing / index pages (non-numeric values mean 10)
    #[arg(short, long, value_name = "N")]
    pages: Option<String>,

    /// Directory result files are written into
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Validate config and show what would be fetched without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Dubizzle,
    Mobilemasr,
    Both,
}

impl SourceArg {
    fn sources(self) -> Vec<Source> {
        match self {
            SourceArg::Dubizzle => vec![Source::Dubizzle],
            SourceArg::Mobilemasr => vec![Source::MobileMasr],
            SourceArg::Both => Source::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_config_or_default(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
    validate(&config).context("invalid configuration")?;

    let pages = cli
        .pages
        .as_deref()
        .map(parse_page_count)
        .unwrap_or(DEFAULT_PAGES);

    match cli.source {
        Some(source) => {
            let request = match cli.query {
                Some(query) if !query.trim().is_empty() => RunRequest::search(query, pages),
                _ => RunRequest::full_catalog(pages),
            };

            if cli.dry_run {
                handle_dry_run(&config, &source.sources(), &request);
                return Ok(());
            }
            handle_run(&config, &source.sources(), &request).await
        }
        None => {
            if cli.dry_run {
                handle_dry_run(&config, &Source::ALL, &RunRequest::full_catalog(pages));
                return Ok(());
            }
            handle_menu(&config).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mobile_harvest=info,warn"),
            1 => EnvFilter::new("mobile_harvest=debug,info"),
            2 => EnvFilter::new("mobile_harvest=trace,debug"),
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

/// Handles --dry-run: shows the resolved configuration and planned requests
fn handle_dry_run(config: &Config, sources: &[Source], request: &RunRequest) {
    println!("=== Mobile-Harvest Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Engine: {:?}", config.scraper.engine);
    println!("  Max attempts: {}", config.scraper.max_attempts);
    println!("  Retry backoff: {}ms", config.scraper.retry_backoff_ms);
    println!("  Page load timeout: {}s", config.scraper.page_load_timeout_secs);
    println!("  Minimum content length: {}", config.scraper.min_content_length);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    if request.is_search() {
        println!("\nSearch: '{}'", request.query.trim());
    } else {
        println!("\nFull catalog");
    }

    for source in sources {
        match source {
            Source::Dubizzle => {
                let seeds = seed_urls(&config.dubizzle.base_url, request);
                println!(
                    "\nDubizzle ({} listing / {} detail at a time), {} listing pages:",
                    config.dubizzle.listing_concurrency,
                    config.dubizzle.detail_concurrency,
                    seeds.len()
                );
                for seed in &seeds {
                    println!("  * {}", seed);
                }
            }
            Source::MobileMasr => {
                let credentials = if load_credentials().is_some() {
                    "present"
                } else {
                    "MISSING"
                };
                println!(
                    "\nMobileMasr ({} at a time): index '{}', up to {} pages of {} hits, credentials {}",
                    config.mobilemasr.concurrency,
                    config.mobilemasr.index_name,
                    request.max_pages,
                    config.mobilemasr.hits_per_page,
                    credentials
                );
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Runs the given sources once and prints their reports
async fn handle_run(config: &Config, sources: &[Source], request: &RunRequest) -> anyhow::Result<()> {
    let harvester = Harvester::new(config, sources, load_credentials())
        .context("cannot start harvesting")?;

    let reports = harvester.run(request).await;
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

/// Interactive loop
async fn handle_menu(config: &Config) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut menu = Menu::new(stdin.lock(), io::stdout());

    loop {
        match menu.next_action()? {
            MenuAction::Exit => return Ok(()),
            MenuAction::Invalid => {}
            MenuAction::Run { sources, request } => {
                // A failed run is reported and the menu continues
                if let Err(e) = handle_run(config, &sources, &request).await {
                    tracing::error!("{:#}", e);
                }
            }
        }

        if !menu.ask_continue()? {
            return Ok(());
        }
    }
}
