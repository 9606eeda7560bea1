mod config;
mod crawler;
mod http;
mod json;
mod output;
mod query;
mod record;
mod registry;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use url::Url;

use config::{CrawlConfig, PropertyPreset};
use record::CrawlOutcome;
use registry::PageType;

#[derive(Parser)]
#[command(
    name = "bnb_scraper",
    about = "Listing crawler over a site's private persisted-query APIs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a search URL page by page and write JSON + CSV outputs
    Crawl {
        /// Search URL to start from (alternative to --preset)
        #[arg(long, conflicts_with = "preset")]
        url: Option<String>,
        /// Preset JSON file with url, label, and filter query
        #[arg(long)]
        preset: Option<PathBuf>,
        /// Max pages to fetch (default: until pagination exhausts)
        #[arg(short = 'n', long)]
        page_limit: Option<u32>,
        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
    /// Crawl one room page and print the record as JSON
    Detail {
        url: String,
        /// Also fetch live pricing via the checkout API
        #[arg(long)]
        with_price: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let http = http::HttpClient::new()?;

    match cli.command {
        Commands::Crawl {
            url,
            preset,
            page_limit,
            output,
        } => {
            let (url, label) = resolve_target(url, preset)?;
            let site = host_of(&url)?;
            let crawler = registry::lookup(&site, PageType::Search, http)?;

            let config = CrawlConfig {
                url: url.clone(),
                page_limit,
                with_price: false,
            };
            let crawl_start = Utc::now();
            let records = crawler.execute(&config).await;
            let crawl_finish = Utc::now();

            let outcome = CrawlOutcome {
                url,
                crawl_start,
                crawl_finish,
                records,
            };
            let (json_path, csv_path) = output::write_outputs(&output, &label, &outcome)?;
            println!(
                "Crawled {} listings.\n  {}\n  {}",
                outcome.records.len(),
                json_path.display(),
                csv_path.display()
            );
        }
        Commands::Detail { url, with_price } => {
            let site = host_of(&url)?;
            let crawler = registry::lookup(&site, PageType::Detail, http)?;
            let config = CrawlConfig {
                url,
                page_limit: None,
                with_price,
            };
            let records = crawler.execute(&config).await;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

/// Crawl target from either a bare URL or a preset file; preset filters are
/// merged into the URL's query.
fn resolve_target(url: Option<String>, preset: Option<PathBuf>) -> Result<(String, String)> {
    match (url, preset) {
        (Some(url), None) => Ok((url, String::new())),
        (None, Some(path)) => {
            let preset: PropertyPreset = config::load_preset(&path)?;
            let url = if preset.query.is_empty() {
                preset.url
            } else {
                query::generate_query_url(&preset.url, &preset.query)
            };
            info!("Preset '{}' resolved to {}", preset.label, url);
            Ok((url, preset.label))
        }
        _ => Err(anyhow!("Pass exactly one of --url or --preset")),
    }
}

fn host_of(url: &str) -> Result<String> {
    Url::parse(url)?
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("URL has no host: {}", url))
}
