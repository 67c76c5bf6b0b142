mod cli;
mod config;
mod models;
mod scrapers;
mod store;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use reqwest::Client;
use scrapers::{PaginationParams, StopReason};
use std::time::Duration;
use store::{CodeStore, ListingStore, MarkOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Codes => update_codes(&config).await,
        Commands::MarkUsed { codes } => mark_used(&config, &codes),
        Commands::ListCodes => list_codes(&config),
        Commands::Listings => scrape_listings(&config).await,
    }
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

async fn update_codes(config: &Config) -> Result<()> {
    let (mut store, _) = CodeStore::load(&config.codes_path);
    let client = http_client()?;

    let sources = scrapers::default_sources(config);
    let scraped = scrapers::collect_codes(&sources, &client).await?;
    info!("Scraped {} distinct codes", scraped.len());

    let added = store.update(scraped)?;
    if added.is_empty() {
        println!("No new codes found.");
    } else {
        println!("New codes found and updated: {}", added.join(", "));
    }

    println!("Current new codes: {}", store.codes().new.join(", "));
    Ok(())
}

fn mark_used(config: &Config, codes: &[String]) -> Result<()> {
    let (mut store, _) = CodeStore::load(&config.codes_path);

    for code in codes {
        match store.mark_used(code)? {
            MarkOutcome::Marked => println!("Code '{}' marked as used.", code),
            MarkOutcome::NotFound => println!("Code '{}' not found in new codes.", code),
        }
    }
    Ok(())
}

fn list_codes(config: &Config) -> Result<()> {
    let (store, _) = CodeStore::load(&config.codes_path);
    let codes = store.codes();

    println!("New ({}): {}", codes.new.len(), codes.new.join(", "));
    println!("Used ({}): {}", codes.used.len(), codes.used.join(", "));
    Ok(())
}

async fn scrape_listings(config: &Config) -> Result<()> {
    let today = Local::now().date_naive();
    let fetcher = scrapers::HttpPageFetcher::new(http_client()?, config.listings_url.clone());
    let params = PaginationParams {
        page_delay: config.page_delay,
        max_pages: config.max_pages,
    };

    let crawl = scrapers::crawl_listings(&fetcher, &params, today).await?;
    if let StopReason::HttpStatus { page, status } = &crawl.stop {
        warn!("Stopped at page {} on HTTP {}; results may be incomplete", page, status);
    }

    if crawl.properties.is_empty() {
        println!("No properties scraped.");
        return Ok(());
    }

    println!(
        "Scraped {} properties from {} pages:",
        crawl.properties.len(),
        crawl.pages_scraped
    );
    for (i, property) in crawl.properties.iter().enumerate() {
        println!(
            "{}. {} | {} | {} | {}",
            i + 1,
            property.property_id.as_deref().unwrap_or("(no id)"),
            property.title,
            property.price,
            property.location
        );
    }

    let store = ListingStore::new(&config.listings_path, &config.changes_path);
    let outcome = store.persist(crawl.properties, today)?;

    println!(
        "Data saved to {} ({} new, {} updated)",
        store.data_path().display(),
        outcome.inserted,
        outcome.updated
    );
    Ok(())
}
