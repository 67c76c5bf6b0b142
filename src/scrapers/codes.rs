use crate::config::Config;
use crate::scrapers::escapist::EscapistSource;
use crate::scrapers::thegamer::TheGamerSource;
use crate::scrapers::traits::CodeSource;
use anyhow::Result;
use reqwest::Client;
use std::collections::BTreeSet;
use tracing::info;

/// The sites codes are currently collected from
pub fn default_sources(config: &Config) -> Vec<Box<dyn CodeSource>> {
    vec![
        Box::new(EscapistSource::new(config.escapist_url.clone())),
        Box::new(TheGamerSource::new(config.thegamer_url.clone())),
    ]
}

/// Scrape every source in turn and union the results
pub async fn collect_codes(sources: &[Box<dyn CodeSource>], client: &Client) -> Result<BTreeSet<String>> {
    let mut codes = BTreeSet::new();

    for source in sources {
        let found = source.scrape(client).await?;
        info!("{} listed {} codes", source.source_name(), found.len());
        codes.extend(found);
    }

    Ok(codes)
}
