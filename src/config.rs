use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for both pipelines
#[derive(Debug, Clone)]
pub struct Config {
    pub codes_path: PathBuf,
    pub listings_path: PathBuf,
    pub changes_path: PathBuf,
    pub escapist_url: String,
    pub thegamer_url: String,
    pub listings_url: String,
    /// Pause after every productive listing page
    pub page_delay: Duration,
    /// Hard stop for sites that never return an empty page
    pub max_pages: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codes_path: PathBuf::from("codes.json"),
            listings_path: PathBuf::from("property_data.csv"),
            changes_path: PathBuf::from("property_data_changes.csv"),
            escapist_url: "https://www.escapistmagazine.com/solo-leveling-arise-codes/".to_string(),
            thegamer_url: "https://www.thegamer.com/solo-leveling-arise-codes-updated-daily/"
                .to_string(),
            listings_url: "https://www.property.co.zw/property-for-sale".to_string(),
            page_delay: Duration::from_secs(1),
            max_pages: 500,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        let defaults = Self::default();

        Ok(Self {
            codes_path: env::var("SCOUT_CODES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.codes_path),
            listings_path: env::var("SCOUT_LISTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.listings_path),
            changes_path: env::var("SCOUT_CHANGES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.changes_path),
            escapist_url: env::var("SCOUT_ESCAPIST_URL").unwrap_or(defaults.escapist_url),
            thegamer_url: env::var("SCOUT_THEGAMER_URL").unwrap_or(defaults.thegamer_url),
            listings_url: env::var("SCOUT_LISTINGS_URL").unwrap_or(defaults.listings_url),
            page_delay: match env::var("SCOUT_PAGE_DELAY_MS") {
                Ok(ms) => Duration::from_millis(
                    ms.parse()
                        .context("SCOUT_PAGE_DELAY_MS must be a number of milliseconds")?,
                ),
                Err(_) => defaults.page_delay,
            },
            max_pages: match env::var("SCOUT_MAX_PAGES") {
                Ok(n) => n.parse().context("SCOUT_MAX_PAGES must be a valid number")?,
                Err(_) => defaults.max_pages,
            },
        })
    }
}
