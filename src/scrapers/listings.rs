use crate::models::{Property, NOT_AVAILABLE};
use crate::scrapers::html::selector;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::{Crawl, PageResponse, PaginationParams, ScrapeError, StopReason};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static CARD: LazyLock<Selector> =
    LazyLock::new(|| selector("div.result-cards > div.ResultCardItem"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2 a"));
static LOCATION: LazyLock<Selector> = LazyLock::new(|| selector("div.text-graypurpledark"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector("div.result-price a"));
static SIZE: LazyLock<Selector> = LazyLock::new(|| selector("span.land-size"));
static DETAILS: LazyLock<Selector> = LazyLock::new(|| selector("div.ResultDescription"));
static DATE_POSTED: LazyLock<Selector> = LazyLock::new(|| selector("div.result-date"));

/// Fetches listing pages over HTTP by appending `?page=N` to the search URL
pub struct HttpPageFetcher {
    client: Client,
    base_url: String,
}

impl HttpPageFetcher {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<PageResponse> {
        debug!("Fetching {} page {}", self.base_url, page);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("page", page)])
            .send()
            .await
            .with_context(|| format!("Failed to fetch listing page {}", page))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(PageResponse::Status(status));
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;
        Ok(PageResponse::Body(html))
    }
}

/// Parse every listing card on a results page
pub fn parse_listings(html: &str, today: NaiveDate) -> Vec<Property> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .map(|card| parse_card(card, today))
        .collect()
}

/// Each field is looked up on its own; a missing one becomes "N/A"
fn parse_card(card: ElementRef<'_>, today: NaiveDate) -> Property {
    Property {
        property_id: card.value().attr("id").map(str::to_string),
        title: field_text(card, &TITLE),
        location: field_text(card, &LOCATION),
        price: field_text(card, &PRICE),
        size: field_text(card, &SIZE),
        details: field_text(card, &DETAILS),
        date_posted: field_text(card, &DATE_POSTED),
        date_scraped: today,
        date_updated: None,
    }
}

fn field_text(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Walk result pages from 1 until a page has no cards or the site refuses the request.
/// Page `max_pages + 1` is still fetched to confirm the end; listings there are an error.
pub async fn crawl_listings(
    fetcher: &dyn PageFetcher,
    params: &PaginationParams,
    today: NaiveDate,
) -> Result<Crawl> {
    let mut properties = Vec::new();
    let mut page = 1;

    loop {
        info!("Scraping page: {}", page);

        let html = match fetcher.fetch_page(page).await? {
            PageResponse::Body(html) => html,
            PageResponse::Status(status) => {
                warn!("Failed to retrieve page {}. Status code: {}", page, status);
                return Ok(Crawl {
                    properties,
                    pages_scraped: page - 1,
                    stop: StopReason::HttpStatus { page, status },
                });
            }
        };

        let listings = parse_listings(&html, today);
        if listings.is_empty() {
            info!("No more listings found");
            return Ok(Crawl {
                properties,
                pages_scraped: page - 1,
                stop: StopReason::EmptyPage { page },
            });
        }

        if page > params.max_pages {
            return Err(ScrapeError::PageLimitExceeded {
                max_pages: params.max_pages,
            }
            .into());
        }

        debug!("Page {} had {} listings", page, listings.len());
        properties.extend(listings);

        page += 1;
        pause(params.page_delay).await;
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
