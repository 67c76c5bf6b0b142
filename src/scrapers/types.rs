use crate::models::Property;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Pagination parameters for the listings crawl
#[derive(Debug, Clone)]
pub struct PaginationParams {
    /// Pause after each page that produced listings
    pub page_delay: Duration,
    /// Fail when the page after this one still has listings
    pub max_pages: u32,
}

/// Raw result of requesting one listing page
#[derive(Debug, Clone)]
pub enum PageResponse {
    /// 2xx response with its body
    Body(String),
    /// Any other status
    Status(StatusCode),
}

/// Why the pagination loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The page rendered no listing cards, the normal end of results
    EmptyPage { page: u32 },
    /// The site answered with a non-success status
    HttpStatus { page: u32, status: StatusCode },
}

/// Everything collected by one crawl
#[derive(Debug, Clone)]
pub struct Crawl {
    pub properties: Vec<Property>,
    /// Pages that contributed listings
    pub pages_scraped: u32,
    pub stop: StopReason,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("listings continued past page {max_pages}")]
    PageLimitExceeded { max_pages: u32 },
}
