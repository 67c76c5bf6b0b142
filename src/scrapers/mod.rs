pub mod codes;
pub mod escapist;
pub mod html;
pub mod listings;
pub mod thegamer;
pub mod traits;
pub mod types;

pub use codes::{collect_codes, default_sources};
pub use listings::{crawl_listings, HttpPageFetcher};
pub use types::{PaginationParams, StopReason};
