use crate::scrapers::html::{element_text, find_next, selector};
use crate::scrapers::traits::CodeSource;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static HEADING: LazyLock<Selector> =
    LazyLock::new(|| selector("h3#h-solo-leveling-arise-codes-working"));
static CODE_LIST: LazyLock<Selector> = LazyLock::new(|| selector(r#"ul[data-found-items="10"]"#));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| selector("strong"));

/// Escapist Magazine code list: the bullet list following the "working codes" heading
pub struct EscapistSource {
    url: String,
}

impl EscapistSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl CodeSource for EscapistSource {
    fn source_name(&self) -> &'static str {
        "Escapist Magazine"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn extract_codes(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Some(heading) = document.select(&HEADING).next() else {
            debug!("Working codes heading not found");
            return Vec::new();
        };
        let Some(list) = find_next(heading, &CODE_LIST) else {
            debug!("No code list after the working codes heading");
            return Vec::new();
        };

        list.select(&LIST_ITEM)
            .filter_map(|li| li.select(&STRONG).next())
            .filter_map(element_text)
            .collect()
    }
}
