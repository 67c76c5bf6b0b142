use crate::scrapers::html::{element_text, selector};
use crate::scrapers::traits::CodeSource;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("div.table-container table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tbody tr"));
static CODE_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td p strong"));

/// TheGamer code table: one code per body row
pub struct TheGamerSource {
    url: String,
}

impl TheGamerSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl CodeSource for TheGamerSource {
    fn source_name(&self) -> &'static str {
        "TheGamer"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn extract_codes(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Some(table) = document.select(&TABLE).next() else {
            debug!("Code table not found");
            return Vec::new();
        };

        table
            .select(&ROW)
            .filter_map(|row| row.select(&CODE_CELL).next())
            .filter_map(element_text)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TheGamerSource {
        TheGamerSource::new("https://example.com/codes")
    }

    #[test]
    fn test_extracts_one_code_per_row() {
        let html = r#"
            <div class="table-container">
                <table>
                    <thead><tr><th><p><strong>Code</strong></p></th></tr></thead>
                    <tbody>
                        <tr><td><p><strong>SOLODEVNOTE</strong></p></td><td><p>Reward</p></td></tr>
                        <tr><td><p>expired</p></td></tr>
                        <tr><td><p><strong>SHARPSTREAM</strong></p></td></tr>
                    </tbody>
                </table>
            </div>
        "#;
        assert_eq!(source().extract_codes(html), vec!["SOLODEVNOTE", "SHARPSTREAM"]);
    }

    #[test]
    fn test_table_outside_container_ignored() {
        let html = r#"
            <table><tbody><tr><td><p><strong>LOOSE</strong></p></td></tr></tbody></table>
        "#;
        assert!(source().extract_codes(html).is_empty());
    }

    #[test]
    fn test_only_first_table_used() {
        let html = r#"
            <div class="table-container"><table><tr><td><p><strong>FIRST</strong></p></td></tr></table></div>
            <div class="table-container"><table><tr><td><p><strong>SECOND</strong></p></td></tr></table></div>
        "#;
        assert_eq!(source().extract_codes(html), vec!["FIRST"]);
    }
}
