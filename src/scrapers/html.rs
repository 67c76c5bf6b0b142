use scraper::{ElementRef, Selector};

/// Parse a selector literal. Only called with constants, so a failure is a typo in this crate.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Whitespace-trimmed text of an element, `None` when empty
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// First element matching `selector` that follows `start` in document order,
/// including the descendants of `start` itself
pub fn find_next<'a>(start: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    let root = start.ancestors().last().unwrap_or(*start);
    root.descendants()
        .skip_while(|node| node.id() != start.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| selector.matches(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_element_text_trims() {
        let document = Html::parse_fragment("<p>  hello <b>world</b>\n</p><p>   </p>");
        let p = selector("p");
        let mut paragraphs = document.select(&p);
        assert_eq!(element_text(paragraphs.next().unwrap()).as_deref(), Some("hello world"));
        assert_eq!(element_text(paragraphs.next().unwrap()), None);
    }

    #[test]
    fn test_find_next_skips_earlier_matches() {
        let document = Html::parse_document(
            r#"<div><span id="a">1</span></div><h1 id="start">x</h1><div><span id="b">2</span></div>"#,
        );
        let start = document.select(&selector("h1")).next().unwrap();
        let found = find_next(start, &selector("span")).unwrap();
        assert_eq!(found.value().attr("id"), Some("b"));
    }
}
