// ABOUTME: Structured-document query helpers over scraper: select, attribute read and text extraction.
// ABOUTME: Every helper tolerates absence, returning None or an empty list instead of failing.

//! Structured-document query helpers.
//!
//! All helpers take an [`ElementRef`] scope so the same call works on a whole
//! document (`doc.root_element()`) or on a sub-tree. Key behaviors:
//! - An invalid selector is treated as no match.
//! - Texts are trimmed; empty strings are treated as no match where the
//!   helper returns an `Option`.

use scraper::{ElementRef, Node, Selector};

/// Parse a selector, treating an invalid one as matching nothing.
fn selector(sel: &str) -> Option<Selector> {
    Selector::parse(sel).ok()
}

/// Concatenated descendant text of an element, untrimmed.
pub fn raw_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Concatenated descendant text of an element, trimmed.
pub fn text_of(el: ElementRef<'_>) -> String {
    raw_text(el).trim().to_string()
}

/// First element matching `sel` within `scope`.
pub fn select_first<'a>(scope: ElementRef<'a>, sel: &str) -> Option<ElementRef<'a>> {
    let sel = selector(sel)?;
    scope.select(&sel).next()
}

/// All elements matching `sel` within `scope`, in document order.
pub fn select_all<'a>(scope: ElementRef<'a>, sel: &str) -> Vec<ElementRef<'a>> {
    let Some(sel) = selector(sel) else {
        return Vec::new();
    };
    scope.select(&sel).collect()
}

/// Concatenated text of every element matching `sel`, trimmed.
///
/// Mirrors how jQuery-style `.text()` joins a multi-element selection.
pub fn select_text(scope: ElementRef<'_>, sel: &str) -> String {
    select_all(scope, sel)
        .into_iter()
        .map(raw_text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Trimmed text of each element matching `sel`, empty ones dropped.
pub fn select_texts(scope: ElementRef<'_>, sel: &str) -> Vec<String> {
    select_all(scope, sel)
        .into_iter()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extracts an attribute value from the first matching element with a non-empty value.
pub fn extract_attr_first(scope: ElementRef<'_>, sel: &str, attr: &str) -> Option<String> {
    select_all(scope, sel).into_iter().find_map(|el| {
        let value = el.value().attr(attr)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Non-empty attribute values of every matching element.
pub fn select_attrs(scope: ElementRef<'_>, sel: &str, attr: &str) -> Vec<String> {
    select_all(scope, sel)
        .into_iter()
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Elements matching `sel` whose text contains `needle`.
///
/// Stands in for the non-standard `:contains()` pseudo-class.
pub fn select_containing<'a>(
    scope: ElementRef<'a>,
    sel: &str,
    needle: &str,
) -> Vec<ElementRef<'a>> {
    select_all(scope, sel)
        .into_iter()
        .filter(|el| raw_text(*el).contains(needle))
        .collect()
}

/// Trimmed text node directly following `el`, as in `<span>Label:</span> value<br>`.
pub fn next_text_sibling(el: ElementRef<'_>) -> Option<String> {
    let sibling = el.next_sibling()?;
    match sibling.value() {
        Node::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Next sibling that is an element, skipping text and comments.
pub fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Parse the JSON-LD block selected by `sel`, tolerating raw newlines in strings.
pub fn ld_json(scope: ElementRef<'_>, sel: &str) -> Option<serde_json::Value> {
    let script = select_first(scope, sel)?;
    let raw = raw_text(script).replace(['\n', '\r'], "");
    serde_json::from_str(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <script type="application/ld+json">
            {"name": "Line
            Break", "image": "https://img.example/p.jpg"}
            </script>
        </head>
        <body>
            <div id="info">
                <span class="pl">又名:</span> 别名一 / 别名二<br>
                <span class="pl">语言:</span> 英语<br>
            </div>
            <ul><li class="tag"> a </li><li class="tag"></li><li class="tag">b</li></ul>
            <img class="shot" src=" /one.jpg "><img class="shot"><img class="shot" src="/two.jpg">
            <h4>分级</h4>
            <div class="rating"><img src="/pegi.png"></div>
        </body>
        </html>
    "#;

    fn parse_html() -> Html {
        Html::parse_document(SAMPLE_HTML)
    }

    #[test]
    fn test_select_texts_drops_empty() {
        let doc = parse_html();
        assert_eq!(select_texts(doc.root_element(), "li.tag"), vec!["a", "b"]);
    }

    #[test]
    fn test_select_text_joins() {
        let doc = parse_html();
        assert_eq!(select_text(doc.root_element(), "li.tag"), "a b");
    }

    #[test]
    fn test_select_attrs() {
        let doc = parse_html();
        assert_eq!(
            select_attrs(doc.root_element(), "img.shot", "src"),
            vec!["/one.jpg", "/two.jpg"]
        );
        assert_eq!(
            extract_attr_first(doc.root_element(), "img.shot", "src"),
            Some("/one.jpg".to_string())
        );
        assert_eq!(extract_attr_first(doc.root_element(), "video", "src"), None);
    }

    #[test]
    fn test_next_text_sibling_of_label() {
        let doc = parse_html();
        let label = select_containing(doc.root_element(), "#info span.pl", "又名")
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(next_text_sibling(label), Some("别名一 / 别名二".to_string()));
        assert!(select_containing(doc.root_element(), "#info span.pl", "集数").is_empty());
    }

    #[test]
    fn test_next_element_sibling() {
        let doc = parse_html();
        let h4 = select_containing(doc.root_element(), "h4", "分级")
            .into_iter()
            .next()
            .unwrap();
        let div = next_element_sibling(h4).unwrap();
        assert_eq!(div.value().attr("class"), Some("rating"));
    }

    #[test]
    fn test_ld_json_with_newlines() {
        let doc = parse_html();
        let json = ld_json(doc.root_element(), "script[type=\"application/ld+json\"]").unwrap();
        assert_eq!(json["image"], "https://img.example/p.jpg");
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = parse_html();
        assert!(select_all(doc.root_element(), "::bad").is_empty());
        assert_eq!(select_text(doc.root_element(), "::bad"), "");
    }
}
