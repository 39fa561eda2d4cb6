//! Detail-page extraction: find the main content block of an
//! announcement page and pull a title, a date and a bounded body out
//! of it.

use scraper::{ElementRef, Html};

use crate::app::Result;
use crate::extract::date::normalize_date;
use crate::extract::list::parse_selector;
use crate::extract::text::clean_text;

/// Candidate containers tried when the site has no explicit
/// `detail_selector`. The one with the most text wins.
const CONTENT_CANDIDATES: &str =
    "article, main, .content, .post, .entry, #content, .post-content, .entry-content";

const TITLE_CANDIDATES: &str = "h1, h2, h3";
const DATE_CANDIDATES: &str = ".date, time, .post-date";

/// What a detail page yields. All fields are best-effort except the
/// body, which falls back to the whole document text.
#[derive(Debug, Clone, Default)]
pub struct Detail {
    pub title: Option<String>,
    pub body: String,
    pub date: Option<String>,
}

fn node_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join("\n")
}

fn first_text(el: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    el.select(selector)
        .map(|n| n.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .find(|t| !t.is_empty())
}

/// Extract title, date and body from a detail page. With an explicit
/// selector the first matching node is the content block; otherwise the
/// candidate list is tried and the node with the most text is used,
/// falling back to the document root.
pub fn extract_detail(html: &str, detail_selector: Option<&str>, body_limit: usize) -> Result<Detail> {
    let doc = Html::parse_document(html);

    let node = match detail_selector {
        Some(raw) if !raw.trim().is_empty() => {
            let sel = parse_selector(raw)?;
            doc.select(&sel).next()
        }
        _ => {
            let sel = parse_selector(CONTENT_CANDIDATES)?;
            doc.select(&sel).max_by_key(|n| node_text(*n).trim().len())
        }
    };
    let node = node.unwrap_or_else(|| doc.root_element());

    let title_sel = parse_selector(TITLE_CANDIDATES)?;
    let title = first_text(node, &title_sel);

    let date_sel = parse_selector(DATE_CANDIDATES)?;
    let date = match first_text(node, &date_sel) {
        // A marked-up date element wins even when it does not parse.
        Some(raw) => Some(normalize_date(&raw).unwrap_or(raw)),
        None => normalize_date(&node_text(doc.root_element())),
    };

    let body = clean_text(&node_text(node), body_limit);

    Ok(Detail { title, body, date })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_selector_wins() {
        let html = r#"
            <article>Lots and lots of article text here padding padding</article>
            <div class="announcement"><h2>Notice title</h2><p>Short body</p></div>
        "#;
        let d = extract_detail(html, Some(".announcement"), 1000).unwrap();
        assert_eq!(d.title.as_deref(), Some("Notice title"));
        assert!(d.body.contains("Short body"));
        assert!(!d.body.contains("padding"));
    }

    #[test]
    fn test_largest_candidate_chosen() {
        let html = r#"
            <main>tiny</main>
            <article>
              <h1>Big announcement</h1>
              <p>The actual content of the announcement, considerably longer
                 than the other candidate containers on the page.</p>
            </article>
        "#;
        let d = extract_detail(html, None, 1000).unwrap();
        assert_eq!(d.title.as_deref(), Some("Big announcement"));
        assert!(d.body.contains("actual content"));
    }

    #[test]
    fn test_falls_back_to_root_without_candidates() {
        let html = "<p>Plain page body with no semantic containers at all.</p>";
        let d = extract_detail(html, None, 1000).unwrap();
        assert!(d.title.is_none());
        assert!(d.body.contains("Plain page body"));
    }

    #[test]
    fn test_marked_up_date_normalized() {
        let html = r#"
            <article><h1>T</h1><span class="date">5 Mart 2024</span><p>body</p></article>
        "#;
        let d = extract_detail(html, None, 1000).unwrap();
        assert_eq!(d.date.as_deref(), Some("05.03.2024"));
    }

    #[test]
    fn test_unparseable_marked_up_date_kept_raw() {
        let html = r#"<article><time>yesterday</time><p>body text long enough</p></article>"#;
        let d = extract_detail(html, None, 1000).unwrap();
        assert_eq!(d.date.as_deref(), Some("yesterday"));
    }

    #[test]
    fn test_date_scanned_from_document_when_unmarked() {
        let html = r#"
            <article><p>Announced on 15.03.2024 at the town hall.</p></article>
        "#;
        let d = extract_detail(html, None, 1000).unwrap();
        assert_eq!(d.date.as_deref(), Some("15.03.2024"));
    }

    #[test]
    fn test_body_limit_applied() {
        let long = "word ".repeat(500);
        let html = format!("<article><p>{}</p></article>", long);
        let d = extract_detail(&html, None, 50).unwrap();
        assert!(d.body.chars().count() <= 50);
    }
}
