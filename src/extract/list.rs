//! List-page extraction: anchors under a configured container become
//! candidate items.

use std::collections::HashSet;

use regex::RegexBuilder;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::{Result, SitewatchError};
use crate::domain::ListItem;

/// Anchor text shorter than this is navigation chrome, not a title.
const MIN_TITLE_CHARS: usize = 5;

pub(crate) fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| SitewatchError::Selector(format!("{}: {}", raw, e)))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn absolute_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Collect anchors under the list container into items. Relative hrefs
/// are resolved against `base_url`; anchors with trivial text are
/// skipped; duplicate URLs keep only their first occurrence.
pub fn extract_list_links(
    html: &str,
    list_selector: &str,
    item_link_selector: &str,
    base_url: &str,
) -> Result<Vec<ListItem>> {
    let doc = Html::parse_document(html);
    let base = Url::parse(base_url)?;
    let link_sel = parse_selector(item_link_selector)?;

    let container = if list_selector.trim().is_empty() {
        Some(doc.root_element())
    } else {
        let sel = parse_selector(list_selector)?;
        doc.select(&sel).next()
    };
    let Some(container) = container else {
        return Ok(Vec::new());
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut items = Vec::new();
    for anchor in container.select(&link_sel) {
        let title = element_text(anchor);
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = absolute_url(&base, href) else {
            continue;
        };
        if seen.insert(url.clone()) {
            items.push(ListItem { title, url });
        }
    }
    Ok(items)
}

/// Apply the site's regex filters: keep items whose URL matches the
/// include pattern (when set), drop items whose title or URL matches
/// the exclude pattern (when set). Both are case-insensitive.
pub fn filter_links(
    items: Vec<ListItem>,
    include_url_regex: Option<&str>,
    exclude_text_regex: Option<&str>,
) -> Result<Vec<ListItem>> {
    let build = |pattern: &str| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SitewatchError::Config(format!("bad filter regex {:?}: {}", pattern, e)))
    };
    let include = include_url_regex.map(build).transpose()?;
    let exclude = exclude_text_regex.map(build).transpose()?;

    let mut out = Vec::new();
    for item in items {
        if let Some(ref inc) = include {
            if !inc.is_match(&item.url) {
                continue;
            }
        }
        if let Some(ref exc) = exclude {
            if exc.is_match(&item.title) || exc.is_match(&item.url) {
                continue;
            }
        }
        out.push(item);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/news/";

    #[test]
    fn test_dedup_and_short_text_exclusion() {
        let html = r#"
            <ul>
              <li><a href="/post/1">First announcement</a></li>
              <li><a href="/post/1">First announcement again</a></li>
              <li><a href="/post/2">abc</a></li>
            </ul>
        "#;
        let items = extract_list_links(html, "", "a", BASE).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://example.com/post/1");
        assert_eq!(items[0].title, "First announcement");
    }

    #[test]
    fn test_relative_and_absolute_hrefs() {
        let html = r#"
            <div class="list">
              <a href="detail?id=7">Relative announcement</a>
              <a href="https://other.example.org/x">Absolute announcement</a>
            </div>
        "#;
        let items = extract_list_links(html, ".list", "a", BASE).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://example.com/news/detail?id=7");
        assert_eq!(items[1].url, "https://other.example.org/x");
    }

    #[test]
    fn test_missing_container_yields_empty() {
        let html = "<p><a href='/x'>Some announcement</a></p>";
        let items = extract_list_links(html, ".does-not-exist", "a", BASE).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_anchor_without_href_skipped() {
        let html = "<a>Looks like a link</a><a href='/p'>Real announcement</a>";
        let items = extract_list_links(html, "", "a", BASE).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_first_occurrence_order_preserved() {
        let html = r#"
            <a href="/b">Second announcement</a>
            <a href="/a">First by URL but later</a>
            <a href="/b">Second duplicate</a>
        "#;
        let items = extract_list_links(html, "", "a", BASE).unwrap();
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://example.com/b", "https://example.com/a"]);
    }

    fn item(title: &str, url: &str) -> ListItem {
        ListItem {
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_filter_include_url() {
        let items = vec![
            item("Tender call", "https://example.com/tenders/1"),
            item("Blog post", "https://example.com/blog/1"),
        ];
        let out = filter_links(items, Some("/tenders/"), None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Tender call");
    }

    #[test]
    fn test_filter_exclude_matches_title_or_url() {
        let items = vec![
            item("Archived notice", "https://example.com/p/1"),
            item("Fresh notice", "https://example.com/archive/2"),
            item("Fresh notice", "https://example.com/p/3"),
        ];
        let out = filter_links(items, None, Some("archive")).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://example.com/p/3");
    }

    #[test]
    fn test_filter_case_insensitive() {
        let items = vec![item("SOME Notice", "https://example.com/p/1")];
        assert!(filter_links(items, None, Some("some"))
            .unwrap()
            .is_empty());
    }
}
