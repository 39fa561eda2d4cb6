use serde::Deserialize;

/// A watched announcement page, as configured in the sites file.
///
/// The URL is the site's identity everywhere: in subscriptions, in the
/// dedup ledger and in keyboard callbacks.
#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    pub url: String,
    pub name: String,

    /// CSS selector for the container holding the announcement list.
    /// Empty means the whole document.
    #[serde(default)]
    pub list_selector: String,

    /// CSS selector for item links inside the container.
    #[serde(default = "default_item_link_selector")]
    pub item_link_selector: String,

    /// Keep only items whose URL matches (case-insensitive).
    #[serde(default)]
    pub include_url_regex: Option<String>,

    /// Drop items whose title or URL matches (case-insensitive).
    #[serde(default)]
    pub exclude_text_regex: Option<String>,

    /// Explicit content selector for detail pages. When absent the
    /// extractor falls back to its content-node heuristic.
    #[serde(default)]
    pub detail_selector: Option<String>,
}

fn default_item_link_selector() -> String {
    "a".to_string()
}

impl Default for Site {
    fn default() -> Self {
        Self {
            url: String::new(),
            name: String::new(),
            list_selector: String::new(),
            item_link_selector: default_item_link_selector(),
            include_url_regex: None,
            exclude_text_regex: None,
            detail_selector: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_site_deserializes_with_defaults() {
        let site: Site = toml::from_str(
            r#"
url = "https://example.com/news"
name = "Example"
"#,
        )
        .unwrap();

        assert_eq!(site.url, "https://example.com/news");
        assert_eq!(site.list_selector, "");
        assert_eq!(site.item_link_selector, "a");
        assert!(site.include_url_regex.is_none());
        assert!(site.detail_selector.is_none());
    }
}
