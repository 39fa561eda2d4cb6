//! Page fetching: plain HTTP first, headless Chrome when the static
//! document is a JavaScript shell.

pub mod chrome;
pub mod http;

pub use chrome::RenderFetcher;
pub use http::HttpFetcher;

use scraper::{Html, Selector};

/// More scripts than this on an otherwise empty page means the content
/// is rendered client-side.
const SCRIPT_THRESHOLD: usize = 8;
/// Minimum visible text for a page to count as server-rendered.
const TEXT_THRESHOLD: usize = 200;

/// Decide whether a statically fetched document needs the browser:
/// script-heavy and nearly no visible text.
pub fn needs_rendering(html: &str) -> bool {
    let doc = Html::parse_document(html);

    let script_sel = Selector::parse("script").unwrap();
    let style_sel = Selector::parse("style").unwrap();

    let scripts = doc.select(&script_sel).count();
    if scripts <= SCRIPT_THRESHOLD {
        return false;
    }

    let total: usize = doc.root_element().text().map(str::len).sum();
    let hidden: usize = doc
        .select(&script_sel)
        .chain(doc.select(&style_sel))
        .flat_map(|n| n.text())
        .map(str::len)
        .sum();
    let visible = total.saturating_sub(hidden);

    visible < TEXT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_page_does_not_need_rendering() {
        let html = "<html><body><p>Plenty of regular server rendered content.</p></body></html>";
        assert!(!needs_rendering(html));
    }

    #[test]
    fn test_script_shell_needs_rendering() {
        let scripts: String = (0..10)
            .map(|i| format!("<script>var bundle{} = load();</script>", i))
            .collect();
        let html = format!("<html><body><div id=\"app\"></div>{}</body></html>", scripts);
        assert!(needs_rendering(&html));
    }

    #[test]
    fn test_script_heavy_but_texty_page_stays_static() {
        let scripts: String = (0..10).map(|_| "<script>x()</script>".to_string()).collect();
        let text = "Visible announcement text. ".repeat(20);
        let html = format!("<html><body><p>{}</p>{}</body></html>", text, scripts);
        assert!(!needs_rendering(&html));
    }

    #[test]
    fn test_script_text_not_counted_as_visible() {
        // A page whose only "text" is inline script source is still a shell.
        let scripts: String = (0..10)
            .map(|_| format!("<script>{}</script>", "var filler = 1; ".repeat(50)))
            .collect();
        let html = format!("<html><body>{}</body></html>", scripts);
        assert!(needs_rendering(&html));
    }
}
