//! Message rendering for chat and email notifications.

use crate::extract::{dedupe_adjacent_lines, preview, strip_title_and_date_lines};

/// Characters of snippet shown in a chat message.
const CHAT_PREVIEW_CHARS: usize = 280;

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn snippet_preview(snippet: &str, title: &str, date: Option<&str>) -> String {
    let stripped = strip_title_and_date_lines(snippet, title, date);
    let deduped = dedupe_adjacent_lines(&stripped);
    preview(&deduped, CHAT_PREVIEW_CHARS)
}

/// Chat message for a new posting, in Telegram HTML.
pub fn format_chat_message(
    site_name: &str,
    title: &str,
    link: &str,
    snippet: &str,
    date: Option<&str>,
) -> String {
    let mut out = format!("📢 <b>{}</b>\n", escape_html(site_name));
    out.push_str(&format!("<b>{}</b>\n", escape_html(title)));
    if let Some(date) = date {
        out.push_str(&format!("<i>🗓 {}</i>\n", escape_html(date)));
    }
    out.push_str(&format!("<a href=\"{}\">View posting</a>\n", escape_html(link)));

    let body = snippet_preview(snippet, title, date);
    if !body.is_empty() {
        out.push('\n');
        out.push_str(&escape_html(&body));
    }
    out
}

/// Email body for a new posting. A small self-contained HTML document,
/// inline styles only.
pub fn email_html(
    site_name: &str,
    title: &str,
    link: &str,
    snippet: &str,
    date: Option<&str>,
) -> String {
    let date_row = match date {
        Some(date) => format!(
            "<tr><td style=\"padding:4px 0;color:#666;\">🗓 {}</td></tr>",
            escape_html(date)
        ),
        None => String::new(),
    };
    let body = snippet_preview(snippet, title, date);
    let body_row = if body.is_empty() {
        String::new()
    } else {
        format!(
            "<tr><td style=\"padding:12px 0;color:#333;line-height:1.5;\">{}</td></tr>",
            escape_html(&body)
        )
    };

    format!(
        "<html><body style=\"font-family:Arial,sans-serif;background:#f5f5f5;padding:20px;\">\
<table style=\"max-width:600px;margin:0 auto;background:#fff;border-radius:8px;padding:24px;\" \
width=\"100%\" cellpadding=\"0\" cellspacing=\"0\">\
<tr><td style=\"font-size:13px;color:#888;padding-bottom:8px;\">New posting</td></tr>\
<tr><td style=\"font-size:16px;color:#555;padding-bottom:4px;\">{site}</td></tr>\
<tr><td style=\"font-size:20px;font-weight:bold;color:#111;padding:8px 0;\">{title}</td></tr>\
{date_row}{body_row}\
<tr><td style=\"padding-top:16px;\">\
<a href=\"{link}\" style=\"background:#2a6fd6;color:#fff;padding:10px 18px;\
border-radius:4px;text-decoration:none;\">View posting</a></td></tr>\
<tr><td style=\"padding-top:24px;font-size:12px;color:#aaa;\">\
This email was sent automatically.</td></tr>\
</table></body></html>",
        site = escape_html(site_name),
        title = escape_html(title),
        link = escape_html(link),
        date_row = date_row,
        body_row = body_row,
    )
}
