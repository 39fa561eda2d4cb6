//! Inline keyboards for the subscription and email menus.

use std::collections::HashSet;

use crate::domain::Site;
use crate::telegram::{Button, InlineKeyboard};

/// One row per site, marked with the current subscription state, plus
/// navigation rows.
pub fn sites_keyboard(subs: &HashSet<String>, sites: &[Site]) -> InlineKeyboard {
    let mut rows: Vec<Vec<Button>> = sites
        .iter()
        .map(|site| {
            let marker = if subs.contains(&site.url) { "✅" } else { "➕" };
            vec![Button::new(
                format!("{} {}", marker, site.name),
                format!("tog|{}", site.url),
            )]
        })
        .collect();
    rows.push(vec![
        Button::new("📋 My subscriptions", "list"),
        Button::new("📧 Emails", "emails"),
    ]);
    InlineKeyboard {
        inline_keyboard: rows,
    }
}

/// The email management menu: text plus a keyboard with one removal
/// row per registered address.
pub fn emails_keyboard(emails: &[String]) -> (String, InlineKeyboard) {
    let text = if emails.is_empty() {
        "No email addresses registered.\nUse /email add you@example.com".to_string()
    } else {
        let mut text = String::from("Registered email addresses:\n");
        for email in emails {
            text.push_str(&format!("• {}\n", email));
        }
        text
    };

    let mut rows: Vec<Vec<Button>> = emails
        .iter()
        .map(|email| vec![Button::new(format!("❌ {}", email), format!("emailrm|{}", email))])
        .collect();
    rows.push(vec![Button::new("➕ /email add you@example.com", "noop")]);
    rows.push(vec![Button::new("⬅ Back", "back")]);

    (
        text,
        InlineKeyboard {
            inline_keyboard: rows,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, url: &str) -> Site {
        Site {
            url: url.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sites_keyboard_markers() {
        let sites = vec![site("A", "https://a"), site("B", "https://b")];
        let subs: HashSet<String> = ["https://a".to_string()].into_iter().collect();

        let kb = sites_keyboard(&subs, &sites);
        assert_eq!(kb.inline_keyboard.len(), 3);
        assert!(kb.inline_keyboard[0][0].text.starts_with("✅"));
        assert_eq!(kb.inline_keyboard[0][0].callback_data, "tog|https://a");
        assert!(kb.inline_keyboard[1][0].text.starts_with("➕"));
    }

    #[test]
    fn test_emails_keyboard_rows() {
        let (text, kb) = emails_keyboard(&["a@example.com".to_string()]);
        assert!(text.contains("a@example.com"));
        assert_eq!(kb.inline_keyboard[0][0].callback_data, "emailrm|a@example.com");
        assert_eq!(kb.inline_keyboard.last().unwrap()[0].callback_data, "back");
    }

    #[test]
    fn test_emails_keyboard_empty() {
        let (text, kb) = emails_keyboard(&[]);
        assert!(text.contains("No email addresses"));
        assert_eq!(kb.inline_keyboard.len(), 2);
    }
}
