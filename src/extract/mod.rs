//! HTML extraction: list pages to candidate links, detail pages to
//! title/date/body, plus the date and text helpers both rely on.

pub mod date;
pub mod detail;
pub mod list;
pub mod text;

pub use date::normalize_date;
pub use detail::{extract_detail, Detail};
pub use list::{extract_list_links, filter_links};
pub use text::{clean_text, dedupe_adjacent_lines, preview, strip_title_and_date_lines};
