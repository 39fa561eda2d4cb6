pub mod item;
pub mod site;

pub use item::{text_hash, ListItem, SeenItem};
pub use site::Site;
