//! The chat bot: command processing, inline keyboards and the update
//! poll loop.

pub mod commands;
pub mod keyboard;
pub mod poller;

pub use commands::CommandProcessor;
pub use poller::{reset_cursor_on_token_rotation, UpdatePoller};
