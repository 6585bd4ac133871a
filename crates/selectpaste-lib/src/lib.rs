//! SelectPaste — paste picked text into any window from a global shortcut.

pub mod clipboard;
pub mod config;
pub mod context;
pub mod error;
pub mod hotkey;
pub mod inject;
pub mod input;
pub mod instance;
pub mod picker;
pub mod retry;

pub use error::SelectPasteError;
