//! Chat UI components

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod typing;

pub use composer::{Composer, ComposerResult};
pub use history::HistoryView;
pub use manager::{ChatSession, SessionAction};
pub use typing::TypingIndicator;
