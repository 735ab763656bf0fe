//! Syntax Highlighting
//!
//! Regex-driven highlighting for the page editor preview. Keyword sets
//! live in a registry so they can be extended from configuration.

pub mod engine;
pub mod keywords;

pub use engine::{escape_html, highlight, Highlighter, TokenKind};
pub use keywords::{KeywordFile, KeywordRegistry, KeywordSetDef};
