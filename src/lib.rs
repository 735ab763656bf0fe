//! WebPages Editor
//!
//! Editing core for a small static-site area of pages and assets.
//!
//! This library provides:
//! - Regex syntax highlighting with placeholder-protected passes
//! - An editing session with debounced autosave and surface sync
//! - Filesystem storage for pages and assets
//! - Configuration management

pub mod cli;
pub mod config;
pub mod document;
pub mod highlight;
pub mod notify;
pub mod session;
pub mod storage;

// Re-exports for clean public API
pub use config::Config;
pub use document::{Document, Language};
pub use highlight::{highlight, Highlighter, KeywordRegistry};
pub use notify::{NoticeKind, Notifier};
pub use session::{DocumentStatus, SaveOutcome, Session, SessionError};
pub use storage::{FileInfo, FsStorage, Storage, StorageError};
