//! Storage
//!
//! The persistence collaborator used by the editing session: text pages
//! plus opaque binary assets.

pub mod fs;

use std::time::SystemTime;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use fs::FsStorage;

/// Listing entry for a stored page or asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Storage-relative path with `/` separators
    pub path: String,
    pub size: u64,
    pub modified: SystemTime,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing file path")]
    MissingPath,
    #[error("invalid file path: {0}")]
    InvalidPath(String),
    #[error("only .html, .css, and .js files are allowed: {0}")]
    UnsupportedExtension(String),
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Remote or local file store for pages and assets
#[async_trait]
pub trait Storage: Send + Sync {
    /// All pages, sorted by path
    async fn list(&self) -> Result<Vec<FileInfo>, StorageError>;
    async fn read(&self, path: &str) -> Result<String, StorageError>;
    async fn write(&self, path: &str, content: &str) -> Result<(), StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    async fn list_assets(&self) -> Result<Vec<FileInfo>, StorageError>;
    async fn upload_asset(&self, name: &str, bytes: &[u8]) -> Result<FileInfo, StorageError>;
    async fn delete_asset(&self, path: &str) -> Result<(), StorageError>;
}
