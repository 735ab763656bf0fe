//! Filesystem Storage
//!
//! Pages under `<root>/pages`, assets under `<root>/assets`. Paths are
//! always relative to those directories; traversal is rejected.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{FileInfo, Storage, StorageError};

/// Page extensions accepted by the store
pub const PAGE_EXTENSIONS: &[&str] = &["html", "css", "js"];

/// Default upper bound for a page body
pub const MAX_PAGE_BYTES: usize = 1_000_000;

/// Default upper bound for an uploaded asset
pub const MAX_ASSET_BYTES: usize = 5_000_000;

#[derive(Debug, Clone)]
pub struct FsStorage {
    pages_root: PathBuf,
    assets_root: PathBuf,
    max_page_bytes: usize,
    max_asset_bytes: usize,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            pages_root: root.join("pages"),
            assets_root: root.join("assets"),
            max_page_bytes: MAX_PAGE_BYTES,
            max_asset_bytes: MAX_ASSET_BYTES,
        }
    }

    pub fn with_limits(mut self, max_page_bytes: usize, max_asset_bytes: usize) -> Self {
        self.max_page_bytes = max_page_bytes;
        self.max_asset_bytes = max_asset_bytes;
        self
    }

    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    fn page_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let full_path = resolve(&self.pages_root, path)?;

        if !has_page_extension(&full_path) {
            return Err(StorageError::UnsupportedExtension(path.trim().to_string()));
        }

        Ok(full_path)
    }

    fn asset_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        resolve(&self.assets_root, path)
    }
}

/// Join a relative path onto `root`, refusing anything that could escape it.
fn resolve(root: &Path, path: &str) -> Result<PathBuf, StorageError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(StorageError::MissingPath);
    }

    let rel_path = Path::new(trimmed);
    let escapes = rel_path.is_absolute()
        || rel_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if escapes {
        return Err(StorageError::InvalidPath(trimmed.to_string()));
    }

    Ok(root.join(rel_path))
}

fn not_found_as(err: std::io::Error, path: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.trim().to_string())
    } else {
        StorageError::Io(err)
    }
}

/// Recursively collect files under `root`, keeping those `keep` accepts.
async fn walk(root: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<FileInfo>, StorageError> {
    fs::create_dir_all(root).await?;

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = entry.metadata().await?;

            if metadata.is_dir() {
                pending.push(path);
                continue;
            }
            if !metadata.is_file() || !keep(&path) {
                continue;
            }

            files.push(FileInfo {
                path: relative_path(root, &path),
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_page_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

async fn write_file(full_path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(full_path, bytes).await?;
    Ok(())
}

#[async_trait]
impl Storage for FsStorage {
    async fn list(&self) -> Result<Vec<FileInfo>, StorageError> {
        walk(&self.pages_root, has_page_extension).await
    }

    async fn read(&self, path: &str) -> Result<String, StorageError> {
        let full_path = self.page_path(path)?;
        fs::read_to_string(&full_path)
            .await
            .map_err(|e| not_found_as(e, path))
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let full_path = self.page_path(path)?;

        if content.len() > self.max_page_bytes {
            return Err(StorageError::TooLarge {
                size: content.len(),
                limit: self.max_page_bytes,
            });
        }

        write_file(&full_path, content.as_bytes()).await?;
        log::debug!("Wrote {} bytes to {:?}", content.len(), full_path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.page_path(path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| not_found_as(e, path))?;
        log::debug!("Deleted {:?}", full_path);
        Ok(())
    }

    async fn list_assets(&self) -> Result<Vec<FileInfo>, StorageError> {
        walk(&self.assets_root, |_| true).await
    }

    async fn upload_asset(&self, name: &str, bytes: &[u8]) -> Result<FileInfo, StorageError> {
        let full_path = self.asset_path(name)?;

        if bytes.len() > self.max_asset_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.max_asset_bytes,
            });
        }

        write_file(&full_path, bytes).await?;
        let metadata = fs::metadata(&full_path).await?;

        Ok(FileInfo {
            path: relative_path(&self.assets_root, &full_path),
            size: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    async fn delete_asset(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.asset_path(path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| not_found_as(e, path))
    }
}
