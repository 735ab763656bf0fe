//! Test doubles for the session collaborators.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use webpages_editor::notify::{NoticeKind, Notifier};
use webpages_editor::session::{Clipboard, ClipboardError, EditSurface, Session, SessionOptions};
use webpages_editor::storage::{FileInfo, Storage, StorageError};

/// In-memory storage that records writes and can hold them in flight
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    list_calls: AtomicUsize,
    hold: AtomicBool,
    fail: AtomicBool,
    gate: Semaphore,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
            fail: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    pub fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
        let storage = Self::new();
        {
            let mut map = storage.files.lock();
            for (path, content) in files {
                map.insert(path.to_string(), content.to_string());
            }
        }
        Arc::new(storage)
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().clone()
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Block every following write until `release_writes`
    pub fn hold_writes(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Let one held write through and stop holding new ones
    pub fn release_writes(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.gate.add_permits(1);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list(&self) -> Result<Vec<FileInfo>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .files
            .lock()
            .iter()
            .map(|(path, content)| FileInfo {
                path: path.clone(),
                size: content.len() as u64,
                modified: UNIX_EPOCH,
            })
            .collect())
    }

    async fn read(&self, path: &str) -> Result<String, StorageError> {
        self.content(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.writes
            .lock()
            .push((path.to_string(), content.to_string()));

        if self.hold.load(Ordering::SeqCst) {
            self.gate
                .acquire()
                .await
                .expect("write gate closed")
                .forget();
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("storage unavailable".to_string()));
        }

        self.files
            .lock()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn list_assets(&self) -> Result<Vec<FileInfo>, StorageError> {
        Ok(Vec::new())
    }

    async fn upload_asset(&self, name: &str, bytes: &[u8]) -> Result<FileInfo, StorageError> {
        Ok(FileInfo {
            path: name.to_string(),
            size: bytes.len() as u64,
            modified: UNIX_EPOCH,
        })
    }

    async fn delete_asset(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().clone()
    }

    pub fn has(&self, kind: NoticeKind, message: &str) -> bool {
        self.notices
            .lock()
            .iter()
            .any(|(k, m)| *k == kind && m == message)
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().push((kind, message.to_string()));
    }
}

/// Editing widget that reports every value change back to the session,
/// optionally rewriting the value the way real widgets normalise input.
pub struct TestSurface {
    value: Mutex<String>,
    session: Mutex<Option<Session>>,
    rewrite: fn(&str) -> String,
    pushes: AtomicUsize,
    accepted: AtomicUsize,
}

impl TestSurface {
    pub fn new() -> Arc<Self> {
        Self::with_rewrite(|text| text.to_string())
    }

    /// Surface that drops one trailing newline from whatever it is given
    pub fn normalizing() -> Arc<Self> {
        Self::with_rewrite(|text| text.strip_suffix('\n').unwrap_or(text).to_string())
    }

    fn with_rewrite(rewrite: fn(&str) -> String) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(String::new()),
            session: Mutex::new(None),
            rewrite,
            pushes: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
        })
    }

    /// Attach to the session in both directions
    pub fn connect(self: &Arc<Self>, session: &Session) {
        *self.session.lock() = Some(session.clone());
        session.attach_surface(self.clone());
    }

    /// Set the value without notifying anyone
    pub fn preset(&self, text: &str) {
        *self.value.lock() = text.to_string();
    }

    /// Simulate the user typing a new value
    pub fn type_text(&self, text: &str) {
        *self.value.lock() = text.to_string();
        self.emit(text);
    }

    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Change events the session applied to its raw text
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    fn emit(&self, value: &str) {
        let session = self.session.lock().clone();
        if let Some(session) = session {
            if session.surface_changed(value) {
                self.accepted.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

impl EditSurface for TestSurface {
    fn value(&self) -> String {
        self.value.lock().clone()
    }

    fn set_value(&self, text: &str) {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        let value = (self.rewrite)(text);
        *self.value.lock() = value.clone();
        self.emit(&value);
    }
}

#[derive(Default)]
pub struct MemoryClipboard {
    pub text: Mutex<Option<String>>,
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.text.lock() = Some(text.to_string());
        Ok(())
    }
}

pub struct BrokenClipboard;

impl Clipboard for BrokenClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError("permission denied".to_string()))
    }
}

pub fn session_with(storage: &Arc<MemoryStorage>) -> (Session, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let session = Session::new(storage.clone(), notifier.clone(), SessionOptions::default());
    (session, notifier)
}
