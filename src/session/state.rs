//! Document Session
//!
//! Owns the open document and keeps its raw text, the debounced
//! persistence path and an optional editing surface consistent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use thiserror::Error;

use super::debounce::Debouncer;
use super::surface::{Clipboard, ClipboardError, EditSurface, SyncGuard};
use crate::document::{ensure_extension, normalize_path, template_content, Document, Language};
use crate::highlight::Highlighter;
use crate::notify::{NoticeKind, Notifier};
use crate::storage::{FileInfo, Storage, StorageError};

/// Quiet period after the last edit before an autosave fires
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(700);

/// URL prefix under which saved pages are served
pub const LIVE_PREFIX: &str = "/webpages/static/pages";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Persistence(#[from] StorageError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Where the open document stands relative to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Raw text equals the last persisted text
    Clean,
    /// Raw text differs and nothing is scheduled or running
    Dirty,
    /// The debounce timer is armed
    AutosavePending,
    /// A write is outstanding for this path
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Manual,
    Autosave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Rejected(SaveRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRejection {
    NoDocument,
    /// Another save for the same path has not completed yet
    InFlight,
    Unchanged,
    /// The document the save was scheduled for is no longer open
    Stale,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub autosave_delay: Duration,
    pub highlighter: Highlighter,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            highlighter: Highlighter::default(),
        }
    }
}

/// Handle to one editing session. Cloning shares the same session.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

struct Shared {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    highlighter: Highlighter,
    state: Mutex<State>,
    surface: Mutex<Option<Arc<dyn EditSurface>>>,
    syncing: AtomicBool,
}

struct State {
    document: Option<Document>,
    /// Bumped whenever the open document is replaced or closed
    epoch: u64,
    files: Vec<FileInfo>,
    in_flight: HashMap<String, SaveKind>,
    autosave: Debouncer,
    preview_key: u64,
    preview: Option<Preview>,
    last_saved_at: Option<SystemTime>,
}

struct Preview {
    language: Language,
    source: String,
    markup: String,
}

impl State {
    fn open(&mut self, document: Document) {
        self.autosave.cancel();
        self.epoch += 1;
        if document.is_html() {
            self.preview_key += 1;
        }
        self.document = Some(document);
    }

    fn close_document(&mut self) {
        self.autosave.cancel();
        self.epoch += 1;
        self.document = None;
        self.preview = None;
    }

    fn is_current(&self, path: &str) -> bool {
        self.document.as_ref().is_some_and(|doc| doc.path == path)
    }
}

impl Session {
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        options: SessionOptions,
    ) -> Self {
        let state = State {
            document: None,
            epoch: 0,
            files: Vec::new(),
            in_flight: HashMap::new(),
            autosave: Debouncer::new(options.autosave_delay),
            preview_key: 0,
            preview: None,
            last_saved_at: None,
        };

        Self {
            shared: Arc::new(Shared {
                storage,
                notifier,
                highlighter: options.highlighter,
                state: Mutex::new(state),
                surface: Mutex::new(None),
                syncing: AtomicBool::new(false),
            }),
        }
    }

    pub fn document(&self) -> Option<Document> {
        self.shared.state.lock().document.clone()
    }

    pub fn path(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .document
            .as_ref()
            .map(|doc| doc.path.clone())
    }

    /// Current raw text, empty when no document is open
    pub fn raw_text(&self) -> String {
        self.shared
            .state
            .lock()
            .document
            .as_ref()
            .map(|doc| doc.raw_text.clone())
            .unwrap_or_default()
    }

    pub fn is_dirty(&self) -> bool {
        self.shared
            .state
            .lock()
            .document
            .as_ref()
            .is_some_and(Document::is_dirty)
    }

    pub fn language(&self) -> Language {
        self.shared
            .state
            .lock()
            .document
            .as_ref()
            .map(|doc| doc.language)
            .unwrap_or_default()
    }

    /// Status of the open document, `None` when nothing is open
    pub fn status(&self) -> Option<DocumentStatus> {
        let state = self.shared.state.lock();
        let doc = state.document.as_ref()?;

        let status = if state.in_flight.contains_key(&doc.path) {
            DocumentStatus::Saving
        } else if state.autosave.is_pending() {
            DocumentStatus::AutosavePending
        } else if doc.is_dirty() {
            DocumentStatus::Dirty
        } else {
            DocumentStatus::Clean
        };

        Some(status)
    }

    pub fn files(&self) -> Vec<FileInfo> {
        self.shared.state.lock().files.clone()
    }

    /// Cached listing filtered by a case-insensitive substring of the path
    pub fn filtered_files(&self, needle: &str) -> Vec<FileInfo> {
        let files = self.files();
        if needle.is_empty() {
            return files;
        }

        let needle = needle.to_lowercase();
        files
            .into_iter()
            .filter(|file| file.path.to_lowercase().contains(&needle))
            .collect()
    }

    /// Bumped whenever an html preview should reload
    pub fn preview_key(&self) -> u64 {
        self.shared.state.lock().preview_key
    }

    /// Where the open page is served, for html documents only
    pub fn live_url(&self) -> Option<String> {
        let state = self.shared.state.lock();
        let doc = state.document.as_ref().filter(|doc| doc.is_html())?;
        Some(format!("{}/{}", LIVE_PREFIX, doc.path))
    }

    pub fn last_saved_at(&self) -> Option<SystemTime> {
        self.shared.state.lock().last_saved_at
    }

    /// Highlighted markup of the raw text, recomputed only when the text
    /// or the language changed since the last call.
    pub fn highlighted(&self) -> String {
        let mut state = self.shared.state.lock();
        let Some(doc) = state.document.as_ref() else {
            return String::new();
        };

        if let Some(preview) = &state.preview {
            if preview.language == doc.language && preview.source == doc.raw_text {
                return preview.markup.clone();
            }
        }

        let language = doc.language;
        let source = doc.raw_text.clone();
        let markup = self.shared.highlighter.highlight(&source, language);

        state.preview = Some(Preview {
            language,
            source,
            markup: markup.clone(),
        });
        markup
    }

    /// Reload the cached file listing
    pub async fn refresh_files(&self) -> Result<(), SessionError> {
        match self.shared.storage.list().await {
            Ok(files) => {
                self.shared.state.lock().files = files;
                Ok(())
            }
            Err(e) => {
                self.report_failure("Failed to list files", &e);
                Err(e.into())
            }
        }
    }

    /// Load a stored file and make it the open document
    pub async fn select(&self, path: &str) -> Result<(), SessionError> {
        let path = normalize_path(path);
        self.shared.state.lock().autosave.cancel();

        let content = match self.shared.storage.read(&path).await {
            Ok(content) => content,
            Err(e) => {
                self.report_failure("Failed to open file", &e);
                return Err(e.into());
            }
        };

        self.shared
            .state
            .lock()
            .open(Document::new(path.clone(), content.clone()));
        self.push_to_surface(&content);

        log::debug!("Selected {}", path);
        Ok(())
    }

    /// Create a file from a template and open it. Returns the stored path.
    pub async fn create(&self, path: &str, template: Language) -> Result<String, SessionError> {
        self.shared.state.lock().autosave.cancel();

        let normalized = normalize_path(path.trim());
        if normalized.is_empty() {
            let message = "File path is required.";
            self.shared.notifier.notify(NoticeKind::Negative, message);
            return Err(SessionError::Validation(message.to_string()));
        }

        let path = ensure_extension(&normalized, template);
        let content = template_content(template);

        if let Err(e) = self.shared.storage.write(&path, content).await {
            self.report_failure("Failed to create file", &e);
            return Err(e.into());
        }

        self.shared
            .state
            .lock()
            .open(Document::new(path.clone(), content));
        self.push_to_surface(content);

        // listing failures are reported by refresh_files itself
        let _ = self.refresh_files().await;
        self.shared
            .notifier
            .notify(NoticeKind::Positive, "File created.");

        log::info!("Created {}", path);
        Ok(path)
    }

    /// Delete a stored file, the open one when `path` is `None`.
    ///
    /// Returns `Ok(false)` when there was nothing to delete.
    pub async fn delete(&self, path: Option<&str>) -> Result<bool, SessionError> {
        let target = match path {
            Some(path) => normalize_path(path),
            None => self.path().unwrap_or_default(),
        };
        if target.is_empty() {
            return Ok(false);
        }

        {
            let mut state = self.shared.state.lock();
            if state.is_current(&target) {
                state.autosave.cancel();
            }
        }

        if let Err(e) = self.shared.storage.delete(&target).await {
            self.report_failure("Failed to delete file", &e);
            return Err(e.into());
        }

        let cleared = {
            let mut state = self.shared.state.lock();
            let current = state.is_current(&target);
            if current {
                state.close_document();
            }
            current
        };
        if cleared {
            self.push_to_surface("");
        }

        let _ = self.refresh_files().await;
        self.shared.notifier.notify(NoticeKind::Positive, "Deleted.");

        log::info!("Deleted {}", target);
        Ok(true)
    }

    /// Replace the raw text programmatically and mirror it into the
    /// surface. Returns whether the text changed.
    pub fn edit(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        if !self.apply_edit(&text) {
            return false;
        }
        self.push_to_surface(&text);
        true
    }

    /// Save now. Rejected while any save of this path is in flight or
    /// when there is nothing new to write.
    pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
        self.persist(SaveKind::Manual, None).await
    }

    /// Stop any pending autosave, e.g. when the editor is unmounted.
    pub fn close(&self) {
        if self.shared.state.lock().autosave.cancel() {
            log::debug!("Cancelled pending autosave on close");
        }
    }

    /// Attach an editing surface and push the current text into it.
    pub fn attach_surface(&self, surface: Arc<dyn EditSurface>) {
        *self.shared.surface.lock() = Some(surface);
        let text = self.raw_text();
        self.push_to_surface(&text);
    }

    pub fn detach_surface(&self) -> Option<Arc<dyn EditSurface>> {
        self.shared.surface.lock().take()
    }

    /// Change notification from the attached surface.
    ///
    /// Notifications caused by the session's own pushes are ignored.
    /// Returns whether the raw text was updated.
    pub fn surface_changed(&self, value: &str) -> bool {
        if self.shared.syncing.load(Ordering::SeqCst) {
            log::trace!("Ignoring change echoed by a programmatic push");
            return false;
        }
        self.apply_edit(value)
    }

    /// Copy the raw text to a clipboard. Failures only produce a soft
    /// notification.
    pub fn copy_content(&self, clipboard: &dyn Clipboard) -> Result<(), SessionError> {
        match clipboard.write_text(&self.raw_text()) {
            Ok(()) => {
                self.shared
                    .notifier
                    .notify(NoticeKind::Positive, "Copied to clipboard.");
                Ok(())
            }
            Err(e) => {
                log::warn!("Clipboard copy failed: {}", e);
                self.shared.notifier.notify(
                    NoticeKind::Negative,
                    "Clipboard copy failed. Copy manually from the editor.",
                );
                Err(e.into())
            }
        }
    }

    fn apply_edit(&self, text: &str) -> bool {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let Some(doc) = state.document.as_mut() else {
            log::debug!("Ignoring edit with no open document");
            return false;
        };
        if doc.raw_text == text {
            return false;
        }

        doc.raw_text = text.to_string();
        self.schedule_autosave(state);
        true
    }

    /// (Re)arm the autosave timer for a dirty document, or drop it when
    /// the text went back to its saved content.
    fn schedule_autosave(&self, state: &mut State) {
        let Some(doc) = state.document.as_ref() else {
            return;
        };
        if !doc.is_dirty() {
            state.autosave.cancel();
            return;
        }

        let path = doc.path.clone();
        let epoch = state.epoch;
        let session = self.clone();

        state.autosave.arm(move |ticket| async move {
            session.autosave_fired(ticket, path, epoch).await;
        });
    }

    async fn autosave_fired(&self, ticket: u64, path: String, epoch: u64) {
        let claimed = self.shared.state.lock().autosave.fired(ticket);
        if !claimed {
            log::trace!("Dropping stale autosave for {}", path);
            return;
        }

        match self.persist(SaveKind::Autosave, Some((&path, epoch))).await {
            Ok(SaveOutcome::Saved) => log::debug!("Autosaved {}", path),
            Ok(SaveOutcome::Rejected(reason)) => {
                log::debug!("Autosave of {} skipped: {:?}", path, reason)
            }
            Err(e) => log::debug!("Autosave of {} failed: {}", path, e),
        }
    }

    async fn persist(
        &self,
        kind: SaveKind,
        expected: Option<(&str, u64)>,
    ) -> Result<SaveOutcome, SessionError> {
        let (path, content, epoch) = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;

            let Some(doc) = state.document.as_ref() else {
                return Ok(SaveOutcome::Rejected(SaveRejection::NoDocument));
            };
            if let Some((path, epoch)) = expected {
                if doc.path != path || state.epoch != epoch {
                    return Ok(SaveOutcome::Rejected(SaveRejection::Stale));
                }
            }
            if state.in_flight.contains_key(&doc.path) {
                return Ok(SaveOutcome::Rejected(SaveRejection::InFlight));
            }
            if !doc.is_dirty() {
                return Ok(SaveOutcome::Rejected(SaveRejection::Unchanged));
            }

            let path = doc.path.clone();
            let content = doc.raw_text.clone();
            state.autosave.cancel();
            state.in_flight.insert(path.clone(), kind);
            (path, content, state.epoch)
        };

        log::debug!("Saving {} ({:?}, {} bytes)", path, kind, content.len());
        let result = self.shared.storage.write(&path, &content).await;

        let current = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            state.in_flight.remove(&path);

            // The path may have been reopened while writing: the write still
            // defines what is on disk, and timers that fired meanwhile were
            // rejected as in flight.
            let same_path = state.is_current(&path);
            let current = same_path && state.epoch == epoch;
            if same_path && result.is_ok() {
                if let Some(doc) = state.document.as_mut() {
                    doc.saved_text = content;
                }
            }
            if current && result.is_ok() {
                if state.document.as_ref().is_some_and(Document::is_html) {
                    state.preview_key += 1;
                }
                state.last_saved_at = Some(SystemTime::now());
            }
            // edits that arrived while writing still need a save; a failed
            // save of the current epoch is not retried
            if same_path && (result.is_ok() || !current) {
                self.schedule_autosave(state);
            }
            current
        };

        match result {
            Ok(()) => {
                if current {
                    let _ = self.refresh_files().await;
                    if kind == SaveKind::Manual {
                        self.shared.notifier.notify(NoticeKind::Positive, "Saved.");
                    }
                }
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                self.report_failure(&format!("Failed to save {}", path), &e);
                Err(e.into())
            }
        }
    }

    fn push_to_surface(&self, text: &str) -> bool {
        let Some(surface) = self.shared.surface.lock().clone() else {
            return false;
        };
        if surface.value() == text {
            return false;
        }

        let _guard = SyncGuard::raise(&self.shared.syncing);
        surface.set_value(text);
        true
    }

    fn report_failure(&self, action: &str, err: &StorageError) {
        log::warn!("{}: {}", action, err);
        self.shared
            .notifier
            .notify(NoticeKind::Negative, &format!("{}: {}", action, err));
    }
}
