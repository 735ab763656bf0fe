//! Editing Session
//!
//! Dirty tracking, debounced autosave and editing-surface sync for the
//! one open document.

pub mod debounce;
pub mod state;
pub mod surface;

pub use debounce::Debouncer;
pub use state::{
    DocumentStatus, SaveKind, SaveOutcome, SaveRejection, Session, SessionError, SessionOptions,
    DEFAULT_AUTOSAVE_DELAY, LIVE_PREFIX,
};
pub use surface::{Clipboard, ClipboardError, EditSurface, SyncGuard};
