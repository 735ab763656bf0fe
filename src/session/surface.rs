//! Editing surface and clipboard collaborators.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// An external text widget mirrored from the session's raw text.
///
/// The widget reports every value change through
/// [`Session::surface_changed`](super::Session::surface_changed),
/// whatever caused it, including `set_value` calls made by the session.
pub trait EditSurface: Send + Sync {
    fn value(&self) -> String;
    fn set_value(&self, text: &str);
}

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Raises a flag for as long as it lives.
///
/// Held around programmatic pushes into the surface so the change
/// notification they produce can be recognised and dropped.
pub struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    pub fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
