//! User-facing notifications.

/// Tone of a notification toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Positive,
    Negative,
}

/// Fire-and-forget notification channel
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Notifier that writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Positive => log::info!("{}", message),
            NoticeKind::Negative => log::warn!("{}", message),
        }
    }
}
