use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// User-facing notification sink. Toast delivery itself is an external
/// concern; managers only emit the notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(NoticeKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeKind::Error, message);
    }

    fn info(&self, message: &str) {
        self.notify(NoticeKind::Info, message);
    }
}

/// Routes notices through the tracing pipeline.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => tracing::info!(notice = "success", "{message}"),
            NoticeKind::Error => tracing::warn!(notice = "error", "{message}"),
            NoticeKind::Info => tracing::info!(notice = "info", "{message}"),
        }
    }
}

/// Captures notices in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn has(&self, kind: NoticeKind) -> bool {
        self.notices().iter().any(|(k, _)| *k == kind)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((kind, message.to_string()));
    }
}
