use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Idle,
    Uploading,
    Retrying,
    Done,
    Error,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProgressStatus::Idle => "idle",
            ProgressStatus::Uploading => "uploading",
            ProgressStatus::Retrying => "retrying",
            ProgressStatus::Done => "done",
            ProgressStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Snapshot rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub status: ProgressStatus,
    pub message: String,
    pub progress: u8,
    pub retry_count: Option<u32>,
    pub error: Option<String>,
}

impl UploadProgress {
    pub fn idle() -> Self {
        Self {
            status: ProgressStatus::Idle,
            message: String::new(),
            progress: 0,
            retry_count: None,
            error: None,
        }
    }
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::idle()
    }
}

/// Single-writer progress state. The sequencer mutates it; any number of
/// readers observe it through [`ProgressTracker::subscribe`].
///
/// The percentage never decreases between two calls to [`ProgressTracker::reset`].
#[derive(Debug)]
pub struct ProgressTracker {
    state: watch::Sender<UploadProgress>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(UploadProgress::idle());
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UploadProgress {
        self.state.borrow().clone()
    }

    /// Starts a fresh attempt at 0%.
    pub fn reset(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| {
            *state = UploadProgress {
                message,
                ..UploadProgress::idle()
            };
        });
    }

    pub fn uploading(&self, message: impl Into<String>, progress: u8) {
        self.transition(ProgressStatus::Uploading, message.into(), progress, None, None);
    }

    pub fn retrying(&self, message: impl Into<String>, progress: u8, retry_count: u32) {
        self.transition(
            ProgressStatus::Retrying,
            message.into(),
            progress,
            Some(retry_count),
            None,
        );
    }

    pub fn done(&self, message: impl Into<String>) {
        self.transition(ProgressStatus::Done, message.into(), 100, None, None);
    }

    /// Terminal failure; keeps the percentage reached so far.
    pub fn fail(&self, message: impl Into<String>, error: impl Into<String>) {
        let progress = self.state.borrow().progress;
        self.transition(
            ProgressStatus::Error,
            message.into(),
            progress,
            None,
            Some(error.into()),
        );
    }

    fn transition(
        &self,
        status: ProgressStatus,
        message: String,
        progress: u8,
        retry_count: Option<u32>,
        error: Option<String>,
    ) {
        self.state.send_modify(|state| {
            state.status = status;
            state.message = message;
            state.progress = state.progress.max(progress.min(100));
            state.retry_count = retry_count;
            state.error = error;
        });
    }
}
