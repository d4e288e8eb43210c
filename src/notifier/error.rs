use thiserror::Error;

/// Failure to deliver a lifecycle notification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Unreachable listener, non-success status, or timeout
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ureq::Error> for NotifyError {
    fn from(err: ureq::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}
