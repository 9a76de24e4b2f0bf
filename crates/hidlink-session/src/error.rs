use std::path::PathBuf;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] hidlink_transport::TransportError),

    /// Framing or message encoding error.
    #[error("frame error: {0}")]
    Frame(#[from] hidlink_frame::FrameError),

    /// The session has been disconnected.
    #[error("session closed")]
    Closed,

    /// A session configuration value is out of range.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(&'static str),

    /// The monitor task could not be started.
    #[error("failed to start monitor: {0}")]
    Monitor(std::io::Error),

    /// Device specification could not be parsed.
    #[error("invalid device specification: {0}")]
    Config(#[from] serde_json::Error),

    /// Device specification file could not be read.
    #[error("failed to read {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SessionError {
    /// True if the underlying transport timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
