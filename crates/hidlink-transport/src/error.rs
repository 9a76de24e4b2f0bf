use hidlink_frame::FrameError;

/// Errors that can occur in packet transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the specified device or emulator address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel accepted fewer bytes than one full packet.
    #[error("short packet write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The device went away mid-operation.
    #[error("device disconnected")]
    Disconnected,

    /// The device layer reported an error.
    #[error("device error: {0}")]
    Device(String),

    /// Inbound packets could not be reassembled.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// True if the error is an I/O timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(err) | Self::Connect { source: err, .. } => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
