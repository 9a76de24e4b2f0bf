use std::fmt;
use std::io;

use hidlink_frame::FrameError;
use hidlink_session::SessionError;
use hidlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Misaligned { .. }
        | FrameError::PayloadTooLarge { .. }
        | FrameError::Codec(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::Frame(err) => frame_error(context, err),
        TransportError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Config(_)
        | SessionError::ConfigIo { .. }
        | SessionError::InvalidConfig(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        SessionError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_124() {
        let err = SessionError::Transport(TransportError::Io(io::Error::from(
            io::ErrorKind::TimedOut,
        )));
        assert_eq!(session_error("read failed", err).code, TIMEOUT);
    }

    #[test]
    fn misaligned_maps_to_data_invalid() {
        let err = SessionError::Frame(FrameError::Misaligned {
            len: 10,
            payload_size: 63,
        });
        let cli = session_error("write failed", err);
        assert_eq!(cli.code, DATA_INVALID);
        assert!(cli.message.starts_with("write failed: "));
    }

    #[test]
    fn invalid_config_maps_to_usage() {
        let err = SessionError::InvalidConfig("monitor_interval_ms must be greater than zero");
        assert_eq!(session_error("open failed", err).code, USAGE);
    }

    #[test]
    fn bad_inbound_packet_maps_to_transport() {
        let err = TransportError::Frame(FrameError::InvalidMagic);
        assert_eq!(transport_error("read failed", err).code, TRANSPORT_ERROR);
    }
}
