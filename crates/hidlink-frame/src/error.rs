/// Errors that can occur while splitting, reassembling or encoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame buffer is not a whole number of packet payloads and the
    /// splitter is configured to reject trailing bytes.
    #[error("frame buffer of {len} bytes is not a multiple of the {payload_size}-byte packet payload")]
    Misaligned { len: usize, payload_size: usize },

    /// A packet format with no payload bytes.
    #[error("packet payload size must be at least 1 byte")]
    ZeroPayloadSize,

    /// An inbound packet does not have the transport's fixed size.
    #[error("invalid packet size ({size} bytes, expected {expected})")]
    InvalidPacketSize { size: usize, expected: usize },

    /// An inbound packet carries an unexpected header byte.
    #[error("invalid packet header 0x{found:02x} (expected 0x{expected:02x})")]
    InvalidPacketHeader { expected: u8, found: u8 },

    /// The message envelope does not start with the "##" marker.
    #[error("invalid envelope magic (expected 0x2323 \"##\")")]
    InvalidMagic,

    /// The message body exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A frame buffer ended before the envelope it declares.
    #[error("incomplete frame ({have} bytes, need {need})")]
    Incomplete { have: usize, need: usize },

    /// The message encoder rejected a message or buffer.
    ///
    /// Reserved for [`MessageCodec`](crate::MessageCodec) implementations
    /// outside this crate that wrap their own encoding errors.
    #[error("codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
