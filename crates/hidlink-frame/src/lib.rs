//! Fixed-size link packet framing for HID-class hardware devices.
//!
//! A structured message is first encoded into a flat frame buffer by a
//! [`MessageCodec`]. The frame buffer is then cut into fixed-size link
//! packets:
//! - 1 header byte holding the transport's constant payload size (63)
//! - N payload bytes (63 for the reference 64-byte HID report)
//!
//! Inbound packets are stitched back together by [`PacketAssembler`], using
//! the length declared in the frame buffer's [`Envelope`] header.

pub mod assembler;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod packet;
pub mod splitter;

pub use assembler::PacketAssembler;
pub use codec::{EnvelopeCodec, MessageCodec};
pub use envelope::{
    decode_envelope, encode_envelope, envelope_len, Envelope, ENVELOPE_HEADER_SIZE, ENVELOPE_MAGIC,
};
pub use error::{FrameError, Result};
pub use packet::{
    hex_dump, FrameConfig, LinkPacket, PacketFormat, DEFAULT_MAX_MESSAGE, DEFAULT_PAYLOAD_SIZE,
    REPORT_SIZE,
};
pub use splitter::{split_frame, Packets, Splitter, TrailingBytes};
