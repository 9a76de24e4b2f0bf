use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Envelope header: magic (2) + kind (2) + length (4) = 8 bytes.
pub const ENVELOPE_HEADER_SIZE: usize = 8;

/// Magic bytes: "##" (0x23 0x23).
pub const ENVELOPE_MAGIC: [u8; 2] = [0x23, 0x23];

/// A typed message body as carried in a frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Device message kind.
    pub kind: u16,
    /// Encoded message body. Opaque to this crate.
    pub body: Bytes,
}

impl Envelope {
    /// Create a new envelope.
    pub fn new(kind: u16, body: impl Into<Bytes>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// The total frame buffer size of this envelope (header + body).
    pub fn wire_size(&self) -> usize {
        ENVELOPE_HEADER_SIZE + self.body.len()
    }
}

/// Encode an envelope into a frame buffer.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬───────────┬─────────────────┐
/// │ Magic (2B)   │ Kind      │ Length    │ Body             │
/// │ 0x23 0x23    │ (2B BE)   │ (4B BE)   │ (Length bytes)   │
/// │ "##"         │           │           │                  │
/// └──────────────┴───────────┴───────────┴─────────────────┘
/// ```
pub fn encode_envelope(kind: u16, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: body.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(ENVELOPE_HEADER_SIZE + body.len());
    dst.put_slice(&ENVELOPE_MAGIC);
    dst.put_u16(kind);
    dst.put_u32(body.len() as u32);
    dst.put_slice(body);
    Ok(())
}

/// Total frame buffer length declared by an envelope header.
///
/// Returns `Ok(None)` while fewer than [`ENVELOPE_HEADER_SIZE`] bytes are
/// available.
pub fn envelope_len(src: &[u8], max_body: usize) -> Result<Option<usize>> {
    if src.len() < ENVELOPE_HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != ENVELOPE_MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let body_len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;
    if body_len > max_body {
        return Err(FrameError::PayloadTooLarge {
            size: body_len,
            max: max_body,
        });
    }

    Ok(Some(ENVELOPE_HEADER_SIZE + body_len))
}

/// Decode an envelope from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete envelope yet.
/// On success, consumes the envelope bytes from the buffer. Bytes past the
/// declared length (packet padding) are left in place.
pub fn decode_envelope(src: &mut BytesMut, max_body: usize) -> Result<Option<Envelope>> {
    let Some(total) = envelope_len(src, max_body)? else {
        return Ok(None);
    };
    if src.len() < total {
        return Ok(None);
    }

    let kind = u16::from_be_bytes([src[2], src[3]]);
    src.advance(ENVELOPE_HEADER_SIZE);
    let body = src.split_to(total - ENVELOPE_HEADER_SIZE).freeze();

    Ok(Some(Envelope { kind, body }))
}
