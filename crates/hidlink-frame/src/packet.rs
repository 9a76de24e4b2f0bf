use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::splitter::TrailingBytes;

/// Total size of a reference HID report: 1 header byte + 63 payload bytes.
pub const REPORT_SIZE: usize = 64;

/// Payload bytes carried by each reference link packet.
pub const DEFAULT_PAYLOAD_SIZE: u8 = 63;

/// Default maximum envelope body size accepted during reassembly: 1 MiB.
pub const DEFAULT_MAX_MESSAGE: usize = 1024 * 1024;

/// Per-transport packet layout.
///
/// The header byte of every packet is the constant `payload_size`, not the
/// number of payload bytes actually in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPacketFormat")]
pub struct PacketFormat {
    payload_size: u8,
}

#[derive(Deserialize)]
struct RawPacketFormat {
    payload_size: u8,
}

impl TryFrom<RawPacketFormat> for PacketFormat {
    type Error = FrameError;

    fn try_from(raw: RawPacketFormat) -> Result<Self> {
        Self::new(raw.payload_size).ok_or(FrameError::ZeroPayloadSize)
    }
}

impl PacketFormat {
    /// Create a format with an explicit payload size.
    ///
    /// Returns `None` for a zero payload size.
    pub fn new(payload_size: u8) -> Option<Self> {
        (payload_size > 0).then_some(Self { payload_size })
    }

    /// Header byte written at offset 0 of every packet.
    pub fn header(&self) -> u8 {
        self.payload_size
    }

    /// Payload bytes per packet.
    pub fn payload_len(&self) -> usize {
        usize::from(self.payload_size)
    }

    /// Total wire size of one packet (header + payload).
    pub fn packet_len(&self) -> usize {
        1 + self.payload_len()
    }
}

impl Default for PacketFormat {
    fn default() -> Self {
        Self {
            payload_size: DEFAULT_PAYLOAD_SIZE,
        }
    }
}

/// One fixed-size link packet: header byte followed by the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct LinkPacket {
    buf: Bytes,
}

impl LinkPacket {
    /// Build a packet from a payload slice, zero-padding it to the format's
    /// payload size.
    ///
    /// Fails if `payload` is longer than one packet payload.
    pub fn from_payload(format: PacketFormat, payload: &[u8]) -> Result<Self> {
        if payload.len() > format.payload_len() {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: format.payload_len(),
            });
        }
        let mut buf = BytesMut::with_capacity(format.packet_len());
        buf.put_u8(format.header());
        buf.put_slice(payload);
        buf.put_bytes(0, format.payload_len() - payload.len());
        Ok(Self { buf: buf.freeze() })
    }

    /// Wrap raw wire bytes received from a transport.
    ///
    /// Validates the total size and header byte against `format`.
    pub fn from_wire(format: PacketFormat, wire: impl Into<Bytes>) -> Result<Self> {
        let buf = wire.into();
        if buf.len() != format.packet_len() {
            return Err(FrameError::InvalidPacketSize {
                size: buf.len(),
                expected: format.packet_len(),
            });
        }
        if buf[0] != format.header() {
            return Err(FrameError::InvalidPacketHeader {
                expected: format.header(),
                found: buf[0],
            });
        }
        Ok(Self { buf })
    }

    /// The header byte.
    pub fn header(&self) -> u8 {
        self.buf[0]
    }

    /// The payload bytes (everything after the header).
    pub fn payload(&self) -> &[u8] {
        &self.buf[1..]
    }

    /// The full wire representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Wire length of this packet.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Space-separated lowercase hex dump of the whole packet.
    pub fn hex(&self) -> String {
        hex_dump(&self.buf)
    }
}

impl AsRef<[u8]> for LinkPacket {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl fmt::Debug for LinkPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkPacket")
            .field("header", &self.header())
            .field("len", &self.len())
            .finish()
    }
}

/// Format bytes as two-digit hex separated by single spaces.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Configuration shared by the splitter and the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Packet layout of the transport.
    pub format: PacketFormat,
    /// How a final partial payload is handled when splitting.
    pub trailing: TrailingBytes,
    /// Maximum envelope body size accepted during reassembly. Default: 1 MiB.
    pub max_message_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            format: PacketFormat::default(),
            trailing: TrailingBytes::default(),
            max_message_size: DEFAULT_MAX_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_64_byte_report() {
        let format = PacketFormat::default();
        assert_eq!(format.header(), 63);
        assert_eq!(format.packet_len(), REPORT_SIZE);
    }

    #[test]
    fn zero_payload_size_rejected() {
        assert!(PacketFormat::new(0).is_none());
        assert_eq!(PacketFormat::new(7).unwrap().packet_len(), 8);
    }

    #[test]
    fn deserialize_rejects_zero_payload_size() {
        let err = serde_json::from_str::<FrameConfig>(r#"{"format":{"payload_size":0}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("payload size"));

        let config: FrameConfig =
            serde_json::from_str(r#"{"format":{"payload_size":8}}"#).unwrap();
        assert_eq!(config.format.packet_len(), 9);
        assert_eq!(config.format, PacketFormat::new(8).unwrap());
    }

    #[test]
    fn from_payload_pads_with_zeros() {
        let packet = LinkPacket::from_payload(PacketFormat::default(), b"abc").unwrap();
        assert_eq!(packet.len(), REPORT_SIZE);
        assert_eq!(packet.header(), 63);
        assert_eq!(&packet.payload()[..3], b"abc");
        assert!(packet.payload()[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn from_payload_rejects_oversized_slice() {
        let format = PacketFormat::new(4).unwrap();
        let err = LinkPacket::from_payload(format, b"12345").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 5, max: 4 }));
    }

    #[test]
    fn from_wire_validates_size_and_header() {
        let format = PacketFormat::new(3).unwrap();
        assert!(LinkPacket::from_wire(format, vec![3u8, 1, 2, 3]).is_ok());

        let err = LinkPacket::from_wire(format, vec![3u8, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidPacketSize {
                size: 3,
                expected: 4
            }
        ));

        let err = LinkPacket::from_wire(format, vec![9u8, 1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidPacketHeader {
                expected: 3,
                found: 9
            }
        ));
    }

    #[test]
    fn hex_dump_format() {
        assert_eq!(hex_dump(&[0x3f, 0x23, 0x00]), "3f 23 00");
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn frame_config_deserializes_with_defaults() {
        let cfg: FrameConfig = serde_json::from_str(r#"{"trailing":"reject"}"#).unwrap();
        assert_eq!(cfg.trailing, TrailingBytes::Reject);
        assert_eq!(cfg.format, PacketFormat::default());
        assert_eq!(cfg.max_message_size, DEFAULT_MAX_MESSAGE);
    }
}
