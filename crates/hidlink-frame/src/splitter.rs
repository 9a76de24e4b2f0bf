use std::iter::FusedIterator;
use std::slice::Chunks;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::packet::{FrameConfig, LinkPacket, PacketFormat};

/// What to do with the final `len % payload_size` bytes of a frame buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingBytes {
    /// Emit one more packet holding the remainder, zero-padded.
    #[default]
    Pad,
    /// Fail the split with [`FrameError::Misaligned`].
    Reject,
}

/// Splits frame buffers into fixed-size link packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Splitter {
    format: PacketFormat,
    trailing: TrailingBytes,
}

impl Splitter {
    /// Create a splitter for the given packet format and trailing policy.
    pub fn new(format: PacketFormat, trailing: TrailingBytes) -> Self {
        Self { format, trailing }
    }

    /// Create a splitter from the shared frame configuration.
    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(config.format, config.trailing)
    }

    pub fn format(&self) -> PacketFormat {
        self.format
    }

    pub fn trailing(&self) -> TrailingBytes {
        self.trailing
    }

    /// Split `buffer` into an ordered, lazy sequence of packets.
    ///
    /// With [`TrailingBytes::Reject`] a misaligned buffer fails here, before
    /// any packet is produced.
    pub fn split<'a>(&self, buffer: &'a [u8]) -> Result<Packets<'a>> {
        let payload_size = self.format.payload_len();
        let remainder = buffer.len() % payload_size;
        if remainder != 0 && self.trailing == TrailingBytes::Reject {
            return Err(FrameError::Misaligned {
                len: buffer.len(),
                payload_size,
            });
        }

        Ok(Packets {
            format: self.format,
            chunks: buffer.chunks(payload_size),
        })
    }

    /// Number of packets `split` would produce for a buffer of `len` bytes.
    pub fn packet_count(&self, len: usize) -> usize {
        let payload_size = self.format.payload_len();
        match self.trailing {
            TrailingBytes::Pad => len.div_ceil(payload_size),
            TrailingBytes::Reject => len / payload_size,
        }
    }
}

/// Split `buffer` with the reference format (63-byte payloads) and padding.
pub fn split_frame(buffer: &[u8]) -> Packets<'_> {
    Packets {
        format: PacketFormat::default(),
        chunks: buffer.chunks(PacketFormat::default().payload_len()),
    }
}

/// Iterator over the link packets of one frame buffer, in emission order.
#[derive(Debug, Clone)]
pub struct Packets<'a> {
    format: PacketFormat,
    chunks: Chunks<'a, u8>,
}

impl Iterator for Packets<'_> {
    type Item = LinkPacket;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        // Chunks never exceed the payload size.
        LinkPacket::from_payload(self.format, chunk).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Packets<'_> {}

impl FusedIterator for Packets<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn aligned_buffer_splits_into_exact_packets() {
        let data = buffer(63 * 3);
        let packets: Vec<_> = Splitter::default().split(&data).unwrap().collect();

        assert_eq!(packets.len(), 3);
        for (i, packet) in packets.iter().enumerate() {
            assert_eq!(packet.len(), 64);
            assert_eq!(packet.header(), 63);
            assert_eq!(packet.payload(), &data[i * 63..(i + 1) * 63]);
        }

        let rebuilt: Vec<u8> = packets
            .iter()
            .flat_map(|p| p.payload().iter().copied())
            .collect();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn trailing_bytes_are_padded_by_default() {
        let data = buffer(63 * 2 + 10);
        let packets: Vec<_> = Splitter::default().split(&data).unwrap().collect();

        assert_eq!(packets.len(), 3);
        let last = &packets[2];
        assert_eq!(last.header(), 63);
        assert_eq!(&last.payload()[..10], &data[126..]);
        assert!(last.payload()[10..].iter().all(|b| *b == 0));
    }

    #[test]
    fn trailing_bytes_rejected_when_configured() {
        let splitter = Splitter::new(PacketFormat::default(), TrailingBytes::Reject);
        let data = buffer(63 * 2 + 10);

        let err = splitter.split(&data).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Misaligned {
                len: 136,
                payload_size: 63
            }
        ));

        // Same splitter, same answer.
        assert!(splitter.split(&data).is_err());
        assert_eq!(splitter.split(&buffer(126)).unwrap().count(), 2);
    }

    #[test]
    fn empty_buffer_yields_no_packets() {
        assert_eq!(Splitter::default().split(&[]).unwrap().count(), 0);
        let strict = Splitter::new(PacketFormat::default(), TrailingBytes::Reject);
        assert_eq!(strict.split(&[]).unwrap().count(), 0);
    }

    #[test]
    fn header_is_payload_size_not_bytes_used() {
        let format = PacketFormat::new(8).unwrap();
        let packets: Vec<_> = Splitter::new(format, TrailingBytes::Pad)
            .split(b"abc")
            .unwrap()
            .collect();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].header(), 8);
        assert_eq!(packets[0].as_bytes(), b"\x08abc\0\0\0\0\0");
    }

    #[test]
    fn packets_is_exact_size_and_lazy() {
        let data = buffer(63 * 4 + 1);
        let mut packets = Splitter::default().split(&data).unwrap();
        assert_eq!(packets.len(), 5);
        packets.next();
        assert_eq!(packets.len(), 4);
    }

    #[test]
    fn packet_count_matches_split() {
        let pad = Splitter::default();
        let strict = Splitter::new(PacketFormat::default(), TrailingBytes::Reject);
        assert_eq!(pad.packet_count(0), 0);
        assert_eq!(pad.packet_count(63), 1);
        assert_eq!(pad.packet_count(64), 2);
        assert_eq!(strict.packet_count(126), 2);
    }

    #[test]
    fn split_frame_uses_reference_format() {
        let data = buffer(100);
        let packets: Vec<_> = split_frame(&data).collect();
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.len() == 64 && p.header() == 63));
    }
}
