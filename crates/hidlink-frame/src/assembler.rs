use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::envelope::envelope_len;
use crate::error::{FrameError, Result};
use crate::packet::{FrameConfig, LinkPacket, PacketFormat};

/// Reassembles inbound link packets into complete frame buffers.
///
/// Message boundaries come from the envelope header carried at the start of
/// the first packet. Padding after the declared length is discarded.
#[derive(Debug)]
pub struct PacketAssembler {
    format: PacketFormat,
    max_message_size: usize,
    buf: BytesMut,
}

impl PacketAssembler {
    /// Create an assembler for the given packet format.
    pub fn new(format: PacketFormat, max_message_size: usize) -> Self {
        Self {
            format,
            max_message_size,
            buf: BytesMut::new(),
        }
    }

    /// Create an assembler from the shared frame configuration.
    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(config.format, config.max_message_size)
    }

    pub fn format(&self) -> PacketFormat {
        self.format
    }

    /// Feed raw wire bytes for one packet.
    pub fn push_wire(&mut self, wire: impl Into<Bytes>) -> Result<Option<Bytes>> {
        let packet = LinkPacket::from_wire(self.format, wire)?;
        self.push(&packet)
    }

    /// Feed one packet.
    ///
    /// Returns the complete frame buffer once the last packet of a message
    /// has arrived. On error the partial message is discarded.
    pub fn push(&mut self, packet: &LinkPacket) -> Result<Option<Bytes>> {
        if packet.len() != self.format.packet_len() {
            self.reset();
            return Err(FrameError::InvalidPacketSize {
                size: packet.len(),
                expected: self.format.packet_len(),
            });
        }
        if packet.header() != self.format.header() {
            self.reset();
            return Err(FrameError::InvalidPacketHeader {
                expected: self.format.header(),
                found: packet.header(),
            });
        }

        trace!(packet = %packet.hex(), "< packet");
        self.buf.extend_from_slice(packet.payload());

        let total = match envelope_len(&self.buf, self.max_message_size) {
            Ok(Some(total)) => total,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        if self.buf.len() < total {
            return Ok(None);
        }

        let frame = self.buf.split_to(total).freeze();
        self.buf.clear();
        Ok(Some(frame))
    }

    /// Bytes buffered for an incomplete message.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partially assembled message.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for PacketAssembler {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}
