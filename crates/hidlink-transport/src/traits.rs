use std::time::Duration;

use bytes::Bytes;
use hidlink_frame::LinkPacket;

use crate::error::Result;

/// Raw packet I/O over one physical channel.
///
/// Implementations own the device handle. All calls block the calling
/// thread; none of them retry on failure.
pub trait PacketTransport: Send {
    /// Write exactly one full-size link packet.
    ///
    /// Returns the number of bytes the channel accepted.
    fn write_raw(&mut self, packet: &LinkPacket) -> Result<usize>;

    /// Block until one complete frame buffer has been reassembled from
    /// inbound packets.
    fn read_raw(&mut self) -> Result<Bytes>;

    /// Release the device handle. Called once, during session teardown.
    fn close_device(&mut self) -> Result<()>;

    /// Bound the time a single `write_raw` or `read_raw` may block.
    ///
    /// `None` blocks indefinitely.
    fn set_io_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        let _ = timeout;
        Ok(())
    }

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: PacketTransport + ?Sized> PacketTransport for Box<T> {
    fn write_raw(&mut self, packet: &LinkPacket) -> Result<usize> {
        (**self).write_raw(packet)
    }

    fn read_raw(&mut self) -> Result<Bytes> {
        (**self).read_raw()
    }

    fn close_device(&mut self) -> Result<()> {
        (**self).close_device()
    }

    fn set_io_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_io_timeout(timeout)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
