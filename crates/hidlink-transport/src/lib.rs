//! Packet transport abstraction for HID-class hardware devices.
//!
//! Provides a unified [`PacketTransport`] interface over different channels:
//! - USB HID devices (feature `usb`)
//! - Emulator sockets (TCP, or Unix domain sockets on Unix)
//! - An in-memory loopback for tests and simulators
//!
//! Every transport moves fixed-size link packets out and returns complete,
//! reassembled frame buffers in.

pub mod error;
pub mod memory;
pub mod socket;
pub mod stream;
pub mod traits;

#[cfg(feature = "usb")]
pub mod usb;

pub use error::{Result, TransportError};
pub use memory::{MemoryHandle, MemoryTransport};
pub use socket::SocketTransport;
pub use stream::LinkStream;
pub use traits::PacketTransport;

#[cfg(feature = "usb")]
pub use usb::UsbTransport;
