//! Device session management for HID-class hardware devices.
//!
//! This is the "just works" layer. Open a session over any packet
//! transport, write and read whole messages, and tear it down exactly once.

pub mod config;
pub mod connector;
pub mod error;
pub mod monitor;
pub mod session;

pub use config::{DeviceSpecification, SessionConfig, UsbId, WriteAck};
#[cfg(unix)]
pub use connector::connect_unix;
#[cfg(feature = "usb")]
pub use connector::connect_usb;
pub use connector::connect_socket;
pub use error::{Result, SessionError};
pub use monitor::{DeviceMonitor, MonitorHandle, MonitorStatus};
pub use session::{Session, SessionState};
