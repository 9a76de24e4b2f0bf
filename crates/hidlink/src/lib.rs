//! Packet framing and session lifecycle for HID-class hardware security devices.
//!
//! hidlink turns arbitrarily long messages into the fixed-size packets a
//! hardware wallet's HID channel expects, and gives every transport the same
//! write / read / disconnect lifecycle.
//!
//! # Crate Structure
//!
//! - [`frame`]: Link packets, frame splitting, envelope codec and reassembly
//! - [`transport`]: Packet transports (emulator socket, loopback, USB HID behind `usb`)
//! - [`session`]: Session lifecycle, monitor task and message write/read

/// Re-export frame types.
pub mod frame {
    pub use hidlink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use hidlink_transport::*;
}

/// Re-export session types.
pub mod session {
    pub use hidlink_session::*;
}
