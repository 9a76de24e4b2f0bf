#[cfg(unix)]
use std::path::Path;

use hidlink_frame::MessageCodec;
use hidlink_transport::{LinkStream, SocketTransport};
use tracing::debug;

use crate::config::{DeviceSpecification, SessionConfig};
use crate::error::Result;
use crate::session::Session;

/// Open a session with a device emulator listening on `spec.host:spec.port`.
pub fn connect_socket<C: MessageCodec>(
    spec: &DeviceSpecification,
    codec: C,
    config: SessionConfig,
) -> Result<Session<SocketTransport, C>> {
    let addr = spec.socket_addr();
    let stream = LinkStream::connect_tcp(addr.as_str())?;
    let transport = SocketTransport::new(stream, &config.frame);
    debug!(device = %spec.name, %addr, "connected to emulator");
    Session::open(transport, codec, config)
}

/// Open a session with a device emulator listening on a Unix socket.
#[cfg(unix)]
pub fn connect_unix<C: MessageCodec>(
    path: impl AsRef<Path>,
    codec: C,
    config: SessionConfig,
) -> Result<Session<SocketTransport, C>> {
    let path = path.as_ref();
    let stream = LinkStream::connect_unix(path)?;
    let transport = SocketTransport::new(stream, &config.frame);
    debug!(?path, "connected to emulator");
    Session::open(transport, codec, config)
}

/// Open a session with the physical USB HID device described by `spec`.
#[cfg(feature = "usb")]
pub fn connect_usb<C: MessageCodec>(
    spec: &DeviceSpecification,
    codec: C,
    config: SessionConfig,
) -> Result<Session<hidlink_transport::UsbTransport, C>> {
    let usb = spec.usb.ok_or_else(|| {
        hidlink_transport::TransportError::Connect {
            addr: spec.name.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "device specification has no usb identifiers",
            ),
        }
    })?;
    let transport =
        hidlink_transport::UsbTransport::open(usb.vendor_id, usb.product_id, &config.frame)?;
    debug!(device = %spec.name, "connected to usb device");
    Session::open(transport, codec, config)
}
