use std::time::Duration;

use bytes::Bytes;
use hidapi::{HidApi, HidDevice};
use hidlink_frame::{FrameConfig, LinkPacket, PacketAssembler};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::PacketTransport;

/// hidapi expects a leading report id; single-report devices use 0.
const REPORT_ID: u8 = 0x00;

/// Packet transport over a USB HID device.
pub struct UsbTransport {
    device: Option<HidDevice>,
    assembler: PacketAssembler,
    packet_len: usize,
    read_timeout_ms: i32,
    vendor_id: u16,
    product_id: u16,
}

impl UsbTransport {
    /// Open the first device matching `vendor_id:product_id`.
    pub fn open(vendor_id: u16, product_id: u16, config: &FrameConfig) -> Result<Self> {
        let addr = format!("usb {vendor_id:04x}:{product_id:04x}");
        let api = HidApi::new().map_err(|e| TransportError::Connect {
            addr: addr.clone(),
            source: std::io::Error::other(e.to_string()),
        })?;
        let device = api
            .open(vendor_id, product_id)
            .map_err(|e| TransportError::Connect {
                addr: addr.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;

        info!(%addr, "opened usb hid device");
        Ok(Self {
            device: Some(device),
            assembler: PacketAssembler::from_config(config),
            packet_len: config.format.packet_len(),
            read_timeout_ms: -1,
            vendor_id,
            product_id,
        })
    }

    fn device(&self) -> Result<&HidDevice> {
        self.device.as_ref().ok_or(TransportError::Shutdown)
    }
}

impl PacketTransport for UsbTransport {
    fn write_raw(&mut self, packet: &LinkPacket) -> Result<usize> {
        let device = self.device()?;
        let mut report = Vec::with_capacity(packet.len() + 1);
        report.push(REPORT_ID);
        report.extend_from_slice(packet.as_bytes());

        let written = device
            .write(&report)
            .map_err(|e| TransportError::Device(e.to_string()))?;
        // Some platforms count the report id, some don't.
        let written = written.min(packet.len());
        trace!(packet = %packet.hex(), "> packet");
        Ok(written)
    }

    fn read_raw(&mut self) -> Result<Bytes> {
        let mut report = vec![0u8; self.packet_len];
        loop {
            let read = self
                .device()?
                .read_timeout(&mut report, self.read_timeout_ms)
                .map_err(|e| TransportError::Device(e.to_string()))?;
            if read == 0 {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "usb hid read timed out",
                )));
            }
            if let Some(frame) = self.assembler.push_wire(report[..read].to_vec())? {
                return Ok(frame);
            }
        }
    }

    fn close_device(&mut self) -> Result<()> {
        if self.device.take().is_some() {
            self.assembler.reset();
            debug!(
                vendor_id = self.vendor_id,
                product_id = self.product_id,
                "released usb hid device"
            );
        }
        Ok(())
    }

    fn set_io_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.read_timeout_ms = match timeout {
            Some(t) => i32::try_from(t.as_millis()).unwrap_or(i32::MAX),
            None => -1,
        };
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "usb-hid"
    }
}

impl std::fmt::Debug for UsbTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbTransport")
            .field("vendor_id", &format_args!("{:04x}", self.vendor_id))
            .field("product_id", &format_args!("{:04x}", self.product_id))
            .field("open", &self.device.is_some())
            .finish()
    }
}
