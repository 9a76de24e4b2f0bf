use std::path::Path;
use std::time::Duration;

use hidlink_frame::{FrameConfig, TrailingBytes};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MONITOR_INTERVAL_MS: u64 = 500;

/// Whether the device expects an acknowledgement after each outbound packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAck {
    /// Packets are written back to back.
    #[default]
    None,
    /// Read and discard one inbound frame after every packet written.
    ReadAfterEachPacket,
}

/// Runtime behavior of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Packet layout, trailing-byte policy and reassembly limit.
    pub frame: FrameConfig,
    /// Timeout applied to each blocking transport operation, in
    /// milliseconds. `None` blocks indefinitely. Default: 5000.
    pub io_timeout_ms: Option<u64>,
    /// Per-packet acknowledgement handshake.
    pub write_ack: WriteAck,
    /// Delay between monitor cycles, in milliseconds. Default: 500.
    pub monitor_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            io_timeout_ms: Some(DEFAULT_IO_TIMEOUT_MS),
            write_ack: WriteAck::None,
            monitor_interval_ms: DEFAULT_MONITOR_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    /// Override the I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Override the trailing-byte policy.
    pub fn with_trailing(mut self, trailing: TrailingBytes) -> Self {
        self.frame.trailing = trailing;
        self
    }

    /// Override the per-packet acknowledgement mode.
    pub fn with_write_ack(mut self, write_ack: WriteAck) -> Self {
        self.write_ack = write_ack;
        self
    }

    /// Override the monitor interval.
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// Reject zero durations. Use `io_timeout_ms: None` to block indefinitely.
    pub fn validate(&self) -> Result<()> {
        if self.io_timeout_ms == Some(0) {
            return Err(SessionError::InvalidConfig("io_timeout_ms must be greater than zero"));
        }
        if self.monitor_interval_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "monitor_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// USB vendor/product identifier pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Where and what a device is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSpecification {
    /// Human-readable device name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Emulator host.
    pub host: String,
    /// Emulator port.
    pub port: u16,
    /// USB identifiers of the physical device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usb: Option<UsbId>,
}

impl Default for DeviceSpecification {
    fn default() -> Self {
        Self {
            name: "TREZOR The Bitcoin Safe".to_string(),
            description: "The hardware Bitcoin wallet. A step in the evolution of Bitcoin towards a completely safe payment system.".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            usb: Some(UsbId {
                vendor_id: 0x534c,
                product_id: 0x0001,
            }),
        }
    }
}

impl DeviceSpecification {
    /// Parse a specification from JSON. Missing fields take default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a specification from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// `host:port` of the emulator.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.io_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cfg.write_ack, WriteAck::None);
        assert_eq!(cfg.frame.trailing, TrailingBytes::Pad);
        assert_eq!(cfg.monitor_interval(), Duration::from_millis(500));
    }

    #[test]
    fn builder_overrides() {
        let cfg = SessionConfig::default()
            .with_io_timeout(None)
            .with_trailing(TrailingBytes::Reject)
            .with_write_ack(WriteAck::ReadAfterEachPacket)
            .with_monitor_interval(Duration::from_millis(20));

        assert_eq!(cfg.io_timeout(), None);
        assert_eq!(cfg.frame.trailing, TrailingBytes::Reject);
        assert_eq!(cfg.write_ack, WriteAck::ReadAfterEachPacket);
        assert_eq!(cfg.monitor_interval_ms, 20);
    }

    #[test]
    fn session_config_from_json() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"write_ack":"read_after_each_packet","io_timeout_ms":null,"frame":{"trailing":"reject"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.write_ack, WriteAck::ReadAfterEachPacket);
        assert_eq!(cfg.io_timeout(), None);
        assert_eq!(cfg.frame.trailing, TrailingBytes::Reject);
        assert_eq!(cfg.monitor_interval_ms, DEFAULT_MONITOR_INTERVAL_MS);
    }

    #[test]
    fn zero_durations_fail_validation() {
        assert!(SessionConfig::default().validate().is_ok());
        assert!(SessionConfig::default()
            .with_io_timeout(None)
            .validate()
            .is_ok());

        let cfg: SessionConfig = serde_json::from_str(r#"{"monitor_interval_ms":0}"#).unwrap();
        assert!(matches!(cfg.validate(), Err(SessionError::InvalidConfig(_))));

        let cfg = SessionConfig::default().with_io_timeout(Some(Duration::ZERO));
        assert!(matches!(cfg.validate(), Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn default_specification_describes_reference_device() {
        let spec = DeviceSpecification::default();
        assert_eq!(spec.name, "TREZOR The Bitcoin Safe");
        assert_eq!(spec.socket_addr(), "127.0.0.1:3000");
        assert_eq!(spec.usb.unwrap().vendor_id, 0x534c);
    }

    #[test]
    fn specification_partial_json_uses_defaults() {
        let spec =
            DeviceSpecification::from_json_str(r#"{"host":"192.168.0.8","port":21324}"#).unwrap();
        assert_eq!(spec.socket_addr(), "192.168.0.8:21324");
        assert_eq!(spec.name, DeviceSpecification::default().name);
    }

    #[test]
    fn specification_invalid_json() {
        let err = DeviceSpecification::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn specification_from_file() {
        let dir = std::env::temp_dir().join(format!("hidlink-spec-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("device.json");
        std::fs::write(&path, r#"{"name":"bench unit","port":4000}"#).unwrap();

        let spec = DeviceSpecification::from_json_file(&path).unwrap();
        assert_eq!(spec.name, "bench unit");
        assert_eq!(spec.port, 4000);

        let missing = DeviceSpecification::from_json_file(dir.join("missing.json")).unwrap_err();
        assert!(matches!(missing, SessionError::ConfigIo { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
