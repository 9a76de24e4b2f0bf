use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use hidlink_frame::{MessageCodec, Splitter};
use hidlink_transport::{PacketTransport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::config::{SessionConfig, WriteAck};
use crate::error::{Result, SessionError};
use crate::monitor::{DeviceMonitor, MonitorHandle};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Device open; writes and reads allowed.
    Open,
    /// Teardown in progress.
    Closing,
    /// Torn down. Terminal.
    Closed,
}

struct Inner<T> {
    state: SessionState,
    transport: Option<T>,
    monitor: Option<MonitorHandle>,
}

impl<T> Inner<T> {
    fn open_transport(&mut self) -> Result<&mut T> {
        match (self.state, self.transport.as_mut()) {
            (SessionState::Open, Some(transport)) => Ok(transport),
            _ => Err(SessionError::Closed),
        }
    }
}

/// One open connection to a device.
///
/// The session exclusively owns its transport and monitor task. Writes,
/// reads and teardown all run under one session-wide lock, so at most one
/// thread touches the transport at a time and no I/O overlaps teardown.
pub struct Session<T, C> {
    id: String,
    transport_name: &'static str,
    codec: C,
    splitter: Splitter,
    config: SessionConfig,
    inner: Mutex<Inner<T>>,
}

impl<T, C> Session<T, C>
where
    T: PacketTransport,
    C: MessageCodec,
{
    /// Open a session over a connected transport, without a monitor task.
    ///
    /// Applies the configured I/O timeout to the transport. Zero durations in
    /// `config` fail with [`SessionError::InvalidConfig`].
    pub fn open(transport: T, codec: C, config: SessionConfig) -> Result<Self> {
        Self::build(transport, codec, config, |_| Ok(None))
    }

    /// Open a session and start `monitor` on a background thread.
    pub fn open_with_monitor<M: DeviceMonitor>(
        transport: T,
        codec: C,
        config: SessionConfig,
        monitor: M,
    ) -> Result<Self> {
        let interval = config.monitor_interval();
        Self::build(transport, codec, config, move |id| {
            MonitorHandle::spawn(id, interval, monitor)
                .map(Some)
                .map_err(SessionError::Monitor)
        })
    }

    /// Open a session and start `monitor` as a tokio task.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn open_with_async_monitor<M: DeviceMonitor>(
        transport: T,
        codec: C,
        config: SessionConfig,
        monitor: M,
    ) -> Result<Self> {
        let interval = config.monitor_interval();
        Self::build(transport, codec, config, move |id| {
            MonitorHandle::spawn_async(id, interval, monitor)
                .map(Some)
                .map_err(SessionError::Monitor)
        })
    }

    fn build(
        mut transport: T,
        codec: C,
        config: SessionConfig,
        start_monitor: impl FnOnce(&str) -> Result<Option<MonitorHandle>>,
    ) -> Result<Self> {
        config.validate()?;
        transport.set_io_timeout(config.io_timeout())?;

        let id = format!("session-{}", NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let monitor = start_monitor(&id)?;
        let transport_name = transport.transport_name();

        info!(session = %id, transport = transport_name, "session open");

        Ok(Self {
            id,
            transport_name,
            codec,
            splitter: Splitter::from_config(&config.frame),
            config,
            inner: Mutex::new(Inner {
                state: SessionState::Open,
                transport: Some(transport),
                monitor,
            }),
        })
    }

    /// Encode `message`, split it into link packets and write them in order.
    ///
    /// The first failed packet write aborts the rest of the message.
    pub fn write_message(&self, message: &C::Message) -> Result<()> {
        let mut inner = self.lock();
        let transport = inner.open_transport()?;

        let frame = self.codec.encode(message)?;
        let packets = self.splitter.split(&frame)?;
        debug!(
            session = %self.id,
            bytes = frame.len(),
            packets = packets.len(),
            "writing message"
        );

        for (index, packet) in packets.enumerate() {
            let written = transport.write_raw(&packet)?;
            if written != packet.len() {
                return Err(TransportError::ShortWrite {
                    written,
                    expected: packet.len(),
                }
                .into());
            }

            if self.config.write_ack == WriteAck::ReadAfterEachPacket {
                let ack = transport.read_raw()?;
                trace!(session = %self.id, index, len = ack.len(), "packet acknowledged");
            }
        }

        Ok(())
    }

    /// Block until one complete message has been read from the device.
    pub fn read_message(&self) -> Result<C::Message> {
        let mut inner = self.lock();
        let transport = inner.open_transport()?;

        let frame = transport.read_raw()?;
        debug!(session = %self.id, bytes = frame.len(), "read message");
        Ok(self.codec.decode(frame)?)
    }

    /// Close the device and cancel the monitor task.
    ///
    /// Runs at most once: later calls find the session `Closed` and return
    /// `Ok(())` without touching the transport. The monitor is cancelled,
    /// not awaited. A close-hook failure is returned after the session has
    /// still been fully torn down.
    pub fn disconnect(&self) -> Result<()> {
        let mut inner = self.lock();

        let close_result = match inner.state {
            SessionState::Closed => {
                debug!(session = %self.id, "already closed");
                return Ok(());
            }
            SessionState::Open => {
                inner.state = SessionState::Closing;
                match inner.transport.as_mut() {
                    Some(transport) => transport.close_device(),
                    None => Ok(()),
                }
            }
            // An earlier teardown was interrupted after the close hook ran.
            SessionState::Closing => Ok(()),
        };

        if let Some(monitor) = inner.monitor.take() {
            monitor.cancel();
        }
        inner.transport = None;
        inner.state = SessionState::Closed;

        info!(session = %self.id, ok = close_result.is_ok(), "session closed");
        close_result.map_err(Into::into)
    }
}

impl<T, C> Session<T, C> {
    /// Session identifier used in logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &'static str {
        self.transport_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // A panic mid-operation leaves the state as it was; keep going.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T, C> Drop for Session<T, C> {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.state == SessionState::Closed {
            return;
        }

        if let Some(monitor) = inner.monitor.take() {
            monitor.cancel();
        }
        inner.state = SessionState::Closed;
        // Dropping the transport releases the device handle.
        if inner.transport.take().is_some() {
            warn!(session = %self.id, "session dropped without disconnect");
        }
    }
}

impl<T, C> fmt::Debug for Session<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("transport", &self.transport_name)
            .field("state", &self.state())
            .finish()
    }
}
