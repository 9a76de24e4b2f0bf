use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use hidlink_frame::{FrameConfig, LinkPacket, PacketAssembler, Splitter};
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::PacketTransport;

#[derive(Debug, Default)]
struct MemoryState {
    written: Vec<LinkPacket>,
    inbound: VecDeque<LinkPacket>,
    write_calls: usize,
    read_calls: usize,
    close_calls: usize,
    fail_write_at: Option<usize>,
    fail_close: bool,
}

/// In-memory loopback transport.
///
/// Records every written packet and serves queued inbound packets. A
/// [`MemoryHandle`] shares the same state, so a test (or an in-process
/// device simulator) can inspect and drive the transport after it has
/// been moved into a session.
#[derive(Debug)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
    assembler: PacketAssembler,
}

/// Shared view of a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
    config: FrameConfig,
}

impl MemoryTransport {
    /// Create a loopback transport with the default frame configuration.
    pub fn new() -> (Self, MemoryHandle) {
        Self::with_config(FrameConfig::default())
    }

    /// Create a loopback transport with an explicit frame configuration.
    pub fn with_config(config: FrameConfig) -> (Self, MemoryHandle) {
        let state = Arc::new(Mutex::new(MemoryState::default()));
        let transport = Self {
            state: Arc::clone(&state),
            assembler: PacketAssembler::from_config(&config),
        };
        (transport, MemoryHandle { state, config })
    }
}

impl PacketTransport for MemoryTransport {
    fn write_raw(&mut self, packet: &LinkPacket) -> Result<usize> {
        let mut state = lock(&self.state);
        state.write_calls += 1;
        if state.fail_write_at == Some(state.write_calls) {
            return Err(TransportError::Device(format!(
                "injected write failure on packet {}",
                state.write_calls
            )));
        }
        trace!(packet = %packet.hex(), "> packet");
        state.written.push(packet.clone());
        Ok(packet.len())
    }

    fn read_raw(&mut self) -> Result<Bytes> {
        let mut state = lock(&self.state);
        state.read_calls += 1;
        loop {
            let Some(packet) = state.inbound.pop_front() else {
                self.assembler.reset();
                return Err(TransportError::Disconnected);
            };
            if let Some(frame) = self.assembler.push(&packet)? {
                return Ok(frame);
            }
        }
    }

    fn close_device(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.close_calls += 1;
        if state.fail_close {
            return Err(TransportError::Device("injected close failure".to_string()));
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

impl MemoryHandle {
    /// Queue one inbound frame buffer, split with the transport's format.
    pub fn push_frame(&self, frame: &[u8]) {
        let splitter = Splitter::new(self.config.format, Default::default());
        // Padding never fails.
        if let Ok(packets) = splitter.split(frame) {
            lock(&self.state).inbound.extend(packets);
        }
    }

    /// Queue one raw inbound packet.
    pub fn push_packet(&self, packet: LinkPacket) {
        lock(&self.state).inbound.push_back(packet);
    }

    /// Packets written so far, in order.
    pub fn written(&self) -> Vec<LinkPacket> {
        lock(&self.state).written.clone()
    }

    /// Number of `write_raw` calls, including failed ones.
    pub fn write_calls(&self) -> usize {
        lock(&self.state).write_calls
    }

    /// Number of `read_raw` calls.
    pub fn read_calls(&self) -> usize {
        lock(&self.state).read_calls
    }

    /// Number of `close_device` calls.
    pub fn close_calls(&self) -> usize {
        lock(&self.state).close_calls
    }

    /// Make the `n`-th `write_raw` call (1-based) fail.
    pub fn fail_write_at(&self, n: usize) {
        lock(&self.state).fail_write_at = Some(n);
    }

    /// Make every `close_device` call fail.
    pub fn fail_close(&self) {
        lock(&self.state).fail_close = true;
    }

    /// Inbound packets not yet consumed.
    pub fn pending_inbound(&self) -> usize {
        lock(&self.state).inbound.len()
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
