use std::io::{ErrorKind, Read, Write};
use std::net::ToSocketAddrs;
#[cfg(unix)]
use std::path::Path;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use hidlink_frame::{FrameConfig, FrameError, LinkPacket, PacketAssembler};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;
use crate::traits::PacketTransport;

/// Packet transport over an emulator socket.
///
/// Every link packet travels as one fixed-size chunk on the stream, so the
/// same 64-byte reports a USB HID device would see. A packet cut short by a
/// read timeout is kept and completed by the next read.
#[derive(Debug)]
pub struct SocketTransport {
    stream: LinkStream,
    assembler: PacketAssembler,
    partial: BytesMut,
    packet_len: usize,
    closed: bool,
}

impl SocketTransport {
    /// Connect to a TCP emulator with the default frame configuration.
    pub fn connect_tcp(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        Ok(Self::new(LinkStream::connect_tcp(addr)?, &FrameConfig::default()))
    }

    /// Connect to a Unix socket emulator with the default frame configuration.
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(
            LinkStream::connect_unix(path)?,
            &FrameConfig::default(),
        ))
    }

    /// Wrap a connected stream.
    pub fn new(stream: LinkStream, config: &FrameConfig) -> Self {
        Self {
            stream,
            assembler: PacketAssembler::from_config(config),
            partial: BytesMut::with_capacity(config.format.packet_len()),
            packet_len: config.format.packet_len(),
            closed: false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &LinkStream {
        &self.stream
    }

    fn read_packet(&mut self) -> Result<Bytes> {
        // Packets are at most 256 bytes (u8 payload size + header).
        let mut chunk = [0u8; 256];
        while self.partial.len() < self.packet_len {
            let want = self.packet_len - self.partial.len();
            match self.stream.read(&mut chunk[..want]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => self.partial.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(self.partial.split_to(self.packet_len).freeze())
    }
}

impl PacketTransport for SocketTransport {
    fn write_raw(&mut self, packet: &LinkPacket) -> Result<usize> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        if packet.len() != self.packet_len {
            return Err(FrameError::InvalidPacketSize {
                size: packet.len(),
                expected: self.packet_len,
            }
            .into());
        }

        let bytes = packet.as_bytes();
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.stream.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.stream.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        trace!(packet = %packet.hex(), "> packet");
        Ok(offset)
    }

    fn read_raw(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        loop {
            let packet = self.read_packet()?;
            if let Some(frame) = self.assembler.push_wire(packet)? {
                debug!(len = frame.len(), "reassembled frame");
                return Ok(frame);
            }
        }
    }

    fn close_device(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.assembler.reset();
        self.partial.clear();
        debug!(kind = self.stream.kind(), "closing emulator socket");
        self.stream.shutdown()
    }

    fn set_io_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        self.stream.set_write_timeout(timeout)
    }

    fn transport_name(&self) -> &'static str {
        "emulator-socket"
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use bytes::BytesMut;
    use hidlink_frame::{encode_envelope, split_frame, REPORT_SIZE};

    use super::*;

    fn envelope(kind: u16, body: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_envelope(kind, body, &mut buf).unwrap();
        buf
    }

    #[test]
    fn writes_packets_and_reads_reply_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let device = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut request = [0u8; REPORT_SIZE * 2];
            conn.read_exact(&mut request).unwrap();

            let reply = envelope(2, &[0xEE; 100]);
            for packet in split_frame(&reply) {
                conn.write_all(packet.as_bytes()).unwrap();
            }
            request
        });

        let mut transport = SocketTransport::connect_tcp(addr).unwrap();
        transport
            .set_io_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        let outbound = envelope(1, &[0x11; 70]);
        let packets: Vec<_> = split_frame(&outbound).collect();
        assert_eq!(packets.len(), 2);
        for packet in &packets {
            assert_eq!(transport.write_raw(packet).unwrap(), REPORT_SIZE);
        }

        let frame = transport.read_raw().unwrap();
        assert_eq!(frame.as_ref(), envelope(2, &[0xEE; 100]).as_ref());

        let request = device.join().unwrap();
        assert_eq!(&request[..REPORT_SIZE], packets[0].as_bytes());
        assert_eq!(&request[REPORT_SIZE..], packets[1].as_bytes());

        transport.close_device().unwrap();
    }

    #[test]
    fn read_after_peer_hangup_is_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let device = std::thread::spawn(move || {
            let (conn, _) = listener.accept().unwrap();
            drop(conn);
        });

        let mut transport = SocketTransport::connect_tcp(addr).unwrap();
        device.join().unwrap();

        let err = transport.read_raw().unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }

    #[test]
    fn io_after_close_is_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let device = std::thread::spawn(move || listener.accept().unwrap());

        let mut transport = SocketTransport::connect_tcp(addr).unwrap();
        let _conn = device.join().unwrap();

        transport.close_device().unwrap();
        transport.close_device().unwrap();

        let packet = split_frame(&envelope(1, b"x")).next().unwrap();
        assert!(matches!(
            transport.write_raw(&packet),
            Err(TransportError::Shutdown)
        ));
        assert!(matches!(
            transport.read_raw(),
            Err(TransportError::Shutdown)
        ));
    }

    #[test]
    fn connect_refused_reports_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = SocketTransport::connect_tcp(addr).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[test]
    fn read_timeout_surfaces_as_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let device = std::thread::spawn(move || listener.accept().unwrap());

        let mut transport = SocketTransport::connect_tcp(addr).unwrap();
        let _conn = device.join().unwrap();
        transport
            .set_io_timeout(Some(Duration::from_millis(20)))
            .unwrap();

        let err = transport.read_raw().unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    #[cfg(unix)]
    fn timeout_mid_packet_resumes_on_next_read() {
        let (left, mut right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut transport =
            SocketTransport::new(LinkStream::from_unix(left), &FrameConfig::default());
        transport
            .set_io_timeout(Some(Duration::from_millis(100)))
            .unwrap();

        let reply = envelope(5, b"pong");
        let packet = split_frame(&reply).next().unwrap();
        let wire = packet.as_bytes();

        right.write_all(&wire[..10]).unwrap();
        let err = transport.read_raw().unwrap_err();
        assert!(err.is_timeout());

        right.write_all(&wire[10..]).unwrap();
        assert_eq!(transport.read_raw().unwrap().as_ref(), reply.as_ref());
    }

    #[test]
    #[cfg(unix)]
    fn wrong_size_packet_is_rejected_before_writing() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let config = FrameConfig {
            format: hidlink_frame::PacketFormat::new(7).unwrap(),
            ..FrameConfig::default()
        };
        let mut transport = SocketTransport::new(LinkStream::from_unix(left), &config);

        let packet = split_frame(&envelope(1, b"x")).next().unwrap();
        let err = transport.write_raw(&packet).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Frame(FrameError::InvalidPacketSize {
                size: 64,
                expected: 8
            })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn unix_stream_pair_roundtrip() {
        let (left, mut right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut transport =
            SocketTransport::new(LinkStream::from_unix(left), &FrameConfig::default());

        let reply = envelope(5, b"pong");
        for packet in split_frame(&reply) {
            right.write_all(packet.as_bytes()).unwrap();
        }

        assert_eq!(transport.read_raw().unwrap().as_ref(), reply.as_ref());
        assert_eq!(transport.transport_name(), "emulator-socket");
    }
}
