use bytes::{Bytes, BytesMut};

use crate::envelope::{decode_envelope, encode_envelope, envelope_len, Envelope};
use crate::error::{FrameError, Result};
use crate::packet::DEFAULT_MAX_MESSAGE;

/// Converts structured messages to and from frame buffers.
///
/// This is the seam to the message schema layer. The framing code never
/// looks inside a message; it only splits and reassembles the bytes this
/// trait produces and consumes.
///
/// Implementations report their own encoding failures as
/// [`FrameError::Codec`].
pub trait MessageCodec {
    /// The structured message type.
    type Message;

    /// Serialize a message into a flat frame buffer.
    fn encode(&self, message: &Self::Message) -> Result<Bytes>;

    /// Deserialize one complete frame buffer.
    fn decode(&self, frame: Bytes) -> Result<Self::Message>;
}

/// Reference codec: messages are [`Envelope`]s with opaque bodies.
#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    max_body: usize,
}

impl EnvelopeCodec {
    pub fn new(max_body: usize) -> Self {
        Self { max_body }
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE)
    }
}

impl MessageCodec for EnvelopeCodec {
    type Message = Envelope;

    fn encode(&self, message: &Envelope) -> Result<Bytes> {
        if message.body.len() > self.max_body {
            return Err(FrameError::PayloadTooLarge {
                size: message.body.len(),
                max: self.max_body,
            });
        }
        let mut buf = BytesMut::with_capacity(message.wire_size());
        encode_envelope(message.kind, &message.body, &mut buf)?;
        Ok(buf.freeze())
    }

    fn decode(&self, frame: Bytes) -> Result<Envelope> {
        let have = frame.len();
        let mut buf = BytesMut::from(frame.as_ref());
        match decode_envelope(&mut buf, self.max_body)? {
            Some(envelope) => Ok(envelope),
            None => {
                let need = envelope_len(&frame, self.max_body)?
                    .unwrap_or(crate::envelope::ENVELOPE_HEADER_SIZE);
                Err(FrameError::Incomplete { have, need })
            }
        }
    }
}

impl<C: MessageCodec + ?Sized> MessageCodec for &C {
    type Message = C::Message;

    fn encode(&self, message: &Self::Message) -> Result<Bytes> {
        (**self).encode(message)
    }

    fn decode(&self, frame: Bytes) -> Result<Self::Message> {
        (**self).decode(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ENVELOPE_HEADER_SIZE;

    #[test]
    fn encode_produces_envelope_frame() {
        let codec = EnvelopeCodec::default();
        let frame = codec.encode(&Envelope::new(55, &b"body"[..])).unwrap();

        assert_eq!(frame.len(), ENVELOPE_HEADER_SIZE + 4);
        assert_eq!(&frame[..2], b"##");
        assert_eq!(&frame[ENVELOPE_HEADER_SIZE..], b"body");
    }

    #[test]
    fn decode_reads_back_kind_and_body() {
        let codec = EnvelopeCodec::default();
        let frame = codec.encode(&Envelope::new(7, &b"features"[..])).unwrap();

        let envelope = codec.decode(frame).unwrap();
        assert_eq!(envelope.kind, 7);
        assert_eq!(envelope.body.as_ref(), b"features");
    }

    #[test]
    fn decode_truncated_frame_is_incomplete() {
        let codec = EnvelopeCodec::default();
        let frame = codec.encode(&Envelope::new(1, &b"0123456789"[..])).unwrap();
        let truncated = frame.slice(..12);

        let err = codec.decode(truncated).unwrap_err();
        assert!(matches!(err, FrameError::Incomplete { have: 12, need: 18 }));

        let err = codec.decode(Bytes::from_static(b"##")).unwrap_err();
        assert!(matches!(err, FrameError::Incomplete { have: 2, need: 8 }));
    }

    #[test]
    fn encode_respects_body_limit() {
        let codec = EnvelopeCodec::new(3);
        let err = codec.encode(&Envelope::new(1, &b"four"[..])).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 4, max: 3 }));
    }

    struct Utf8Codec;

    impl MessageCodec for Utf8Codec {
        type Message = String;

        fn encode(&self, message: &String) -> Result<Bytes> {
            Ok(Bytes::copy_from_slice(message.as_bytes()))
        }

        fn decode(&self, frame: Bytes) -> Result<String> {
            String::from_utf8(frame.to_vec()).map_err(|err| FrameError::Codec(err.to_string()))
        }
    }

    #[test]
    fn custom_codec_reports_codec_error() {
        let codec = Utf8Codec;
        let frame = codec.encode(&"trezor".to_string()).unwrap();
        assert_eq!(codec.decode(frame).unwrap(), "trezor");

        let err = codec.decode(Bytes::from_static(&[0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, FrameError::Codec(_)));
        assert!(err.to_string().starts_with("codec error: "));
    }

    #[test]
    fn codec_by_reference() {
        fn roundtrip<C: MessageCodec<Message = Envelope>>(codec: C) -> Envelope {
            let frame = codec.encode(&Envelope::new(2, &b"x"[..])).unwrap();
            codec.decode(frame).unwrap()
        }

        let codec = EnvelopeCodec::default();
        assert_eq!(roundtrip(&codec).kind, 2);
    }
}
