use hidlink_frame::{
    Envelope, EnvelopeCodec, FrameConfig, LinkPacket, MessageCodec, Splitter, TrailingBytes,
};
use tracing::debug;

use crate::cmd::PacketsArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_packets, OutputFormat};

pub fn run(args: PacketsArgs, format: OutputFormat) -> CliResult<i32> {
    let body = args.payload.body()?;
    let trailing = if args.reject_trailing {
        TrailingBytes::Reject
    } else {
        TrailingBytes::Pad
    };

    let message = Envelope::new(args.payload.kind, body);
    let (frame_size, packets) = split_message(&message, trailing)?;
    debug!(frame_size, packets = packets.len(), "split message");

    print_packets(message.kind, frame_size, &packets, format);
    Ok(SUCCESS)
}

fn split_message(message: &Envelope, trailing: TrailingBytes) -> CliResult<(usize, Vec<LinkPacket>)> {
    let config = FrameConfig {
        trailing,
        ..FrameConfig::default()
    };
    let frame = EnvelopeCodec::new(config.max_message_size)
        .encode(message)
        .map_err(|err| frame_error("encode failed", err))?;
    let packets = Splitter::from_config(&config)
        .split(&frame)
        .map_err(|err| frame_error("split failed", err))?
        .collect();
    Ok((frame.len(), packets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    #[test]
    fn split_pads_by_default() {
        let message = Envelope::new(1, vec![0xAB; 60]);
        let (frame_size, packets) = split_message(&message, TrailingBytes::Pad).unwrap();
        assert_eq!(frame_size, 68);
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.len() == 64 && p.header() == 63));
    }

    #[test]
    fn split_rejects_misaligned_when_asked() {
        let message = Envelope::new(1, vec![0xAB; 60]);
        let err = split_message(&message, TrailingBytes::Reject).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let aligned = Envelope::new(1, vec![0xAB; 63 * 2 - 8]);
        let (_, packets) = split_message(&aligned, TrailingBytes::Reject).unwrap();
        assert_eq!(packets.len(), 2);
    }
}
