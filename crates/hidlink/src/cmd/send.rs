use hidlink_frame::{Envelope, EnvelopeCodec, MessageCodec};
use hidlink_session::{DeviceSpecification, Session, SessionConfig, SessionError, WriteAck};
use hidlink_transport::PacketTransport;
use tracing::info;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let write_ack = if args.ack {
        WriteAck::ReadAfterEachPacket
    } else {
        WriteAck::None
    };
    let config = SessionConfig::default()
        .with_io_timeout(Some(timeout))
        .with_write_ack(write_ack);
    let message = Envelope::new(args.payload.kind, args.payload.body()?);

    if args.unix {
        let path = args
            .target
            .as_deref()
            .ok_or_else(|| CliError::new(USAGE, "--unix requires a socket path"))?;
        #[cfg(unix)]
        {
            let session = hidlink_session::connect_unix(path, EnvelopeCodec::default(), config)
                .map_err(|err| session_error("connect failed", err))?;
            return exchange(&session, &message, args.wait, format);
        }
        #[cfg(not(unix))]
        {
            let _ = (path, config);
            return Err(CliError::new(
                USAGE,
                "--unix is only supported on Unix platforms",
            ));
        }
    }

    let spec = resolve_spec(&args)?;
    let session = hidlink_session::connect_socket(&spec, EnvelopeCodec::default(), config)
        .map_err(|err| session_error("connect failed", err))?;
    exchange(&session, &message, args.wait, format)
}

fn resolve_spec(args: &SendArgs) -> CliResult<DeviceSpecification> {
    let mut spec = match &args.spec {
        Some(path) => DeviceSpecification::from_json_file(path)
            .map_err(|err| session_error("invalid device specification", err))?,
        None => DeviceSpecification::default(),
    };

    if let Some(target) = &args.target {
        let (host, port) = target
            .rsplit_once(':')
            .ok_or_else(|| CliError::new(USAGE, format!("expected host:port, got {target:?}")))?;
        spec.port = port
            .parse()
            .map_err(|_| CliError::new(USAGE, format!("invalid port: {port:?}")))?;
        spec.host = host.to_string();
    }

    Ok(spec)
}

fn exchange<T, C>(
    session: &Session<T, C>,
    message: &Envelope,
    wait: bool,
    format: OutputFormat,
) -> CliResult<i32>
where
    T: PacketTransport,
    C: MessageCodec<Message = Envelope>,
{
    let result = write_and_wait(session, message, wait);
    // Disconnect regardless, but report the first error.
    let closed = session.disconnect();

    let reply = result.map_err(|err| session_error("exchange failed", err))?;
    closed.map_err(|err| session_error("disconnect failed", err))?;

    if let Some(reply) = reply {
        print_message(&reply, session.id(), format);
    }
    Ok(SUCCESS)
}

fn write_and_wait<T, C>(
    session: &Session<T, C>,
    message: &Envelope,
    wait: bool,
) -> Result<Option<Envelope>, SessionError>
where
    T: PacketTransport,
    C: MessageCodec<Message = Envelope>,
{
    session.write_message(message)?;
    info!(session = session.id(), kind = message.kind, "message sent");
    if !wait {
        return Ok(None);
    }
    session.read_message().map(Some)
}
