use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod packets;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the link packets a message is split into.
    Packets(PacketsArgs),
    /// Send one message to a device emulator.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Packets(args) => packets::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// Message kind written into the envelope header.
    #[arg(long, short = 'k', default_value = "0")]
    pub kind: u16,
    /// Raw string body.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex-encoded body (whitespace ignored).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read body from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn body(&self) -> CliResult<Vec<u8>> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(hex) = &self.hex {
            return parse_hex(hex);
        }
        if let Some(path) = &self.file {
            return fs::read(path).map_err(|err| {
                crate::exit::io_error(&format!("failed reading {}", path.display()), err)
            });
        }
        Ok(Vec::new())
    }
}

#[derive(Args, Debug)]
pub struct PacketsArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Fail instead of zero-padding a final partial packet.
    #[arg(long)]
    pub reject_trailing: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Emulator address (`host:port`), or socket path with --unix.
    pub target: Option<String>,
    /// Treat TARGET as a Unix domain socket path.
    #[arg(long)]
    pub unix: bool,
    /// Device specification JSON file (host, port, name).
    #[arg(long, value_name = "FILE", env = "HIDLINK_DEVICE_SPEC")]
    pub spec: Option<PathBuf>,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Wait for one reply message and print it.
    #[arg(long)]
    pub wait: bool,
    /// Read an acknowledgement after every packet written.
    #[arg(long)]
    pub ack: bool,
    /// I/O timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "--hex must have an even number of digits"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).unwrap_or("");
            u8::from_str_radix(text, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte: {text:?}")))
        })
        .collect()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
