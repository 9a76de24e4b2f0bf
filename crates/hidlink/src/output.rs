use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hidlink_frame::{hex_dump, Envelope, LinkPacket};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput {
    index: usize,
    header: u8,
    hex: String,
}

#[derive(Serialize)]
struct PacketsOutput {
    kind: u16,
    frame_size: usize,
    packet_count: usize,
    packets: Vec<PacketOutput>,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    session: &'a str,
    kind: u16,
    body_size: usize,
    body_hex: String,
}

pub fn print_packets(kind: u16, frame_size: usize, packets: &[LinkPacket], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketsOutput {
                kind,
                frame_size,
                packet_count: packets.len(),
                packets: packets
                    .iter()
                    .enumerate()
                    .map(|(index, packet)| PacketOutput {
                        index,
                        header: packet.header(),
                        hex: packet.hex(),
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PACKET", "HEADER", "BYTES"]);
            for (index, packet) in packets.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    packet.header().to_string(),
                    packet.hex(),
                ]);
            }
            println!("kind={kind} frame_size={frame_size} packets={}", packets.len());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, packet) in packets.iter().enumerate() {
                println!("Packet [{index}]: {}", packet.hex());
            }
        }
    }
}

pub fn print_message(message: &Envelope, session: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                session,
                kind: message.kind,
                body_size: message.body.len(),
                body_hex: hex_dump(&message.body),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "SIZE", "SESSION", "BODY"])
                .add_row(vec![
                    message.kind.to_string(),
                    message.body.len().to_string(),
                    session.to_string(),
                    body_preview(&message.body),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "kind={} size={} session={} body={}",
                message.kind,
                message.body.len(),
                session,
                body_preview(&message.body)
            );
        }
    }
}

fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => hex_dump(body),
    }
}
