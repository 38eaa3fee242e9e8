// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Decodes NT Kernel Logger records and writes them as JSON.
//!
//! Usage: `decode_kernel [FILE]...`
//!
//! Each file contains a sequence of records, each of which is a u32 size
//! (little-endian, including the size itself), an 80-byte `EVENT_HEADER`, and
//! the payload. With no files, decodes a few built-in sample records.
//!
//! Set `RUST_LOG=debug` (or `trace`) to see decoder diagnostics.

use std::env;
use std::fs;
use std::process;

use etw_decode::kernel_schemas;
use etw_decode::*;
use etw_types::*;
use tracing_subscriber::EnvFilter;

fn push_utf16(bytes: &mut Vec<u8>, text: &str) {
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
}

fn push_record(dat: &mut Vec<u8>, schema: &EventSchema<'_>, timestamp: i64, payload: &[u8]) {
    let size = 4 + RecordHeader::EVENT_HEADER_SIZE + payload.len();
    dat.extend_from_slice(&(size as u32).to_le_bytes());
    dat.extend_from_slice(&((RecordHeader::EVENT_HEADER_SIZE + payload.len()) as u16).to_le_bytes());
    dat.extend_from_slice(&0u16.to_le_bytes()); // HeaderType
    dat.extend_from_slice(&HeaderFlags::Header64Bit.as_int().to_le_bytes());
    dat.extend_from_slice(&0u16.to_le_bytes()); // EventProperty
    dat.extend_from_slice(&1208u32.to_le_bytes()); // ThreadId
    dat.extend_from_slice(&4242u32.to_le_bytes()); // ProcessId
    dat.extend_from_slice(&timestamp.to_le_bytes());
    dat.extend_from_slice(&schema.key.provider.to_bytes_le());
    dat.extend_from_slice(&schema.key.id.to_le_bytes());
    dat.push(schema.key.version);
    dat.push(0); // Channel
    dat.push(4); // Level
    dat.push(schema.key.opcode);
    dat.extend_from_slice(&0u16.to_le_bytes()); // Task
    dat.extend_from_slice(&0u64.to_le_bytes()); // Keyword
    dat.extend_from_slice(&0u64.to_le_bytes()); // KernelTime, UserTime
    dat.extend_from_slice(&[0; 16]); // ActivityId
    dat.extend_from_slice(payload);
}

fn sample_dat() -> Vec<u8> {
    let mut dat = Vec::new();

    let mut payload = Vec::new();
    payload.extend_from_slice(&4242u32.to_le_bytes());
    payload.extend_from_slice(&1208u32.to_le_bytes());
    push_utf16(&mut payload, "RenderThread");
    push_record(&mut dat, &kernel_schemas::THREAD_SET_NAME, 1000, &payload);

    let mut payload = Vec::new();
    payload.extend_from_slice(&0x7ff6_a000_0000u64.to_le_bytes()); // ImageBase
    payload.extend_from_slice(&0x4_2000u64.to_le_bytes()); // ImageSize
    payload.extend_from_slice(&4242u32.to_le_bytes());
    payload.extend_from_slice(&0x4_b1c3u32.to_le_bytes());
    payload.extend_from_slice(&0x6543_2100u32.to_le_bytes());
    payload.extend_from_slice(&[12, 1, 0, 0]);
    payload.extend_from_slice(&0x1_4000_0000u64.to_le_bytes()); // DefaultBase
    payload.extend_from_slice(&[0; 16]);
    push_utf16(&mut payload, r"\Device\HarddiskVolume3\Program Files\App\app.exe");
    push_record(&mut dat, &kernel_schemas::IMAGE_LOAD, 1001, &payload);

    let mut payload = Vec::new();
    payload.extend_from_slice(&1002u64.to_le_bytes());
    payload.extend_from_slice(&4242u32.to_le_bytes());
    payload.extend_from_slice(&1208u32.to_le_bytes());
    for frame in [0x7ff6_a000_1234u64, 0x7ff6_a000_5678, 0x7ffa_1000_0042] {
        payload.extend_from_slice(&frame.to_le_bytes());
    }
    push_record(&mut dat, &kernel_schemas::STACK_WALK, 1003, &payload);

    // No schema for Thread/SetName v9.
    let unknown = EventSchema {
        key: EventKey {
            version: 9,
            ..kernel_schemas::THREAD_SET_NAME.key
        },
        ..kernel_schemas::THREAD_SET_NAME
    };
    push_record(&mut dat, &unknown, 1004, &[]);

    return dat;
}

/// Decodes each record in `dat`, printing JSON to stdout. Returns the number
/// of records that could not be decoded.
fn decode_dat(decoder: &EventDecoder, dat: &[u8]) -> usize {
    let mut failures = 0;
    let mut pos = 0;
    while dat.len() - pos >= 4 {
        let size = u32::from_le_bytes([dat[pos], dat[pos + 1], dat[pos + 2], dat[pos + 3]]) as usize;
        if size < 4 || size > dat.len() - pos {
            tracing::warn!(pos, size, "bad record size, stopping");
            return failures + 1;
        }

        let record_bytes = &dat[pos + 4..pos + size];
        pos += size;

        let header = match RecordHeader::parse_event_header(record_bytes, 0) {
            Ok(header) => header,
            Err(error) => {
                tracing::warn!(%error, "skipping record");
                failures += 1;
                continue;
            }
        };

        let payload = &record_bytes[RecordHeader::EVENT_HEADER_SIZE..];
        let record = RecordEnvelope::from_header(header, payload);
        match decoder.decode(&record) {
            Ok(event) => println!("{}", event.json_display(decoder.options())),
            Err(error) => {
                tracing::warn!(key = %record.key(), %error, "skipping record");
                failures += 1;
            }
        }
    }

    return failures;
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut catalogue = SchemaCatalogue::new();
    if let Err(error) = kernel_schemas::register_kernel_schemas(&mut catalogue) {
        eprintln!("{}", error);
        process::exit(1);
    }

    let decoder = EventDecoder::new(&catalogue);
    let mut failures = 0;
    let files: Vec<String> = env::args().skip(1).collect();
    if files.is_empty() {
        failures += decode_dat(&decoder, &sample_dat());
    } else {
        for file in files {
            match fs::read(&file) {
                Ok(dat) => failures += decode_dat(&decoder, &dat),
                Err(error) => {
                    tracing::error!(file = file.as_str(), %error, "cannot read file");
                    failures += 1;
                }
            }
        }
    }

    tracing::info!(failures, "done");
}
