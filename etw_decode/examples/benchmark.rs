use std::time;

use etw_decode::kernel_schemas;
use etw_decode::text;
use etw_decode::*;
use etw_types::*;

const ITERATIONS: usize = 5000;

fn utf16(text: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    for unit in text.encode_utf16().chain([0]) {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    return bytes;
}

#[inline(never)]
fn scan_len(bytes: &[u8]) -> usize {
    let mut total = 0;
    for _ in 0..ITERATIONS {
        total += text::scan_text_len(bytes).unwrap_or(0);
    }
    return total;
}

#[inline(never)]
fn scan_decode(bytes: &[u8]) -> usize {
    let mut total = 0;
    for _ in 0..ITERATIONS {
        total += text::scan_text(bytes).map(|(s, _)| s.len()).unwrap_or(0);
    }
    return total;
}

#[inline(never)]
fn decode_image_load(decoder: &EventDecoder, record: &RecordEnvelope) -> usize {
    let mut total = 0;
    for _ in 0..ITERATIONS {
        total += decoder.decode(record).map(|event| event.len()).unwrap_or(0);
    }
    return total;
}

fn main() {
    let bytes = utf16(r"\Device\HarddiskVolume3\Windows\System32\kernelbase.dll");

    let mut catalogue = SchemaCatalogue::new();
    kernel_schemas::register_kernel_schemas(&mut catalogue).unwrap();
    let decoder = EventDecoder::new(&catalogue);

    let header = RecordHeader {
        provider: kernel_schemas::IMAGE_LOAD_GUID,
        descriptor: EventDescriptor {
            version: 3,
            opcode: 10,
            ..EventDescriptor::default()
        },
        ..RecordHeader::default()
    };
    let mut payload = vec![0u8; 3 * 8 + 32];
    payload.extend_from_slice(&bytes);
    let record = RecordEnvelope::new(header, PointerWidth::Bits64, &payload);

    scan_len(&bytes);
    scan_decode(&bytes);
    decode_image_load(&decoder, &record);

    let start1 = time::Instant::now();
    let total1 = scan_len(&bytes);
    let end1 = time::Instant::now();

    let start2 = time::Instant::now();
    let total2 = scan_decode(&bytes);
    let end2 = time::Instant::now();

    let start3 = time::Instant::now();
    let total3 = decode_image_load(&decoder, &record);
    let end3 = time::Instant::now();

    println!("scan_text_len:     {:?} ({})", end1 - start1, total1);
    println!("scan_text:         {:?} ({})", end2 - start2, total2);
    println!("decode Image/Load: {:?} ({})", end3 - start3, total3);
}
