// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Little-endian readers for fixed-size values.
//!
//! These are total over a pre-validated slice: the caller checks that the
//! slice has at least the required number of bytes before reading. Reads
//! from a shorter slice panic, so truncation must be detected (and turned into
//! a [`crate::DecodeError::Truncated`]) by the caller.

use etw_types::Guid;
use etw_types::PointerWidth;

#[inline]
fn array<const N: usize>(source: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&source[..N]);
    return bytes;
}

/// Reads a u8 from the start of the given slice.
/// PRECONDITION: source.len() >= 1
pub fn read_u8(source: &[u8]) -> u8 {
    return source[0];
}

/// Reads an i8 from the start of the given slice.
/// PRECONDITION: source.len() >= 1
pub fn read_i8(source: &[u8]) -> i8 {
    return source[0] as i8;
}

/// Reads a 1-byte boolean from the start of the given slice. Any nonzero
/// value is true.
/// PRECONDITION: source.len() >= 1
pub fn read_bool(source: &[u8]) -> bool {
    return source[0] != 0;
}

/// Reads a little-endian u16 from the start of the given slice.
/// PRECONDITION: source.len() >= 2
pub fn read_u16(source: &[u8]) -> u16 {
    return u16::from_le_bytes(array(source));
}

/// Reads a little-endian i16 from the start of the given slice.
/// PRECONDITION: source.len() >= 2
pub fn read_i16(source: &[u8]) -> i16 {
    return i16::from_le_bytes(array(source));
}

/// Reads a little-endian u32 from the start of the given slice.
/// PRECONDITION: source.len() >= 4
pub fn read_u32(source: &[u8]) -> u32 {
    return u32::from_le_bytes(array(source));
}

/// Reads a little-endian i32 from the start of the given slice.
/// PRECONDITION: source.len() >= 4
pub fn read_i32(source: &[u8]) -> i32 {
    return i32::from_le_bytes(array(source));
}

/// Reads a little-endian u64 from the start of the given slice.
/// PRECONDITION: source.len() >= 8
pub fn read_u64(source: &[u8]) -> u64 {
    return u64::from_le_bytes(array(source));
}

/// Reads a little-endian i64 from the start of the given slice.
/// PRECONDITION: source.len() >= 8
pub fn read_i64(source: &[u8]) -> i64 {
    return i64::from_le_bytes(array(source));
}

/// Reads a little-endian f32 from the start of the given slice.
/// PRECONDITION: source.len() >= 4
pub fn read_f32(source: &[u8]) -> f32 {
    return f32::from_le_bytes(array(source));
}

/// Reads a little-endian f64 from the start of the given slice.
/// PRECONDITION: source.len() >= 8
pub fn read_f64(source: &[u8]) -> f64 {
    return f64::from_le_bytes(array(source));
}

/// Reads a GUID in Windows (mixed-endian) layout from the start of the given slice.
/// PRECONDITION: source.len() >= 16
pub fn read_guid(source: &[u8]) -> Guid {
    return Guid::from_bytes_le(&array(source));
}

/// Reads a pointer-sized unsigned value from the start of the given slice and
/// widens it to u64. Reads exactly `pointer_width.size()` bytes.
/// PRECONDITION: source.len() >= pointer_width.size()
pub fn read_pointer(source: &[u8], pointer_width: PointerWidth) -> u64 {
    return match pointer_width {
        PointerWidth::Bits32 => read_u32(source) as u64,
        PointerWidth::Bits64 => read_u64(source),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_I16: i16 = -0x1234;
    const TEST_U16: u16 = 0x1234;
    const TEST_I32: i32 = -0x12345678;
    const TEST_U32: u32 = 0x12345678;
    const TEST_I64: i64 = -0x1234567890abcdef;
    const TEST_U64: u64 = 0x1234567890abcdef;
    const TEST_F32: f32 = 1234.5678;
    const TEST_F64: f64 = 1234.5678;

    #[test]
    fn read() {
        assert_eq!(0xfe, read_u8(&[0xfe]));
        assert_eq!(-2, read_i8(&[0xfe]));
        assert_eq!(TEST_I16, read_i16(&TEST_I16.to_le_bytes()));
        assert_eq!(TEST_U16, read_u16(&TEST_U16.to_le_bytes()));
        assert_eq!(TEST_I32, read_i32(&TEST_I32.to_le_bytes()));
        assert_eq!(TEST_U32, read_u32(&TEST_U32.to_le_bytes()));
        assert_eq!(TEST_I64, read_i64(&TEST_I64.to_le_bytes()));
        assert_eq!(TEST_U64, read_u64(&TEST_U64.to_le_bytes()));
        assert_eq!(TEST_F32, read_f32(&TEST_F32.to_le_bytes()));
        assert_eq!(TEST_F64, read_f64(&TEST_F64.to_le_bytes()));
    }

    #[test]
    fn read_little_endian_bytes() {
        assert_eq!(0x0201, read_u16(&[0x01, 0x02]));
        assert_eq!(0x04030201, read_u32(&[0x01, 0x02, 0x03, 0x04]));
        assert_eq!(
            0x0807060504030201,
            read_u64(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08])
        );

        // Extra trailing bytes are ignored.
        assert_eq!(5, read_u32(&[0x05, 0x00, 0x00, 0x00, 0xff, 0xff]));
    }

    #[test]
    fn read_bool_nonzero() {
        assert!(!read_bool(&[0]));
        assert!(read_bool(&[1]));
        assert!(read_bool(&[0x80]));
        assert!(read_bool(&[0xff]));
    }

    #[test]
    fn pointer() {
        let bytes = [0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01];
        assert_eq!(0x89abcdef, read_pointer(&bytes, PointerWidth::Bits32));
        assert_eq!(
            0x0123456789abcdef,
            read_pointer(&bytes, PointerWidth::Bits64)
        );

        // 32-bit pointers are zero-extended, not sign-extended.
        assert_eq!(
            0xffff_fffe,
            read_pointer(&[0xfe, 0xff, 0xff, 0xff], PointerWidth::Bits32)
        );
    }

    #[test]
    fn guid() {
        let guid = Guid::from_fields(
            0xdef2fe46,
            0x7bd6,
            0x4b80,
            [0xbd, 0x94, 0xf5, 0x7f, 0xe2, 0x0d, 0x0c, 0xe3],
        );
        assert_eq!(guid, read_guid(&guid.to_bytes_le()));
    }

    #[test]
    #[should_panic]
    fn short_slice_panics() {
        read_u32(&[1, 2, 3]);
    }
}
