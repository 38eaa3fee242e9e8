// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;

/// A 128-bit identifier, e.g. the id of an ETW provider.
///
/// Stored as the canonical field values (`data1`, `data2`, `data3`, `data4`).
/// ETW records store GUIDs in the Windows mixed-endian layout: the first three
/// fields are little-endian and the last 8 bytes are stored as-is. Use
/// [`Guid::from_bytes_le`] to read that layout and [`Guid::from_bytes_be`] to
/// read the RFC 4122 (all big-endian) layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    /// The all-zero GUID.
    pub const ZERO: Guid = Guid::from_fields(0, 0, 0, [0; 8]);

    /// Creates a GUID from its component fields, e.g.
    /// `Guid::from_fields(0x3d6fa8d1, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c])`
    /// for `3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c`.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Guid {
        return Guid {
            data1,
            data2,
            data3,
            data4,
        };
    }

    /// Creates a GUID from 16 bytes in Windows (mixed-endian) layout, i.e.
    /// the layout used by `GUID` in ETW event headers and payloads.
    pub const fn from_bytes_le(bytes: &[u8; 16]) -> Guid {
        return Guid {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        };
    }

    /// Creates a GUID from 16 bytes in RFC 4122 (big-endian) layout.
    pub const fn from_bytes_be(bytes: &[u8; 16]) -> Guid {
        return Guid {
            data1: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_be_bytes([bytes[4], bytes[5]]),
            data3: u16::from_be_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        };
    }

    /// Returns the GUID's bytes in Windows (mixed-endian) layout.
    pub const fn to_bytes_le(&self) -> [u8; 16] {
        let d1 = self.data1.to_le_bytes();
        let d2 = self.data2.to_le_bytes();
        let d3 = self.data3.to_le_bytes();
        let d4 = self.data4;
        return [
            d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], d4[0], d4[1], d4[2], d4[3],
            d4[4], d4[5], d4[6], d4[7],
        ];
    }

    /// Returns the GUID's bytes in RFC 4122 (big-endian) layout.
    pub const fn to_bytes_be(&self) -> [u8; 16] {
        let d1 = self.data1.to_be_bytes();
        let d2 = self.data2.to_be_bytes();
        let d3 = self.data3.to_be_bytes();
        let d4 = self.data4;
        return [
            d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], d4[0], d4[1], d4[2], d4[3],
            d4[4], d4[5], d4[6], d4[7],
        ];
    }

    /// Returns the `data1` field.
    pub const fn data1(&self) -> u32 {
        self.data1
    }

    /// Returns the `data2` field.
    pub const fn data2(&self) -> u16 {
        self.data2
    }

    /// Returns the `data3` field.
    pub const fn data3(&self) -> u16 {
        self.data3
    }

    /// Returns the `data4` field.
    pub const fn data4(&self) -> [u8; 8] {
        self.data4
    }

    /// Parses a GUID string like `3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c`,
    /// optionally surrounded by `{` and `}`. Hex digits may be upper or lower case.
    /// Returns `None` if the string is not a valid GUID string.
    pub fn try_parse(value: &str) -> Option<Guid> {
        let mut chars = value.as_bytes();
        if chars.len() == 38 && chars[0] == b'{' && chars[37] == b'}' {
            chars = &chars[1..37];
        }

        if chars.len() != 36 {
            return None;
        }

        let mut bytes = [0u8; 16];
        let mut byte_index = 0;
        let mut pos = 0;
        while pos < chars.len() {
            if pos == 8 || pos == 13 || pos == 18 || pos == 23 {
                if chars[pos] != b'-' {
                    return None;
                }

                pos += 1;
                continue;
            }

            let high = hex_digit(chars[pos])?;
            let low = hex_digit(chars[pos + 1])?;
            bytes[byte_index] = (high << 4) | low;
            byte_index += 1;
            pos += 2;
        }

        return Some(Guid::from_bytes_be(&bytes));
    }
}

impl fmt::Display for Guid {
    /// Formats as `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` (lowercase, no braces).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d4 = &self.data4;
        return write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            d4[0],
            d4[1],
            d4[2],
            d4[3],
            d4[4],
            d4[5],
            d4[6],
            d4[7],
        );
    }
}

fn hex_digit(ch: u8) -> Option<u8> {
    return match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    };
}
