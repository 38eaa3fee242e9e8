// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Null-terminated text fields.
//!
//! Text fields are not length-prefixed: the length is discovered by scanning
//! for the terminator. Each `scan_*` function returns the number of bytes
//! consumed (including the terminator) so that the next field's offset can be
//! computed.

use alloc::string::String;
use core::fmt;
use core::str;

use crate::DecodeError;

// **** UTF-16LE

/// Returns the number of bytes in the UTF-16LE string at the start of `source`,
/// including the 2-byte zero terminator. Does not decode the text.
///
/// Returns `Truncated` if `source` has no zero code unit. A trailing odd byte
/// is not a code unit.
pub fn scan_text_len(source: &[u8]) -> Result<usize, DecodeError> {
    let mut pos = 0;
    while source.len() - pos >= 2 {
        if source[pos] == 0 && source[pos + 1] == 0 {
            return Ok(pos + 2);
        }

        pos += 2;
    }

    return Err(DecodeError::Truncated {
        offset: 0,
        available: source.len(),
    });
}

/// Decodes the UTF-16LE string at the start of `source`.
///
/// Returns the decoded text (not including the terminator) and the number of
/// bytes consumed (including the terminator). Unpaired surrogates are replaced
/// with U+FFFD. Returns `Truncated` if `source` has no zero code unit.
pub fn scan_text(source: &[u8]) -> Result<(String, usize), DecodeError> {
    let consumed = scan_text_len(source)?;
    return Ok((decode_text(&source[..consumed - 2]), consumed));
}

/// Decodes UTF-16LE bytes (no terminator). Unpaired surrogates are replaced
/// with U+FFFD. A trailing odd byte is ignored.
pub fn decode_text(bytes: &[u8]) -> String {
    return Utf16Chars::new(bytes)
        .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
}

/// Decodes the UTF-16LE string at the start of `source`, failing with
/// `InvalidText` if it contains an unpaired surrogate.
///
/// Returns the decoded text (not including the terminator) and the number of
/// bytes consumed (including the terminator).
pub fn scan_text_strict(source: &[u8]) -> Result<(String, usize), DecodeError> {
    let consumed = scan_text_len(source)?;
    let text = decode_text_strict(&source[..consumed - 2])?;
    return Ok((text, consumed));
}

/// Decodes UTF-16LE bytes (no terminator), failing with `InvalidText` at the
/// first unpaired surrogate. `offset` is relative to the start of `bytes`.
pub fn decode_text_strict(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut text = String::with_capacity(bytes.len() / 2);
    for ch in Utf16Chars::new(bytes) {
        match ch {
            Ok(ch) => text.push(ch),
            Err(offset) => return Err(DecodeError::InvalidText { offset }),
        }
    }

    return Ok(text);
}

/// Iterator over the chars of UTF-16LE bytes (no terminator). Yields
/// `Err(offset)` for each unpaired surrogate, where `offset` is the byte
/// offset of the surrogate. A trailing odd byte is ignored.
#[derive(Clone, Debug)]
pub struct Utf16Chars<'dat> {
    bytes: &'dat [u8],
    pos: usize,
}

impl<'dat> Utf16Chars<'dat> {
    /// Creates an iterator over the chars of `bytes`.
    pub const fn new(bytes: &'dat [u8]) -> Self {
        return Self { bytes, pos: 0 };
    }

    fn code_unit_at(&self, pos: usize) -> u16 {
        return u16::from_le_bytes([self.bytes[pos], self.bytes[pos + 1]]);
    }
}

impl<'dat> Iterator for Utf16Chars<'dat> {
    type Item = Result<char, usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.bytes.len();
        if len - self.pos < 2 {
            return None;
        }

        let start = self.pos;
        let high = self.code_unit_at(start);
        self.pos += 2; // Consume the first code unit.

        let ch = if !(0xD800..=0xDFFF).contains(&high) {
            // Not a surrogate.
            char::from_u32(high as u32).ok_or(start)
        } else if high >= 0xDC00 || len - self.pos < 2 {
            // Low surrogate without a high surrogate, or high surrogate at end.
            Err(start)
        } else {
            let low = self.code_unit_at(self.pos);
            if !(0xDC00..=0xDFFF).contains(&low) {
                Err(start) // Unpaired high surrogate. Next unit is decoded on its own.
            } else {
                self.pos += 2; // Consume the second code unit.
                char::from_u32((((high as u32 - 0xD800) << 10) | (low as u32 - 0xDC00)) + 0x10000)
                    .ok_or(start)
            }
        };

        return Some(ch);
    }
}

/// Formatter for UTF-16LE bytes (no terminator) that writes the text without
/// allocating. Unpaired surrogates are written as U+FFFD.
#[derive(Clone, Copy, Debug)]
pub struct Utf16Display<'dat> {
    bytes: &'dat [u8],
}

impl<'dat> Utf16Display<'dat> {
    /// Creates a formatter for the specified UTF-16LE bytes.
    pub const fn new(bytes: &'dat [u8]) -> Self {
        return Self { bytes };
    }

    /// Writes the text to the specified writer.
    pub fn write_to<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        for ch in Utf16Chars::new(self.bytes) {
            writer.write_char(ch.unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }

        return Ok(());
    }
}

impl<'dat> fmt::Display for Utf16Display<'dat> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.write_to(f);
    }
}

// **** ANSI (8-bit)

/// Returns the number of bytes in the 8-bit string at the start of `source`,
/// including the 1-byte zero terminator.
///
/// Returns `Truncated` if `source` has no zero byte.
pub fn scan_ansi_text_len(source: &[u8]) -> Result<usize, DecodeError> {
    return match source.iter().position(|&b| b == 0) {
        Some(pos) => Ok(pos + 1),
        None => Err(DecodeError::Truncated {
            offset: 0,
            available: source.len(),
        }),
    };
}

/// Decodes the 8-bit string at the start of `source`. The bytes are
/// interpreted as UTF-8; bytes that are not part of a valid UTF-8 sequence
/// are interpreted as Latin-1.
///
/// Returns the decoded text (not including the terminator) and the number of
/// bytes consumed (including the terminator).
pub fn scan_ansi_text(source: &[u8]) -> Result<(String, usize), DecodeError> {
    let consumed = scan_ansi_text_len(source)?;
    return Ok((decode_ansi_text(&source[..consumed - 1]), consumed));
}

/// Decodes 8-bit text (no terminator) as UTF-8, interpreting bytes that are
/// not part of a valid UTF-8 sequence as Latin-1.
pub fn decode_ansi_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    // Writing to a String cannot fail.
    let _ = write_utf8_with_latin1_fallback_to(bytes, &mut text);
    return text;
}

/// Writes a UTF-8-encoded string to a writer. If the string contains any invalid UTF-8 sequences,
/// the invalid bytes are treated as Latin-1.
pub fn write_utf8_with_latin1_fallback_to<W: fmt::Write + ?Sized>(
    bytes: &[u8],
    writer: &mut W,
) -> fmt::Result {
    let mut remaining = bytes;
    loop {
        match str::from_utf8(remaining) {
            Ok(valid) => {
                // Common case: the entire string.
                return writer.write_str(valid);
            }
            Err(error) => {
                let valid_len = error.valid_up_to();
                if valid_len != 0 {
                    // Validated: prefix contains only valid UTF-8.
                    let valid = str::from_utf8(&remaining[..valid_len]).map_err(|_| fmt::Error)?;
                    writer.write_str(valid)?;
                }

                // Treat the first invalid byte as Latin-1 and move forward.
                writer.write_char(remaining[valid_len] as char)?;
                remaining = &remaining[valid_len + 1..];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    fn utf16(text: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        return bytes;
    }

    #[test]
    fn scan() {
        assert_eq!(
            Ok(("Hi".to_string(), 6)),
            scan_text(&[b'H', 0, b'i', 0, 0, 0])
        );
        assert_eq!(Ok((String::new(), 2)), scan_text(&[0, 0, 0xff, 0xff]));

        // Stops at the first terminator; following bytes belong to the next field.
        let mut bytes = utf16("ab");
        bytes.extend_from_slice(&utf16("cd"));
        assert_eq!(Ok(("ab".to_string(), 6)), scan_text(&bytes));
        assert_eq!(Ok(6), scan_text_len(&bytes));

        // Non-BMP characters use surrogate pairs.
        let bytes = utf16("x\u{1F600}y");
        assert_eq!(Ok(("x\u{1F600}y".to_string(), 10)), scan_text(&bytes));
    }

    #[test]
    fn terminator_is_aligned() {
        // 0x00 0x00 straddling two code units is not a terminator.
        let bytes = [0x41, 0x00, 0x00, 0x42, 0x00, 0x00];
        assert_eq!(Ok(6), scan_text_len(&bytes));
        assert_eq!(Ok(("A\u{4200}".to_string(), 6)), scan_text(&bytes));
    }

    #[test]
    fn unterminated() {
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 0,
                available: 4
            }),
            scan_text(&[b'H', 0, b'i', 0])
        );
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 0,
                available: 3
            }),
            scan_text_len(&[b'H', 0, 0])
        );
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 0,
                available: 0
            }),
            scan_text_len(&[])
        );
    }

    #[test]
    fn invalid_surrogates() {
        // Unpaired high surrogate followed by 'A', then lone low surrogate.
        let bytes = [0x00, 0xD8, 0x41, 0x00, 0x00, 0xDC, 0x00, 0x00];
        assert_eq!(
            Ok(("\u{FFFD}A\u{FFFD}".to_string(), 8)),
            scan_text(&bytes)
        );
        assert_eq!(
            Err(DecodeError::InvalidText { offset: 0 }),
            scan_text_strict(&bytes)
        );
        assert_eq!(
            Err(DecodeError::InvalidText { offset: 2 }),
            scan_text_strict(&bytes[2..])
        );

        let valid = utf16("ok\u{1F600}");
        assert_eq!(
            Ok(("ok\u{1F600}".to_string(), 10)),
            scan_text_strict(&valid)
        );
    }

    #[test]
    fn decode_without_terminator() {
        let bytes = utf16("Hi");
        assert_eq!("Hi", decode_text(&bytes[..4]));
        assert_eq!(Ok("Hi".to_string()), decode_text_strict(&bytes[..4]));
        assert_eq!("", decode_text(&[]));
        assert_eq!(
            Err(DecodeError::InvalidText { offset: 2 }),
            decode_text_strict(&[b'a', 0, 0x00, 0xDC])
        );
        assert_eq!("caf\u{E9}", decode_ansi_text(b"caf\xE9"));
    }

    #[test]
    fn display() {
        let bytes = [b'H', 0, b'i', 0, 0x00, 0xD8];
        assert_eq!("Hi\u{FFFD}", Utf16Display::new(&bytes).to_string());
    }

    #[test]
    fn ansi() {
        assert_eq!(Ok(("abc".to_string(), 4)), scan_ansi_text(b"abc\0def\0"));
        assert_eq!(Ok(4), scan_ansi_text_len(b"abc\0def\0"));
        assert_eq!(Ok((String::new(), 1)), scan_ansi_text(b"\0"));
        assert_eq!(
            Ok(("caf\u{E9}".to_string(), 6)),
            scan_ansi_text("caf\u{E9}\0".as_bytes())
        );

        // Latin-1 fallback for invalid UTF-8.
        assert_eq!(
            Ok(("caf\u{E9}!".to_string(), 6)),
            scan_ansi_text(b"caf\xE9!\0")
        );
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 0,
                available: 3
            }),
            scan_ansi_text(b"abc")
        );
    }
}
