// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Formatters for decoded values: FILETIME dates and JSON.

use core::fmt;
use core::fmt::Write;

use crate::DecodeOptions;
use crate::DecodedEvent;
use crate::FieldValue;

const TICKS_PER_SECOND: i64 = 10_000_000;

#[cfg(all(windows, feature = "decode_date"))]
mod date_time {
    #[repr(C)]
    pub struct DateTime {
        year: u16,
        month_of_year: u16,
        day_of_week: u16,
        day_of_month: u16,
        hour: u16,
        minute: u16,
        second: u16,
        milliseconds: u16,
    }

    impl DateTime {
        pub fn new(file_time: i64) -> Self {
            let mut this = Self {
                year: 0,
                month_of_year: 0,
                day_of_week: 0,
                day_of_month: 0,
                hour: 0,
                minute: 0,
                second: 0,
                milliseconds: 0,
            };

            if file_time < 0 || 0 == unsafe { FileTimeToSystemTime(&file_time, &mut this) } {
                this.month_of_year = 0;
            }

            return this;
        }

        pub const fn valid(&self) -> bool {
            self.month_of_year != 0
        }

        pub const fn year(&self) -> u32 {
            self.year as u32
        }

        pub const fn month_of_year(&self) -> u8 {
            self.month_of_year as u8
        }

        pub const fn day_of_month(&self) -> u8 {
            self.day_of_month as u8
        }

        pub const fn hour(&self) -> u8 {
            self.hour as u8
        }

        pub const fn minute(&self) -> u8 {
            self.minute as u8
        }

        pub const fn second(&self) -> u8 {
            self.second as u8
        }
    }

    extern "system" {
        fn FileTimeToSystemTime(file_time: *const i64, system_time: *mut DateTime) -> i32;
    }
}

#[cfg(all(unix, feature = "decode_date"))]
mod date_time {
    use super::TICKS_PER_SECOND;

    /// Seconds from 1601-01-01 to 1970-01-01.
    const UNIX_EPOCH_SECONDS: i64 = 11_644_473_600;

    pub struct DateTime {
        tm: libc::tm,
    }

    impl DateTime {
        pub fn new(file_time: i64) -> Self {
            let mut this = Self {
                tm: unsafe { core::mem::zeroed() },
            };

            let seconds = file_time.div_euclid(TICKS_PER_SECOND) - UNIX_EPOCH_SECONDS;
            let time = seconds as libc::time_t;
            if file_time < 0
                || time as i64 != seconds
                || unsafe { core::ptr::null() == libc::gmtime_r(&time, &mut this.tm) }
            {
                this.tm.tm_mday = 0;
            }

            return this;
        }

        pub const fn valid(&self) -> bool {
            self.tm.tm_mday != 0
        }

        pub const fn year(&self) -> u32 {
            self.tm.tm_year.wrapping_add(1900) as u32
        }

        pub const fn month_of_year(&self) -> u8 {
            self.tm.tm_mon as u8 + 1
        }

        pub const fn day_of_month(&self) -> u8 {
            self.tm.tm_mday as u8
        }

        pub const fn hour(&self) -> u8 {
            self.tm.tm_hour as u8
        }

        pub const fn minute(&self) -> u8 {
            self.tm.tm_min as u8
        }

        pub const fn second(&self) -> u8 {
            self.tm.tm_sec as u8
        }
    }
}

#[cfg(not(any(
    all(windows, feature = "decode_date"),
    all(unix, feature = "decode_date")
)))]
mod date_time {
    pub struct DateTime {}

    impl DateTime {
        pub const fn new(_file_time: i64) -> Self {
            Self {}
        }

        pub const fn valid(&self) -> bool {
            false
        }

        pub const fn year(&self) -> u32 {
            0
        }

        pub const fn month_of_year(&self) -> u8 {
            0
        }

        pub const fn day_of_month(&self) -> u8 {
            0
        }

        pub const fn hour(&self) -> u8 {
            0
        }

        pub const fn minute(&self) -> u8 {
            0
        }

        pub const fn second(&self) -> u8 {
            0
        }
    }
}

// **** FileTimeDisplay

/// Formatter for a FILETIME (100ns intervals since 1601-01-01 UTC).
///
/// Writes a date like `2024-01-01T00:00:00.1234567Z` if the value is a
/// representable date and the `decode_date` feature is enabled. Otherwise
/// writes the raw integer.
#[derive(Clone, Copy, Debug)]
pub struct FileTimeDisplay {
    value: i64,
}

impl FileTimeDisplay {
    /// Creates a formatter for the specified FILETIME value.
    pub const fn new(value: i64) -> Self {
        return Self { value };
    }

    /// Returns true if the value will be written as a date.
    pub fn is_date(&self) -> bool {
        return date_time::DateTime::new(self.value).valid();
    }

    /// Writes the value to the specified writer.
    pub fn write_to<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        let dt = date_time::DateTime::new(self.value);
        if !dt.valid() {
            return write!(writer, "{}", self.value);
        }

        return write!(
            writer,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:07}Z",
            dt.year(),
            dt.month_of_year(),
            dt.day_of_month(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            self.value.rem_euclid(TICKS_PER_SECOND)
        );
    }
}

impl fmt::Display for FileTimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.write_to(f);
    }
}

// **** JSON

/// Writes `value` with JSON escapes for `"`, `\`, and control chars. Does not
/// write the enclosing quotes.
pub fn write_json_escaped<W: fmt::Write + ?Sized>(writer: &mut W, value: &str) -> fmt::Result {
    let bytes = value.as_bytes();
    let mut written_pos = 0;
    for (pos, &b) in bytes.iter().enumerate() {
        let escape = match b {
            b'"' => "\\\"",
            b'\\' => "\\\\",
            b'\x08' => "\\b",
            b'\x0C' => "\\f",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            b'\0'..=b'\x1F' => "",
            _ => continue,
        };

        // ASCII bytes are always char boundaries.
        if written_pos < pos {
            writer.write_str(&value[written_pos..pos])?;
        }

        if escape.is_empty() {
            write!(writer, "\\u{:04X}", b)?;
        } else {
            writer.write_str(escape)?;
        }

        written_pos = pos + 1;
    }

    return if written_pos < bytes.len() {
        writer.write_str(&value[written_pos..])
    } else {
        Ok(())
    };
}

/// Tracks comma and space state while writing JSON.
struct JsonWriter<'wri, W: fmt::Write + ?Sized> {
    dest: &'wri mut W,
    options: DecodeOptions,
    comma: bool,
    space: bool,
}

impl<'wri, W: fmt::Write + ?Sized> JsonWriter<'wri, W> {
    fn new(dest: &'wri mut W, options: DecodeOptions) -> Self {
        return Self {
            dest,
            options,
            comma: false,
            space: false,
        };
    }

    /// Writes: `, "escaped-name":`
    fn write_property_name(&mut self, name: &str) -> fmt::Result {
        self.write_comma_space()?;
        self.comma = false;
        self.dest.write_char('"')?;
        write_json_escaped(self.dest, name)?;
        return self.dest.write_str("\":");
    }

    /// Writes: `, {` or `, [`
    fn write_begin(&mut self, begin: char) -> fmt::Result {
        self.write_comma_space()?;
        self.comma = false;
        return self.dest.write_char(begin);
    }

    /// Writes: ` }` or ` ]`
    fn write_end(&mut self, end: char) -> fmt::Result {
        if self.space {
            self.dest.write_char(' ')?;
        }
        self.comma = true;
        return self.dest.write_char(end);
    }

    /// Writes leading comma/space if needed, then `"escaped-value"`.
    fn write_string_value(&mut self, value: &str) -> fmt::Result {
        self.write_comma_space()?;
        self.comma = true;
        self.dest.write_char('"')?;
        write_json_escaped(self.dest, value)?;
        return self.dest.write_char('"');
    }

    /// Writes leading comma/space if needed, then the value.
    fn write_value(&mut self, value: &FieldValue<'_>) -> fmt::Result {
        let options = self.options;
        if let FieldValue::Addresses(addresses) = value {
            self.write_begin('[')?;
            for address in *addresses {
                self.write_comma_space()?;
                self.comma = true;
                write_json_pointer(self.dest, options, address)?;
            }
            return self.write_end(']');
        }

        self.write_comma_space()?;
        self.comma = true;

        let dest = &mut *self.dest;
        return match value {
            FieldValue::U8(v) => write!(dest, "{}", v),
            FieldValue::I8(v) => write!(dest, "{}", v),
            FieldValue::Bool(v) => write!(dest, "{}", v),
            FieldValue::U16(v) => write!(dest, "{}", v),
            FieldValue::I16(v) => write!(dest, "{}", v),
            FieldValue::U32(v) => write!(dest, "{}", v),
            FieldValue::I32(v) => write!(dest, "{}", v),
            FieldValue::U64(v) => write!(dest, "{}", v),
            FieldValue::I64(v) => write!(dest, "{}", v),
            FieldValue::HexU32(v) if options.has_flag(DecodeOptions::HexIntAsString) => {
                write!(dest, "\"0x{:X}\"", v)
            }
            FieldValue::HexU32(v) => write!(dest, "{}", v),
            FieldValue::HexU64(v) if options.has_flag(DecodeOptions::HexIntAsString) => {
                write!(dest, "\"0x{:X}\"", v)
            }
            FieldValue::HexU64(v) => write!(dest, "{}", v),
            FieldValue::F32(v) => write_json_float(dest, *v as f64),
            FieldValue::F64(v) => write_json_float(dest, *v),
            FieldValue::Guid(v) => write!(dest, "\"{}\"", v),
            FieldValue::FileTime(v) => {
                let file_time = FileTimeDisplay::new(*v);
                if options.has_flag(DecodeOptions::FileTimeAsString) && file_time.is_date() {
                    write!(dest, "\"{}\"", file_time)
                } else {
                    write!(dest, "{}", v)
                }
            }
            FieldValue::Pointer(v) => write_json_pointer(dest, options, *v),
            FieldValue::Text(v) | FieldValue::AnsiText(v) => {
                dest.write_char('"')?;
                write_json_escaped(dest, v)?;
                dest.write_char('"')
            }
            FieldValue::Addresses(_) => Ok(()), // Handled above.
        };
    }

    /// Writes comma and space as needed.
    fn write_comma_space(&mut self) -> fmt::Result {
        if self.comma {
            self.dest.write_char(',')?;
        }
        if self.space {
            self.dest.write_char(' ')?;
        }
        self.space = self.options.has_flag(DecodeOptions::Space);
        return Ok(());
    }
}

fn write_json_pointer<W: fmt::Write + ?Sized>(
    dest: &mut W,
    options: DecodeOptions,
    value: u64,
) -> fmt::Result {
    return if options.has_flag(DecodeOptions::PointerAsString) {
        write!(dest, "\"0x{:X}\"", value)
    } else {
        write!(dest, "{}", value)
    };
}

fn write_json_float<W: fmt::Write + ?Sized>(dest: &mut W, value: f64) -> fmt::Result {
    return if value.is_finite() {
        write!(dest, "{}", value)
    } else {
        // JSON has no NaN or infinity.
        write!(dest, "\"{}\"", value)
    };
}

/// Formatter that writes a [`FieldValue`] as a JSON value.
#[derive(Clone, Copy, Debug)]
pub struct FieldValueJsonDisplay<'val, 'dat> {
    value: &'val FieldValue<'dat>,
    options: DecodeOptions,
}

impl<'val, 'dat> FieldValueJsonDisplay<'val, 'dat> {
    /// Creates a formatter for the specified value.
    pub const fn new(value: &'val FieldValue<'dat>, options: DecodeOptions) -> Self {
        return Self { value, options };
    }

    /// Writes the value to the specified writer.
    pub fn write_to<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        return JsonWriter::new(writer, self.options).write_value(self.value);
    }
}

impl<'val, 'dat> fmt::Display for FieldValueJsonDisplay<'val, 'dat> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.write_to(f);
    }
}

/// Formatter that writes a [`DecodedEvent`] as a JSON object:
/// `"n"` (schema name), each field by name, then `"meta"` with the header.
#[derive(Clone, Copy, Debug)]
pub struct DecodedEventJsonDisplay<'eve, 's, 'dat> {
    event: &'eve DecodedEvent<'s, 'dat>,
    options: DecodeOptions,
}

impl<'eve, 's, 'dat> DecodedEventJsonDisplay<'eve, 's, 'dat> {
    /// Creates a formatter for the specified event.
    pub const fn new(event: &'eve DecodedEvent<'s, 'dat>, options: DecodeOptions) -> Self {
        return Self { event, options };
    }

    /// Writes the event to the specified writer.
    pub fn write_to<W: fmt::Write + ?Sized>(&self, writer: &mut W) -> fmt::Result {
        let event = self.event;
        let header = event.header();
        let mut json = JsonWriter::new(writer, self.options);

        json.write_begin('{')?;
        json.write_property_name("n")?;
        json.write_string_value(event.name())?;
        for (field, value) in event.iter() {
            json.write_property_name(field.name)?;
            json.write_value(value)?;
        }

        json.write_property_name("meta")?;
        json.write_begin('{')?;
        json.write_property_name("provider")?;
        json.write_value(&FieldValue::Guid(header.provider))?;
        json.write_property_name("id")?;
        json.write_value(&FieldValue::U16(header.descriptor.id))?;
        json.write_property_name("version")?;
        json.write_value(&FieldValue::U8(header.descriptor.version))?;
        json.write_property_name("opcode")?;
        json.write_value(&FieldValue::U8(header.descriptor.opcode))?;
        json.write_property_name("level")?;
        json.write_value(&FieldValue::U8(header.descriptor.level))?;
        json.write_property_name("pid")?;
        json.write_value(&FieldValue::U32(header.process_id))?;
        json.write_property_name("tid")?;
        json.write_value(&FieldValue::U32(header.thread_id))?;
        json.write_property_name("time")?;
        json.write_value(&FieldValue::I64(header.timestamp))?;
        json.write_property_name("cpu")?;
        json.write_value(&FieldValue::U8(header.processor_number))?;
        json.write_end('}')?;

        return json.write_end('}');
    }
}

impl<'eve, 's, 'dat> fmt::Display for DecodedEventJsonDisplay<'eve, 's, 'dat> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.write_to(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AddressSequence;
    use alloc::string::String;
    use alloc::string::ToString;
    use etw_types::Guid;
    use etw_types::PointerWidth;

    fn json(value: &FieldValue<'_>, options: DecodeOptions) -> String {
        return value.json_display(options).to_string();
    }

    #[test]
    fn escape() {
        let mut out = String::new();
        write_json_escaped(&mut out, "a\"b\\c\n\x01\u{e9}").unwrap();
        assert_eq!("a\\\"b\\\\c\\n\\u0001\u{e9}", out);

        let mut out = String::new();
        write_json_escaped(&mut out, "plain").unwrap();
        assert_eq!("plain", out);
    }

    #[test]
    fn values() {
        let default = DecodeOptions::Default;
        let compact = DecodeOptions::None;

        assert_eq!("5", json(&FieldValue::U32(5), default));
        assert_eq!("-5", json(&FieldValue::I64(-5), default));
        assert_eq!("true", json(&FieldValue::Bool(true), default));
        assert_eq!("\"0x1F\"", json(&FieldValue::HexU32(0x1f), default));
        assert_eq!("31", json(&FieldValue::HexU32(0x1f), compact));
        assert_eq!("\"0x1000\"", json(&FieldValue::Pointer(0x1000), default));
        assert_eq!("4096", json(&FieldValue::Pointer(0x1000), compact));
        assert_eq!("1.5", json(&FieldValue::F64(1.5), default));
        assert_eq!("\"NaN\"", json(&FieldValue::F32(f32::NAN), default));
        assert_eq!(
            "\"say \\\"hi\\\"\"",
            json(&FieldValue::Text("say \"hi\"".to_string()), default)
        );
        assert_eq!(
            "\"00000001-0002-0003-0405-060708090a0b\"",
            json(
                &FieldValue::Guid(Guid::from_fields(1, 2, 3, [4, 5, 6, 7, 8, 9, 10, 11])),
                default
            )
        );
        assert_eq!("-1", json(&FieldValue::FileTime(-1), default));
    }

    #[test]
    fn addresses() {
        let bytes = [0x00, 0x10, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00];
        let value = FieldValue::Addresses(AddressSequence::new(&bytes, PointerWidth::Bits32));
        assert_eq!(
            "[ \"0x1000\", \"0x2000\" ]",
            json(&value, DecodeOptions::Default)
        );
        assert_eq!("[4096,8192]", json(&value, DecodeOptions::None));

        let empty = FieldValue::Addresses(AddressSequence::new(&[], PointerWidth::Bits64));
        assert_eq!("[ ]", json(&empty, DecodeOptions::Default));
        assert_eq!("[]", json(&empty, DecodeOptions::None));
    }

    #[cfg(all(unix, feature = "decode_date"))]
    #[test]
    fn file_time() {
        // 2024-01-01T00:00:00Z plus 0.1234567 seconds.
        let value = 133_485_408_001_234_567;
        assert_eq!(
            "2024-01-01T00:00:00.1234567Z",
            FileTimeDisplay::new(value).to_string()
        );
        assert_eq!(
            "\"2024-01-01T00:00:00.1234567Z\"",
            json(&FieldValue::FileTime(value), DecodeOptions::Default)
        );
        assert_eq!(
            "133485408001234567",
            json(&FieldValue::FileTime(value), DecodeOptions::None)
        );
        assert_eq!("-1", FileTimeDisplay::new(-1).to_string());
    }
}
