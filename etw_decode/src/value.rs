// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use alloc::string::String;
use core::fmt;

use etw_types::Guid;
use etw_types::ScalarType;

use crate::display;
use crate::scalar;
use crate::AddressSequence;
use crate::DecodeOptions;

/// A typed value decoded from one field of a record.
///
/// Text is decoded into an owned `String`. Address arrays stay borrowed from
/// the record's payload (`'dat`) and are walked lazily.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue<'dat> {
    /// `Fixed(U8)`.
    U8(u8),
    /// `Fixed(I8)`.
    I8(i8),
    /// `Fixed(Bool)`.
    Bool(bool),
    /// `Fixed(U16)`.
    U16(u16),
    /// `Fixed(I16)`.
    I16(i16),
    /// `Fixed(U32)`.
    U32(u32),
    /// `Fixed(I32)`.
    I32(i32),
    /// `Fixed(HexU32)`.
    HexU32(u32),
    /// `Fixed(U64)`.
    U64(u64),
    /// `Fixed(I64)`.
    I64(i64),
    /// `Fixed(HexU64)`.
    HexU64(u64),
    /// `Fixed(F32)`.
    F32(f32),
    /// `Fixed(F64)`.
    F64(f64),
    /// `Fixed(Guid)`.
    Guid(Guid),
    /// `Fixed(FileTime)`: 100ns intervals since 1601-01-01.
    FileTime(i64),
    /// `Pointer`, widened to 64 bits.
    Pointer(u64),
    /// `Utf16Text`, without the terminator.
    Text(String),
    /// `AnsiText`, without the terminator.
    AnsiText(String),
    /// `AddressArray`.
    Addresses(AddressSequence<'dat>),
}

impl<'dat> FieldValue<'dat> {
    /// Reads a value of type `scalar_type` from the start of `bytes`.
    /// PRECONDITION: bytes.len() >= scalar_type.size()
    pub fn from_scalar(scalar_type: ScalarType, bytes: &[u8]) -> Self {
        return match scalar_type {
            ScalarType::U8 => FieldValue::U8(scalar::read_u8(bytes)),
            ScalarType::I8 => FieldValue::I8(scalar::read_i8(bytes)),
            ScalarType::Bool => FieldValue::Bool(scalar::read_bool(bytes)),
            ScalarType::U16 => FieldValue::U16(scalar::read_u16(bytes)),
            ScalarType::I16 => FieldValue::I16(scalar::read_i16(bytes)),
            ScalarType::U32 => FieldValue::U32(scalar::read_u32(bytes)),
            ScalarType::I32 => FieldValue::I32(scalar::read_i32(bytes)),
            ScalarType::HexU32 => FieldValue::HexU32(scalar::read_u32(bytes)),
            ScalarType::U64 => FieldValue::U64(scalar::read_u64(bytes)),
            ScalarType::I64 => FieldValue::I64(scalar::read_i64(bytes)),
            ScalarType::HexU64 => FieldValue::HexU64(scalar::read_u64(bytes)),
            ScalarType::F32 => FieldValue::F32(scalar::read_f32(bytes)),
            ScalarType::F64 => FieldValue::F64(scalar::read_f64(bytes)),
            ScalarType::Guid => FieldValue::Guid(scalar::read_guid(bytes)),
            ScalarType::FileTime => FieldValue::FileTime(scalar::read_i64(bytes)),
        };
    }

    /// Returns the value as u64 if it is an unsigned integer, bool, or pointer.
    pub fn as_u64(&self) -> Option<u64> {
        return match *self {
            FieldValue::U8(v) => Some(v as u64),
            FieldValue::Bool(v) => Some(v as u64),
            FieldValue::U16(v) => Some(v as u64),
            FieldValue::U32(v) | FieldValue::HexU32(v) => Some(v as u64),
            FieldValue::U64(v) | FieldValue::HexU64(v) | FieldValue::Pointer(v) => Some(v),
            _ => None,
        };
    }

    /// Returns the value as i64 if it is an integer that fits in i64.
    pub fn as_i64(&self) -> Option<i64> {
        return match *self {
            FieldValue::I8(v) => Some(v as i64),
            FieldValue::I16(v) => Some(v as i64),
            FieldValue::I32(v) => Some(v as i64),
            FieldValue::I64(v) | FieldValue::FileTime(v) => Some(v),
            _ => match self.as_u64() {
                Some(v) => i64::try_from(v).ok(),
                None => None,
            },
        };
    }

    /// Returns the value as f64 if it is a float.
    pub fn as_f64(&self) -> Option<f64> {
        return match *self {
            FieldValue::F32(v) => Some(v as f64),
            FieldValue::F64(v) => Some(v),
            _ => None,
        };
    }

    /// Returns the value if it is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        return match *self {
            FieldValue::Bool(v) => Some(v),
            _ => None,
        };
    }

    /// Returns the value if it is a GUID.
    pub fn as_guid(&self) -> Option<Guid> {
        return match *self {
            FieldValue::Guid(v) => Some(v),
            _ => None,
        };
    }

    /// Returns the text if the value is `Text` or `AnsiText`.
    pub fn as_str(&self) -> Option<&str> {
        return match self {
            FieldValue::Text(v) | FieldValue::AnsiText(v) => Some(v),
            _ => None,
        };
    }

    /// Returns a fresh sequence over the addresses if the value is `Addresses`.
    pub fn as_addresses(&self) -> Option<AddressSequence<'dat>> {
        return match self {
            FieldValue::Addresses(v) => Some(*v),
            _ => None,
        };
    }

    /// Returns a formatter that writes the value as JSON.
    pub fn json_display(&self, options: DecodeOptions) -> display::FieldValueJsonDisplay<'_, 'dat> {
        return display::FieldValueJsonDisplay::new(self, options);
    }
}

impl<'dat> fmt::Display for FieldValue<'dat> {
    /// Writes the value as text: integers in decimal, hex integers and
    /// pointers as `0x...`, FILETIME as a date if possible, addresses as a
    /// bracketed list.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            FieldValue::U8(v) => write!(f, "{}", v),
            FieldValue::I8(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::U16(v) => write!(f, "{}", v),
            FieldValue::I16(v) => write!(f, "{}", v),
            FieldValue::U32(v) => write!(f, "{}", v),
            FieldValue::I32(v) => write!(f, "{}", v),
            FieldValue::HexU32(v) => write!(f, "0x{:X}", v),
            FieldValue::U64(v) => write!(f, "{}", v),
            FieldValue::I64(v) => write!(f, "{}", v),
            FieldValue::HexU64(v) => write!(f, "0x{:X}", v),
            FieldValue::F32(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
            FieldValue::Guid(v) => write!(f, "{}", v),
            FieldValue::FileTime(v) => display::FileTimeDisplay::new(*v).write_to(f),
            FieldValue::Pointer(v) => write!(f, "0x{:X}", v),
            FieldValue::Text(v) | FieldValue::AnsiText(v) => f.write_str(v),
            FieldValue::Addresses(v) => {
                let addresses: AddressSequence<'_> = *v;
                f.write_str("[")?;
                for (i, address) in addresses.enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "0x{:X}", address)?;
                }
                f.write_str("]")
            }
        };
    }
}
