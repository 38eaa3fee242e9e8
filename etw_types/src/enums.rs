// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;

/// Size of a pointer-sized field in a record, determined by the bitness of
/// the process that emitted the record (not by the field declaration).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerWidth {
    /// Record was emitted by a 32-bit process: pointers are 4 bytes.
    Bits32,

    /// Record was emitted by a 64-bit process: pointers are 8 bytes.
    Bits64,
}

impl PointerWidth {
    /// Pointer width of the running process.
    pub const HOST: PointerWidth = if cfg!(target_pointer_width = "64") {
        PointerWidth::Bits64
    } else {
        PointerWidth::Bits32
    };

    /// Returns the size of a pointer in bytes: 4 or 8.
    pub const fn size(self) -> usize {
        return match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        };
    }

    /// Returns `Some(Bits32)` for 4, `Some(Bits64)` for 8, `None` otherwise.
    pub const fn from_size(size: usize) -> Option<PointerWidth> {
        return match size {
            4 => Some(PointerWidth::Bits32),
            8 => Some(PointerWidth::Bits64),
            _ => None,
        };
    }

    /// Returns the pointer width indicated by an ETW event header's flags.
    /// If neither `Header32Bit` nor `Header64Bit` is set, the record came from
    /// the local machine, so the host width is used.
    pub const fn from_header_flags(flags: HeaderFlags) -> PointerWidth {
        return if flags.has_flag(HeaderFlags::Header32Bit) {
            PointerWidth::Bits32
        } else if flags.has_flag(HeaderFlags::Header64Bit) {
            PointerWidth::Bits64
        } else {
            PointerWidth::HOST
        };
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            PointerWidth::Bits32 => "Bits32",
            PointerWidth::Bits64 => "Bits64",
        };
        return f.pad(str);
    }
}

/// Values for the `Flags` field of an ETW `EVENT_HEADER`
/// (`EVENT_HEADER_FLAG_*`).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderFlags(u16);

#[allow(non_upper_case_globals)]
impl HeaderFlags {
    /// Returns a `HeaderFlags` with the specified numeric value.
    pub const fn from_int(value: u16) -> Self {
        return Self(value);
    }

    /// Returns the numeric value of these flags.
    pub const fn as_int(self) -> u16 {
        return self.0;
    }

    /// Returns true if `self & flag != 0`.
    pub const fn has_flag(self, flag: Self) -> bool {
        return self.0 & flag.0 != 0;
    }

    /// Returns `self | flag`.
    pub const fn or(self, flag: Self) -> Self {
        return Self(self.0 | flag.0);
    }

    /// Returns `self & !flag`.
    pub const fn and_not(self, flag: Self) -> Self {
        return Self(self.0 & !flag.0);
    }

    /// No flags set.
    pub const None: Self = Self(0);

    /// Record has extended data items.
    pub const ExtendedInfo: Self = Self(0x0001);

    /// Record came from a private session. CPU time is in `ProcessorTime`.
    pub const PrivateSession: Self = Self(0x0002);

    /// Payload is a single null-terminated UTF-16 string.
    pub const StringOnly: Self = Self(0x0004);

    /// Record was logged with `TraceMessage`.
    pub const TraceMessage: Self = Self(0x0008);

    /// Kernel/user times were not recorded. CPU time is in `ProcessorTime`.
    pub const NoCpuTime: Self = Self(0x0010);

    /// Record was emitted by a 32-bit process.
    pub const Header32Bit: Self = Self(0x0020);

    /// Record was emitted by a 64-bit process.
    pub const Header64Bit: Self = Self(0x0040);

    /// Record was logged by a classic (MOF) provider.
    pub const ClassicHeader: Self = Self(0x0100);

    /// The buffer context holds a full processor index rather than a processor number.
    pub const ProcessorIndex: Self = Self(0x0200);
}

/// Fixed-width value types. The encoded size of each type does not depend on
/// the record it appears in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 1-byte unsigned integer.
    U8,
    /// 1-byte signed integer.
    I8,
    /// 1-byte boolean: any nonzero value is true.
    Bool,
    /// 2-byte unsigned integer.
    U16,
    /// 2-byte signed integer.
    I16,
    /// 4-byte unsigned integer.
    U32,
    /// 4-byte signed integer.
    I32,
    /// 4-byte unsigned integer, formatted as hex.
    HexU32,
    /// 8-byte unsigned integer.
    U64,
    /// 8-byte signed integer.
    I64,
    /// 8-byte unsigned integer, formatted as hex.
    HexU64,
    /// 4-byte IEEE float.
    F32,
    /// 8-byte IEEE float.
    F64,
    /// 16-byte GUID in Windows (mixed-endian) layout.
    Guid,
    /// 8-byte signed count of 100ns intervals since 1601-01-01 (Windows `FILETIME`).
    FileTime,
}

impl ScalarType {
    /// Returns the encoded size of the type in bytes: 1, 2, 4, 8, or 16.
    pub const fn size(self) -> usize {
        return match self {
            ScalarType::U8 | ScalarType::I8 | ScalarType::Bool => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::HexU32 | ScalarType::F32 => 4,
            ScalarType::U64
            | ScalarType::I64
            | ScalarType::HexU64
            | ScalarType::F64
            | ScalarType::FileTime => 8,
            ScalarType::Guid => 16,
        };
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            ScalarType::U8 => "U8",
            ScalarType::I8 => "I8",
            ScalarType::Bool => "Bool",
            ScalarType::U16 => "U16",
            ScalarType::I16 => "I16",
            ScalarType::U32 => "U32",
            ScalarType::I32 => "I32",
            ScalarType::HexU32 => "HexU32",
            ScalarType::U64 => "U64",
            ScalarType::I64 => "I64",
            ScalarType::HexU64 => "HexU64",
            ScalarType::F32 => "F32",
            ScalarType::F64 => "F64",
            ScalarType::Guid => "Guid",
            ScalarType::FileTime => "FileTime",
        };
        return f.pad(str);
    }
}

/// How a field is laid out in a record payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Fixed-size value. Encoded length is `ScalarType::size()`.
    Fixed(ScalarType),

    /// Pointer-sized unsigned value. Encoded length is the record's pointer
    /// width (4 or 8).
    Pointer,

    /// UTF-16LE text terminated by a zero code unit. Encoded length is
    /// discovered by scanning and includes the 2-byte terminator.
    Utf16Text,

    /// 8-bit text terminated by a zero byte. Encoded length is discovered by
    /// scanning and includes the 1-byte terminator.
    AnsiText,

    /// Sequence of pointer-sized values occupying the rest of the payload.
    /// Only valid as the last field of a schema.
    AddressArray,
}

impl FieldKind {
    /// Returns the encoded size if it is known without looking at the payload,
    /// i.e. for `Fixed` and `Pointer` fields. Returns `None` for fields whose
    /// size must be discovered from the payload.
    pub const fn static_size(self, pointer_width: PointerWidth) -> Option<usize> {
        return match self {
            FieldKind::Fixed(scalar) => Some(scalar.size()),
            FieldKind::Pointer => Some(pointer_width.size()),
            FieldKind::Utf16Text | FieldKind::AnsiText | FieldKind::AddressArray => None,
        };
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            FieldKind::Fixed(scalar) => write!(f, "Fixed({})", scalar),
            FieldKind::Pointer => f.pad("Pointer"),
            FieldKind::Utf16Text => f.pad("Utf16Text"),
            FieldKind::AnsiText => f.pad("AnsiText"),
            FieldKind::AddressArray => f.pad("AddressArray"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_width() {
        assert_eq!(4, PointerWidth::Bits32.size());
        assert_eq!(8, PointerWidth::Bits64.size());
        assert_eq!(Some(PointerWidth::Bits32), PointerWidth::from_size(4));
        assert_eq!(Some(PointerWidth::Bits64), PointerWidth::from_size(8));
        assert_eq!(None, PointerWidth::from_size(2));

        assert_eq!(
            PointerWidth::Bits32,
            PointerWidth::from_header_flags(HeaderFlags::Header32Bit.or(HeaderFlags::NoCpuTime))
        );
        assert_eq!(
            PointerWidth::Bits64,
            PointerWidth::from_header_flags(HeaderFlags::Header64Bit)
        );
        assert_eq!(
            PointerWidth::HOST,
            PointerWidth::from_header_flags(HeaderFlags::None)
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(1, ScalarType::Bool.size());
        assert_eq!(2, ScalarType::I16.size());
        assert_eq!(4, ScalarType::HexU32.size());
        assert_eq!(8, ScalarType::FileTime.size());
        assert_eq!(16, ScalarType::Guid.size());

        assert_eq!(
            Some(4),
            FieldKind::Pointer.static_size(PointerWidth::Bits32)
        );
        assert_eq!(
            Some(8),
            FieldKind::Fixed(ScalarType::U64).static_size(PointerWidth::Bits32)
        );
        assert_eq!(None, FieldKind::Utf16Text.static_size(PointerWidth::Bits64));
        assert_eq!(None, FieldKind::AddressArray.static_size(PointerWidth::Bits64));
    }
}
