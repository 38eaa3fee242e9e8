// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

/// Flags that control how records are decoded and formatted.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DecodeOptions(u32);

#[allow(non_upper_case_globals)]
impl DecodeOptions {
    /// Returns a `DecodeOptions` with the specified numeric value.
    pub const fn from_int(value: u32) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this `DecodeOptions` value.
    pub const fn as_int(self) -> u32 {
        return self.0;
    }

    /// Returns true if `self & flag != 0`.
    pub const fn has_flag(self, flag: Self) -> bool {
        return self.0 & flag.0 != 0;
    }

    /// Returns `self & flag`.
    pub const fn and(self, flag: Self) -> Self {
        return Self(self.0 & flag.0);
    }

    /// Returns `self & !flag`.
    pub const fn and_not(self, flag: Self) -> Self {
        return Self(self.0 & !flag.0);
    }

    /// Returns `self | flag`.
    pub const fn or(self, flag: Self) -> Self {
        return Self(self.0 | flag.0);
    }

    /// No flags set.
    pub const None: Self = Self(0);

    /// Add spaces to JSON output, e.g. `{ "Name": [ 1, 2, 3 ] }` instead of `{"Name":[1,2,3]}`.
    pub const Space: Self = Self(0x01);

    /// If set, text containing unpaired UTF-16 surrogates fails to decode with
    /// `InvalidText`. If unset, unpaired surrogates are replaced with U+FFFD.
    pub const StrictText: Self = Self(0x02);

    /// If set, pointers and address-array elements format in JSON as strings
    /// like "0x7FF6A0001000". If unset, they format as decimal numbers.
    pub const PointerAsString: Self = Self(0x04);

    /// If set, hex integers format in JSON as strings like "0xF123".
    /// If unset, they format as decimal numbers.
    pub const HexIntAsString: Self = Self(0x08);

    /// If set, FILETIME values format as a date string like "2024-04-08T23:59:59.1234567Z"
    /// when the date is representable. If unset, they format as the raw integer.
    pub const FileTimeAsString: Self = Self(0x10);

    /// Default flags.
    pub const Default: Self = Self(
        Self::Space.0 | Self::PointerAsString.0 | Self::HexIntAsString.0 | Self::FileTimeAsString.0,
    );

    /// All flags set.
    pub const All: Self = Self(!0u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        const OPTIONS: DecodeOptions = DecodeOptions::Default
            .and_not(DecodeOptions::Space)
            .or(DecodeOptions::StrictText);

        assert!(OPTIONS.has_flag(DecodeOptions::StrictText));
        assert!(OPTIONS.has_flag(DecodeOptions::PointerAsString));
        assert!(!OPTIONS.has_flag(DecodeOptions::Space));
        assert!(!DecodeOptions::Default.has_flag(DecodeOptions::StrictText));
        assert!(DecodeOptions::All.has_flag(DecodeOptions::StrictText));
        assert!(!DecodeOptions::None.has_flag(DecodeOptions::All));
        assert_eq!(
            DecodeOptions::Space,
            DecodeOptions::Default.and(DecodeOptions::Space)
        );
        assert_eq!(0x02, DecodeOptions::from_int(0x02).as_int());
    }
}
