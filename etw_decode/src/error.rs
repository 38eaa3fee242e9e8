// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use etw_types::EventKey;
use thiserror::Error;

/// Errors returned while decoding a record.
///
/// A malformed record cannot be fixed by retrying, so these are always
/// returned to the caller, which decides whether to skip the record, log it,
/// or stop processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A field extends past the end of the payload, e.g. a fixed-size field
    /// with too few bytes remaining or a string with no terminator.
    ///
    /// `offset` is where the field starts; `available` is the number of
    /// payload bytes from `offset` to the end of the payload.
    #[error("field at offset {offset} is truncated ({available} bytes available)")]
    Truncated {
        /// Offset of the field within the slice being decoded.
        offset: usize,
        /// Bytes available starting at `offset`.
        available: usize,
    },

    /// No schema is registered for the record's provider, id, version, and opcode.
    #[error("no schema registered for event {0}")]
    UnknownSchema(EventKey),

    /// Text is not valid UTF-16. Only returned when strict text decoding is
    /// requested; by default invalid code units are replaced with U+FFFD.
    #[error("invalid UTF-16 code unit at offset {offset}")]
    InvalidText {
        /// Offset of the first invalid code unit within the slice being
        /// decoded. Errors from a cursor use payload offsets.
        offset: usize,
    },

    /// An `AddressArray` field is followed by another field. Address arrays
    /// occupy the rest of the payload, so nothing can follow them.
    #[error("address array at field {index} is not the last field")]
    AddressArrayNotLast {
        /// Index of the address array field.
        index: usize,
    },

    /// A field index is not less than the number of fields in the schema.
    #[error("field index {index} out of range (schema has {count} fields)")]
    FieldIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of fields in the schema.
        count: usize,
    },

    /// A field list has more than [`crate::MAX_FIELDS`] fields.
    #[error("{count} fields exceeds the limit of {max}", max = crate::MAX_FIELDS)]
    TooManyFields {
        /// Number of fields in the list.
        count: usize,
    },

    /// A payload is too large to be addressed with 32-bit offsets.
    #[error("payload of {len} bytes is too large")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
    },
}

/// Errors returned when a schema is registered in a [`crate::SchemaCatalogue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema has more than [`crate::MAX_FIELDS`] fields.
    #[error("schema for {key} has {count} fields, limit is {max}", max = crate::MAX_FIELDS)]
    TooManyFields {
        /// Key of the rejected schema.
        key: EventKey,
        /// Number of fields in the schema.
        count: usize,
    },

    /// An `AddressArray` field is followed by another field. Address arrays
    /// occupy the rest of the payload, so nothing can follow them.
    #[error("schema for {key} has an address array at field {index} that is not the last field")]
    AddressArrayNotLast {
        /// Key of the rejected schema.
        key: EventKey,
        /// Index of the address array field.
        index: usize,
    },

    /// A schema with the same key is already registered.
    #[error("a schema for {0} is already registered")]
    DuplicateKey(EventKey),
}

impl DecodeError {
    /// Returns the error with `base` added to any offset it carries, for
    /// errors produced by decoding a sub-slice that starts at `base`.
    pub(crate) const fn at_base_offset(self, base: usize) -> Self {
        return match self {
            DecodeError::Truncated { offset, available } => DecodeError::Truncated {
                offset: offset + base,
                available,
            },
            DecodeError::InvalidText { offset } => DecodeError::InvalidText {
                offset: offset + base,
            },
            other => other,
        };
    }
}
