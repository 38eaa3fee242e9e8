// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![no_std]
#![warn(missing_docs)]
#![allow(clippy::needless_return)]

//! ETW trace record decoding
//!
//! Decodes the binary payload of an ETW record into named, typed values,
//! given the record's header and a field layout from a [`SchemaCatalogue`].
//!
//! - [`RecordEnvelope`] is a borrowed view of one record: header, pointer
//!   width, and payload bytes.
//! - [`FieldCursor`] finds the offset of each field, scanning variable-length
//!   text as needed and memoizing the results.
//! - [`EventDecoder`] looks up a record's schema and decodes every field into
//!   a [`DecodedEvent`].
//!
//! ```
//! use etw_decode::*;
//! use etw_types::*;
//!
//! let mut catalogue = SchemaCatalogue::new();
//! kernel_schemas::register_kernel_schemas(&mut catalogue).unwrap();
//!
//! let header = RecordHeader {
//!     provider: kernel_schemas::THREAD_GUID,
//!     descriptor: EventDescriptor { version: 2, opcode: 72, ..EventDescriptor::default() },
//!     ..RecordHeader::default()
//! };
//! let payload = [4, 0, 0, 0, 8, 0, 0, 0, b'T', 0, 0, 0];
//! let record = RecordEnvelope::new(header, PointerWidth::Bits64, &payload);
//!
//! let event = EventDecoder::new(&catalogue).decode(&record).unwrap();
//! assert_eq!("Thread/SetName", event.name());
//! assert_eq!(Some("T"), event.get("ThreadName").and_then(|v| v.as_str()));
//! ```

extern crate alloc;

pub use address::AddressSequence;
pub use cursor::FieldCursor;
pub use cursor::FieldSpan;
pub use cursor::MAX_FIELDS;
pub use decoder::DecodedEvent;
pub use decoder::EventDecoder;
pub use error::DecodeError;
pub use error::SchemaError;
pub use options::DecodeOptions;
pub use record::RecordEnvelope;
pub use record::RecordHeader;
pub use schema::EventSchema;
pub use schema::SchemaCatalogue;
pub use value::FieldValue;

pub mod changelog;
pub mod display;
pub mod kernel_schemas;
pub mod scalar;
pub mod text;

mod address;
mod cursor;
mod decoder;
mod error;
mod options;
mod record;
mod schema;
mod value;
