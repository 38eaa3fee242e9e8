// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use alloc::collections::btree_map;
use alloc::collections::BTreeMap;
use core::fmt;

use etw_types::EventKey;
use etw_types::FieldDescriptor;
use etw_types::FieldKind;

use crate::DecodeError;
use crate::SchemaError;
use crate::MAX_FIELDS;

/// The layout of one event: its identity, a display name, and its fields in
/// declaration order.
///
/// Schemas are configuration, usually `static` data:
///
/// ```
/// use etw_decode::EventSchema;
/// use etw_types::*;
///
/// static PROCESS_START: EventSchema<'static> = EventSchema::new(
///     EventKey::new(Guid::from_fields(0x22fb2cd6, 0x0e7b, 0x422b, [0xa0, 0xc7, 0x2f, 0xad, 0x1f, 0xd0, 0xe7, 0x16]), 1, 0, 1),
///     "Process/Start",
///     &[
///         FieldDescriptor::new("ProcessId", FieldKind::Fixed(ScalarType::U32)),
///         FieldDescriptor::new("ImageName", FieldKind::Utf16Text),
///     ],
/// );
/// assert_eq!(Ok(()), PROCESS_START.validate());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSchema<'s> {
    /// Provider, id, version, and opcode of the events that use this layout.
    pub key: EventKey,

    /// Human-readable name, e.g. `"Thread/SetName"`.
    pub name: &'s str,

    /// Fields in declaration order.
    pub fields: &'s [FieldDescriptor<'s>],
}

impl<'s> EventSchema<'s> {
    /// Creates a new schema. Does not validate it.
    pub const fn new(key: EventKey, name: &'s str, fields: &'s [FieldDescriptor<'s>]) -> Self {
        return Self { key, name, fields };
    }

    /// Checks that the schema can be decoded: at most [`MAX_FIELDS`] fields,
    /// and an `AddressArray` field (if any) is the last field.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.len() > MAX_FIELDS {
            return Err(SchemaError::TooManyFields {
                key: self.key,
                count: self.fields.len(),
            });
        }

        let last = self.fields.len().saturating_sub(1);
        for (index, field) in self.fields.iter().enumerate() {
            if field.kind == FieldKind::AddressArray && index != last {
                return Err(SchemaError::AddressArrayNotLast {
                    key: self.key,
                    index,
                });
            }
        }

        return Ok(());
    }

    /// Returns the index of the first field named `name`, or `None`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        return self.fields.iter().position(|field| field.name == name);
    }
}

impl<'s> fmt::Display for EventSchema<'s> {
    /// Formats as `name(field: kind, ...)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        f.write_str("(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", field)?;
        }
        return f.write_str(")");
    }
}

/// Maps an [`EventKey`] to the [`EventSchema`] that describes records with
/// that key.
///
/// The catalogue is populated ahead of time and is read-only while decoding,
/// so it can be shared by reference between threads. Lookup is O(log n).
#[derive(Clone, Debug, Default)]
pub struct SchemaCatalogue<'s> {
    schemas: BTreeMap<EventKey, EventSchema<'s>>,
}

impl<'s> SchemaCatalogue<'s> {
    /// Creates an empty catalogue.
    pub const fn new() -> Self {
        return Self {
            schemas: BTreeMap::new(),
        };
    }

    /// Adds a schema to the catalogue.
    ///
    /// Returns an error if the schema is not valid (see
    /// [`EventSchema::validate`]) or if a schema with the same key is
    /// already registered. On error, the catalogue is unchanged.
    pub fn insert(&mut self, schema: EventSchema<'s>) -> Result<(), SchemaError> {
        schema.validate()?;
        return match self.schemas.entry(schema.key) {
            btree_map::Entry::Occupied(_) => {
                tracing::debug!(key = %schema.key, name = schema.name, "duplicate schema");
                Err(SchemaError::DuplicateKey(schema.key))
            }
            btree_map::Entry::Vacant(entry) => {
                tracing::debug!(
                    key = %schema.key,
                    name = schema.name,
                    fields = schema.fields.len(),
                    "registered schema"
                );
                entry.insert(schema);
                Ok(())
            }
        };
    }

    /// Adds each schema in `schemas`, stopping at the first error.
    pub fn insert_all<I>(&mut self, schemas: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = EventSchema<'s>>,
    {
        for schema in schemas {
            self.insert(schema)?;
        }

        return Ok(());
    }

    /// Returns the schema registered for `key`, or `UnknownSchema`.
    pub fn lookup(&self, key: &EventKey) -> Result<&EventSchema<'s>, DecodeError> {
        return match self.schemas.get(key) {
            Some(schema) => Ok(schema),
            None => {
                tracing::debug!(key = %key, "no schema for event");
                Err(DecodeError::UnknownSchema(*key))
            }
        };
    }

    /// Returns true if a schema is registered for `key`.
    pub fn contains(&self, key: &EventKey) -> bool {
        return self.schemas.contains_key(key);
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        return self.schemas.len();
    }

    /// Returns true if no schemas are registered.
    pub fn is_empty(&self) -> bool {
        return self.schemas.is_empty();
    }

    /// Iterates the registered schemas in key order.
    pub fn iter(&self) -> impl Iterator<Item = &EventSchema<'s>> {
        return self.schemas.values();
    }
}
