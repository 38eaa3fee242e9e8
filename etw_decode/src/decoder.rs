// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use alloc::vec::Vec;

use etw_types::FieldDescriptor;
use etw_types::PointerWidth;

use crate::display;
use crate::DecodeError;
use crate::DecodeOptions;
use crate::EventSchema;
use crate::FieldCursor;
use crate::FieldValue;
use crate::RecordEnvelope;
use crate::RecordHeader;
use crate::SchemaCatalogue;

/// Decodes records using the schemas in a [`SchemaCatalogue`].
///
/// The decoder holds no per-record state, so one decoder can be shared by
/// reference across threads; each call to [`EventDecoder::decode`] uses its
/// own [`FieldCursor`].
#[derive(Clone, Copy, Debug)]
pub struct EventDecoder<'cat, 's> {
    catalogue: &'cat SchemaCatalogue<'s>,
    options: DecodeOptions,
}

impl<'cat, 's> EventDecoder<'cat, 's> {
    /// Creates a decoder that uses [`DecodeOptions::Default`].
    pub const fn new(catalogue: &'cat SchemaCatalogue<'s>) -> Self {
        return Self::with_options(catalogue, DecodeOptions::Default);
    }

    /// Creates a decoder with the specified options.
    pub const fn with_options(catalogue: &'cat SchemaCatalogue<'s>, options: DecodeOptions) -> Self {
        return Self { catalogue, options };
    }

    /// The catalogue used to find schemas.
    pub const fn catalogue(&self) -> &'cat SchemaCatalogue<'s> {
        return self.catalogue;
    }

    /// The options used for decoding.
    pub const fn options(&self) -> DecodeOptions {
        return self.options;
    }

    /// Finds the schema for `record` and decodes all of its fields.
    ///
    /// Returns `UnknownSchema` if the catalogue has no schema for the
    /// record's key, or the first error encountered while decoding a field.
    /// No partially-decoded event is returned.
    pub fn decode<'dat>(
        &self,
        record: &RecordEnvelope<'dat>,
    ) -> Result<DecodedEvent<'s, 'dat>, DecodeError> {
        let schema = *self.catalogue.lookup(&record.key())?;
        return Self::decode_with_schema(record, schema, self.options);
    }

    /// Decodes all fields of `record` using `schema`, without consulting a
    /// catalogue. The caller is responsible for choosing a matching schema.
    pub fn decode_with_schema<'dat>(
        record: &RecordEnvelope<'dat>,
        schema: EventSchema<'s>,
        options: DecodeOptions,
    ) -> Result<DecodedEvent<'s, 'dat>, DecodeError> {
        let mut cursor = FieldCursor::with_options(record, schema.fields, options)?;
        let mut values = Vec::with_capacity(schema.fields.len());
        for index in 0..schema.fields.len() {
            values.push(cursor.value(index)?);
        }

        return Ok(DecodedEvent {
            header: *record.header(),
            pointer_width: record.pointer_width(),
            schema,
            values,
        });
    }
}

/// The named, typed values of one record, in declaration order.
///
/// Text values are owned. Address arrays borrow from the record's payload,
/// so the event cannot outlive the buffer it was decoded from.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedEvent<'s, 'dat> {
    header: RecordHeader,
    pointer_width: PointerWidth,
    schema: EventSchema<'s>,
    values: Vec<FieldValue<'dat>>,
}

impl<'s, 'dat> DecodedEvent<'s, 'dat> {
    /// Header of the record that was decoded.
    pub const fn header(&self) -> &RecordHeader {
        return &self.header;
    }

    /// Pointer width of the record that was decoded.
    pub const fn pointer_width(&self) -> PointerWidth {
        return self.pointer_width;
    }

    /// Schema used to decode the record.
    pub const fn schema(&self) -> &EventSchema<'s> {
        return &self.schema;
    }

    /// Schema name, e.g. `"Thread/SetName"`.
    pub const fn name(&self) -> &'s str {
        return self.schema.name;
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        return self.values.len();
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        return self.values.is_empty();
    }

    /// Returns the value of the first field named `name`, or `None`.
    pub fn get(&self, name: &str) -> Option<&FieldValue<'dat>> {
        return self.schema.index_of(name).map(|index| &self.values[index]);
    }

    /// Returns the value of field `index`, or `None` if out of range.
    pub fn value(&self, index: usize) -> Option<&FieldValue<'dat>> {
        return self.values.get(index);
    }

    /// Values in declaration order.
    pub fn values(&self) -> &[FieldValue<'dat>] {
        return &self.values;
    }

    /// Iterates (field, value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'s FieldDescriptor<'s>, &FieldValue<'dat>)> {
        return self.schema.fields.iter().zip(self.values.iter());
    }

    /// Returns a formatter that writes the event as a JSON object, e.g.
    /// `{ "n": "Thread/SetName", "ProcessId": 4, ..., "meta": { ... } }`.
    pub fn json_display(&self, options: DecodeOptions) -> display::DecodedEventJsonDisplay<'_, 's, 'dat> {
        return display::DecodedEventJsonDisplay::new(self, options);
    }
}
