// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::ops;

use etw_types::FieldDescriptor;
use etw_types::FieldKind;
use etw_types::PointerWidth;

use crate::scalar;
use crate::text;
use crate::AddressSequence;
use crate::DecodeError;
use crate::DecodeOptions;
use crate::FieldValue;
use crate::RecordEnvelope;

/// Maximum number of fields in a field list.
pub const MAX_FIELDS: usize = 64;

/// Location of a field within a record's payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldSpan {
    /// Offset of the first byte of the field.
    pub offset: u32,

    /// Encoded length of the field, including any terminator.
    pub len: u32,
}

impl FieldSpan {
    /// Offset of the first byte after the field.
    pub const fn end(&self) -> u32 {
        return self.offset + self.len;
    }

    /// Range of payload bytes covered by the field.
    pub const fn range(&self) -> ops::Range<usize> {
        return self.offset as usize..self.end() as usize;
    }
}

/// Resolves the location of each field of one record.
///
/// Fields are laid out back to back in declaration order, and some have
/// lengths that can only be found by scanning the payload. The offset of field
/// `i` is therefore the offset of field `i - 1` plus the encoded length of
/// field `i - 1`, with field 0 at offset 0.
///
/// Offsets and lengths are memoized: requesting any field resolves (once) all
/// earlier fields that are not yet resolved, and later requests for the same
/// or an earlier field are O(1). Total work to resolve fields `0..=k` is O(k)
/// regardless of the order they are requested in.
///
/// A cursor is created per record and discarded after decoding. Resolution
/// mutates cursor-local state, so methods take `&mut self`; separate records
/// can be decoded on separate threads with separate cursors.
#[derive(Clone, Debug)]
pub struct FieldCursor<'sch, 'dat> {
    fields: &'sch [FieldDescriptor<'sch>],
    payload: &'dat [u8],
    pointer_width: PointerWidth,
    options: DecodeOptions,
    offsets: [Option<u32>; MAX_FIELDS],
    lengths: [Option<u32>; MAX_FIELDS],
    computed_lengths: usize,
}

impl<'sch, 'dat> FieldCursor<'sch, 'dat> {
    /// Creates a cursor for decoding `record` using the layout `fields`.
    ///
    /// Returns `TooManyFields` if `fields` has more than [`MAX_FIELDS`]
    /// entries, `AddressArrayNotLast` if an `AddressArray` field is followed
    /// by another field, or `PayloadTooLarge` if the payload cannot be
    /// addressed with 32-bit offsets.
    pub fn new(
        record: &RecordEnvelope<'dat>,
        fields: &'sch [FieldDescriptor<'sch>],
    ) -> Result<Self, DecodeError> {
        return Self::with_options(record, fields, DecodeOptions::Default);
    }

    /// Creates a cursor with the specified decoding options. Only
    /// [`DecodeOptions::StrictText`] affects decoding.
    pub fn with_options(
        record: &RecordEnvelope<'dat>,
        fields: &'sch [FieldDescriptor<'sch>],
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        if fields.len() > MAX_FIELDS {
            return Err(DecodeError::TooManyFields {
                count: fields.len(),
            });
        }

        let last = fields.len().saturating_sub(1);
        if let Some(index) = fields[..last]
            .iter()
            .position(|field| field.kind == FieldKind::AddressArray)
        {
            return Err(DecodeError::AddressArrayNotLast { index });
        }

        let payload = record.payload();
        if u32::try_from(payload.len()).is_err() {
            return Err(DecodeError::PayloadTooLarge { len: payload.len() });
        }

        return Ok(Self {
            fields,
            payload,
            pointer_width: record.pointer_width(),
            options,
            offsets: [None; MAX_FIELDS],
            lengths: [None; MAX_FIELDS],
            computed_lengths: 0,
        });
    }

    /// The field list this cursor decodes.
    pub const fn fields(&self) -> &'sch [FieldDescriptor<'sch>] {
        return self.fields;
    }

    /// Number of fields in the field list.
    pub const fn field_count(&self) -> usize {
        return self.fields.len();
    }

    /// The payload being decoded.
    pub const fn payload(&self) -> &'dat [u8] {
        return self.payload;
    }

    /// Pointer width used for `Pointer` and `AddressArray` fields.
    pub const fn pointer_width(&self) -> PointerWidth {
        return self.pointer_width;
    }

    /// Returns the index of the first field named `name`, or `None`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        return self.fields.iter().position(|field| field.name == name);
    }

    /// Number of fields whose offsets have been resolved so far. Fields are
    /// always resolved in declaration order, so these are fields `0..n`.
    pub fn resolved_count(&self) -> usize {
        return self.offsets.iter().take_while(|offset| offset.is_some()).count();
    }

    /// Returns the offset of field `index` within the payload.
    ///
    /// Resolves the lengths of fields `0..index` if they are not yet known.
    /// The field's own length is not needed, so this succeeds even if field
    /// `index` itself is truncated. Returns `Truncated` if an earlier field
    /// extends past the end of the payload.
    pub fn offset(&mut self, index: usize) -> Result<u32, DecodeError> {
        self.check_index(index)?;
        if let Some(offset) = self.offsets[index] {
            return Ok(offset);
        }

        // Offsets are resolved in order, so walk back to the last known one.
        let mut first = index;
        while first > 0 && self.offsets[first].is_none() {
            first -= 1;
        }

        // offsets[0] is the base case.
        let mut offset = self.offsets[first].unwrap_or(0);
        self.offsets[first] = Some(offset);
        for i in first..index {
            offset += self.length_at(i, offset)?;
            self.offsets[i + 1] = Some(offset);
            tracing::trace!(index = i + 1, offset, "resolved field offset");
        }

        return Ok(offset);
    }

    /// Returns the offset and encoded length of field `index`.
    ///
    /// Returns `Truncated` if field `index` or an earlier field extends past
    /// the end of the payload.
    pub fn span(&mut self, index: usize) -> Result<FieldSpan, DecodeError> {
        let offset = self.offset(index)?;
        let len = self.length_at(index, offset)?;
        return Ok(FieldSpan { offset, len });
    }

    /// Returns the payload bytes of field `index`, including any terminator.
    pub fn field_bytes(&mut self, index: usize) -> Result<&'dat [u8], DecodeError> {
        let span = self.span(index)?;
        return Ok(&self.payload[span.range()]);
    }

    /// Decodes the value of field `index`.
    pub fn value(&mut self, index: usize) -> Result<FieldValue<'dat>, DecodeError> {
        let span = self.span(index)?;
        let bytes = &self.payload[span.range()];
        let base = span.offset as usize;
        let value = match self.fields[index].kind {
            FieldKind::Fixed(scalar_type) => FieldValue::from_scalar(scalar_type, bytes),
            FieldKind::Pointer => {
                FieldValue::Pointer(scalar::read_pointer(bytes, self.pointer_width))
            }
            // span.len includes the terminator.
            FieldKind::Utf16Text => {
                let units = &bytes[..bytes.len() - 2];
                FieldValue::Text(if self.options.has_flag(DecodeOptions::StrictText) {
                    text::decode_text_strict(units).map_err(|e| e.at_base_offset(base))?
                } else {
                    text::decode_text(units)
                })
            }
            FieldKind::AnsiText => FieldValue::AnsiText(text::decode_ansi_text(&bytes[..bytes.len() - 1])),
            FieldKind::AddressArray => {
                FieldValue::Addresses(AddressSequence::new(bytes, self.pointer_width))
            }
        };

        return Ok(value);
    }

    fn check_index(&self, index: usize) -> Result<(), DecodeError> {
        return if index < self.fields.len() {
            Ok(())
        } else {
            Err(DecodeError::FieldIndexOutOfRange {
                index,
                count: self.fields.len(),
            })
        };
    }

    /// Returns the encoded length of field `index`, which starts at `offset`.
    /// PRECONDITION: offset == self.offsets[index].
    fn length_at(&mut self, index: usize, offset: u32) -> Result<u32, DecodeError> {
        if let Some(len) = self.lengths[index] {
            return Ok(len);
        }

        let field = &self.fields[index];
        let start = offset as usize;
        let remaining = self.payload.get(start..).unwrap_or(&[]);
        let pointer_size = self.pointer_width.size();
        let scanned = match field.kind.static_size(self.pointer_width) {
            Some(size) => fixed_len(size, remaining),
            None => match field.kind {
                FieldKind::Utf16Text => text::scan_text_len(remaining),
                FieldKind::AnsiText => text::scan_ansi_text_len(remaining),
                // AddressArray
                _ => Ok(remaining.len() - remaining.len() % pointer_size),
            },
        };

        self.computed_lengths += 1;
        let len = match scanned {
            Ok(len) => len as u32, // len <= payload.len() <= u32::MAX
            Err(error) => {
                tracing::debug!(
                    field = field.name,
                    index,
                    offset,
                    available = remaining.len(),
                    "field truncated"
                );
                return Err(error.at_base_offset(start));
            }
        };

        self.lengths[index] = Some(len);
        return Ok(len);
    }
}

fn fixed_len(size: usize, remaining: &[u8]) -> Result<usize, DecodeError> {
    return if size <= remaining.len() {
        Ok(size)
    } else {
        Err(DecodeError::Truncated {
            offset: 0,
            available: remaining.len(),
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordHeader;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use etw_types::ScalarType;

    const COUNT_NAME: &[FieldDescriptor<'static>] = &[
        FieldDescriptor::new("Count", FieldKind::Fixed(ScalarType::U32)),
        FieldDescriptor::new("Name", FieldKind::Utf16Text),
    ];

    const MIXED: &[FieldDescriptor<'static>] = &[
        FieldDescriptor::new("Base", FieldKind::Pointer),
        FieldDescriptor::new("Name", FieldKind::Utf16Text),
        FieldDescriptor::new("Flags", FieldKind::Fixed(ScalarType::U16)),
        FieldDescriptor::new("Module", FieldKind::AnsiText),
        FieldDescriptor::new("Enabled", FieldKind::Fixed(ScalarType::Bool)),
        FieldDescriptor::new("Stack", FieldKind::AddressArray),
    ];

    fn record(payload: &[u8], pointer_width: PointerWidth) -> RecordEnvelope<'_> {
        return RecordEnvelope::new(RecordHeader::default(), pointer_width, payload);
    }

    fn utf16(text: &str, bytes: &mut Vec<u8>) {
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
    }

    fn mixed_payload(pointer_width: PointerWidth) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x7ff6_a000_1000u64.to_le_bytes()[..pointer_width.size()]);
        utf16("ntdll", &mut bytes);
        bytes.extend_from_slice(&0x8001u16.to_le_bytes());
        bytes.extend_from_slice(b"kernel32\0");
        bytes.push(2);
        for frame in [0x1000u64, 0x2000, 0x3000] {
            bytes.extend_from_slice(&frame.to_le_bytes()[..pointer_width.size()]);
        }
        bytes.push(0xee); // Partial trailing element.
        return bytes;
    }

    #[test]
    fn count_and_name() {
        let payload = [0x05, 0x00, 0x00, 0x00, b'H', 0, b'i', 0, 0, 0];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, COUNT_NAME).unwrap();

        assert_eq!(Ok(0), cursor.offset(0));
        assert_eq!(Ok(FieldValue::U32(5)), cursor.value(0));
        assert_eq!(Ok(4), cursor.offset(1));
        assert_eq!(Ok(FieldSpan { offset: 4, len: 6 }), cursor.span(1));
        assert_eq!(Ok(FieldValue::Text("Hi".to_string())), cursor.value(1));
        assert_eq!(Ok(&payload[4..]), cursor.field_bytes(1));
    }

    #[test]
    fn text_then_fixed_offset() {
        for text in ["", "a", "hello world"] {
            let mut payload = Vec::new();
            utf16(text, &mut payload);
            payload.extend_from_slice(&7u16.to_le_bytes());

            let fields = [
                FieldDescriptor::new("Text", FieldKind::Utf16Text),
                FieldDescriptor::new("Value", FieldKind::Fixed(ScalarType::U16)),
            ];
            let record = record(&payload, PointerWidth::Bits32);
            let mut cursor = FieldCursor::new(&record, &fields).unwrap();
            let code_units = text.encode_utf16().count() as u32;
            assert_eq!(Ok(2 * (code_units + 1)), cursor.offset(1));
            assert_eq!(Ok(FieldValue::U16(7)), cursor.value(1));
        }
    }

    #[test]
    fn mixed_bits64() {
        let payload = mixed_payload(PointerWidth::Bits64);
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, MIXED).unwrap();

        assert_eq!(Ok(FieldValue::Pointer(0x7ff6_a000_1000)), cursor.value(0));
        assert_eq!(Ok(8), cursor.offset(1));
        assert_eq!(Ok(FieldValue::Text("ntdll".to_string())), cursor.value(1));
        assert_eq!(Ok(20), cursor.offset(2));
        assert_eq!(Ok(FieldValue::U16(0x8001)), cursor.value(2));
        assert_eq!(Ok(22), cursor.offset(3));
        assert_eq!(Ok(FieldValue::AnsiText("kernel32".to_string())), cursor.value(3));
        assert_eq!(Ok(31), cursor.offset(4));
        assert_eq!(Ok(FieldValue::Bool(true)), cursor.value(4));
        assert_eq!(Ok(FieldSpan { offset: 32, len: 24 }), cursor.span(5));

        let stack = cursor.value(5).unwrap().as_addresses().unwrap();
        assert_eq!(3, stack.len());
        assert_eq!([0x1000u64, 0x2000, 0x3000], stack.collect::<Vec<_>>()[..]);
    }

    #[test]
    fn mixed_bits32() {
        let payload = mixed_payload(PointerWidth::Bits32);
        let record = record(&payload, PointerWidth::Bits32);
        let mut cursor = FieldCursor::new(&record, MIXED).unwrap();

        // Truncated to 32 bits by the encoder above.
        assert_eq!(Ok(FieldValue::Pointer(0xa000_1000)), cursor.value(0));
        assert_eq!(Ok(4), cursor.offset(1));
        assert_eq!(Ok(16), cursor.offset(2));
        assert_eq!(Ok(FieldSpan { offset: 28, len: 12 }), cursor.span(5));
        assert_eq!(
            Ok("[0x1000, 0x2000, 0x3000]".to_string()),
            cursor.value(5).map(|v| v.to_string())
        );
    }

    #[test]
    fn out_of_order_matches_in_order() {
        let payload = mixed_payload(PointerWidth::Bits64);
        let record = record(&payload, PointerWidth::Bits64);

        let mut in_order = FieldCursor::new(&record, MIXED).unwrap();
        let expected: Vec<_> = (0..MIXED.len()).map(|i| in_order.offset(i)).collect();

        let mut out_of_order = FieldCursor::new(&record, MIXED).unwrap();
        assert_eq!(0, out_of_order.resolved_count());
        assert_eq!(expected[3], out_of_order.offset(3));
        assert_eq!(4, out_of_order.resolved_count());
        assert_eq!(3, out_of_order.computed_lengths);

        // Earlier fields are already memoized.
        assert_eq!(expected[1], out_of_order.offset(1));
        assert_eq!(expected[3], out_of_order.offset(3));
        assert_eq!(3, out_of_order.computed_lengths);

        for i in (0..MIXED.len()).rev() {
            assert_eq!(expected[i], out_of_order.offset(i));
        }
        assert_eq!(MIXED.len(), out_of_order.resolved_count());
        assert_eq!(MIXED.len() - 1, out_of_order.computed_lengths);

        // Spans add the last field's length, once.
        let _ = out_of_order.span(5);
        let _ = out_of_order.span(5);
        assert_eq!(MIXED.len(), out_of_order.computed_lengths);
    }

    #[test]
    fn truncated_fixed() {
        let payload = [0x05, 0x00, 0x00];
        let fields = [FieldDescriptor::new("Count", FieldKind::Fixed(ScalarType::U32))];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, &fields).unwrap();

        // The offset of a field does not depend on its own length.
        assert_eq!(Ok(0), cursor.offset(0));
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 0,
                available: 3
            }),
            cursor.value(0)
        );
    }

    #[test]
    fn truncated_pointer() {
        let payload = [1u8, 0, 0, 0, 0, 0, 0];
        let fields = [FieldDescriptor::new("Address", FieldKind::Pointer)];

        let record32 = record(&payload, PointerWidth::Bits32);
        let mut cursor = FieldCursor::new(&record32, &fields).unwrap();
        assert_eq!(Ok(FieldValue::Pointer(1)), cursor.value(0));

        let record64 = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record64, &fields).unwrap();
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 0,
                available: 7
            }),
            cursor.value(0)
        );
    }

    #[test]
    fn truncated_text_blocks_later_fields() {
        // "Count" = 1, then "Name" is missing its terminator.
        let payload = [1, 0, 0, 0, b'H', 0, b'i', 0, 0];
        let fields = [
            FieldDescriptor::new("Count", FieldKind::Fixed(ScalarType::U32)),
            FieldDescriptor::new("Name", FieldKind::Utf16Text),
            FieldDescriptor::new("After", FieldKind::Fixed(ScalarType::U8)),
        ];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, &fields).unwrap();

        let truncated = DecodeError::Truncated {
            offset: 4,
            available: 5,
        };
        assert_eq!(Ok(FieldValue::U32(1)), cursor.value(0));
        assert_eq!(Ok(4), cursor.offset(1));
        assert_eq!(Err(truncated), cursor.value(1));
        assert_eq!(Err(truncated), cursor.offset(2));
        assert_eq!(2, cursor.resolved_count());
    }

    #[test]
    fn field_at_end_of_payload() {
        let payload = [1, 0];
        let fields = [
            FieldDescriptor::new("Value", FieldKind::Fixed(ScalarType::U16)),
            FieldDescriptor::new("Text", FieldKind::Utf16Text),
            FieldDescriptor::new("Stack", FieldKind::AddressArray),
        ];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, &fields).unwrap();
        assert_eq!(Ok(2), cursor.offset(1));
        assert_eq!(
            Err(DecodeError::Truncated {
                offset: 2,
                available: 0
            }),
            cursor.value(1)
        );
    }

    #[test]
    fn empty_address_array() {
        let payload = [9, 0, 0, 0, 1, 2, 3];
        let fields = [
            FieldDescriptor::new("Value", FieldKind::Fixed(ScalarType::U32)),
            FieldDescriptor::new("Stack", FieldKind::AddressArray),
        ];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, &fields).unwrap();
        assert_eq!(Ok(FieldSpan { offset: 4, len: 0 }), cursor.span(1));
        assert_eq!(Some(0), cursor.value(1).unwrap().as_addresses().map(|a| a.len()));
    }

    #[test]
    fn strict_text() {
        let payload = [b'A', 0, 0x00, 0xD8, 0, 0];
        let fields = [FieldDescriptor::new("Text", FieldKind::Utf16Text)];
        let record = record(&payload, PointerWidth::Bits64);

        let mut cursor = FieldCursor::new(&record, &fields).unwrap();
        assert_eq!(Ok(FieldValue::Text("A\u{FFFD}".to_string())), cursor.value(0));

        let mut cursor = FieldCursor::with_options(
            &record,
            &fields,
            DecodeOptions::Default.or(DecodeOptions::StrictText),
        )
        .unwrap();
        assert_eq!(Err(DecodeError::InvalidText { offset: 2 }), cursor.value(0));
    }

    #[test]
    fn strict_text_error_uses_payload_offset() {
        let payload = [7, 0, b'A', 0, 0x00, 0xDC, 0, 0];
        let fields = [
            FieldDescriptor::new("Id", FieldKind::Fixed(ScalarType::U16)),
            FieldDescriptor::new("Text", FieldKind::Utf16Text),
        ];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor =
            FieldCursor::with_options(&record, &fields, DecodeOptions::StrictText).unwrap();
        assert_eq!(Err(DecodeError::InvalidText { offset: 4 }), cursor.value(1));
    }

    #[test]
    fn text_value_reuses_length() {
        let mut payload = Vec::new();
        utf16("abc", &mut payload);
        payload.extend_from_slice(b"xyz\0");
        let fields = [
            FieldDescriptor::new("Wide", FieldKind::Utf16Text),
            FieldDescriptor::new("Narrow", FieldKind::AnsiText),
        ];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, &fields).unwrap();
        for _ in 0..2 {
            assert_eq!(Ok(FieldValue::Text("abc".to_string())), cursor.value(0));
            assert_eq!(Ok(FieldValue::AnsiText("xyz".to_string())), cursor.value(1));
        }
        assert_eq!(2, cursor.computed_lengths);
    }

    #[test]
    fn address_array_not_last() {
        let payload = [1, 0, 0, 0, 0, 0, 0, 0, 0xee];
        let fields = [
            FieldDescriptor::new("Stack", FieldKind::AddressArray),
            FieldDescriptor::new("After", FieldKind::Fixed(ScalarType::U8)),
        ];
        let record = record(&payload, PointerWidth::Bits64);
        assert_eq!(
            Err(DecodeError::AddressArrayNotLast { index: 0 }),
            FieldCursor::new(&record, &fields).map(|_| ())
        );

        // Trailing bytes after the last whole address are not returned.
        let mut cursor = FieldCursor::new(&record, &fields[..1]).unwrap();
        assert_eq!(Ok(FieldSpan { offset: 0, len: 8 }), cursor.span(0));
        assert_eq!(
            Some(alloc::vec![1]),
            cursor.value(0).unwrap().as_addresses().map(|a| a.collect::<Vec<_>>())
        );
    }

    #[test]
    fn index_errors() {
        let payload = [0u8; 4];
        let record = record(&payload, PointerWidth::Bits64);
        let mut cursor = FieldCursor::new(&record, COUNT_NAME).unwrap();
        assert_eq!(Some(1), cursor.index_of("Name"));
        assert_eq!(None, cursor.index_of("Missing"));
        assert_eq!(2, cursor.field_count());
        assert_eq!(
            Err(DecodeError::FieldIndexOutOfRange { index: 2, count: 2 }),
            cursor.offset(2)
        );

        let too_many = [FieldDescriptor::new("F", FieldKind::Pointer); MAX_FIELDS + 1];
        assert_eq!(
            Err(DecodeError::TooManyFields {
                count: MAX_FIELDS + 1
            }),
            FieldCursor::new(&record, &too_many).map(|_| ())
        );
    }
}
