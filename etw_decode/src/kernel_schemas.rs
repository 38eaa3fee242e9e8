// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Schemas for a few classic NT Kernel Logger events.
//!
//! Classic kernel events are identified by provider (event class) GUID,
//! version, and opcode; the event id is always 0. These tables cover the
//! thread-name, image-load, and stack-walk events that a profiler needs to
//! symbolize stacks. Other events can be added to a [`SchemaCatalogue`] the
//! same way.

use etw_types::EventKey;
use etw_types::FieldDescriptor;
use etw_types::FieldKind;
use etw_types::Guid;
use etw_types::ScalarType;

use crate::EventSchema;
use crate::SchemaCatalogue;
use crate::SchemaError;

const U8: FieldKind = FieldKind::Fixed(ScalarType::U8);
const U16: FieldKind = FieldKind::Fixed(ScalarType::U16);
const U32: FieldKind = FieldKind::Fixed(ScalarType::U32);
const HEX32: FieldKind = FieldKind::Fixed(ScalarType::HexU32);
const U64: FieldKind = FieldKind::Fixed(ScalarType::U64);
const PTR: FieldKind = FieldKind::Pointer;
const TEXT: FieldKind = FieldKind::Utf16Text;

/// Thread event class: 3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c.
pub const THREAD_GUID: Guid = Guid::from_fields(
    0x3d6fa8d1,
    0xfe05,
    0x11d0,
    [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
);

/// Image event class: 2cb15d1d-5fc1-11d2-abe1-00a0c911f518.
pub const IMAGE_LOAD_GUID: Guid = Guid::from_fields(
    0x2cb15d1d,
    0x5fc1,
    0x11d2,
    [0xab, 0xe1, 0x00, 0xa0, 0xc9, 0x11, 0xf5, 0x18],
);

/// StackWalk event class: def2fe46-7bd6-4b80-bd94-f57fe20d0ce3.
pub const STACK_WALK_GUID: Guid = Guid::from_fields(
    0xdef2fe46,
    0x7bd6,
    0x4b80,
    [0xbd, 0x94, 0xf5, 0x7f, 0xe2, 0x0d, 0x0c, 0xe3],
);

const THREAD_SET_NAME_FIELDS: &[FieldDescriptor<'static>] = &[
    FieldDescriptor::new("ProcessId", U32),
    FieldDescriptor::new("TThreadId", U32),
    FieldDescriptor::new("ThreadName", TEXT),
];

const IMAGE_LOAD_FIELDS: &[FieldDescriptor<'static>] = &[
    FieldDescriptor::new("ImageBase", PTR),
    FieldDescriptor::new("ImageSize", PTR),
    FieldDescriptor::new("ProcessId", U32),
    FieldDescriptor::new("ImageCheckSum", HEX32),
    FieldDescriptor::new("TimeDateStamp", HEX32),
    FieldDescriptor::new("SignatureLevel", U8),
    FieldDescriptor::new("SignatureType", U8),
    FieldDescriptor::new("Reserved0", U16),
    FieldDescriptor::new("DefaultBase", PTR),
    FieldDescriptor::new("Reserved1", U32),
    FieldDescriptor::new("Reserved2", U32),
    FieldDescriptor::new("Reserved3", U32),
    FieldDescriptor::new("Reserved4", U32),
    FieldDescriptor::new("FileName", TEXT),
];

const STACK_WALK_FIELDS: &[FieldDescriptor<'static>] = &[
    FieldDescriptor::new("EventTimeStamp", U64),
    FieldDescriptor::new("StackProcess", U32),
    FieldDescriptor::new("StackThread", U32),
    FieldDescriptor::new("Stack", FieldKind::AddressArray),
];

/// Thread/SetName, version 2, opcode 72.
pub const THREAD_SET_NAME: EventSchema<'static> = EventSchema::new(
    EventKey::new(THREAD_GUID, 0, 2, 72),
    "Thread/SetName",
    THREAD_SET_NAME_FIELDS,
);

/// Image/Load, version 3, opcode 10.
pub const IMAGE_LOAD: EventSchema<'static> = EventSchema::new(
    EventKey::new(IMAGE_LOAD_GUID, 0, 3, 10),
    "Image/Load",
    IMAGE_LOAD_FIELDS,
);

/// Image/UnLoad, version 3, opcode 2. Same layout as Image/Load.
pub const IMAGE_UNLOAD: EventSchema<'static> = EventSchema::new(
    EventKey::new(IMAGE_LOAD_GUID, 0, 3, 2),
    "Image/UnLoad",
    IMAGE_LOAD_FIELDS,
);

/// Image/DCStart, version 3, opcode 3. Same layout as Image/Load.
pub const IMAGE_DC_START: EventSchema<'static> = EventSchema::new(
    EventKey::new(IMAGE_LOAD_GUID, 0, 3, 3),
    "Image/DCStart",
    IMAGE_LOAD_FIELDS,
);

/// Image/DCEnd, version 3, opcode 4. Same layout as Image/Load.
pub const IMAGE_DC_END: EventSchema<'static> = EventSchema::new(
    EventKey::new(IMAGE_LOAD_GUID, 0, 3, 4),
    "Image/DCEnd",
    IMAGE_LOAD_FIELDS,
);

/// StackWalk/Event, version 2, opcode 32.
pub const STACK_WALK: EventSchema<'static> = EventSchema::new(
    EventKey::new(STACK_WALK_GUID, 0, 2, 32),
    "StackWalk/Event",
    STACK_WALK_FIELDS,
);

/// All schemas defined in this module.
pub const ALL: &[EventSchema<'static>] = &[
    THREAD_SET_NAME,
    IMAGE_LOAD,
    IMAGE_UNLOAD,
    IMAGE_DC_START,
    IMAGE_DC_END,
    STACK_WALK,
];

/// Adds the schemas in [`ALL`] to `catalogue`.
pub fn register_kernel_schemas(catalogue: &mut SchemaCatalogue<'static>) -> Result<(), SchemaError> {
    return catalogue.insert_all(ALL.iter().copied());
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn register() {
        let mut catalogue = SchemaCatalogue::new();
        register_kernel_schemas(&mut catalogue).unwrap();
        assert_eq!(ALL.len(), catalogue.len());
        for schema in ALL {
            assert_eq!(Ok(()), schema.validate());
            assert_eq!(Ok(schema), catalogue.lookup(&schema.key));
        }

        // Registering twice fails on the first duplicate.
        assert_eq!(
            Err(SchemaError::DuplicateKey(THREAD_SET_NAME.key)),
            register_kernel_schemas(&mut catalogue)
        );
    }

    #[test]
    fn guids() {
        assert_eq!("3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c", THREAD_GUID.to_string());
        assert_eq!("2cb15d1d-5fc1-11d2-abe1-00a0c911f518", IMAGE_LOAD_GUID.to_string());
        assert_eq!("def2fe46-7bd6-4b80-bd94-f57fe20d0ce3", STACK_WALK_GUID.to_string());
    }
}
