// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;

use crate::enums::FieldKind;
use crate::guid::Guid;

/// Identity of an event schema: the tuple used to select the field layout
/// for an arriving record.
///
/// A given provider may reuse an event id with different versions or opcodes,
/// and each combination may have its own layout. Classic (MOF) kernel events
/// are distinguished by opcode, manifest events by id and version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    /// Id of the provider that emitted the event.
    pub provider: Guid,

    /// Event id. Classic kernel events use 0.
    pub id: u16,

    /// Version of the event's layout.
    pub version: u8,

    /// Event opcode, e.g. 1=start, 2=stop, or a provider-defined value.
    pub opcode: u8,
}

impl EventKey {
    /// Creates a new key.
    pub const fn new(provider: Guid, id: u16, version: u8, opcode: u8) -> EventKey {
        return EventKey {
            provider,
            id,
            version,
            opcode,
        };
    }
}

impl fmt::Display for EventKey {
    /// Formats as `{provider}/id=N,v=N,op=N`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "{{{}}}/id={},v={},op={}",
            self.provider, self.id, self.version, self.opcode
        );
    }
}

/// Characteristics of an ETW event: the `EVENT_DESCRIPTOR` that appears in
/// every `EVENT_HEADER`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventDescriptor {
    /// Event id. Classic kernel events use 0.
    pub id: u16,

    /// Version of the event's layout.
    pub version: u8,

    /// Channel the event is logged to.
    pub channel: u8,

    /// Severity level: 1=critical, 2=error, 3=warning, 4=info, 5=verbose.
    pub level: u8,

    /// Event opcode.
    pub opcode: u8,

    /// Provider-defined task.
    pub task: u16,

    /// Keyword (category) bits.
    pub keyword: u64,
}

impl EventDescriptor {
    /// Size of the encoded descriptor in bytes.
    pub const SIZE: usize = 16;

    /// Returns the key used to look up this event's schema.
    pub const fn key(&self, provider: Guid) -> EventKey {
        return EventKey::new(provider, self.id, self.version, self.opcode);
    }
}

/// Name and layout of one field in an event schema.
///
/// Schema tables are usually `static` data, so this is const-constructible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldDescriptor<'s> {
    /// Field name, e.g. `"ProcessId"`.
    pub name: &'s str,

    /// Field layout.
    pub kind: FieldKind,
}

impl<'s> FieldDescriptor<'s> {
    /// Creates a new field descriptor.
    pub const fn new(name: &'s str, kind: FieldKind) -> Self {
        return Self { name, kind };
    }
}

impl<'s> fmt::Display for FieldDescriptor<'s> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}: {}", self.name, self.kind);
    }
}
