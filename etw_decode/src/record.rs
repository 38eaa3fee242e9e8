// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use etw_types::EventDescriptor;
use etw_types::EventKey;
use etw_types::Guid;
use etw_types::HeaderFlags;
use etw_types::PointerWidth;

use crate::scalar;
use crate::DecodeError;

/// Header information for one captured record, as supplied by the capture
/// layer. Copied out of the capture buffer, so it does not borrow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordHeader {
    /// Id of the provider that emitted the record.
    pub provider: Guid,

    /// Event id, version, level, opcode, etc.
    pub descriptor: EventDescriptor,

    /// `EVENT_HEADER_FLAG_*` values, including pointer width.
    pub flags: HeaderFlags,

    /// Id of the process that emitted the record.
    pub process_id: u32,

    /// Id of the thread that emitted the record.
    pub thread_id: u32,

    /// Timestamp, in the session's clock units.
    pub timestamp: i64,

    /// Processor that the record was logged on.
    pub processor_number: u8,

    /// Kernel-mode CPU time for the thread, in clock ticks.
    /// `None` for private sessions and records without CPU times.
    pub kernel_time: Option<u64>,

    /// User-mode CPU time for the thread, in clock ticks.
    /// `None` for private sessions and records without CPU times.
    pub user_time: Option<u64>,

    /// Processor time, in clock ticks. Present instead of kernel/user time
    /// for private sessions and records with `NoCpuTime`.
    pub processor_time: Option<u64>,

    /// Activity id associated with the record, or zero.
    pub activity_id: Guid,
}

impl RecordHeader {
    /// Size of an encoded ETW `EVENT_HEADER`.
    pub const EVENT_HEADER_SIZE: usize = 80;

    /// Parses a little-endian ETW `EVENT_HEADER` (80 bytes) from the start of
    /// `bytes`. The processor number is not part of `EVENT_HEADER` (it comes
    /// from the buffer context), so it is passed separately.
    ///
    /// If the header's flags include `PrivateSession` or `NoCpuTime`, the
    /// 8-byte time union is read as `processor_time`; otherwise it is read as
    /// `kernel_time` followed by `user_time`.
    ///
    /// Returns `Truncated` if `bytes` is shorter than 80 bytes.
    pub fn parse_event_header(bytes: &[u8], processor_number: u8) -> Result<Self, DecodeError> {
        if bytes.len() < Self::EVENT_HEADER_SIZE {
            tracing::debug!(len = bytes.len(), "event header truncated");
            return Err(DecodeError::Truncated {
                offset: 0,
                available: bytes.len(),
            });
        }

        // 0: Size, 2: HeaderType, 6: EventProperty are not needed for decoding.
        let flags = HeaderFlags::from_int(scalar::read_u16(&bytes[4..]));
        let descriptor = EventDescriptor {
            id: scalar::read_u16(&bytes[40..]),
            version: scalar::read_u8(&bytes[42..]),
            channel: scalar::read_u8(&bytes[43..]),
            level: scalar::read_u8(&bytes[44..]),
            opcode: scalar::read_u8(&bytes[45..]),
            task: scalar::read_u16(&bytes[46..]),
            keyword: scalar::read_u64(&bytes[48..]),
        };

        let processor_time_only = flags.has_flag(HeaderFlags::PrivateSession)
            || flags.has_flag(HeaderFlags::NoCpuTime);
        let (kernel_time, user_time, processor_time) = if processor_time_only {
            (None, None, Some(scalar::read_u64(&bytes[56..])))
        } else {
            (
                Some(scalar::read_u32(&bytes[56..]) as u64),
                Some(scalar::read_u32(&bytes[60..]) as u64),
                None,
            )
        };

        return Ok(Self {
            provider: scalar::read_guid(&bytes[24..]),
            descriptor,
            flags,
            process_id: scalar::read_u32(&bytes[12..]),
            thread_id: scalar::read_u32(&bytes[8..]),
            timestamp: scalar::read_i64(&bytes[16..]),
            processor_number,
            kernel_time,
            user_time,
            processor_time,
            activity_id: scalar::read_guid(&bytes[64..]),
        });
    }

    /// Returns the key used to look up this record's schema.
    pub const fn key(&self) -> EventKey {
        return self.descriptor.key(self.provider);
    }
}

/// Borrowed view of one captured record: header plus payload bytes.
///
/// The payload belongs to the capture layer and is only valid for the
/// duration of the callback that delivered it; the `'dat` lifetime ties every
/// value decoded from the payload to that buffer. The payload is never copied.
#[derive(Clone, Copy, Debug)]
pub struct RecordEnvelope<'dat> {
    header: RecordHeader,
    pointer_width: PointerWidth,
    payload: &'dat [u8],
}

impl<'dat> RecordEnvelope<'dat> {
    /// Creates a view of a record with an explicit pointer width.
    pub const fn new(
        header: RecordHeader,
        pointer_width: PointerWidth,
        payload: &'dat [u8],
    ) -> Self {
        return Self {
            header,
            pointer_width,
            payload,
        };
    }

    /// Creates a view of a record, taking the pointer width from the header's
    /// `Header32Bit`/`Header64Bit` flags.
    pub const fn from_header(header: RecordHeader, payload: &'dat [u8]) -> Self {
        return Self::new(
            header,
            PointerWidth::from_header_flags(header.flags),
            payload,
        );
    }

    /// The record's header.
    pub const fn header(&self) -> &RecordHeader {
        return &self.header;
    }

    /// Size of pointer fields in this record's payload.
    pub const fn pointer_width(&self) -> PointerWidth {
        return self.pointer_width;
    }

    /// The record's payload (user data) bytes.
    pub const fn payload(&self) -> &'dat [u8] {
        return self.payload;
    }

    /// Returns the key used to look up this record's schema.
    pub const fn key(&self) -> EventKey {
        return self.header.key();
    }

    /// Id of the provider that emitted the record.
    pub const fn provider(&self) -> Guid {
        return self.header.provider;
    }

    /// Id of the process that emitted the record.
    pub const fn process_id(&self) -> u32 {
        return self.header.process_id;
    }

    /// Id of the thread that emitted the record.
    pub const fn thread_id(&self) -> u32 {
        return self.header.thread_id;
    }

    /// Timestamp, in the session's clock units.
    pub const fn timestamp(&self) -> i64 {
        return self.header.timestamp;
    }

    /// Processor that the record was logged on.
    pub const fn processor_number(&self) -> u8 {
        return self.header.processor_number;
    }

    /// Kernel-mode CPU time, if recorded.
    pub const fn kernel_time(&self) -> Option<u64> {
        return self.header.kernel_time;
    }

    /// User-mode CPU time, if recorded.
    pub const fn user_time(&self) -> Option<u64> {
        return self.header.user_time;
    }

    /// Processor time, if recorded.
    pub const fn processor_time(&self) -> Option<u64> {
        return self.header.processor_time;
    }
}
