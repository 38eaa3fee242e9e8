// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![no_std]
#![warn(missing_docs)]
#![allow(clippy::needless_return)]

//! Types for identifying ETW events and describing the layout of their payloads.
//!
//! These types are shared by schema tables (static data) and by the
//! `etw_decode` decoding engine.

pub use descriptors::EventDescriptor;
pub use descriptors::EventKey;
pub use descriptors::FieldDescriptor;
pub use enums::FieldKind;
pub use enums::HeaderFlags;
pub use enums::PointerWidth;
pub use enums::ScalarType;
pub use guid::Guid;

pub mod changelog;

mod descriptors;
mod enums;
mod guid;
