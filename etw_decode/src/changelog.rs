// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Release history

#[allow(unused_imports)]
use crate::*; // For docs

/// # v0.1.0 (2026-10-18)
/// - Initial release: [`RecordEnvelope`], [`FieldCursor`], [`FieldValue`],
///   [`SchemaCatalogue`], [`EventDecoder`].
/// - UTF-16LE and ANSI text scanning in [`text`], little-endian readers in
///   [`scalar`].
/// - JSON and FILETIME formatting in [`display`].
/// - NT Kernel Logger schemas for thread names, image loads, and stack walks
///   in [`kernel_schemas`].
pub mod v0_1_0 {}
