// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Release history

#[allow(unused_imports)]
use crate::*; // For docs

/// # v0.1.0 (2026-10-18)
/// - Initial release: [`Guid`], [`EventKey`], [`EventDescriptor`], [`FieldDescriptor`],
///   [`FieldKind`], [`ScalarType`], [`PointerWidth`], [`HeaderFlags`].
pub mod v0_1_0 {}
