// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::iter;

use etw_types::PointerWidth;

use crate::scalar;

/// Lazy sequence of pointer-sized values, e.g. the frames of a stack walk.
///
/// Walks a slice in `pointer_width` strides, yielding each element widened to
/// u64. Any trailing bytes that do not make up a whole element are ignored.
/// Holds no state beyond the remaining slice, so iterating again means
/// creating a new sequence over the same slice (it is `Copy`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressSequence<'dat> {
    bytes: &'dat [u8],
    pointer_width: PointerWidth,
}

impl<'dat> AddressSequence<'dat> {
    /// Creates a sequence over `bytes` with elements of size `pointer_width`.
    pub const fn new(bytes: &'dat [u8], pointer_width: PointerWidth) -> Self {
        return Self {
            bytes,
            pointer_width,
        };
    }

    /// Returns the size of each element.
    pub const fn pointer_width(&self) -> PointerWidth {
        return self.pointer_width;
    }

    /// Returns the bytes that have not been consumed yet, including any
    /// trailing partial element.
    pub const fn remaining_bytes(&self) -> &'dat [u8] {
        return self.bytes;
    }

    /// Returns the number of remaining elements: `floor(remaining_bytes / pointer_width)`.
    pub const fn len(&self) -> usize {
        return self.bytes.len() / self.pointer_width.size();
    }

    /// Returns true if no whole elements remain.
    pub const fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Returns the element at `index` without consuming anything, or `None` if
    /// `index >= len()`.
    pub fn get(&self, index: usize) -> Option<u64> {
        let size = self.pointer_width.size();
        if index >= self.len() {
            return None;
        }

        return Some(scalar::read_pointer(
            &self.bytes[index * size..],
            self.pointer_width,
        ));
    }
}

impl<'dat> Iterator for AddressSequence<'dat> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let size = self.pointer_width.size();
        if self.bytes.len() < size {
            return None;
        }

        let value = scalar::read_pointer(self.bytes, self.pointer_width);
        self.bytes = &self.bytes[size..];
        return Some(value);
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        return (len, Some(len));
    }
}

impl<'dat> ExactSizeIterator for AddressSequence<'dat> {}

impl<'dat> iter::FusedIterator for AddressSequence<'dat> {}
