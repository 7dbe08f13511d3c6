// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Category keys.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt::Debug;
use core::hash::Hash;

/// A value identifying one position on the category axis.
///
/// Keys are compared and hashed to group stacked segments. Keys that also have a
/// numeric position (integer timestamps, day numbers) can be placed on a continuous
/// category axis through [`CategoryKey::numeric_value`].
pub trait CategoryKey: Clone + Eq + Hash + Debug {
    /// Returns the position of this key on a continuous axis, if it has one.
    fn numeric_value(&self) -> Option<f64> {
        None
    }
}

impl CategoryKey for String {}

impl CategoryKey for &str {}

impl CategoryKey for Arc<str> {}

impl CategoryKey for i32 {
    fn numeric_value(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl CategoryKey for u32 {
    fn numeric_value(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl CategoryKey for i64 {
    fn numeric_value(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl CategoryKey for u64 {
    fn numeric_value(&self) -> Option<f64> {
        Some(*self as f64)
    }
}
