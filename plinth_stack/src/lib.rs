// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacked-offset computation for Plinth.
//!
//! This crate turns N parallel datasets that share a category axis into per-datum
//! stacked spans:
//! - [`compute_stacked_entries`] accumulates a running total per category and
//!   records each datum's `base`/`extent`, and
//! - [`stacked_domain`] reduces those spans to the value-axis domain that keeps every
//!   stacked mark visible.
//!
//! Bad data never fails a stacking pass. Values that are not finite numbers are
//! stacked as `0` (see [`coerce_to_finite_number`]) while the original value is kept
//! on the entry, and malformed values are reported as [`AccessorError`]s.

#![no_std]

extern crate alloc;

mod error;
mod extent;
mod key;
mod stack;
mod value;

pub use error::{AccessorError, AccessorErrorReason};
pub use extent::{StackDomain, stacked_domain};
pub use key::CategoryKey;
pub use stack::{
    CategoryTotal, Datum, SignMode, StackEntry, StackedEntries, StackingOrder,
    compute_stacked_entries, compute_stacked_entries_with,
};
pub use value::{RawValue, coerce_to_finite_number};
