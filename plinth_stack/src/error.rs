// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accessor diagnostics.

extern crate alloc;

use alloc::string::String;

/// An accessor produced a value that could not be stacked as-is.
///
/// These never abort stacking: the value is stacked as `0` and the diagnostic is
/// collected on [`StackedEntries`](crate::StackedEntries) (and logged).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("dataset {dataset_index}, datum {datum_index}: {reason}")]
pub struct AccessorError {
    /// Index of the dataset the datum belongs to.
    pub dataset_index: usize,
    /// Index of the datum within its dataset.
    pub datum_index: usize,
    /// What was wrong with the value.
    pub reason: AccessorErrorReason,
}

/// Why an accessor value was replaced by `0`.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AccessorErrorReason {
    /// Text that does not parse as a number.
    #[error("value {text:?} is not numeric, stacked as 0")]
    NotNumeric {
        /// The original text.
        text: String,
    },
    /// `NaN` or an infinity.
    #[error("value {value} is not finite, stacked as 0")]
    NonFinite {
        /// The original number.
        value: f64,
    },
}
