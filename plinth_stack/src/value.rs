// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw datum values and the coercion applied at the stacking boundary.

extern crate alloc;

use alloc::string::String;

use crate::error::AccessorErrorReason;

/// A datum value as an accessor produced it, before coercion.
///
/// The stacking pass never rewrites this; it is carried on each
/// [`StackEntry`](crate::StackEntry) so tooltips and labels can show the original.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawValue {
    /// A number (possibly `NaN` or infinite).
    Number(f64),
    /// Text that may or may not parse as a number.
    Text(String),
    /// No value (null/undefined in loosely typed sources).
    #[default]
    Missing,
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Coerces a raw value to the finite number used for stacking.
///
/// - finite numbers pass through,
/// - `NaN` and infinities become `0`,
/// - text is trimmed and parsed; empty or unparsable text becomes `0`,
/// - [`RawValue::Missing`] becomes `0`.
pub fn coerce_to_finite_number(raw: &RawValue) -> f64 {
    coerce(raw).0
}

/// Coerces and reports why a value fell back to `0`, if it was malformed.
///
/// `Missing` and empty text fall back silently.
pub(crate) fn coerce(raw: &RawValue) -> (f64, Option<AccessorErrorReason>) {
    match raw {
        RawValue::Number(v) if v.is_finite() => (*v, None),
        RawValue::Number(v) => (0.0, Some(AccessorErrorReason::NonFinite { value: *v })),
        RawValue::Missing => (0.0, None),
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return (0.0, None);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => (v, None),
                Ok(v) => (0.0, Some(AccessorErrorReason::NonFinite { value: v })),
                Err(_) => (
                    0.0,
                    Some(AccessorErrorReason::NotNumeric { text: text.clone() }),
                ),
            }
        }
    }
}
