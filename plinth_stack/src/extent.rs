// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value-axis domains for stacked data.

use crate::stack::StackEntry;

/// The `[min, max]` value range covered by a set of stacked spans.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StackDomain {
    /// Smallest base or extent.
    pub min: f64,
    /// Largest base or extent.
    pub max: f64,
}

impl StackDomain {
    /// The domain reported when there is no data.
    pub const EMPTY: Self = Self { min: 0.0, max: 0.0 };

    /// Returns `(min, max)`, the shape scale constructors take.
    pub fn as_tuple(self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// `max - min`.
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    /// The smallest domain covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns `true` if `value` lies within `[min, max]`.
    pub fn contains(self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Returns the minimum and maximum of every `base` and `extent` in `entries`.
///
/// Both ends of each span count, so stacks that grow downward from zero are
/// covered as well as upward ones. Returns [`StackDomain::EMPTY`] when there are no
/// entries.
pub fn stacked_domain<'a, K: 'a>(
    entries: impl IntoIterator<Item = &'a StackEntry<K>>,
) -> StackDomain {
    let mut bounds: Option<(f64, f64)> = None;
    for e in entries {
        let (lo, hi) = (e.low(), e.high());
        bounds = Some(match bounds {
            None => (lo, hi),
            Some((min, max)) => (min.min(lo), max.max(hi)),
        });
    }
    bounds.map_or(StackDomain::EMPTY, |(min, max)| StackDomain { min, max })
}
