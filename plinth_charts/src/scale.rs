// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiny scale utilities.
//!
//! Stacked bars need two mappings into pixel space: a continuous value scale and a
//! category scale that is either banded (discrete keys) or continuous (numeric keys
//! such as day numbers).

extern crate alloc;

use alloc::vec::Vec;

use hashbrown::HashMap;
use plinth_stack::{CategoryKey, StackDomain};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// A continuous mapping from data values to pixels.
pub trait ValueScale {
    /// Maps a value from domain space into range space.
    fn map(&self, value: f64) -> f64;

    /// The output range, as authored (it may be inverted).
    fn range(&self) -> (f64, f64);
}

/// A mapping from category keys to pixels.
pub trait CategoryScale<K> {
    /// Maps a category into range space.
    ///
    /// Band scales return the start of the category's band; continuous scales return
    /// the category's position. Returns `None` for categories the scale cannot place.
    fn map(&self, category: &K) -> Option<f64>;

    /// The output range, as authored (it may be inverted).
    fn range(&self) -> (f64, f64);

    /// The band width, or `None` for a continuous category axis.
    fn band_width(&self) -> Option<f64>;

    /// Maps a numeric position on a continuous category axis into range space.
    ///
    /// Band scales have no positions between categories and return `None`.
    fn map_position(&self, position: f64) -> Option<f64> {
        let _ = position;
        None
    }
}

impl<T: ValueScale + ?Sized> ValueScale for &T {
    fn map(&self, value: f64) -> f64 {
        (**self).map(value)
    }

    fn range(&self) -> (f64, f64) {
        (**self).range()
    }
}

impl<K, T: CategoryScale<K> + ?Sized> CategoryScale<K> for &T {
    fn map(&self, category: &K) -> Option<f64> {
        (**self).map(category)
    }

    fn range(&self) -> (f64, f64) {
        (**self).range()
    }

    fn band_width(&self) -> Option<f64> {
        (**self).band_width()
    }

    fn map_position(&self, position: f64) -> Option<f64> {
        (**self).map_position(position)
    }
}

/// A linear mapping from a continuous domain to a continuous range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLinear {
    domain: (f64, f64),
    range: (f64, f64),
}

impl ScaleLinear {
    /// Creates a new scale mapping `domain` values to `range` values.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Creates a scale over a stacked domain.
    pub fn from_domain(domain: StackDomain, range: (f64, f64)) -> Self {
        Self::new(domain.as_tuple(), range)
    }

    /// Maps a value from domain space into range space.
    pub fn map(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 {
            return r0;
        }
        let t = (x - d0) / denom;
        r0 + t * (r1 - r0)
    }

    /// Returns the configured domain.
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Extends the domain outward to “nice” tick boundaries.
    ///
    /// Stacked domains usually start at 0 and end on an arbitrary sum; this rounds
    /// the far end so total labels get some headroom.
    #[must_use]
    pub fn nice(self, tick_count: usize) -> Self {
        let ticks = nice_ticks(self.domain.0, self.domain.1, tick_count);
        match (ticks.first(), ticks.last()) {
            (Some(&lo), Some(&hi)) if ticks.len() >= 2 => {
                let domain = if self.domain.0 <= self.domain.1 {
                    (lo, hi)
                } else {
                    (hi, lo)
                };
                Self { domain, ..self }
            }
            _ => self,
        }
    }
}

impl ValueScale for ScaleLinear {
    fn map(&self, value: f64) -> f64 {
        Self::map(self, value)
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }
}

/// A linear scale used as a continuous category axis.
///
/// Keys are placed through [`CategoryKey::numeric_value`].
impl<K: CategoryKey> CategoryScale<K> for ScaleLinear {
    fn map(&self, category: &K) -> Option<f64> {
        category.numeric_value().map(|v| Self::map(self, v))
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }

    fn band_width(&self) -> Option<f64> {
        None
    }

    fn map_position(&self, position: f64) -> Option<f64> {
        Some(Self::map(self, position))
    }
}

fn nice_ticks(mut min: f64, mut max: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if min == max {
        return alloc::vec![min];
    }
    if min > max {
        core::mem::swap(&mut min, &mut max);
    }
    let span = max - min;
    let step0 = span / count.max(1) as f64;
    let step = nice_step(step0);
    if step == 0.0 {
        return alloc::vec![min, max];
    }

    let start = (min / step).floor() * step;
    let stop = (max / step).ceil() * step;

    let n_f = ((stop - start) / step).round();
    let n = if n_f.is_finite() && n_f >= 0.0 {
        let n_f = n_f.min(10_000.0);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "guarded by finite/non-negative checks and capped at 10k"
        )]
        {
            n_f as u64
        }
    } else {
        0
    };
    (0..=n).map(|i| start + step * i as f64).collect()
}

fn nice_step(step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let power = step.log10().floor();
    let base = 10_f64.powf(power);
    let error = step / base;
    let nice = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    nice * base
}

/// Evenly spaced bands over a range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleBand {
    range: (f64, f64),
    count: usize,
    padding_inner: f64,
    padding_outer: f64,
}

impl ScaleBand {
    /// Creates a new band scale covering `count` bands over `range`.
    pub fn new(range: (f64, f64), count: usize) -> Self {
        Self {
            range,
            count,
            padding_inner: 0.1,
            padding_outer: 0.1,
        }
    }

    /// Sets inner and outer padding in band units.
    #[must_use]
    pub fn with_padding(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = inner.max(0.0);
        self.padding_outer = outer.max(0.0);
        self
    }

    /// Returns the computed band width.
    pub fn band_width(&self) -> f64 {
        let (r0, r1) = self.range;
        let n = self.count as f64;
        if n <= 0.0 {
            return 0.0;
        }
        let span = (r1 - r0).abs();
        let denom = n + self.padding_inner * (n - 1.0) + 2.0 * self.padding_outer;
        if denom == 0.0 { 0.0 } else { span / denom }
    }

    /// Returns the number of bands.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the start position of the band at `index`.
    pub fn x(&self, index: usize) -> f64 {
        let (r0, r1) = self.range;
        let bw = self.band_width();
        let step = bw * (1.0 + self.padding_inner);
        let start = if r1 >= r0 { r0 } else { r1 };
        start + bw * self.padding_outer + step * index as f64
    }
}

/// A band scale over an explicit list of category keys.
///
/// Keys map to bands in domain order; duplicate keys keep their first band.
#[derive(Clone, Debug)]
pub struct ScaleCategory<K> {
    domain: Vec<K>,
    index: HashMap<K, usize>,
    band: ScaleBand,
}

impl<K: CategoryKey> ScaleCategory<K> {
    /// Creates a category scale placing `domain` over `range`.
    pub fn new(domain: impl IntoIterator<Item = K>, range: (f64, f64)) -> Self {
        let mut keys = Vec::new();
        let mut index = HashMap::new();
        for key in domain {
            if !index.contains_key(&key) {
                index.insert(key.clone(), keys.len());
                keys.push(key);
            }
        }
        let band = ScaleBand::new(range, keys.len());
        Self {
            domain: keys,
            index,
            band,
        }
    }

    /// Sets inner and outer padding in band units.
    #[must_use]
    pub fn with_padding(mut self, inner: f64, outer: f64) -> Self {
        self.band = self.band.with_padding(inner, outer);
        self
    }

    /// The category keys, in band order.
    pub fn domain(&self) -> &[K] {
        &self.domain
    }

    /// The underlying band metrics.
    pub fn band(&self) -> ScaleBand {
        self.band
    }
}

impl<K: CategoryKey> CategoryScale<K> for ScaleCategory<K> {
    fn map(&self, category: &K) -> Option<f64> {
        self.index.get(category).map(|&i| self.band.x(i))
    }

    fn range(&self) -> (f64, f64) {
        self.band.range
    }

    fn band_width(&self) -> Option<f64> {
        Some(self.band.band_width())
    }
}
