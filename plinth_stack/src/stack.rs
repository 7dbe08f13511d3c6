// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offset accumulation across parallel datasets.

extern crate alloc;

use alloc::vec::Vec;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::error::AccessorError;
use crate::extent::{StackDomain, stacked_domain};
use crate::key::CategoryKey;
use crate::value::{RawValue, coerce};

/// The order in which datasets are layered from the baseline outward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StackingOrder {
    /// Dataset 0 sits on the baseline; later datasets stack on top of it.
    #[default]
    BottomUp,
    /// The last dataset sits on the baseline; dataset 0 is furthest from it.
    TopDown,
}

impl StackingOrder {
    /// Returns the opposite order.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::BottomUp => Self::TopDown,
            Self::TopDown => Self::BottomUp,
        }
    }

    /// Dataset indices in traversal order.
    fn traversal(self, count: usize) -> Vec<usize> {
        match self {
            Self::BottomUp => (0..count).collect(),
            Self::TopDown => (0..count).rev().collect(),
        }
    }
}

/// How values of different signs share a category's running total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SignMode {
    /// One running total per category; a negative value steps the stack back down.
    #[default]
    Cumulative,
    /// Positive values stack upward from 0 and negative values downward from 0, each
    /// with its own running total.
    Diverging,
}

/// One datum as seen through an accessor.
#[derive(Clone, Debug, PartialEq)]
pub struct Datum<K> {
    /// Category the datum belongs to.
    pub category: K,
    /// The uncoerced value.
    pub value: RawValue,
}

impl<K> Datum<K> {
    /// Creates a datum.
    pub fn new(category: K, value: impl Into<RawValue>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }
}

/// The stacked span of one datum.
#[derive(Clone, Debug, PartialEq)]
pub struct StackEntry<K> {
    /// Category of the datum.
    pub category: K,
    /// Index of the source dataset.
    pub dataset_index: usize,
    /// Index of the datum within its dataset.
    pub datum_index: usize,
    /// Running total of the category before this datum.
    pub base: f64,
    /// `base + value`.
    pub extent: f64,
    /// The coerced (always finite) value.
    pub value: f64,
    /// The value as the accessor produced it.
    pub raw: RawValue,
}

impl<K> StackEntry<K> {
    /// The smaller of `base` and `extent`.
    pub fn low(&self) -> f64 {
        self.base.min(self.extent)
    }

    /// The larger of `base` and `extent`.
    pub fn high(&self) -> f64 {
        self.base.max(self.extent)
    }
}

/// The sum of a category's values and where its stack ends.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal<K> {
    /// The category.
    pub category: K,
    /// Sum of the coerced values of every datum in the category.
    pub total: f64,
    /// The stack edge furthest from zero on the side of `total`.
    ///
    /// For a non-negative total this is the largest base/extent in the category,
    /// otherwise the smallest.
    pub outer_extent: f64,
}

/// Output of [`compute_stacked_entries`].
///
/// Entries keep the source indexing (`dataset_index`, `datum_index`) regardless of the
/// order datasets were stacked in.
#[derive(Clone, Debug)]
pub struct StackedEntries<K> {
    datasets: Vec<Vec<StackEntry<K>>>,
    categories: Vec<K>,
    diagnostics: Vec<AccessorError>,
    order: StackingOrder,
    sign_mode: SignMode,
}

impl<K: CategoryKey> StackedEntries<K> {
    /// Entries grouped by dataset, in dataset index order.
    pub fn datasets(&self) -> &[Vec<StackEntry<K>>] {
        &self.datasets
    }

    /// Entries of one dataset, in datum order.
    pub fn dataset(&self, dataset_index: usize) -> Option<&[StackEntry<K>]> {
        self.datasets.get(dataset_index).map(Vec::as_slice)
    }

    /// The entry for a `(dataset, datum)` pair.
    pub fn get(&self, dataset_index: usize, datum_index: usize) -> Option<&StackEntry<K>> {
        self.datasets.get(dataset_index)?.get(datum_index)
    }

    /// All entries, in dataset order then datum order.
    pub fn iter(&self) -> impl Iterator<Item = &StackEntry<K>> + '_ {
        self.datasets.iter().flatten()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.datasets.iter().map(Vec::len).sum()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every category observed, in first-encounter order (datasets in index order).
    ///
    /// This is a convenient band scale domain.
    pub fn categories(&self) -> &[K] {
        &self.categories
    }

    /// Values that were coerced to `0` because they were malformed.
    pub fn diagnostics(&self) -> &[AccessorError] {
        &self.diagnostics
    }

    /// The stacking order used.
    pub fn order(&self) -> StackingOrder {
        self.order
    }

    /// The sign mode used.
    pub fn sign_mode(&self) -> SignMode {
        self.sign_mode
    }

    /// The value domain covering every stacked span.
    pub fn domain(&self) -> StackDomain {
        stacked_domain(self.iter())
    }

    /// Per-category totals, in category order.
    pub fn category_totals(&self) -> Vec<CategoryTotal<K>> {
        let mut acc: HashMap<&K, (f64, f64, f64)> = HashMap::with_capacity(self.categories.len());
        for e in self.iter() {
            let (sum, lo, hi) = acc
                .entry(&e.category)
                .or_insert((0.0, f64::INFINITY, f64::NEG_INFINITY));
            *sum += e.value;
            *lo = lo.min(e.low());
            *hi = hi.max(e.high());
        }
        self.categories
            .iter()
            .filter_map(|category| {
                let &(total, lo, hi) = acc.get(category)?;
                Some(CategoryTotal {
                    category: category.clone(),
                    total,
                    outer_extent: if total >= 0.0 { hi } else { lo },
                })
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct RunningTotal {
    total: f64,
    negative: f64,
}

impl RunningTotal {
    /// Stacks `value` and returns `(base, extent)`.
    fn push(&mut self, value: f64, sign_mode: SignMode) -> (f64, f64) {
        let slot = match sign_mode {
            SignMode::Diverging if value < 0.0 => &mut self.negative,
            _ => &mut self.total,
        };
        let base = *slot;
        let extent = base + value;
        *slot = extent;
        (base, extent)
    }
}

/// Stacks `datasets` per category with a single running total per category.
///
/// See [`compute_stacked_entries_with`].
pub fn compute_stacked_entries<T, D, K, F>(
    datasets: &[D],
    accessor: F,
    order: StackingOrder,
) -> StackedEntries<K>
where
    D: AsRef<[T]>,
    K: CategoryKey,
    F: Fn(&T, usize) -> Datum<K>,
{
    compute_stacked_entries_with(datasets, accessor, order, SignMode::Cumulative)
}

/// Stacks `datasets` per category.
///
/// `accessor` is called once per record with the record's index in its dataset.
/// Datasets are traversed in `order`; within a dataset, records are stacked in
/// index order, so duplicate categories in one dataset accumulate. A category that is
/// absent from a dataset simply contributes nothing, which leaves later datasets
/// stacking from that category's current total (`0` if nothing came before).
///
/// Malformed values are stacked as `0` and reported through
/// [`StackedEntries::diagnostics`]; this function never fails.
pub fn compute_stacked_entries_with<T, D, K, F>(
    datasets: &[D],
    accessor: F,
    order: StackingOrder,
    sign_mode: SignMode,
) -> StackedEntries<K>
where
    D: AsRef<[T]>,
    K: CategoryKey,
    F: Fn(&T, usize) -> Datum<K>,
{
    let mut totals: HashMap<K, RunningTotal> = HashMap::new();
    let mut categories = Vec::new();
    let mut diagnostics = Vec::new();

    // Read and coerce everything in source order first, so categories and
    // diagnostics do not depend on the stacking order.
    let mut rows: Vec<Vec<(K, RawValue, f64)>> = Vec::with_capacity(datasets.len());
    for (dataset_index, data) in datasets.iter().enumerate() {
        let data = data.as_ref();
        let mut read = Vec::with_capacity(data.len());
        for (datum_index, record) in data.iter().enumerate() {
            let Datum { category, value } = accessor(record, datum_index);
            if let Entry::Vacant(slot) = totals.entry(category.clone()) {
                categories.push(category.clone());
                slot.insert(RunningTotal::default());
            }
            let (coerced, issue) = coerce(&value);
            if let Some(reason) = issue {
                tracing::warn!(
                    dataset = dataset_index,
                    datum = datum_index,
                    %reason,
                    "stacking malformed value as 0"
                );
                diagnostics.push(AccessorError {
                    dataset_index,
                    datum_index,
                    reason,
                });
            }
            read.push((category, value, coerced));
        }
        rows.push(read);
    }

    let mut out: Vec<Vec<StackEntry<K>>> = Vec::with_capacity(rows.len());
    out.resize_with(rows.len(), Vec::new);
    for dataset_index in order.traversal(rows.len()) {
        let read = core::mem::take(&mut rows[dataset_index]);
        let mut entries = Vec::with_capacity(read.len());
        for (datum_index, (category, raw, value)) in read.into_iter().enumerate() {
            let (base, extent) = totals
                .entry(category.clone())
                .or_default()
                .push(value, sign_mode);
            entries.push(StackEntry {
                category,
                dataset_index,
                datum_index,
                base,
                extent,
                value,
                raw,
            });
        }
        out[dataset_index] = entries;
    }

    tracing::trace!(
        datasets = out.len(),
        categories = categories.len(),
        malformed = diagnostics.len(),
        "stacked entries computed"
    );

    StackedEntries {
        datasets: out,
        categories,
        diagnostics,
        order,
        sign_mode,
    }
}
