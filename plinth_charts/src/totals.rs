// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack total labels.
//!
//! One label per category, just past the outer end of its stack. Positive totals
//! sit above (vertical) or right of (horizontal) the stack edge, negative totals
//! below or left of it. The side follows the sign of the total, not the direction
//! of the value scale.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Rect;
use plinth_stack::{CategoryKey, StackedEntries};
use plinth_text::{MeasurementUnavailableError, TextMeasurer, TextStyle};

use crate::contrast::LabelTone;
use crate::geometry::{MarkLayer, Orientation, VisibleBounds};
use crate::label::{LabelDecision, LabelKind, LabelPlacement, LabelRejection};
use crate::scale::ValueScale;

/// Formats a number as its shortest round-tripping decimal, with `-0` shown as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return String::from("0");
    }
    format!("{value}")
}

/// Where one category's total label goes, before its text is measured.
#[derive(Clone, Debug, PartialEq)]
pub struct TotalAnchor {
    /// The formatted total.
    pub text: String,
    /// Index of the category in first-encounter order.
    pub category_index: usize,
    /// Span of the category's marks along the category axis, low to high.
    pub band: (f64, f64),
    /// Pixel position of the outer stack edge along the value axis.
    pub edge: f64,
    /// Whether the total is negative.
    pub negative: bool,
}

impl TotalAnchor {
    fn thickness(&self) -> f64 {
        self.band.1 - self.band.0
    }
}

/// Computes total anchors for every category with at least one mark.
pub fn total_anchors<K: CategoryKey>(
    stacked: &StackedEntries<K>,
    layer: &MarkLayer<K>,
    value: &impl ValueScale,
) -> Vec<TotalAnchor> {
    let orientation = layer.orientation();
    let mut bands: HashMap<&K, (f64, f64)> = HashMap::new();
    for mark in layer.iter() {
        let (lo, hi) = match orientation {
            Orientation::Vertical => (mark.rect.x0, mark.rect.x1),
            Orientation::Horizontal => (mark.rect.y0, mark.rect.y1),
        };
        let band = bands.entry(&mark.category).or_insert((lo, hi));
        band.0 = band.0.min(lo);
        band.1 = band.1.max(hi);
    }

    stacked
        .category_totals()
        .into_iter()
        .enumerate()
        .filter_map(|(category_index, total)| {
            let &band = bands.get(&total.category)?;
            Some(TotalAnchor {
                text: format_number(total.total),
                category_index,
                band,
                edge: value.map(total.outer_extent),
                negative: total.total < 0.0,
            })
        })
        .collect()
}

/// Places one measured total label.
///
/// The label is centered across the band and set `padding` pixels past the stack
/// edge. It is rejected when the text is wider (vertical) or taller (horizontal)
/// than the band, or when it leaves `bounds`.
pub fn place_total(
    anchor: &TotalAnchor,
    (width, height): (f64, f64),
    orientation: Orientation,
    padding: f64,
    bounds: VisibleBounds,
) -> LabelDecision {
    let kind = LabelKind::Total {
        category_index: anchor.category_index,
    };
    let reject = |reason| LabelDecision::Rejected {
        text: anchor.text.clone(),
        kind,
        reason,
    };

    let thickness = anchor.thickness();
    let rect = match orientation {
        Orientation::Vertical => {
            if width > thickness {
                return reject(LabelRejection::TooLarge);
            }
            let x = anchor.band.0 + (thickness - width) / 2.0;
            let y = if anchor.negative {
                anchor.edge + padding
            } else {
                anchor.edge - padding - height
            };
            Rect::new(x, y, x + width, y + height)
        }
        Orientation::Horizontal => {
            if height > thickness {
                return reject(LabelRejection::TooLarge);
            }
            let y = anchor.band.0 + (thickness - height) / 2.0;
            let x = if anchor.negative {
                anchor.edge - padding - width
            } else {
                anchor.edge + padding
            };
            Rect::new(x, y, x + width, y + height)
        }
    };
    if !bounds.contains_rect(&rect) {
        return reject(LabelRejection::OutOfBounds);
    }

    LabelDecision::Placed(LabelPlacement {
        text: anchor.text.clone(),
        bounds: rect,
        // Totals sit on the plot background, not on a fill.
        tone: LabelTone::Dark,
        kind,
    })
}

/// Measures and places every total label, in category order.
pub fn place_total_labels(
    anchors: &[TotalAnchor],
    measurer: &dyn TextMeasurer,
    style: &TextStyle,
    orientation: Orientation,
    padding: f64,
    bounds: VisibleBounds,
) -> Result<Vec<LabelDecision>, MeasurementUnavailableError> {
    anchors
        .iter()
        .map(|anchor| {
            let size = measurer.measure(&anchor.text, style)?.size();
            Ok(place_total(anchor, size, orientation, padding, bounds))
        })
        .collect()
}
