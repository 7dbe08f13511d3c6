// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy, priority-ordered label placement inside stacked marks.
//!
//! Marks are scanned in dataset order, then datum order. Each label is measured,
//! centered in its mark and then either placed or rejected:
//!
//! 1. it must fit inside its mark (edges inclusive),
//! 2. it must stay inside the plot's [`VisibleBounds`], and
//! 3. it must not touch any mark scanned after its own.
//!
//! Rule 3 gives earlier marks priority over the space they share with later ones:
//! a label yields to later marks instead of being painted over by them.
//! Pairwise checks are a linear scan over the remaining marks, so a full pass is
//! quadratic in the worst case.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::iter::FusedIterator;

use kurbo::{Point, Rect};
use plinth_text::{MeasurementUnavailableError, TextMeasurer, TextStyle};

use crate::contrast::{ColorContrast, LabelTone};
use crate::geometry::{MarkLayer, MarkRect, VisibleBounds};

/// Boxes closer than this many pixels count as intersecting.
pub const OVERLAP_TOLERANCE: f64 = 0.5;

/// Returns `true` if `a` and `b` touch or overlap, allowing `tolerance` pixels of slack.
pub fn intersects(a: &Rect, b: &Rect, tolerance: f64) -> bool {
    b.x0 <= a.x1 + tolerance
        && a.x0 - tolerance <= b.x1
        && b.y0 <= a.y1 + tolerance
        && a.y0 - tolerance <= b.y1
}

/// What a label annotates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// The value of one stacked mark.
    Mark {
        /// Index of the source dataset.
        dataset_index: usize,
        /// Index of the source datum within its dataset.
        datum_index: usize,
    },
    /// The total of one category's stack.
    Total {
        /// Index of the category in first-encounter order.
        category_index: usize,
    },
}

/// An accepted label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacement {
    /// The label text.
    pub text: String,
    /// The placed label box. Text is centered in it, unrotated.
    pub bounds: Rect,
    /// Text tone for the fill underneath.
    pub tone: LabelTone,
    /// What the label annotates.
    pub kind: LabelKind,
}

impl LabelPlacement {
    /// Top-left corner of the label box; the drawing anchor.
    pub fn origin(&self) -> Point {
        self.bounds.origin()
    }
}

/// Why a label was not placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelRejection {
    /// The text is wider or taller than the space it must fit in.
    TooLarge,
    /// The placed box would leave the visible bounds.
    OutOfBounds,
    /// The placed box touches a later mark.
    Occluded {
        /// Dataset of the first occluding mark.
        dataset_index: usize,
        /// Datum of the first occluding mark.
        datum_index: usize,
    },
}

/// The outcome for one label candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelDecision {
    /// The label is drawn.
    Placed(LabelPlacement),
    /// The label is suppressed.
    Rejected {
        /// The label text.
        text: String,
        /// What the label would have annotated.
        kind: LabelKind,
        /// Why it was suppressed.
        reason: LabelRejection,
    },
}

impl LabelDecision {
    /// The placement, if the label was accepted.
    pub fn placement(&self) -> Option<&LabelPlacement> {
        match self {
            Self::Placed(p) => Some(p),
            Self::Rejected { .. } => None,
        }
    }

    /// The rejection reason, if the label was suppressed.
    pub fn rejection(&self) -> Option<LabelRejection> {
        match self {
            Self::Placed(_) => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }

    /// What the label annotates.
    pub fn kind(&self) -> LabelKind {
        match self {
            Self::Placed(p) => p.kind,
            Self::Rejected { kind, .. } => *kind,
        }
    }
}

/// Lazily decides the labels of a [`MarkLayer`].
///
/// Yields one decision per mark that has label text, in scan order. A measurement
/// failure is yielded once as an error, after which the iterator is exhausted.
pub struct LabelLayout<'a, K, F> {
    marks: Vec<&'a MarkRect<K>>,
    bounds: VisibleBounds,
    text: F,
    measurer: &'a dyn TextMeasurer,
    style: &'a TextStyle,
    contrast: &'a dyn ColorContrast,
    next: usize,
    failed: bool,
}

impl<K, F> core::fmt::Debug for LabelLayout<'_, K, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabelLayout")
            .field("marks", &self.marks.len())
            .field("bounds", &self.bounds)
            .field("style", &self.style)
            .field("next", &self.next)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl<'a, K, F> LabelLayout<'a, K, F>
where
    F: FnMut(&MarkRect<K>) -> Option<String>,
{
    /// Creates a layout over `layer`. `text` returns the label for a mark, or `None`
    /// for marks without one.
    pub fn new(
        layer: &'a MarkLayer<K>,
        text: F,
        measurer: &'a dyn TextMeasurer,
        style: &'a TextStyle,
        contrast: &'a dyn ColorContrast,
    ) -> Self {
        Self {
            marks: layer.iter().collect(),
            bounds: layer.bounds(),
            text,
            measurer,
            style,
            contrast,
            next: 0,
            failed: false,
        }
    }

    fn decide(&self, index: usize, text: String, (width, height): (f64, f64)) -> LabelDecision {
        let mark = self.marks[index];
        let kind = LabelKind::Mark {
            dataset_index: mark.dataset_index,
            datum_index: mark.datum_index,
        };
        let reject = |text, reason| LabelDecision::Rejected { text, kind, reason };

        let rect = mark.rect;
        if width > rect.width() || height > rect.height() {
            return reject(text, LabelRejection::TooLarge);
        }
        let x = rect.x0 + (rect.width() - width) / 2.0;
        let y = rect.y0 + (rect.height() - height) / 2.0;
        let bounds = Rect::new(x, y, x + width, y + height);
        if !self.bounds.contains_rect(&bounds) {
            return reject(text, LabelRejection::OutOfBounds);
        }
        if let Some(later) = self.marks[index + 1..]
            .iter()
            .find(|m| intersects(&bounds, &m.rect, OVERLAP_TOLERANCE))
        {
            return reject(
                text,
                LabelRejection::Occluded {
                    dataset_index: later.dataset_index,
                    datum_index: later.datum_index,
                },
            );
        }

        LabelDecision::Placed(LabelPlacement {
            text,
            bounds,
            tone: LabelTone::for_fill(self.contrast, mark.fill),
            kind,
        })
    }
}

impl<K, F> Iterator for LabelLayout<'_, K, F>
where
    F: FnMut(&MarkRect<K>) -> Option<String>,
{
    type Item = Result<LabelDecision, MeasurementUnavailableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.next < self.marks.len() {
            let index = self.next;
            self.next += 1;
            let Some(text) = (self.text)(self.marks[index]) else {
                continue;
            };
            let metrics = match self.measurer.measure(&text, self.style) {
                Ok(metrics) => metrics,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            let decision = self.decide(index, text, metrics.size());
            if let LabelDecision::Rejected { kind, reason, .. } = &decision {
                tracing::trace!(?kind, ?reason, "label rejected");
            }
            return Some(Ok(decision));
        }
        None
    }
}

impl<K, F> FusedIterator for LabelLayout<'_, K, F> where F: FnMut(&MarkRect<K>) -> Option<String> {}
