// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacked bar geometry and label placement for Plinth.
//!
//! This crate sits on top of `plinth_stack`:
//! - **Geometry**: [`resolve_rectangles`] maps stacked entries to pixel rectangles
//!   through a category scale and a value scale, vertically or horizontally.
//! - **Labels**: [`LabelLayout`] places value labels inside marks, greedily and in a
//!   fixed priority order, suppressing labels that do not fit, leave the plot or
//!   collide with later marks. Stack totals get their own labels past each stack.
//! - **Scheduling**: label passes are deferred tasks on a single-threaded
//!   [`DeferredQueue`]; re-rendering cancels the pending pass.
//!
//! [`StackedBarPlot`] ties these together behind a [`Painter`], so the crate never
//! touches paint primitives. Text measurement comes from `plinth_text`.

#![no_std]

extern crate alloc;

mod contrast;
mod error;
#[cfg(not(feature = "std"))]
mod float;
mod geometry;
mod label;
mod plot;
mod scale;
mod scheduler;
#[cfg(test)]
mod stacked_tests;
mod totals;

pub use contrast::{ColorContrast, DARK_LABEL_CONTRAST_RATIO, LabelTone, WcagContrast};
pub use error::{InvalidScaleError, PlotError};
pub use geometry::{
    GeometryOptions, MarkLayer, MarkRect, Orientation, RectPaint, Scales, VisibleBounds,
    resolve_rectangles,
};
pub use label::{
    LabelDecision, LabelKind, LabelLayout, LabelPlacement, LabelRejection, OVERLAP_TOLERANCE,
    intersects,
};
pub use plot::{
    LabelPass, LabelPassReport, LabelText, Painter, PlotId, StackedBarConfig, StackedBarPlot,
    schedule_label_pass,
};
pub use scale::{CategoryScale, ScaleBand, ScaleCategory, ScaleLinear, ValueScale};
pub use scheduler::{CancelHandle, DeferredQueue, TaskId, TaskSender};
pub use totals::{TotalAnchor, format_number, place_total, place_total_labels, total_anchors};
