// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render errors.

extern crate alloc;

use alloc::string::String;

/// The category axis cannot position the bars.
///
/// This is fatal to the render pass that hit it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidScaleError {
    /// A continuous category axis has no values to derive a bar width from, and no
    /// explicit bar width is configured.
    #[error("category axis has no values to derive a bar width from")]
    NoCategorySpan,
    /// A category the scale cannot place.
    #[error("category {0} is not on the category axis")]
    UnmappedCategory(String),
}

/// Errors surfaced by [`StackedBarPlot::render`](crate::StackedBarPlot::render).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlotError {
    /// Geometry could not be resolved.
    #[error(transparent)]
    InvalidScale(#[from] InvalidScaleError),
}
