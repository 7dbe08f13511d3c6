// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stacked bar plot: stacking, geometry, painting and the deferred label pass.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::time::Duration;

use peniko::Color;
use plinth_stack::{
    CategoryKey, Datum, SignMode, StackEntry, StackedEntries, StackingOrder,
    compute_stacked_entries_with,
};
use plinth_text::{MeasurementUnavailableError, TextMeasurer, TextStyle};

use crate::contrast::{ColorContrast, WcagContrast};
use crate::error::PlotError;
use crate::geometry::{
    GeometryOptions, MarkLayer, MarkRect, Orientation, RectPaint, Scales, resolve_rectangles,
};
use crate::label::{LabelDecision, LabelLayout, LabelPlacement};
use crate::scale::{CategoryScale, ValueScale};
use crate::scheduler::{CancelHandle, TaskSender};
use crate::totals::{TotalAnchor, format_number, place_total_labels, total_anchors};

/// Caller-chosen identity of a plot, used by painters to key what they draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlotId(pub u64);

/// The drawing capability.
///
/// Plots never touch paint primitives; they hand finished geometry to a painter.
/// Painters keep each plot's drawn marks and labels apart by [`PlotId`].
pub trait Painter {
    /// Replaces the plot's marks.
    fn paint_marks(&mut self, plot: PlotId, marks: &[RectPaint]);

    /// Draws labels for the plot, in addition to any already drawn.
    fn paint_labels(&mut self, plot: PlotId, labels: &[LabelPlacement]);

    /// Removes every label drawn for the plot.
    fn clear_labels(&mut self, plot: PlotId);
}

/// Label text for one stacked entry, or `None` for no label.
pub type LabelText<K> = Arc<dyn Fn(&StackEntry<K>) -> Option<String>>;

/// Configuration for a [`StackedBarPlot`].
#[derive(Clone, Debug, PartialEq)]
pub struct StackedBarConfig {
    /// Which axis carries the values.
    pub orientation: Orientation,
    /// Dataset layering order.
    pub stacking_order: StackingOrder,
    /// How mixed-sign values share a stack.
    pub sign_mode: SignMode,
    /// Whether the deferred label pass runs at all.
    pub labels_enabled: bool,
    /// Whether stack totals are labelled (only when labels are enabled).
    pub total_labels_enabled: bool,
    /// Text style for both mark and total labels.
    pub label_style: TextStyle,
    /// How long after `render` the label pass runs.
    pub label_delay: Duration,
    /// Explicit bar thickness along the category axis.
    pub bar_width: Option<f64>,
    /// Gap between a stack's outer edge and its total label.
    pub total_label_padding: f64,
    /// Per-dataset fills, cycled by dataset index.
    pub fills: Vec<Color>,
    /// Fill used when `fills` is empty.
    pub default_fill: Color,
}

impl Default for StackedBarConfig {
    fn default() -> Self {
        let geometry = GeometryOptions::default();
        Self {
            orientation: Orientation::Vertical,
            stacking_order: StackingOrder::BottomUp,
            sign_mode: SignMode::Cumulative,
            labels_enabled: false,
            total_labels_enabled: true,
            label_style: TextStyle::new(12.0),
            label_delay: Duration::ZERO,
            bar_width: geometry.bar_width,
            total_label_padding: 4.0,
            fills: geometry.fills,
            default_fill: geometry.default_fill,
        }
    }
}

impl StackedBarConfig {
    /// Sets the orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the stacking order.
    #[must_use]
    pub fn with_stacking_order(mut self, order: StackingOrder) -> Self {
        self.stacking_order = order;
        self
    }

    /// Sets the sign mode.
    #[must_use]
    pub fn with_sign_mode(mut self, sign_mode: SignMode) -> Self {
        self.sign_mode = sign_mode;
        self
    }

    /// Enables or disables the label pass.
    #[must_use]
    pub fn with_labels(mut self, enabled: bool) -> Self {
        self.labels_enabled = enabled;
        self
    }

    /// Enables or disables stack total labels.
    #[must_use]
    pub fn with_total_labels(mut self, enabled: bool) -> Self {
        self.total_labels_enabled = enabled;
        self
    }

    /// Sets the label text style.
    #[must_use]
    pub fn with_label_style(mut self, style: TextStyle) -> Self {
        self.label_style = style;
        self
    }

    /// Sets the label pass delay.
    #[must_use]
    pub fn with_label_delay(mut self, delay: Duration) -> Self {
        self.label_delay = delay;
        self
    }

    /// Sets an explicit bar thickness.
    #[must_use]
    pub fn with_bar_width(mut self, width: f64) -> Self {
        self.bar_width = Some(width);
        self
    }

    /// Sets the total label padding.
    #[must_use]
    pub fn with_total_label_padding(mut self, padding: f64) -> Self {
        self.total_label_padding = padding;
        self
    }

    /// Sets per-dataset fills.
    #[must_use]
    pub fn with_fills(mut self, fills: Vec<Color>) -> Self {
        self.fills = fills;
        self
    }

    /// Sets the fallback fill.
    #[must_use]
    pub fn with_default_fill(mut self, fill: Color) -> Self {
        self.default_fill = fill;
        self
    }

    fn geometry(&self) -> GeometryOptions {
        GeometryOptions {
            bar_width: self.bar_width,
            fills: self.fills.clone(),
            default_fill: self.default_fill,
        }
    }
}

/// Counts from one completed label pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelPassReport {
    /// Labels drawn.
    pub placed: usize,
    /// Labels suppressed.
    pub rejected: usize,
}

/// Everything one deferred label pass needs, captured at render time.
pub struct LabelPass<K> {
    plot: PlotId,
    layer: MarkLayer<K>,
    stacked: StackedEntries<K>,
    text: Option<LabelText<K>>,
    totals: Vec<TotalAnchor>,
    measurer: Option<Arc<dyn TextMeasurer>>,
    contrast: Arc<dyn ColorContrast>,
    style: TextStyle,
    total_padding: f64,
}

impl<K: core::fmt::Debug> core::fmt::Debug for LabelPass<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabelPass")
            .field("plot", &self.plot)
            .field("marks", &self.layer.len())
            .field("totals", &self.totals.len())
            .field("text", &self.text.as_ref().map(|_| "<fn>"))
            .field("has_measurer", &self.measurer.is_some())
            .field("style", &self.style)
            .field("total_padding", &self.total_padding)
            .finish_non_exhaustive()
    }
}

impl<K: CategoryKey> LabelPass<K> {
    /// Creates a pass over `layer`, which must have been resolved from `stacked`.
    ///
    /// The pass starts with no measurer (it will abort), value labels, no totals,
    /// [`WcagContrast`] tones and a 12px label style.
    pub fn new(plot: PlotId, layer: MarkLayer<K>, stacked: StackedEntries<K>) -> Self {
        Self {
            plot,
            layer,
            stacked,
            text: None,
            totals: Vec::new(),
            measurer: None,
            contrast: Arc::new(WcagContrast),
            style: TextStyle::new(12.0),
            total_padding: 4.0,
        }
    }

    /// Sets the label text accessor.
    #[must_use]
    pub fn with_text(mut self, text: Option<LabelText<K>>) -> Self {
        self.text = text;
        self
    }

    /// Sets the stack total anchors to place after the mark labels.
    #[must_use]
    pub fn with_totals(mut self, totals: Vec<TotalAnchor>, padding: f64) -> Self {
        self.totals = totals;
        self.total_padding = padding;
        self
    }

    /// Sets the text measurer.
    #[must_use]
    pub fn with_measurer(mut self, measurer: Option<Arc<dyn TextMeasurer>>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Sets the color-contrast capability.
    #[must_use]
    pub fn with_contrast(mut self, contrast: Arc<dyn ColorContrast>) -> Self {
        self.contrast = contrast;
        self
    }

    /// Sets the label text style.
    #[must_use]
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    /// The plot this pass labels.
    pub fn plot(&self) -> PlotId {
        self.plot
    }

    /// Decides every mark label, then every total label, without drawing.
    ///
    /// The same inputs always produce the same decisions.
    pub fn decisions(&self) -> Result<Vec<LabelDecision>, MeasurementUnavailableError> {
        let measurer = self
            .measurer
            .as_deref()
            .ok_or_else(|| MeasurementUnavailableError::new("no text measurer configured"))?;

        let text = |mark: &MarkRect<K>| {
            let entry = self.stacked.get(mark.dataset_index, mark.datum_index)?;
            match &self.text {
                Some(text) => text(entry),
                None => Some(format_number(entry.value)),
            }
        };
        let mut decisions = LabelLayout::new(
            &self.layer,
            text,
            measurer,
            &self.style,
            self.contrast.as_ref(),
        )
        .collect::<Result<Vec<_>, _>>()?;

        decisions.extend(place_total_labels(
            &self.totals,
            measurer,
            &self.style,
            self.layer.orientation(),
            self.total_padding,
            self.layer.bounds(),
        )?);
        Ok(decisions)
    }

    /// Runs the pass: decides every label and then draws the placed ones.
    ///
    /// Nothing is drawn if measurement fails part way.
    pub fn run(
        &self,
        painter: &mut dyn Painter,
    ) -> Result<LabelPassReport, MeasurementUnavailableError> {
        let decisions = self.decisions()?;
        let placed: Vec<LabelPlacement> = decisions
            .iter()
            .filter_map(LabelDecision::placement)
            .cloned()
            .collect();
        painter.clear_labels(self.plot);
        painter.paint_labels(self.plot, &placed);
        Ok(LabelPassReport {
            placed: placed.len(),
            rejected: decisions.len() - placed.len(),
        })
    }
}

/// Posts `pass` to the host queue to run after `delay`.
///
/// The returned handle cancels the pass if it has not run yet.
pub fn schedule_label_pass<K, P>(
    sender: &TaskSender<P>,
    pass: LabelPass<K>,
    delay: Duration,
) -> CancelHandle
where
    K: CategoryKey + 'static,
    P: Painter + 'static,
{
    let plot = pass.plot;
    let handle = sender.schedule(delay, move |painter: &mut P| match pass.run(painter) {
        Ok(report) => tracing::debug!(
            plot = plot.0,
            placed = report.placed,
            rejected = report.rejected,
            "label pass complete"
        ),
        Err(err) => tracing::debug!(plot = plot.0, %err, "label pass aborted"),
    });
    tracing::debug!(plot = plot.0, task = handle.id().0, ?delay, "label pass scheduled");
    handle
}

/// A stacked bar plot.
///
/// Geometry is computed and painted synchronously in [`render`](Self::render); labels
/// come later from a deferred label pass. At most one label pass per plot is ever
/// pending: every render and [`destroy`](Self::destroy) cancels the outstanding one.
pub struct StackedBarPlot<K> {
    id: PlotId,
    config: StackedBarConfig,
    label_text: Option<LabelText<K>>,
    measurer: Option<Arc<dyn TextMeasurer>>,
    contrast: Arc<dyn ColorContrast>,
    pending: Option<CancelHandle>,
}

impl<K> core::fmt::Debug for StackedBarPlot<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StackedBarPlot")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("label_text", &self.label_text.as_ref().map(|_| "<fn>"))
            .field("has_measurer", &self.measurer.is_some())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<K: CategoryKey + 'static> StackedBarPlot<K> {
    /// Creates a plot with no measurer; label passes abort until one is set.
    pub fn new(id: PlotId, config: StackedBarConfig) -> Self {
        Self {
            id,
            config,
            label_text: None,
            measurer: None,
            contrast: Arc::new(WcagContrast),
            pending: None,
        }
    }

    /// Sets the label text accessor. Without one, marks are labelled with their value.
    #[must_use]
    pub fn with_label_text(
        mut self,
        text: impl Fn(&StackEntry<K>) -> Option<String> + 'static,
    ) -> Self {
        self.label_text = Some(Arc::new(text));
        self
    }

    /// Sets the text measurer.
    #[must_use]
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    /// Sets the color-contrast capability used for label tones.
    #[must_use]
    pub fn with_contrast(mut self, contrast: Arc<dyn ColorContrast>) -> Self {
        self.contrast = contrast;
        self
    }

    /// The plot id.
    pub fn id(&self) -> PlotId {
        self.id
    }

    /// The configuration.
    pub fn config(&self) -> &StackedBarConfig {
        &self.config
    }

    /// Mutable access to the configuration; changes apply from the next render.
    pub fn config_mut(&mut self) -> &mut StackedBarConfig {
        &mut self.config
    }

    /// Returns `true` if a label pass is scheduled and has not been cancelled.
    ///
    /// A pass that already ran still counts until the next render or destroy.
    pub fn has_pending_pass(&self) -> bool {
        self.pending.is_some()
    }

    /// Stacks `datasets` with the configured order and sign mode.
    pub fn stack<T, D, F>(&self, datasets: &[D], accessor: F) -> StackedEntries<K>
    where
        D: AsRef<[T]>,
        F: Fn(&T, usize) -> Datum<K>,
    {
        compute_stacked_entries_with(
            datasets,
            accessor,
            self.config.stacking_order,
            self.config.sign_mode,
        )
    }

    /// Resolves and paints the marks, then schedules the label pass.
    ///
    /// Any outstanding label pass is cancelled and this plot's labels are cleared
    /// first, even if geometry then fails.
    pub fn render<C, V, P>(
        &mut self,
        stacked: &StackedEntries<K>,
        scales: &Scales<C, V>,
        painter: &mut P,
        queue: &TaskSender<P>,
    ) -> Result<MarkLayer<K>, PlotError>
    where
        C: CategoryScale<K>,
        V: ValueScale,
        P: Painter + 'static,
    {
        self.cancel_pending();
        painter.clear_labels(self.id);

        let layer = resolve_rectangles(
            stacked,
            scales,
            self.config.orientation,
            &self.config.geometry(),
        )?;
        painter.paint_marks(self.id, &layer.paints());

        if self.config.labels_enabled {
            let totals = if self.config.total_labels_enabled {
                total_anchors(stacked, &layer, &scales.value)
            } else {
                Vec::new()
            };
            let pass = LabelPass::new(self.id, layer.clone(), stacked.clone())
                .with_text(self.label_text.clone())
                .with_totals(totals, self.config.total_label_padding)
                .with_measurer(self.measurer.clone())
                .with_contrast(self.contrast.clone())
                .with_style(self.config.label_style.clone());
            self.pending = Some(schedule_label_pass(queue, pass, self.config.label_delay));
        }
        Ok(layer)
    }

    /// Cancels any pending label pass and clears this plot's labels.
    ///
    /// Safe to call repeatedly.
    pub fn destroy(&mut self, painter: &mut impl Painter) {
        self.cancel_pending();
        painter.clear_labels(self.id);
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
            tracing::debug!(plot = self.id.0, task = handle.id().0, "label pass cancelled");
        }
    }
}
