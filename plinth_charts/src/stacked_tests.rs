// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

extern crate std;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::time::Duration;

use kurbo::Point;
use plinth_stack::{Datum, StackedEntries, StackingOrder};
use plinth_text::HeuristicTextMeasurer;

use crate::{
    DeferredQueue, InvalidScaleError, LabelKind, LabelPass, LabelPlacement, Orientation, Painter,
    PlotError, PlotId, RectPaint, ScaleCategory, ScaleLinear, Scales, StackedBarConfig,
    StackedBarPlot,
};

/// Records what each plot has on screen.
#[derive(Debug, Default)]
struct Recorder {
    marks: BTreeMap<PlotId, Vec<RectPaint>>,
    labels: BTreeMap<PlotId, Vec<LabelPlacement>>,
    label_paints: usize,
}

impl Recorder {
    fn labels(&self, plot: PlotId) -> &[LabelPlacement] {
        self.labels.get(&plot).map_or(&[][..], Vec::as_slice)
    }

    fn totals(&self, plot: PlotId) -> Vec<&str> {
        self.labels(plot)
            .iter()
            .filter(|l| matches!(l.kind, LabelKind::Total { .. }))
            .map(|l| l.text.as_str())
            .collect()
    }
}

impl Painter for Recorder {
    fn paint_marks(&mut self, plot: PlotId, marks: &[RectPaint]) {
        self.marks.insert(plot, marks.to_vec());
    }

    fn paint_labels(&mut self, plot: PlotId, labels: &[LabelPlacement]) {
        self.label_paints += 1;
        self.labels.entry(plot).or_default().extend_from_slice(labels);
    }

    fn clear_labels(&mut self, plot: PlotId) {
        self.labels.remove(&plot);
    }
}

const PLOT: PlotId = PlotId(7);

type Row = (&'static str, f64);

fn labelled(config: StackedBarConfig) -> StackedBarPlot<&'static str> {
    StackedBarPlot::new(PLOT, config.with_labels(true))
        .with_measurer(Arc::new(HeuristicTextMeasurer))
}

fn stack(plot: &StackedBarPlot<&'static str>, rows: &[Vec<Row>]) -> StackedEntries<&'static str> {
    plot.stack(rows, |&(c, v): &Row, _| Datum::new(c, v))
}

fn scales(
    categories: (f64, f64),
    domain: (f64, f64),
    values: (f64, f64),
) -> Scales<ScaleCategory<&'static str>, ScaleLinear> {
    Scales::new(
        ScaleCategory::new(["A", "B"], categories),
        ScaleLinear::new(domain, values),
    )
}

/// Renders once and lets the label pass run.
fn totals_for(
    config: StackedBarConfig,
    rows: &[Vec<Row>],
    scales: &Scales<ScaleCategory<&'static str>, ScaleLinear>,
) -> Vec<String> {
    let mut plot = labelled(config);
    let stacked = stack(&plot, rows);
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    plot.render(&stacked, scales, &mut screen, &queue.sender())
        .unwrap();
    queue.run_ready(&mut screen);
    screen.totals(PLOT).into_iter().map(String::from).collect()
}

fn positive() -> Vec<Vec<Row>> {
    vec![vec![("A", 1.0), ("B", 2.0)], vec![("A", 2.0), ("B", 1.0)]]
}

fn negative() -> Vec<Vec<Row>> {
    vec![vec![("A", -1.0), ("B", -2.0)], vec![("A", -2.0), ("B", -1.0)]]
}

#[test]
fn shows_stack_totals() {
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    assert_eq!(totals_for(StackedBarConfig::default(), &positive(), &s), ["3", "3"]);
}

#[test]
fn hides_totals_when_stacks_reach_the_top() {
    let s = scales((0.0, 400.0), (0.0, 3.0), (400.0, 0.0));
    assert!(totals_for(StackedBarConfig::default(), &positive(), &s).is_empty());
}

#[test]
fn hides_totals_when_bands_are_too_narrow() {
    let s = scales((0.0, 10.0), (0.0, 30.0), (400.0, 0.0));
    assert!(totals_for(StackedBarConfig::default(), &positive(), &s).is_empty());
}

#[test]
fn shows_negative_totals() {
    let s = scales((0.0, 400.0), (3.0, -3.0), (400.0, 0.0));
    assert_eq!(totals_for(StackedBarConfig::default(), &negative(), &s), ["-3", "-3"]);
}

#[test]
fn hides_negative_totals_when_stacks_reach_the_bottom() {
    let s = scales((0.0, 400.0), (-3.0, 0.0), (400.0, 0.0));
    assert!(totals_for(StackedBarConfig::default(), &negative(), &s).is_empty());
}

#[test]
fn shows_horizontal_totals() {
    let config = StackedBarConfig::default().with_orientation(Orientation::Horizontal);
    let s = scales((0.0, 400.0), (0.0, 30.0), (0.0, 400.0));
    assert_eq!(totals_for(config.clone(), &positive(), &s), ["3", "3"]);

    let s = scales((0.0, 400.0), (0.0, 3.0), (0.0, 400.0));
    assert!(totals_for(config, &positive(), &s).is_empty());
}

#[test]
fn totals_can_be_turned_off() {
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    let config = StackedBarConfig::default().with_total_labels(false);
    assert!(totals_for(config, &positive(), &s).is_empty());
}

#[test]
fn shows_totals_on_a_date_axis() {
    let mut plot = StackedBarPlot::<i64>::new(PLOT, StackedBarConfig::default().with_labels(true))
        .with_measurer(Arc::new(HeuristicTextMeasurer));
    // Day numbers since the epoch.
    let rows = vec![vec![(15_950_i64, 1.0), (15_951, 2.0)], vec![(15_950, 2.0), (15_951, 1.0)]];
    let stacked = plot.stack(&rows, |&(day, v): &(i64, f64), _| Datum::new(day, v));
    let s = Scales::new(
        ScaleLinear::new((15_949.5, 15_951.5), (0.0, 400.0)),
        ScaleLinear::new((0.0, 30.0), (400.0, 0.0)),
    );
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);
    assert_eq!(screen.totals(PLOT), ["3", "3"]);
}

#[test]
fn shows_totals_for_a_single_day() {
    let mut plot = StackedBarPlot::<i64>::new(PLOT, StackedBarConfig::default().with_labels(true))
        .with_measurer(Arc::new(HeuristicTextMeasurer));
    let rows = vec![vec![(15_950_i64, 1.0)], vec![(15_950, 2.0)]];
    let stacked = plot.stack(&rows, |&(day, v): &(i64, f64), _| Datum::new(day, v));
    let s = Scales::new(
        ScaleLinear::new((15_949.0, 15_951.0), (0.0, 400.0)),
        ScaleLinear::new((0.0, 30.0), (400.0, 0.0)),
    );
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);
    assert_eq!(screen.marks[&PLOT].len(), 2);
    assert_eq!(screen.totals(PLOT), ["3"]);
}

#[test]
fn config_changes_apply_on_the_next_render() {
    let mut plot = labelled(StackedBarConfig::default());
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    let stacked = stack(&plot, &positive());

    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);
    assert_eq!(screen.totals(PLOT), ["3", "3"]);

    plot.config_mut().total_labels_enabled = false;
    assert_eq!(screen.totals(PLOT), ["3", "3"], "nothing changes until the next render");
    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);
    assert!(screen.totals(PLOT).is_empty());
    assert!(!screen.labels(PLOT).is_empty(), "mark labels still drawn");
}

#[test]
fn later_datasets_stack_above_earlier_ones() {
    let rows = vec![
        vec![("A", 1.0), ("B", 2.0), ("C", 1.0)],
        vec![("A", 2.0), ("B", 3.0)],
        vec![("B", 1.0), ("C", 7.0)],
    ];
    let s = Scales::new(
        ScaleCategory::new(["A", "B", "C"], (0.0, 300.0)),
        ScaleLinear::new((0.0, 10.0), (400.0, 0.0)),
    );
    for order in [StackingOrder::BottomUp, StackingOrder::TopDown] {
        let config = StackedBarConfig::default().with_stacking_order(order);
        let mut plot = StackedBarPlot::new(PLOT, config);
        let stacked = stack(&plot, &rows);
        let mut screen = Recorder::default();
        let layer = plot
            .render(&stacked, &s, &mut screen, &DeferredQueue::new().sender())
            .unwrap();
        assert_eq!(screen.marks[&PLOT].len(), 7, "one rect per datum");

        for category in ["A", "B", "C"] {
            let bars: Vec<_> = layer.iter().filter(|m| m.category == category).collect();
            for pair in bars.windows(2) {
                assert_eq!(pair[0].rect.x0, pair[1].rect.x0, "same band");
                let first_is_lower = pair[0].rect.y0 > pair[1].rect.y0;
                assert_eq!(
                    first_is_lower,
                    order == StackingOrder::BottomUp,
                    "{order:?} {category}"
                );
            }
        }
    }
}

#[test]
fn labels_are_off_by_default() {
    let mut plot = StackedBarPlot::new(PLOT, StackedBarConfig::default())
        .with_measurer(Arc::new(HeuristicTextMeasurer));
    let stacked = stack(&plot, &positive());
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    assert!(!plot.has_pending_pass(), "nothing scheduled");
    assert_eq!(queue.pending_count(), 0);
    assert_eq!(screen.marks[&PLOT].len(), 4);
}

#[test]
fn labels_wait_for_the_deferred_pass() {
    let config = StackedBarConfig::default().with_label_delay(Duration::from_millis(16));
    let mut plot = labelled(config);
    let stacked = stack(&plot, &positive());
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));

    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    assert_eq!(screen.marks[&PLOT].len(), 4, "geometry is synchronous");
    assert!(screen.labels(PLOT).is_empty(), "labels are not");

    assert_eq!(queue.advance(Duration::from_millis(15), &mut screen), 0);
    assert_eq!(queue.advance(Duration::from_millis(1), &mut screen), 1);
    assert!(!screen.labels(PLOT).is_empty());
}

#[test]
fn rerender_supersedes_the_pending_pass() {
    let config = StackedBarConfig::default().with_label_delay(Duration::from_millis(10));
    let mut plot = labelled(config);
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));

    let first = stack(&plot, &positive());
    plot.render(&first, &s, &mut screen, &queue.sender()).unwrap();
    queue.advance(Duration::from_millis(5), &mut screen);

    let second = stack(&plot, &vec![vec![("A", 4.0), ("B", 5.0)]]);
    plot.render(&second, &s, &mut screen, &queue.sender()).unwrap();
    assert_eq!(queue.pending_count(), 1, "first pass cancelled");

    let ran = queue.advance(Duration::from_millis(20), &mut screen);
    assert_eq!(ran, 1);
    assert_eq!(screen.label_paints, 1, "only one pass drew");
    assert_eq!(screen.totals(PLOT), ["4", "5"]);
}

#[test]
fn rerender_clears_labels_from_the_previous_pass() {
    let mut plot = labelled(StackedBarConfig::default());
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));

    let stacked = stack(&plot, &positive());
    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);
    let drawn = screen.labels(PLOT).to_vec();
    assert!(!drawn.is_empty());

    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    assert!(screen.labels(PLOT).is_empty(), "cleared synchronously");
    queue.run_ready(&mut screen);
    assert_eq!(screen.labels(PLOT), drawn.as_slice(), "same inputs, same labels");
}

#[test]
fn destroy_cancels_and_clears() {
    let config = StackedBarConfig::default().with_label_delay(Duration::from_millis(10));
    let mut plot = labelled(config);
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    let stacked = stack(&plot, &positive());

    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    plot.destroy(&mut screen);
    plot.destroy(&mut screen);
    assert!(!plot.has_pending_pass());
    assert_eq!(queue.advance(Duration::from_millis(50), &mut screen), 0);
    assert!(screen.labels(PLOT).is_empty());
    assert_eq!(screen.label_paints, 0);
}

#[test]
fn plots_only_touch_their_own_labels() {
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));

    let mut a = labelled(StackedBarConfig::default());
    let mut b = StackedBarPlot::new(PlotId(8), StackedBarConfig::default().with_labels(true))
        .with_measurer(Arc::new(HeuristicTextMeasurer));
    let stacked = stack(&a, &positive());
    a.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    b.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);

    a.destroy(&mut screen);
    assert!(screen.labels(PLOT).is_empty());
    assert!(!screen.labels(PlotId(8)).is_empty(), "other plot keeps its labels");
}

#[test]
fn missing_measurer_skips_labels_but_not_geometry() {
    let mut plot = StackedBarPlot::new(PLOT, StackedBarConfig::default().with_labels(true));
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    let stacked = stack(&plot, &positive());

    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    assert_eq!(queue.run_ready(&mut screen), 1, "the pass runs and aborts");
    assert_eq!(screen.marks[&PLOT].len(), 4);
    assert_eq!(screen.label_paints, 0, "an aborted pass draws nothing");
}

#[test]
fn geometry_errors_reach_the_caller() {
    let mut plot = labelled(StackedBarConfig::default());
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 30.0), (400.0, 0.0));
    let stacked = stack(&plot, &vec![vec![("Z", 1.0)]]);

    let err = plot
        .render(&stacked, &s, &mut screen, &queue.sender())
        .unwrap_err();
    assert!(
        matches!(err, PlotError::InvalidScale(InvalidScaleError::UnmappedCategory(_))),
        "{err:?}"
    );
    assert!(screen.marks.is_empty(), "nothing painted");
    assert_eq!(queue.pending_count(), 0, "no label pass for failed geometry");
}

#[test]
fn custom_label_text() {
    let mut plot = labelled(StackedBarConfig::default().with_total_labels(false))
        .with_label_text(|e| (e.dataset_index == 0).then(|| format!("{}!", e.value)));
    let mut queue = DeferredQueue::new();
    let mut screen = Recorder::default();
    let s = scales((0.0, 400.0), (0.0, 3.0), (400.0, 0.0));
    let stacked = stack(&plot, &positive());

    plot.render(&stacked, &s, &mut screen, &queue.sender()).unwrap();
    queue.run_ready(&mut screen);
    let texts: Vec<_> = screen.labels(PLOT).iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["1!", "2!"]);
}

#[test]
fn label_pass_decisions_are_repeatable() {
    let plot = labelled(StackedBarConfig::default());
    let stacked = stack(&plot, &positive());
    let s = scales((0.0, 400.0), (0.0, 3.0), (400.0, 0.0));
    let layer = crate::resolve_rectangles(
        &stacked,
        &s,
        Orientation::Vertical,
        &crate::GeometryOptions::default(),
    )
    .unwrap();
    let pass = LabelPass::new(PLOT, layer, stacked)
        .with_measurer(Some(Arc::new(HeuristicTextMeasurer)));
    let first = pass.decisions().unwrap();
    assert_eq!(first.len(), 4, "one decision per mark");
    assert_eq!(pass.decisions().unwrap(), first);
}

#[test]
fn nearest_mark_from_a_render() {
    let mut plot = StackedBarPlot::new(PLOT, StackedBarConfig::default());
    let stacked = stack(&plot, &positive());
    let s = scales((0.0, 400.0), (0.0, 3.0), (300.0, 0.0));
    let mut screen = Recorder::default();
    let layer = plot
        .render(&stacked, &s, &mut screen, &DeferredQueue::new().sender())
        .unwrap();

    // Category A, dataset 0 spans y 200..300 and dataset 1 spans 0..200.
    let x = layer.datasets()[0][0].rect.center().x;
    assert_eq!(layer.nearest(Point::new(x, 201.0)).unwrap().dataset_index, 0);
    assert_eq!(layer.nearest(Point::new(x, 199.0)).unwrap().dataset_index, 1);
}
