// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacked bar demos for Plinth.
//!
//! Renders a handful of stacked bar plots onto one [`svg::SvgSurface`], lets the
//! deferred label passes run, and writes the result to `plinth_demo.html`.
//! Set `RUST_LOG=plinth_charts=trace` to watch individual label decisions.

mod svg;

use std::sync::Arc;
use std::time::Duration;

use kurbo::Rect;
use peniko::Color;
use plinth_charts::{
    DeferredQueue, Orientation, PlotId, ScaleCategory, ScaleLinear, Scales, StackedBarConfig,
    StackedBarPlot, format_number,
};
use plinth_stack::{Datum, RawValue, SignMode, StackDomain, StackingOrder};
use plinth_text::{FontFamily, FontWeight, TextMeasurer, TextStyle};
use tracing_subscriber::EnvFilter;

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 320.0;
const FONT_SIZE: f64 = 11.0;
const LABEL_DELAY: Duration = Duration::from_millis(16);

struct Section {
    title: &'static str,
    svg: String,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,plinth_charts=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut surface = svg::SvgSurface::new(label_style());
    let mut queue = DeferredQueue::new();

    let plots = vec![
        regions_demo(&mut surface, &queue),
        balance_demo(&mut surface, &queue),
        daily_demo(&mut surface, &queue),
        messy_data_demo(&mut surface, &queue),
    ];

    // Every pass was scheduled with the same delay; one frame later they have all run.
    let ran = queue.advance(LABEL_DELAY, &mut surface);
    tracing::info!(ran, "label passes finished");

    let view = Rect::new(0.0, 0.0, WIDTH, HEIGHT);
    let sections: Vec<Section> = plots
        .into_iter()
        .map(|(title, id)| {
            tracing::info!(plot = id.0, labels = surface.label_count(id), "{title}");
            Section {
                title,
                svg: surface.to_svg_string(id, view),
            }
        })
        .collect();

    let html = render_report("Plinth stacked bars", &sections);
    std::fs::write("plinth_demo.html", html).expect("write plinth_demo.html");
    println!("wrote plinth_demo.html");
}

fn demo_measurer() -> Arc<dyn TextMeasurer> {
    #[cfg(feature = "parley")]
    {
        Arc::new(plinth_text_parley::ParleyTextMeasurer::new())
    }

    #[cfg(not(feature = "parley"))]
    {
        Arc::new(plinth_text::HeuristicTextMeasurer)
    }
}

fn palette() -> Vec<Color> {
    vec![
        Color::from_rgb8(0x4c, 0x78, 0xa8),
        Color::from_rgb8(0xf5, 0x85, 0x18),
        Color::from_rgb8(0xe4, 0x57, 0x56),
        Color::from_rgb8(0xee, 0xca, 0x3b),
    ]
}

fn label_style() -> TextStyle {
    TextStyle::new(FONT_SIZE)
        .with_family(FontFamily::SansSerif)
        .with_weight(FontWeight::BOLD)
}

fn base_config() -> StackedBarConfig {
    StackedBarConfig::default()
        .with_labels(true)
        .with_label_delay(LABEL_DELAY)
        .with_label_style(label_style())
        .with_fills(palette())
}

/// Three regions stacked per quarter, with totals above each stack.
fn regions_demo(
    surface: &mut svg::SvgSurface,
    queue: &DeferredQueue<svg::SvgSurface>,
) -> (&'static str, PlotId) {
    let id = PlotId(1);
    let north = [("Q1", 12.0), ("Q2", 18.0), ("Q3", 9.0), ("Q4", 21.0)];
    let south = [("Q1", 7.0), ("Q2", 4.0), ("Q3", 11.0), ("Q4", 6.0)];
    let west = [("Q1", 3.0), ("Q2", 9.0), ("Q4", 14.0)];
    let datasets: [&[(&str, f64)]; 3] = [&north, &south, &west];

    let mut plot = StackedBarPlot::new(id, base_config()).with_measurer(demo_measurer());
    let stacked = plot.stack(&datasets, |&(q, v): &(&str, f64), _| Datum::new(q, v));
    let scales = Scales::new(
        ScaleCategory::new(stacked.categories().iter().copied(), (0.0, WIDTH)),
        ScaleLinear::from_domain(stacked.domain(), (HEIGHT, 0.0)).nice(5),
    );
    if let Err(err) = plot.render(&stacked, &scales, surface, &queue.sender()) {
        tracing::error!(plot = id.0, %err, "render failed");
    }
    ("Quarterly sales by region", id)
}

/// Mixed-sign monthly balances, horizontal, with negatives growing left of zero.
fn balance_demo(
    surface: &mut svg::SvgSurface,
    queue: &DeferredQueue<svg::SvgSurface>,
) -> (&'static str, PlotId) {
    let id = PlotId(2);
    let income = [("Jan", 40.0), ("Feb", 35.0), ("Mar", 52.0)];
    let costs = [("Jan", -28.0), ("Feb", -41.0), ("Mar", -30.0)];
    let datasets: [&[(&str, f64)]; 2] = [&income, &costs];

    let config = base_config()
        .with_orientation(Orientation::Horizontal)
        .with_sign_mode(SignMode::Diverging)
        .with_total_labels(false);
    let mut plot = StackedBarPlot::new(id, config)
        .with_measurer(demo_measurer())
        .with_label_text(|e| Some(format!("{:+}", e.value)));
    let stacked = plot.stack(&datasets, |&(m, v): &(&str, f64), _| Datum::new(m, v));
    let scales = Scales::new(
        ScaleCategory::new(stacked.categories().iter().copied(), (0.0, HEIGHT)),
        ScaleLinear::from_domain(stacked.domain(), (0.0, WIDTH)).nice(6),
    );
    if let Err(err) = plot.render(&stacked, &scales, surface, &queue.sender()) {
        tracing::error!(plot = id.0, %err, "render failed");
    }
    ("Monthly balance (diverging, horizontal)", id)
}

/// A continuous day axis, stacked top-down so the first series sits on top.
fn daily_demo(
    surface: &mut svg::SvgSurface,
    queue: &DeferredQueue<svg::SvgSurface>,
) -> (&'static str, PlotId) {
    let id = PlotId(3);
    // Days since the Unix epoch.
    let first_day = 20_000_i64;
    let signups: Vec<(i64, f64)> = (0..7_i32)
        .map(|d| (first_day + i64::from(d), f64::from(3 + d * 5 % 7)))
        .collect();
    let trials: Vec<(i64, f64)> = (0..7_i32)
        .map(|d| (first_day + i64::from(d), f64::from(1 + d * 3 % 4)))
        .collect();
    let datasets = [signups, trials];

    let config = base_config().with_stacking_order(StackingOrder::TopDown);
    let mut plot = StackedBarPlot::new(id, config).with_measurer(demo_measurer());
    let stacked = plot.stack(&datasets, |&(day, v): &(i64, f64), _| Datum::new(day, v));
    let scales = Scales::new(
        ScaleLinear::new(
            (first_day as f64 - 0.5, first_day as f64 + 6.5),
            (0.0, WIDTH),
        ),
        ScaleLinear::from_domain(stacked.domain(), (HEIGHT, 0.0)).nice(5),
    );
    if let Err(err) = plot.render(&stacked, &scales, surface, &queue.sender()) {
        tracing::error!(plot = id.0, %err, "render failed");
    }
    ("Daily signups (continuous axis, top-down)", id)
}

/// Malformed values are stacked as zero and reported, never fatal.
fn messy_data_demo(
    surface: &mut svg::SvgSurface,
    queue: &DeferredQueue<svg::SvgSurface>,
) -> (&'static str, PlotId) {
    let id = PlotId(4);
    let readings: Vec<Vec<(&str, RawValue)>> = vec![
        vec![
            ("a", RawValue::from(4.0)),
            ("b", RawValue::from("n/a")),
            ("c", RawValue::from(6.0)),
        ],
        vec![
            ("a", RawValue::from(f64::NAN)),
            ("b", RawValue::from(2.5)),
            ("c", RawValue::from(None)),
        ],
    ];

    let mut plot = StackedBarPlot::new(id, base_config().with_bar_width(60.0))
        .with_measurer(demo_measurer());
    let stacked = plot.stack(&readings, |(k, v): &(&str, RawValue), _| {
        Datum::new(*k, v.clone())
    });
    for diagnostic in stacked.diagnostics() {
        tracing::warn!(plot = id.0, %diagnostic, "bad reading");
    }
    let total: f64 = stacked.iter().map(|e| e.value).sum();
    tracing::info!(plot = id.0, total = %format_number(total), "stacked readings");

    // Keep the value axis at the sensor's full 0..10 range even when readings are low.
    let domain = stacked.domain().union(StackDomain { min: 0.0, max: 10.0 });
    let scales = Scales::new(
        ScaleCategory::new(["a", "b", "c"], (0.0, WIDTH)),
        ScaleLinear::from_domain(domain, (HEIGHT, 0.0)).nice(4),
    );
    if let Err(err) = plot.render(&stacked, &scales, surface, &queue.sender()) {
        tracing::error!(plot = id.0, %err, "render failed");
    }
    ("Readings with malformed values", id)
}

fn render_report(title: &str, sections: &[Section]) -> String {
    let mut out = String::new();
    out.push_str("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", svg::escape_xml(title)));
    out.push_str(
        "<style>body{font-family:sans-serif;margin:24px}section{margin-bottom:32px}</style>\n",
    );
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", svg::escape_xml(title)));
    for section in sections {
        out.push_str("<section>\n");
        out.push_str(&format!("<h2>{}</h2>\n", svg::escape_xml(section.title)));
        out.push_str(&section.svg);
        out.push_str("</section>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}
