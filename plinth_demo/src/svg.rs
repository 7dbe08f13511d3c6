// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SVG output for `plinth_demo`.

use std::collections::BTreeMap;

use kurbo::Rect;
use peniko::Color;
use plinth_charts::{LabelPlacement, LabelTone, Painter, PlotId, RectPaint};
use plinth_text::TextStyle;

#[derive(Debug, Default)]
struct PlotLayers {
    marks: Vec<RectPaint>,
    labels: Vec<LabelPlacement>,
}

/// A painter that keeps every plot's marks and labels and dumps them as SVG.
#[derive(Debug)]
pub(crate) struct SvgSurface {
    plots: BTreeMap<PlotId, PlotLayers>,
    style: TextStyle,
}

impl SvgSurface {
    /// Creates a surface that draws labels in `style`, the style they were measured with.
    pub(crate) fn new(style: TextStyle) -> Self {
        Self {
            plots: BTreeMap::new(),
            style,
        }
    }

    pub(crate) fn label_count(&self, plot: PlotId) -> usize {
        self.plots.get(&plot).map_or(0, |p| p.labels.len())
    }

    pub(crate) fn to_svg_string(&self, plot: PlotId, view_box: Rect) -> String {
        let mut out = String::new();
        out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" "#);
        out.push_str(&format!(
            r#"viewBox="{} {} {} {}" width="{}" height="{}" preserveAspectRatio="xMinYMin meet">"#,
            view_box.x0,
            view_box.y0,
            view_box.width(),
            view_box.height(),
            view_box.width(),
            view_box.height()
        ));
        out.push('\n');
        out.push_str(&format!(
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#f4f4f4"/>"##,
            view_box.x0,
            view_box.y0,
            view_box.width(),
            view_box.height()
        ));
        out.push('\n');

        let Some(layers) = self.plots.get(&plot) else {
            out.push_str("</svg>\n");
            return out;
        };

        for mark in &layers.marks {
            out.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}""#,
                mark.rect.x0,
                mark.rect.y0,
                mark.rect.width(),
                mark.rect.height(),
            ));
            write_paint_attr(&mut out, "fill", mark.fill);
            out.push_str("/>\n");
        }

        for label in &layers.labels {
            let center = label.bounds.center();
            out.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="{}" font-family="{}" font-weight="{}""#,
                center.x,
                center.y,
                self.style.font_size,
                escape_xml(self.style.font_family.as_css_family()),
                self.style.font_weight.0
            ));
            out.push_str(r#" dominant-baseline="middle" text-anchor="middle""#);
            let fill = match label.tone {
                LabelTone::Dark => Color::from_rgb8(0x22, 0x22, 0x22),
                LabelTone::Light => Color::WHITE,
            };
            write_paint_attr(&mut out, "fill", fill);
            out.push('>');
            out.push_str(&escape_xml(&label.text));
            out.push_str("</text>\n");
        }

        out.push_str("</svg>\n");
        out
    }
}

impl Painter for SvgSurface {
    fn paint_marks(&mut self, plot: PlotId, marks: &[RectPaint]) {
        self.plots.entry(plot).or_default().marks = marks.to_vec();
    }

    fn paint_labels(&mut self, plot: PlotId, labels: &[LabelPlacement]) {
        self.plots
            .entry(plot)
            .or_default()
            .labels
            .extend_from_slice(labels);
    }

    fn clear_labels(&mut self, plot: PlotId) {
        if let Some(layers) = self.plots.get_mut(&plot) {
            layers.labels.clear();
        }
    }
}

fn svg_paint(color: Color) -> (String, Option<f64>) {
    let rgba = color.to_rgba8();
    let fill = format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b);
    let opacity = if rgba.a == 255 {
        None
    } else {
        Some(f64::from(rgba.a) / 255.0)
    };
    (fill, opacity)
}

fn write_paint_attr(out: &mut String, name: &str, color: Color) {
    let (value, opacity) = svg_paint(color);
    out.push_str(&format!(r#" {name}="{value}""#));
    if let Some(o) = opacity {
        out.push_str(&format!(r#" {name}-opacity="{o}""#));
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
