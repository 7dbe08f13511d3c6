// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement hooks for label layout.
//!
//! Plinth places value labels inside stacked bars and total labels beyond them.
//! Both decisions need the rendered size of a string before anything is drawn,
//! but shaping and glyph layout stay downstream, so label layout depends on a
//! tiny text measurement interface.
//!
//! This crate is intentionally:
//! - small and dependency-light,
//! - `no_std`-friendly (it uses `alloc` for owned font family names), and
//! - renderer-agnostic (native shaping engines and heuristic estimates can
//!   both implement the same trait).

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;

/// A minimal text measurement interface used by label layout.
///
/// Implementations can be:
/// - heuristic (fast, but inaccurate), or
/// - backed by a shaping engine (e.g. Parley).
///
/// Measurement is fallible: a backend that has no fonts, or that cannot be
/// reached, reports [`MeasurementUnavailableError`] and the caller skips its
/// label work instead of guessing.
pub trait TextMeasurer {
    /// Measure a single line of text.
    ///
    /// `text` is treated as a single line; callers should split on `\n` if they
    /// want multi-line layout.
    fn measure(
        &self,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextMetrics, MeasurementUnavailableError>;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(
        &self,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextMetrics, MeasurementUnavailableError> {
        (**self).measure(text, style)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for Arc<T> {
    fn measure(
        &self,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextMetrics, MeasurementUnavailableError> {
        (**self).measure(text, style)
    }
}

/// The measurement capability is absent or failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("text measurement unavailable: {reason}")]
pub struct MeasurementUnavailableError {
    /// Human-readable description of what went wrong.
    pub reason: String,
}

impl MeasurementUnavailableError {
    /// Creates an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Text styling inputs relevant to measurement.
///
/// This is intentionally minimal: it’s just enough to make label layout
/// consistent. More detailed typography belongs in a higher-level text system.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in the chart’s coordinate system (typically pixels).
    pub font_size: f64,
    /// The preferred font family.
    pub font_family: FontFamily,
    /// Font weight (e.g. `400` for normal, `700` for bold).
    pub font_weight: FontWeight,
    /// Font style (normal/italic/oblique).
    pub font_style: FontStyle,
}

impl TextStyle {
    /// Creates a default `TextStyle` with the given `font_size`.
    #[must_use]
    pub fn new(font_size: f64) -> Self {
        Self {
            font_size,
            font_family: FontFamily::SansSerif,
            font_weight: FontWeight::NORMAL,
            font_style: FontStyle::Normal,
        }
    }

    /// Sets the font family.
    #[must_use]
    pub fn with_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    /// Sets the font weight.
    #[must_use]
    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = weight;
        self
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new(12.0)
    }
}

/// Font family selection for measurement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// A generic serif family (CSS `serif`).
    Serif,
    /// A generic sans-serif family (CSS `sans-serif`).
    SansSerif,
    /// A generic monospace family (CSS `monospace`).
    Monospace,
    /// A named family (e.g. `"Inter"`, `"Helvetica Neue"`).
    Named(Arc<str>),
}

impl FontFamily {
    /// Returns the font family string for CSS-style font declarations.
    #[must_use]
    pub fn as_css_family(&self) -> &str {
        match self {
            Self::Serif => "serif",
            Self::SansSerif => "sans-serif",
            Self::Monospace => "monospace",
            Self::Named(name) => name,
        }
    }
}

/// CSS-style font weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Normal weight (`400`).
    pub const NORMAL: Self = Self(400);
    /// Bold weight (`700`).
    pub const BOLD: Self = Self(700);
}

/// CSS-style font styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Normal style.
    Normal,
    /// Italic style.
    Italic,
    /// Oblique style.
    Oblique,
}

/// Measured metrics for a single line of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// The advance width (the horizontal extent of the label box).
    pub advance_width: f64,
    /// Distance from baseline to the top of typical glyphs.
    pub ascent: f64,
    /// Distance from baseline to the bottom of typical glyphs.
    pub descent: f64,
    /// Additional line spacing beyond ascent+descent.
    pub leading: f64,
}

impl TextMetrics {
    /// Metrics of an empty string.
    pub const ZERO: Self = Self {
        advance_width: 0.0,
        ascent: 0.0,
        descent: 0.0,
        leading: 0.0,
    };

    /// Returns `ascent + descent + leading`.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.ascent + self.descent + self.leading
    }

    /// Returns `(width, height)` of the label box.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.advance_width, self.line_height())
    }
}

/// A tiny heuristic text measurer suitable for demos, tests and early layout.
///
/// It assumes an average glyph width of ~0.6em and a baseline at ~0.8em.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(
        &self,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextMetrics, MeasurementUnavailableError> {
        let advance_width = 0.6 * style.font_size * text.chars().count() as f64;
        let ascent = 0.8 * style.font_size;
        let descent = 0.2 * style.font_size;
        Ok(TextMetrics {
            advance_width,
            ascent,
            descent,
            leading: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn heuristic_box_scales_with_char_count_and_font_size() {
        let m = HeuristicTextMeasurer;
        let metrics = m.measure("abcd", &TextStyle::new(10.0)).unwrap();
        assert!((metrics.advance_width - 24.0).abs() < 1e-9, "0.6em per char");
        assert!((metrics.line_height() - 10.0).abs() < 1e-9, "one em tall");
    }

    #[test]
    fn heuristic_counts_chars_not_bytes() {
        let m = HeuristicTextMeasurer;
        let ascii = m.measure("ab", &TextStyle::new(10.0)).unwrap();
        let wide = m.measure("éü", &TextStyle::new(10.0)).unwrap();
        assert_eq!(ascii.advance_width, wide.advance_width);
    }

    #[test]
    fn style_builders_set_family_and_weight() {
        let style = TextStyle::new(14.0)
            .with_family(FontFamily::Named(Arc::from("Inter")))
            .with_weight(FontWeight::BOLD);
        assert_eq!(style.font_family.as_css_family(), "Inter");
        assert_eq!(style.font_weight, FontWeight(700));
        assert_eq!(style.font_size, 14.0);
        assert_eq!(TextStyle::default().font_family.as_css_family(), "sans-serif");
    }

    #[test]
    fn measurer_through_arc_and_reference() {
        let shared: Arc<dyn TextMeasurer> = Arc::new(HeuristicTextMeasurer);
        let style = TextStyle::default();
        let direct = HeuristicTextMeasurer.measure("12", &style).unwrap();
        assert_eq!(shared.measure("12", &style).unwrap(), direct);
        assert_eq!((&HeuristicTextMeasurer).measure("12", &style).unwrap(), direct);
    }
}
