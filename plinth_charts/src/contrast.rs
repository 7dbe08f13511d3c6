// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label tone selection by color contrast.

use peniko::Color;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// How strongly contrast against black must beat contrast against white before a
/// label switches to the dark tone.
pub const DARK_LABEL_CONTRAST_RATIO: f64 = 1.6;

/// A color-contrast capability.
pub trait ColorContrast {
    /// Returns the contrast between two colors (`>= 0`, order-independent).
    fn contrast(&self, a: Color, b: Color) -> f64;
}

impl<T: ColorContrast + ?Sized> ColorContrast for &T {
    fn contrast(&self, a: Color, b: Color) -> f64 {
        (**self).contrast(a, b)
    }
}

/// WCAG 2 contrast ratio over sRGB relative luminance. Alpha is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WcagContrast;

impl WcagContrast {
    /// Relative luminance of `color` in `[0, 1]`.
    pub fn relative_luminance(color: Color) -> f64 {
        let rgba = color.to_rgba8();
        let channel = |c: u8| {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * channel(rgba.r) + 0.7152 * channel(rgba.g) + 0.0722 * channel(rgba.b)
    }
}

impl ColorContrast for WcagContrast {
    fn contrast(&self, a: Color, b: Color) -> f64 {
        let la = Self::relative_luminance(a);
        let lb = Self::relative_luminance(b);
        (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
    }
}

/// Text tone for a label drawn over a fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelTone {
    /// Dark text, for light fills.
    Dark,
    /// Light text, for dark and mid-tone fills.
    Light,
}

impl LabelTone {
    /// Picks the tone for text over `fill`.
    ///
    /// Dark wins only when `contrast(white, fill) * 1.6 < contrast(black, fill)`; the
    /// bias favors light text on mid-tones.
    pub fn for_fill(contrast: &dyn ColorContrast, fill: Color) -> Self {
        let against_white = contrast.contrast(Color::WHITE, fill);
        let against_black = contrast.contrast(Color::BLACK, fill);
        if against_white * DARK_LABEL_CONTRAST_RATIO < against_black {
            Self::Dark
        } else {
            Self::Light
        }
    }
}
