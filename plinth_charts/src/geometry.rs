// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacked entries to pixel rectangles.

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use peniko::Color;
use plinth_stack::{CategoryKey, StackEntry, StackedEntries};

use crate::error::InvalidScaleError;
use crate::scale::{CategoryScale, ValueScale};

/// Which axis carries the stacked values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Categories along x, values along y.
    #[default]
    Vertical,
    /// Categories along y, values along x.
    Horizontal,
}

/// The category and value scales of one plot.
#[derive(Clone, Copy, Debug)]
pub struct Scales<C, V> {
    /// Scale for the category axis.
    pub category: C,
    /// Scale for the value axis.
    pub value: V,
}

impl<C, V> Scales<C, V> {
    /// Bundles a category scale and a value scale.
    pub fn new(category: C, value: V) -> Self {
        Self { category, value }
    }
}

/// The plot's drawable pixel area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleBounds {
    /// The area, with `x0 <= x1` and `y0 <= y1`.
    pub rect: Rect,
}

impl VisibleBounds {
    /// Builds bounds from an x range and a y range, in either direction.
    pub fn from_ranges(x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            rect: Rect::new(x.0.min(x.1), y.0.min(y.1), x.0.max(x.1), y.0.max(y.1)),
        }
    }

    /// Builds bounds from the ranges of both scales.
    pub fn from_scales<K>(
        category: &impl CategoryScale<K>,
        value: &impl ValueScale,
        orientation: Orientation,
    ) -> Self {
        match orientation {
            Orientation::Vertical => Self::from_ranges(category.range(), value.range()),
            Orientation::Horizontal => Self::from_ranges(value.range(), category.range()),
        }
    }

    /// Returns `true` if `rect` lies entirely inside, edges included.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        rect.x0 >= self.rect.x0
            && rect.x1 <= self.rect.x1
            && rect.y0 >= self.rect.y0
            && rect.y1 <= self.rect.y1
    }
}

/// One stacked segment in pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkRect<K> {
    /// The segment rectangle.
    pub rect: Rect,
    /// Fill color.
    pub fill: Color,
    /// Category of the source datum.
    pub category: K,
    /// Index of the source dataset.
    pub dataset_index: usize,
    /// Index of the source datum within its dataset.
    pub datum_index: usize,
}

impl<K> MarkRect<K> {
    /// The paint instruction for this mark.
    pub fn paint(&self) -> RectPaint {
        RectPaint {
            rect: self.rect,
            fill: self.fill,
            dataset_index: self.dataset_index,
            datum_index: self.datum_index,
        }
    }
}

/// A rectangle handed to a [`Painter`](crate::Painter).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectPaint {
    /// The rectangle in pixel space.
    pub rect: Rect,
    /// Fill color.
    pub fill: Color,
    /// Index of the source dataset.
    pub dataset_index: usize,
    /// Index of the source datum within its dataset.
    pub datum_index: usize,
}

/// All marks of one render, grouped per dataset in dataset order.
#[derive(Clone, Debug)]
pub struct MarkLayer<K> {
    datasets: Vec<Vec<MarkRect<K>>>,
    orientation: Orientation,
    bounds: VisibleBounds,
}

impl<K> MarkLayer<K> {
    /// Creates a layer from already resolved marks.
    pub fn new(
        datasets: Vec<Vec<MarkRect<K>>>,
        orientation: Orientation,
        bounds: VisibleBounds,
    ) -> Self {
        Self {
            datasets,
            orientation,
            bounds,
        }
    }

    /// Marks grouped per dataset.
    pub fn datasets(&self) -> &[Vec<MarkRect<K>>] {
        &self.datasets
    }

    /// Marks in scan order: dataset order, then datum order.
    pub fn iter(&self) -> impl Iterator<Item = &MarkRect<K>> + '_ {
        self.datasets.iter().flatten()
    }

    /// Number of marks.
    pub fn len(&self) -> usize {
        self.datasets.iter().map(Vec::len).sum()
    }

    /// Returns `true` if the layer has no marks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The orientation the marks were resolved with.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The drawable area the marks were resolved against.
    pub fn bounds(&self) -> VisibleBounds {
        self.bounds
    }

    /// Paint instructions for every mark, in scan order.
    pub fn paints(&self) -> Vec<RectPaint> {
        self.iter().map(MarkRect::paint).collect()
    }

    /// Returns the mark nearest to `point`.
    ///
    /// Distance along the category axis is compared first, then distance along the
    /// value axis; a point inside a mark's span on an axis is at distance 0 on it. The
    /// earliest mark in scan order wins ties.
    pub fn nearest(&self, point: Point) -> Option<&MarkRect<K>> {
        let mut best: Option<(&MarkRect<K>, (f64, f64))> = None;
        for mark in self.iter() {
            let dx = axis_distance(point.x, mark.rect.x0, mark.rect.x1);
            let dy = axis_distance(point.y, mark.rect.y0, mark.rect.y1);
            let key = match self.orientation {
                Orientation::Vertical => (dx, dy),
                Orientation::Horizontal => (dy, dx),
            };
            if best.is_none_or(|(_, b)| key < b) {
                best = Some((mark, key));
            }
        }
        best.map(|(mark, _)| mark)
    }
}

fn axis_distance(p: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = (a.min(b), a.max(b));
    if p < lo {
        lo - p
    } else if p > hi {
        p - hi
    } else {
        0.0
    }
}

/// Inputs to [`resolve_rectangles`] other than the data and scales.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryOptions {
    /// Bar thickness along the category axis, overriding the scale's band metrics.
    pub bar_width: Option<f64>,
    /// Per-dataset fills, cycled by dataset index.
    pub fills: Vec<Color>,
    /// Fill used when `fills` is empty.
    pub default_fill: Color,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            bar_width: None,
            fills: Vec::new(),
            default_fill: Color::from_rgb8(0x4c, 0x78, 0xa8),
        }
    }
}

impl GeometryOptions {
    fn fill(&self, dataset_index: usize) -> Color {
        if self.fills.is_empty() {
            self.default_fill
        } else {
            self.fills[dataset_index % self.fills.len()]
        }
    }
}

/// How bars sit on the category axis.
enum CategoryPlacement {
    /// `position` is a band start; the bar is centered in a band of `band` pixels.
    Banded { band: f64, thickness: f64 },
    /// `position` is the bar center.
    Centered { thickness: f64 },
}

impl CategoryPlacement {
    fn span(&self, position: f64) -> (f64, f64) {
        match *self {
            Self::Banded { band, thickness } => {
                let start = position + (band - thickness) / 2.0;
                (start, start + thickness)
            }
            Self::Centered { thickness } => {
                let start = position - thickness / 2.0;
                (start, start + thickness)
            }
        }
    }
}

fn unmapped<K: CategoryKey>(category: &K) -> InvalidScaleError {
    InvalidScaleError::UnmappedCategory(format!("{category:?}"))
}

/// Per-unit bar thickness on a continuous category axis.
///
/// The scaled distance between the smallest and largest distinct keys, divided by
/// their numeric span. With a single distinct key the width of one unit at that key
/// is used instead.
fn per_unit_width<'a, K: CategoryKey + 'a>(
    entries: impl Iterator<Item = &'a StackEntry<K>>,
    scale: &impl CategoryScale<K>,
) -> Result<f64, InvalidScaleError> {
    let mut lo: Option<(f64, &K)> = None;
    let mut hi: Option<(f64, &K)> = None;
    for e in entries {
        let v = e
            .category
            .numeric_value()
            .filter(|v| v.is_finite())
            .ok_or_else(|| unmapped(&e.category))?;
        if lo.is_none_or(|(l, _)| v < l) {
            lo = Some((v, &e.category));
        }
        if hi.is_none_or(|(h, _)| v > h) {
            hi = Some((v, &e.category));
        }
    }
    let (Some((lo, lo_key)), Some((hi, hi_key))) = (lo, hi) else {
        return Err(InvalidScaleError::NoCategorySpan);
    };
    let span = hi - lo;
    if span == 0.0 {
        let at = scale.map_position(lo);
        let next = scale.map_position(lo + 1.0);
        return match (at, next) {
            (Some(at), Some(next)) => Ok((next - at).abs()),
            _ => Err(unmapped(lo_key)),
        };
    }
    let scaled_lo = scale.map(lo_key).ok_or_else(|| unmapped(lo_key))?;
    let scaled_hi = scale.map(hi_key).ok_or_else(|| unmapped(hi_key))?;
    Ok((scaled_hi - scaled_lo).abs() / span)
}

/// Maps every stacked entry to a [`MarkRect`].
///
/// Along the value axis a mark spans `scale(base)..scale(extent)`. Along the category
/// axis it takes the band of its category (centered in the band when
/// [`GeometryOptions::bar_width`] is set), or on a continuous category axis it is
/// centered on its category with a uniform per-unit width.
///
/// Fails if the category axis cannot place a category, or if a continuous axis has no
/// span to derive a width from and no explicit width is set.
pub fn resolve_rectangles<K, C, V>(
    entries: &StackedEntries<K>,
    scales: &Scales<C, V>,
    orientation: Orientation,
    options: &GeometryOptions,
) -> Result<MarkLayer<K>, InvalidScaleError>
where
    K: CategoryKey,
    C: CategoryScale<K>,
    V: ValueScale,
{
    let placement = match (scales.category.band_width(), options.bar_width) {
        (Some(band), width) => CategoryPlacement::Banded {
            band,
            thickness: width.unwrap_or(band),
        },
        (None, Some(thickness)) => CategoryPlacement::Centered { thickness },
        (None, None) => CategoryPlacement::Centered {
            thickness: per_unit_width(entries.iter(), &scales.category)?,
        },
    };

    let mut datasets = Vec::with_capacity(entries.datasets().len());
    for dataset in entries.datasets() {
        let mut marks = Vec::with_capacity(dataset.len());
        for e in dataset {
            let position = scales
                .category
                .map(&e.category)
                .ok_or_else(|| unmapped(&e.category))?;
            let (c0, c1) = placement.span(position);
            let a = scales.value.map(e.base);
            let b = scales.value.map(e.extent);
            let (v0, v1) = (a.min(b), a.max(b));
            let rect = match orientation {
                Orientation::Vertical => Rect::new(c0, v0, c1, v1),
                Orientation::Horizontal => Rect::new(v0, c0, v1, c1),
            };
            marks.push(MarkRect {
                rect,
                fill: options.fill(e.dataset_index),
                category: e.category.clone(),
                dataset_index: e.dataset_index,
                datum_index: e.datum_index,
            });
        }
        datasets.push(marks);
    }

    let bounds = VisibleBounds::from_scales::<K>(&scales.category, &scales.value, orientation);
    Ok(MarkLayer::new(datasets, orientation, bounds))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use plinth_stack::{Datum, StackingOrder, compute_stacked_entries};

    use super::*;
    use crate::scale::{ScaleCategory, ScaleLinear};

    type Row = (&'static str, f64);

    fn stacked(rows: &[Vec<Row>]) -> StackedEntries<&'static str> {
        compute_stacked_entries(rows, |&(c, v): &Row, _| Datum::new(c, v), StackingOrder::BottomUp)
    }

    fn scales() -> Scales<ScaleCategory<&'static str>, ScaleLinear> {
        Scales::new(
            ScaleCategory::new(["A", "B"], (0.0, 200.0)).with_padding(0.0, 0.0),
            ScaleLinear::new((0.0, 3.0), (300.0, 0.0)),
        )
    }

    #[test]
    fn vertical_marks_span_base_to_extent() {
        let data = stacked(&[vec![("A", 1.0), ("B", 2.0)], vec![("A", 2.0), ("B", 1.0)]]);
        let layer = resolve_rectangles(
            &data,
            &scales(),
            Orientation::Vertical,
            &GeometryOptions::default(),
        )
        .unwrap();

        let a1 = &layer.datasets()[1][0];
        assert_eq!(a1.rect, Rect::new(0.0, 0.0, 100.0, 200.0));
        let b0 = &layer.datasets()[0][1];
        assert_eq!(b0.rect, Rect::new(100.0, 100.0, 200.0, 300.0));
        assert_eq!(layer.bounds().rect, Rect::new(0.0, 0.0, 200.0, 300.0));
    }

    #[test]
    fn horizontal_marks_swap_axes() {
        let data = stacked(&[vec![("A", 1.0)], vec![("A", 2.0)]]);
        let s = Scales::new(
            ScaleCategory::new(["A"], (0.0, 50.0)).with_padding(0.0, 0.0),
            ScaleLinear::new((0.0, 3.0), (0.0, 300.0)),
        );
        let layer =
            resolve_rectangles(&data, &s, Orientation::Horizontal, &GeometryOptions::default())
                .unwrap();
        assert_eq!(layer.datasets()[0][0].rect, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(layer.datasets()[1][0].rect, Rect::new(100.0, 0.0, 300.0, 50.0));
    }

    #[test]
    fn explicit_width_is_centered_in_the_band() {
        let data = stacked(&[vec![("A", 1.0)]]);
        let options = GeometryOptions {
            bar_width: Some(20.0),
            ..GeometryOptions::default()
        };
        let layer = resolve_rectangles(&data, &scales(), Orientation::Vertical, &options).unwrap();
        let r = layer.datasets()[0][0].rect;
        assert_eq!((r.x0, r.x1), (40.0, 60.0));
    }

    #[test]
    fn fills_cycle_by_dataset() {
        let red = Color::from_rgb8(255, 0, 0);
        let blue = Color::from_rgb8(0, 0, 255);
        let data = stacked(&[vec![("A", 1.0)], vec![("A", 1.0)], vec![("A", 0.5)]]);
        let options = GeometryOptions {
            fills: vec![red, blue],
            ..GeometryOptions::default()
        };
        let layer = resolve_rectangles(&data, &scales(), Orientation::Vertical, &options).unwrap();
        let fills: Vec<_> = layer.iter().map(|m| m.fill).collect();
        assert_eq!(fills, vec![red, blue, red]);
    }

    #[test]
    fn unknown_category_is_an_error() {
        let data = stacked(&[vec![("Z", 1.0)]]);
        let err = resolve_rectangles(
            &data,
            &scales(),
            Orientation::Vertical,
            &GeometryOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InvalidScaleError::UnmappedCategory(_)), "{err:?}");
    }

    fn days(rows: &[Vec<(i64, f64)>]) -> StackedEntries<i64> {
        compute_stacked_entries(
            rows,
            |&(d, v): &(i64, f64), _| Datum::new(d, v),
            StackingOrder::BottomUp,
        )
    }

    #[test]
    fn continuous_axis_derives_a_per_unit_width() {
        let data = days(&[vec![(10, 1.0), (12, 2.0)], vec![(10, 2.0), (12, 1.0)]]);
        let s = Scales::new(
            ScaleLinear::new((9.0, 13.0), (0.0, 400.0)),
            ScaleLinear::new((0.0, 3.0), (300.0, 0.0)),
        );
        let layer =
            resolve_rectangles(&data, &s, Orientation::Vertical, &GeometryOptions::default())
                .unwrap();
        let r = layer.datasets()[0][0].rect;
        // Keys 10..12 span 200px over 2 units: 100px per unit, centered on 100.
        assert_eq!((r.x0, r.x1), (50.0, 150.0));
    }

    #[test]
    fn continuous_axis_with_one_key_uses_a_unit_width() {
        let data = days(&[vec![(10, 1.0)], vec![(10, 2.0)]]);
        let s = Scales::new(
            ScaleLinear::new((9.0, 11.0), (0.0, 400.0)),
            ScaleLinear::new((0.0, 3.0), (300.0, 0.0)),
        );
        let layer =
            resolve_rectangles(&data, &s, Orientation::Vertical, &GeometryOptions::default())
                .unwrap();
        // One day is 200px wide, centered on day 10 at 200.
        assert_eq!(layer.datasets()[0][0].rect, Rect::new(100.0, 200.0, 300.0, 300.0));
        assert_eq!(layer.datasets()[1][0].rect, Rect::new(100.0, 0.0, 300.0, 200.0));

        let options = GeometryOptions {
            bar_width: Some(30.0),
            ..GeometryOptions::default()
        };
        let layer = resolve_rectangles(&data, &s, Orientation::Vertical, &options).unwrap();
        let r = layer.datasets()[0][0].rect;
        assert_eq!((r.x0, r.x1), (185.0, 215.0));
    }

    #[test]
    fn continuous_axis_without_keys_has_no_span() {
        let data = days(&[]);
        let s = Scales::new(
            ScaleLinear::new((9.0, 11.0), (0.0, 400.0)),
            ScaleLinear::new((0.0, 3.0), (300.0, 0.0)),
        );
        let err = resolve_rectangles(&data, &s, Orientation::Vertical, &GeometryOptions::default())
            .unwrap_err();
        assert_eq!(err, InvalidScaleError::NoCategorySpan);
    }

    #[test]
    fn nearest_prefers_the_mark_containing_the_value() {
        let data = stacked(&[vec![("A", 1.0)], vec![("A", 2.0)]]);
        let layer = resolve_rectangles(
            &data,
            &scales(),
            Orientation::Vertical,
            &GeometryOptions::default(),
        )
        .unwrap();
        // Dataset 0 spans y 200..300, dataset 1 spans 0..200.
        let below = layer.nearest(Point::new(0.0, 201.0)).unwrap();
        assert_eq!(below.dataset_index, 0);
        let above = layer.nearest(Point::new(0.0, 199.0)).unwrap();
        assert_eq!(above.dataset_index, 1);
        let far = layer.nearest(Point::new(500.0, 250.0)).unwrap();
        assert_eq!(far.dataset_index, 0);
    }

    #[test]
    fn bounds_are_ordered_for_inverted_ranges() {
        let b = VisibleBounds::from_ranges((100.0, 0.0), (300.0, 0.0));
        assert_eq!(b.rect, Rect::new(0.0, 0.0, 100.0, 300.0));
        assert!(b.contains_rect(&Rect::new(0.0, 0.0, 100.0, 300.0)), "edges count as inside");
        assert!(!b.contains_rect(&Rect::new(-0.1, 0.0, 10.0, 10.0)), "left overflow");
    }
}
