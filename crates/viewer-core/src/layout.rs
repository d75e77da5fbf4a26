//! Spread layout engine
//!
//! Turns a page count and the viewer settings into an ordered sequence of
//! spreads. Every spread occupies one viewport extent along the scroll axis,
//! separated by the page padding; its pages are placed side by side at equal
//! height, scaled to fit and centered inside the spread frame.
//!
//! The computation is pure: identical inputs always produce identical spreads.

use std::ops::RangeInclusive;

use doc_model::{Orientation, PageMode, PageSource, ScrollDirection, ViewerSettings};
use serde::{Serialize, Serializer};

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{Geometry, Rect, Size};

/// Inputs of a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutParams {
    pub page_mode: PageMode,
    pub orientation: Orientation,
    pub double_page_on_first_page: bool,
    pub scroll_direction: ScrollDirection,
    pub viewport: Size,
    pub page_padding: f32,
    pub zoom_small_documents: bool,
}

impl LayoutParams {
    pub fn from_settings(settings: &ViewerSettings, geometry: Geometry) -> Self {
        Self {
            page_mode: settings.page_mode,
            orientation: geometry.orientation,
            double_page_on_first_page: settings.double_page_mode_on_first_page,
            scroll_direction: settings.page_scrolling,
            viewport: geometry.viewport,
            page_padding: if settings.page_padding.is_finite() { settings.page_padding.max(0.0) } else { 0.0 },
            zoom_small_documents: settings.zooming_small_documents_enabled,
        }
    }

    /// Page mode with `Automatic` resolved against the orientation.
    pub fn is_double(&self) -> bool {
        self.page_mode.is_double(self.orientation)
    }

    pub fn pages_per_spread(&self) -> usize {
        if self.is_double() {
            2
        } else {
            1
        }
    }

    /// Distance between the leading edges of two consecutive spreads.
    pub fn stride(&self) -> f32 {
        self.viewport.along(self.scroll_direction).max(0.0) + self.page_padding
    }
}

/// Pages shown by one spread, in left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadPages {
    Single(u32),
    Pair(u32, u32),
}

impl SpreadPages {
    pub fn first(&self) -> u32 {
        match *self {
            Self::Single(page) | Self::Pair(page, _) => page,
        }
    }

    pub fn last(&self) -> u32 {
        match *self {
            Self::Single(page) | Self::Pair(_, page) => page,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Pair(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, page: u32) -> bool {
        self.first() <= page && page <= self.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.first()..=self.last()
    }
}

impl Serialize for SpreadPages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// One on-screen layout unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub index: usize,
    pub pages: SpreadPages,
    /// Slot of this spread in content space (one viewport extent along the scroll axis).
    pub frame: Rect,
    /// Fitted page content, centered in `frame`.
    pub content_frame: Rect,
    /// One frame per page, in the order of `pages`.
    pub page_frames: Vec<Rect>,
}

/// Groups pages into spreads.
///
/// In double mode pages pair as (0,1),(2,3)… When `double_on_first_page` is
/// false page 0 stands alone and pairing restarts at (1,2). A trailing
/// remainder is always a solitary spread.
pub fn page_pairing(page_count: u32, double: bool, double_on_first_page: bool) -> Vec<SpreadPages> {
    if !double {
        return (0..page_count).map(SpreadPages::Single).collect();
    }

    let mut spreads = Vec::with_capacity(page_count as usize / 2 + 1);
    let mut page = 0;

    if !double_on_first_page && page_count > 0 {
        spreads.push(SpreadPages::Single(0));
        page = 1;
    }

    while page < page_count {
        if page + 1 < page_count {
            spreads.push(SpreadPages::Pair(page, page + 1));
            page += 2;
        } else {
            spreads.push(SpreadPages::Single(page));
            page += 1;
        }
    }

    spreads
}

/// Computes spreads from per-page aspect ratios (width / height).
///
/// # Errors
///
/// `InvalidPageCount` when `page_count` is zero, `InvalidViewport` when the
/// viewport has a non-positive dimension.
pub fn compute_spreads(
    page_count: u32,
    params: &LayoutParams,
    aspect_ratio_of: impl Fn(u32) -> f32,
) -> ViewerResult<Vec<Spread>> {
    build_spreads(page_count, params, &aspect_ratio_of, &|_| None)
}

/// Computes spreads for a document, using its natural page sizes when known.
pub fn compute_spreads_for(source: &dyn PageSource, params: &LayoutParams) -> ViewerResult<Vec<Spread>> {
    build_spreads(
        source.page_count(),
        params,
        &|page| source.aspect_ratio(page),
        &|page| source.natural_size(page),
    )
}

fn build_spreads(
    page_count: u32,
    params: &LayoutParams,
    aspect_ratio_of: &dyn Fn(u32) -> f32,
    natural_size_of: &dyn Fn(u32) -> Option<(f32, f32)>,
) -> ViewerResult<Vec<Spread>> {
    if page_count == 0 {
        return Err(ViewerError::InvalidPageCount);
    }

    if !params.viewport.is_positive() {
        return Err(ViewerError::InvalidViewport {
            width: params.viewport.width,
            height: params.viewport.height,
        });
    }

    let aspect = |page: u32| {
        let ratio = aspect_ratio_of(page);
        if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        }
    };

    let stride = params.stride();
    let spreads = page_pairing(page_count, params.is_double(), params.double_page_on_first_page)
        .into_iter()
        .enumerate()
        .map(|(index, pages)| {
            let origin = index as f32 * stride;
            let frame = match params.scroll_direction {
                ScrollDirection::Horizontal => {
                    Rect::new(origin, 0.0, params.viewport.width, params.viewport.height)
                }
                ScrollDirection::Vertical => {
                    Rect::new(0.0, origin, params.viewport.width, params.viewport.height)
                }
            };

            let ratios: Vec<f32> = pages.iter().map(aspect).collect();
            let content = content_size(&pages, &ratios, params, natural_size_of);
            let content_frame = frame.centered(content);

            let mut x = content_frame.x;
            let page_frames = ratios
                .iter()
                .map(|ratio| {
                    let width = ratio * content_frame.height;
                    let page_frame = Rect::new(x, content_frame.y, width, content_frame.height);
                    x += width;
                    page_frame
                })
                .collect();

            Spread { index, pages, frame, content_frame, page_frames }
        })
        .collect();

    Ok(spreads)
}

fn content_size(
    pages: &SpreadPages,
    ratios: &[f32],
    params: &LayoutParams,
    natural_size_of: &dyn Fn(u32) -> Option<(f32, f32)>,
) -> Size {
    let combined_ratio: f32 = ratios.iter().sum();

    if !params.zoom_small_documents {
        let natural: Option<Vec<(f32, f32)>> = pages.iter().map(natural_size_of).collect();
        if let Some(sizes) = natural {
            let height = sizes.iter().map(|(_, height)| *height).fold(0.0, f32::max);
            let natural = Size::new(combined_ratio * height, height);
            if natural.is_positive() && natural.fits_within(params.viewport) {
                return natural;
            }
        }
    }

    let viewport = params.viewport;
    if viewport.width / viewport.height > combined_ratio {
        Size::new(combined_ratio * viewport.height, viewport.height)
    } else {
        Size::new(viewport.width, viewport.width / combined_ratio)
    }
}

/// A computed layout plus the queries the viewport needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    params: LayoutParams,
    spreads: Vec<Spread>,
    page_count: u32,
}

impl Layout {
    /// Lays out `source`. Errors fall back to a single full-viewport spread
    /// showing page 0, or to an empty layout when there are no pages.
    pub fn for_document(source: &dyn PageSource, params: LayoutParams) -> Self {
        match compute_spreads_for(source, &params) {
            Ok(spreads) => Self { params, spreads, page_count: source.page_count() },
            Err(ViewerError::InvalidPageCount) => Self::empty(params),
            Err(err) => {
                tracing::warn!(%err, "layout failed, falling back to a single spread");
                Self::fallback(params, source.page_count())
            }
        }
    }

    /// Layout with no spreads (no document, or no pages).
    pub fn empty(params: LayoutParams) -> Self {
        Self { params, spreads: Vec::new(), page_count: 0 }
    }

    fn fallback(params: LayoutParams, page_count: u32) -> Self {
        let frame = Rect::new(0.0, 0.0, params.viewport.width.max(0.0), params.viewport.height.max(0.0));
        let spread = Spread {
            index: 0,
            pages: SpreadPages::Single(0),
            frame,
            content_frame: frame,
            page_frames: vec![frame],
        };

        Self { params, spreads: vec![spread], page_count }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn spreads(&self) -> &[Spread] {
        &self.spreads
    }

    pub fn spread(&self, index: usize) -> Option<&Spread> {
        self.spreads.get(index)
    }

    pub fn len(&self) -> usize {
        self.spreads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spreads.is_empty()
    }

    /// Number of pages in the document this layout was built for.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// True when the layout was computed in double-page mode.
    pub fn is_double(&self) -> bool {
        self.params.is_double()
    }

    /// Spread owning `page`. Pages the layout does not cover map to `None`.
    pub fn spread_index_for_page(&self, page: u32) -> Option<usize> {
        let index = self.spreads.partition_point(|spread| spread.pages.last() < page);
        self.spreads.get(index).filter(|spread| spread.pages.contains(page)).map(|spread| spread.index)
    }

    /// Scroll offset that brings `spread` into view.
    pub fn offset_for_spread(&self, spread: usize) -> f32 {
        self.spreads
            .get(spread)
            .map(|spread| spread.frame.start(self.params.scroll_direction))
            .unwrap_or(0.0)
    }

    /// Total content length along the scroll axis.
    pub fn content_extent(&self) -> f32 {
        self.spreads.last().map(|spread| spread.frame.end(self.params.scroll_direction)).unwrap_or(0.0)
    }

    /// Largest valid scroll offset.
    pub fn max_offset(&self) -> f32 {
        self.offset_for_spread(self.spreads.len().saturating_sub(1))
    }

    /// Spreads intersecting the viewport window starting at `offset`.
    pub fn visible_range(&self, offset: f32) -> Option<RangeInclusive<usize>> {
        if self.spreads.is_empty() {
            return None;
        }

        let direction = self.params.scroll_direction;
        let extent = self.params.viewport.along(direction).max(0.0);
        let offset = offset.clamp(0.0, self.max_offset());
        let window_end = offset + extent;

        let last_index = self.spreads.len() - 1;
        let first = self.spreads.partition_point(|spread| spread.frame.end(direction) <= offset).min(last_index);
        let last = self
            .spreads
            .partition_point(|spread| spread.frame.start(direction) < window_end)
            .saturating_sub(1)
            .clamp(first, last_index);

        Some(first..=last)
    }

    /// Spread whose frame covers most of the viewport at `offset`.
    pub fn spread_at_offset(&self, offset: f32) -> Option<usize> {
        let range = self.visible_range(offset)?;
        let direction = self.params.scroll_direction;
        let offset = offset.clamp(0.0, self.max_offset());
        let window_end = offset + self.params.viewport.along(direction).max(0.0);

        let mut best = *range.start();
        let mut best_overlap = f32::MIN;
        for index in range {
            let overlap = self.spreads[index].frame.overlap(direction, offset, window_end);
            if overlap > best_overlap {
                best = index;
                best_overlap = overlap;
            }
        }

        Some(best)
    }

    /// Upper bound on spreads that can intersect the viewport at once.
    pub fn max_visible_spreads(&self) -> usize {
        if self.spreads.is_empty() {
            return 0;
        }

        let extent = self.params.viewport.along(self.params.scroll_direction);
        let stride = self.params.stride();
        let spans = if stride > 0.0 && extent.is_finite() { (extent / stride).ceil() as usize } else { 1 };

        (spans + 1).min(self.spreads.len())
    }
}
