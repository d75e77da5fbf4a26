use serde::{Deserialize, Serialize};

/// Who owns the viewport: the paged document view or the thumbnail grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Document,
    Thumbnails,
}

/// Page mode policy. `Automatic` is only ever resolved, never laid out directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    Single,
    Double,
    /// Single in portrait, double in landscape.
    #[default]
    Automatic,
}

impl PageMode {
    /// Resolves the policy for the given orientation.
    pub fn is_double(self, orientation: Orientation) -> bool {
        match self {
            Self::Single => false,
            Self::Double => true,
            Self::Automatic => orientation == Orientation::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Orientation implied by a viewport size. Square viewports count as portrait.
    pub fn from_size(width: f32, height: f32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceIdiom {
    Phone,
    #[default]
    Tablet,
}

/// Host status bar appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBarStyle {
    #[default]
    Default,
    BlackOpaque,
    BlackTranslucent,
}

/// How the HUD drives the host status bar. The pre-HUD state is restored
/// regardless of the setting chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBarStyleSetting {
    /// Keep the host style, but show/hide the status bar with the HUD.
    Inherit,
    /// Black opaque on tablets, black translucent on phones.
    #[default]
    SmartBlack,
    BlackOpaque,
    DefaultWhite,
    /// Never show the status bar.
    Disable,
}

impl StatusBarStyleSetting {
    /// Style applied while the HUD is visible, `None` when the host style is kept.
    pub fn override_style(self, idiom: DeviceIdiom) -> Option<StatusBarStyle> {
        match self {
            Self::Inherit | Self::Disable => None,
            Self::SmartBlack => Some(match idiom {
                DeviceIdiom::Tablet => StatusBarStyle::BlackOpaque,
                DeviceIdiom::Phone => StatusBarStyle::BlackTranslucent,
            }),
            Self::BlackOpaque => Some(StatusBarStyle::BlackOpaque),
            Self::DefaultWhite => Some(StatusBarStyle::Default),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: u32,
    pub height_pt: u32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self { width_pt: 612, height_pt: 792 }
    }
}

impl PageSize {
    pub fn aspect_ratio(&self) -> f32 {
        self.width_pt as f32 / self.height_pt as f32
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("page {index} has an empty size ({width_pt}x{height_pt} pt)")]
    EmptyPage { index: u32, width_pt: u32, height_pt: u32 },
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspectRatio(f32),
}

/// The document collaborator: an ordered sequence of opaque pages.
///
/// Implementations must be stable for the lifetime of a layout pass.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Width divided by height of the page at `index`.
    fn aspect_ratio(&self, index: u32) -> f32;

    /// Unscaled page size in points, when the document knows it.
    fn natural_size(&self, _index: u32) -> Option<(f32, f32)> {
        None
    }
}

/// A document whose pages all share one aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDocument {
    page_count: u32,
    aspect_ratio: f32,
}

impl UniformDocument {
    pub fn new(page_count: u32, aspect_ratio: f32) -> Result<Self, DocumentError> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(DocumentError::InvalidAspectRatio(aspect_ratio));
        }

        Ok(Self { page_count, aspect_ratio })
    }

    /// US Letter pages.
    pub fn letter(page_count: u32) -> Self {
        Self { page_count, aspect_ratio: PageSize::default().aspect_ratio() }
    }
}

impl PageSource for UniformDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn aspect_ratio(&self, _index: u32) -> f32 {
        self.aspect_ratio
    }
}

/// A document with explicit per-page sizes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizedDocument {
    pages: Vec<PageSize>,
}

impl SizedDocument {
    pub fn new(pages: Vec<PageSize>) -> Result<Self, DocumentError> {
        if let Some((index, page)) =
            pages.iter().enumerate().find(|(_, page)| page.width_pt == 0 || page.height_pt == 0)
        {
            return Err(DocumentError::EmptyPage {
                index: index as u32,
                width_pt: page.width_pt,
                height_pt: page.height_pt,
            });
        }

        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[PageSize] {
        &self.pages
    }
}

impl PageSource for SizedDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn aspect_ratio(&self, index: u32) -> f32 {
        self.pages.get(index as usize).map(PageSize::aspect_ratio).unwrap_or(1.0)
    }

    fn natural_size(&self, index: u32) -> Option<(f32, f32)> {
        self.pages.get(index as usize).map(|page| (page.width_pt as f32, page.height_pt as f32))
    }
}

/// User-facing viewer configuration. Set before the first layout for full effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub view_mode: ViewMode,
    pub page_mode: PageMode,
    pub page_scrolling: ScrollDirection,
    /// Pair page 0 with page 1 instead of showing it alone.
    pub double_page_mode_on_first_page: bool,
    /// Gap between spreads along the scroll axis, in points.
    pub page_padding: f32,
    /// Scale pages that fit the viewport up to the viewport size.
    pub zooming_small_documents_enabled: bool,
    pub status_bar_style_setting: StatusBarStyleSetting,
    /// Taps near the leading/trailing edge turn the page instead of toggling the HUD.
    pub scroll_on_tap_page_end_enabled: bool,
    /// Edge tap margin as a fraction of the viewport extent along the scroll axis.
    pub tap_page_end_margin: f32,
    pub scrobble_bar_enabled: bool,
    pub toolbar_enabled: bool,
    pub thumbnail_size_reduction_factor: f32,
    pub device_idiom: DeviceIdiom,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Document,
            page_mode: PageMode::Automatic,
            page_scrolling: ScrollDirection::Horizontal,
            double_page_mode_on_first_page: false,
            page_padding: 20.0,
            zooming_small_documents_enabled: true,
            status_bar_style_setting: StatusBarStyleSetting::SmartBlack,
            scroll_on_tap_page_end_enabled: true,
            tap_page_end_margin: 0.15,
            scrobble_bar_enabled: true,
            toolbar_enabled: true,
            thumbnail_size_reduction_factor: 0.588,
            device_idiom: DeviceIdiom::Tablet,
        }
    }
}
