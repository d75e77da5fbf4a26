//! Viewport controller
//!
//! Owns the current layout, the scroll position and the page slot pool, and
//! routes host events (scroll updates, taps, geometry changes, animation
//! completions) to the rotation and HUD state machines.
//!
//! Everything runs on the host UI thread. Animations are driven by the host:
//! an animated navigation returns an [`AnimationId`], the host reports
//! intermediate offsets through [`ViewerController::did_scroll`] and calls
//! [`ViewerController::scroll_animation_did_finish`] when it is done. A newer
//! navigation, reload or rotation supersedes the animation and its completion
//! becomes a no-op.

use doc_model::{
    DeviceIdiom, PageMode, PageSource, ScrollDirection, StatusBarStyleSetting, ViewMode, ViewerSettings,
};
use folio_cache::{PageSlot, PageSlotPool, PoolCapacity, SlotId};
use serde::Serialize;

use crate::delegate::ViewerDelegate;
use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{self, Geometry, Rect, Size};
use crate::host::{NoChrome, SystemChrome};
use crate::hud::Hud;
use crate::layout::{Layout, LayoutParams, Spread};
use crate::rotation::{RotationCoordinator, RotationPhase};

/// Identifies a host-driven scroll animation.
pub type AnimationId = u64;

/// Scroll position and the page the viewer reports.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ViewportState {
    pub scroll_offset: f32,
    pub current_spread: usize,
    /// Logical page. Stays on the requested page while it belongs to the current spread.
    pub page: u32,
}

/// An animated navigation waiting for its completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollAnimation {
    pub id: AnimationId,
    pub target_offset: f32,
    pub spread: usize,
    pub page: u32,
    #[serde(skip)]
    notify_page_change: bool,
}

/// What a tap resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TapAction {
    PreviousPage,
    NextPage,
    ToggleHud { visible: bool },
}

/// Serializable summary of the controller state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub page: u32,
    pub real_page: u32,
    pub current_spread: usize,
    pub spread_count: usize,
    pub scroll_offset: f32,
    pub content_extent: f32,
    pub dual_page_mode: bool,
    pub visible_pages: Vec<u32>,
    pub bound_pages: Vec<u32>,
    pub live_slots: usize,
    pub hud_visible: bool,
    pub scrobble_bar_visible: bool,
    pub toolbar_visible: bool,
    pub view_mode: ViewMode,
    pub rotation: RotationPhase,
}

/// Paged document viewer core.
///
/// `V` is the per-slot view payload created by the slot factory; headless
/// users keep the default `()`.
pub struct ViewerController<V = ()> {
    settings: ViewerSettings,
    document: Option<Box<dyn PageSource>>,
    geometry: Geometry,
    layout: Layout,
    state: ViewportState,
    pool: PageSlotPool<V>,
    rotation: RotationCoordinator,
    hud: Hud,
    chrome: Box<dyn SystemChrome>,
    delegate: Option<Box<dyn ViewerDelegate>>,
    animation: Option<ScrollAnimation>,
    /// Pages bound when the animation started plus its target pages.
    held_pages: Vec<u32>,
    next_animation_id: AnimationId,
    suppress_hud_hide: bool,
}

impl ViewerController<()> {
    /// Creates a viewer without a document.
    pub fn new(settings: ViewerSettings, geometry: Geometry) -> Self {
        Self::with_slot_factory(settings, geometry, |_| ())
    }

    /// Creates a viewer showing `document` from page 0.
    pub fn with_document(document: impl PageSource + 'static, settings: ViewerSettings, geometry: Geometry) -> Self {
        let mut viewer = Self::new(settings, geometry);
        viewer.set_document(document);
        viewer
    }
}

impl<V> ViewerController<V> {
    /// Creates a viewer whose slots carry a payload built by `factory`.
    ///
    /// # Arguments
    ///
    /// * `settings` - Viewer configuration, applied to the first layout
    /// * `geometry` - Initial viewport size and orientation
    /// * `factory` - Builds the payload for a newly allocated slot
    pub fn with_slot_factory(
        settings: ViewerSettings,
        geometry: Geometry,
        factory: impl FnMut(SlotId) -> V + 'static,
    ) -> Self {
        let params = LayoutParams::from_settings(&settings, geometry);
        let hud = Hud::new(&settings);

        Self {
            settings,
            document: None,
            geometry,
            layout: Layout::empty(params),
            state: ViewportState::default(),
            pool: PageSlotPool::new(PoolCapacity::default(), factory),
            rotation: RotationCoordinator::new(),
            hud,
            chrome: Box::new(NoChrome),
            delegate: None,
            animation: None,
            held_pages: Vec::new(),
            next_animation_id: 1,
            suppress_hud_hide: false,
        }
    }

    pub fn set_delegate(&mut self, delegate: impl ViewerDelegate + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// Replaces the host chrome. Set it before the HUD is first shown.
    pub fn set_chrome(&mut self, chrome: impl SystemChrome + 'static) {
        self.chrome = Box::new(chrome);
    }

    // Document

    pub fn document(&self) -> Option<&dyn PageSource> {
        self.document.as_deref()
    }

    /// Swaps the document. Drops every slot and restarts at page 0.
    pub fn set_document(&mut self, document: impl PageSource + 'static) {
        self.document = Some(Box::new(document));
        self.rotation.cancel();
        self.pool.reset();
        self.reload_to(0);
    }

    /// Removes the document, leaving a blank viewport.
    pub fn clear_document(&mut self) {
        self.document = None;
        self.rotation.cancel();
        self.animation = None;
        self.held_pages.clear();
        self.pool.reset();
        self.relayout();
        self.state = ViewportState::default();
    }

    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map(|document| document.page_count()).unwrap_or(0)
    }

    // Reading state

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn spreads(&self) -> &[Spread] {
        self.layout.spreads()
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Logical page currently displayed.
    pub fn page(&self) -> u32 {
        self.state.page
    }

    /// Trailing page of the current spread in dual-page mode, `page()` otherwise.
    pub fn real_page(&self) -> u32 {
        if !self.is_dual_page_mode() {
            return self.state.page;
        }

        self.layout
            .spread(self.state.current_spread)
            .map(|spread| spread.pages.last())
            .unwrap_or(self.state.page)
    }

    pub fn current_spread(&self) -> usize {
        self.state.current_spread
    }

    pub fn scroll_offset(&self) -> f32 {
        self.state.scroll_offset
    }

    pub fn content_extent(&self) -> f32 {
        self.layout.content_extent()
    }

    /// Page mode resolved against the current orientation.
    pub fn is_dual_page_mode(&self) -> bool {
        self.layout.is_double()
    }

    /// True when `page` is shown on the right half of a two-page spread.
    pub fn is_right_page_in_double_page_mode(&self, page: u32) -> bool {
        if !self.is_dual_page_mode() {
            return false;
        }

        self.layout
            .spread_index_for_page(page)
            .and_then(|index| self.layout.spread(index))
            .map(|spread| spread.pages.len() == 2 && spread.pages.last() == page)
            .unwrap_or(false)
    }

    /// Spreads intersecting the viewport.
    pub fn visible_spreads(&self) -> &[Spread] {
        match self.layout.visible_range(self.state.scroll_offset) {
            Some(range) => &self.layout.spreads()[range],
            None => &[],
        }
    }

    pub fn visible_pages(&self) -> Vec<u32> {
        self.visible_spreads().iter().flat_map(|spread| spread.pages.iter()).collect()
    }

    /// Frame of `page` in content coordinates.
    ///
    /// # Errors
    ///
    /// `DocumentUnavailable` without a document, `IndexOutOfRange` when the
    /// page is not part of the layout.
    pub fn frame_for_page(&self, page: u32) -> ViewerResult<Rect> {
        let document = self.document.as_ref().ok_or(ViewerError::DocumentUnavailable)?;
        let out_of_range = ViewerError::IndexOutOfRange { index: page, page_count: document.page_count() };

        let spread = self
            .layout
            .spread_index_for_page(page)
            .and_then(|index| self.layout.spread(index))
            .ok_or_else(|| out_of_range.clone())?;

        spread
            .page_frames
            .get((page - spread.pages.first()) as usize)
            .copied()
            .ok_or(out_of_range)
    }

    pub fn pool(&self) -> &PageSlotPool<V> {
        &self.pool
    }

    pub fn slot_for(&self, page: u32) -> Option<&PageSlot<V>> {
        self.pool.slot_for(page)
    }

    pub fn slot_for_mut(&mut self, page: u32) -> Option<&mut PageSlot<V>> {
        self.pool.slot_for_mut(page)
    }

    pub fn pending_animation(&self) -> Option<ScrollAnimation> {
        self.animation
    }

    pub fn rotation_phase(&self) -> RotationPhase {
        self.rotation.phase()
    }

    /// Thumbnail grid cell size for the configured device idiom.
    pub fn thumbnail_size(&self, base: Size) -> Size {
        geometry::thumbnail_size(base, self.settings.device_idiom, self.settings.thumbnail_size_reduction_factor)
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            page: self.page(),
            real_page: self.real_page(),
            current_spread: self.state.current_spread,
            spread_count: self.layout.len(),
            scroll_offset: self.state.scroll_offset,
            content_extent: self.content_extent(),
            dual_page_mode: self.is_dual_page_mode(),
            visible_pages: self.visible_pages(),
            bound_pages: self.pool.bound_pages(),
            live_slots: self.pool.live_slots(),
            hud_visible: self.hud.is_visible(),
            scrobble_bar_visible: self.hud.scrobble_bar_visible(),
            toolbar_visible: self.hud.toolbar_visible(),
            view_mode: self.settings.view_mode,
            rotation: self.rotation.phase(),
        }
    }

    // Navigation

    /// Scrolls to `page`, clamped to the document.
    ///
    /// Returns the animation to drive when `animated` is set and the offset
    /// actually changes. Without a document this is a no-op.
    pub fn scroll_to_page(&mut self, page: u32, animated: bool) -> Option<AnimationId> {
        self.scroll_to_page_hiding_hud(page, animated, false)
    }

    /// Like [`scroll_to_page`](Self::scroll_to_page), optionally hiding the HUD first.
    pub fn scroll_to_page_hiding_hud(&mut self, page: u32, animated: bool, hide_hud: bool) -> Option<AnimationId> {
        let page_count = self.page_count();
        if page_count == 0 || self.layout.is_empty() {
            tracing::debug!(page, "scroll ignored, no document");
            return None;
        }

        let page = page.min(page_count - 1);

        if !self.rotation.is_stable() {
            self.rotation.retarget(page);
            return None;
        }

        if hide_hud {
            self.set_hud_visible(false, animated);
        }

        let (page, spread) = self.resolve_page(page);
        let target_offset = self.layout.offset_for_spread(spread);
        self.cancel_animation();

        if !animated || target_offset == self.state.scroll_offset {
            self.jump_to(page, spread);
            return None;
        }

        let from = self.state.page;
        let notify_page_change = from != page;
        if notify_page_change {
            self.notify(|delegate| delegate.page_will_change(from, page));
        }

        self.state.current_spread = spread;
        self.state.page = page;

        self.held_pages = self.pool.bound_pages();
        for held in &self.held_pages {
            self.pool.pin(*held);
        }
        for target in self.activate_spread(spread) {
            self.pool.pin(target);
            if !self.held_pages.contains(&target) {
                self.held_pages.push(target);
            }
        }

        let id = self.next_animation_id;
        self.next_animation_id += 1;
        self.animation = Some(ScrollAnimation { id, target_offset, spread, page, notify_page_change });

        tracing::debug!(id, page, spread, target_offset, "animated scroll started");
        Some(id)
    }

    /// Moves to the next spread. Returns false at the last spread.
    pub fn scroll_to_next_page(&mut self, animated: bool) -> bool {
        let next = self.state.current_spread + 1;
        match self.layout.spread(next).map(|spread| spread.pages.first()) {
            Some(page) if self.document.is_some() => {
                self.scroll_to_page(page, animated);
                true
            }
            _ => false,
        }
    }

    /// Moves to the previous spread. Returns false at the first spread.
    pub fn scroll_to_previous_page(&mut self, animated: bool) -> bool {
        let Some(previous) = self.state.current_spread.checked_sub(1) else {
            return false;
        };

        match self.layout.spread(previous).map(|spread| spread.pages.first()) {
            Some(page) if self.document.is_some() => {
                self.scroll_to_page(page, animated);
                true
            }
            _ => false,
        }
    }

    /// Host report of a new scroll offset (drag, deceleration or animation frame).
    pub fn did_scroll(&mut self, offset: f32) {
        if !self.rotation.is_stable() {
            tracing::trace!(offset, "scroll ignored during rotation");
            return;
        }

        if self.layout.is_empty() || !offset.is_finite() {
            return;
        }

        self.state.scroll_offset = offset.clamp(0.0, self.layout.max_offset());

        if self.animation.is_none() {
            if let Some(spread) = self.layout.spread_at_offset(self.state.scroll_offset) {
                if spread != self.state.current_spread {
                    let page = self.layout.spread(spread).map(|spread| spread.pages.first()).unwrap_or(0);
                    self.change_page(page, spread);
                }
            }
        }

        self.sync_pool();
    }

    /// Completion callback of an animated scroll. Stale ids are ignored.
    pub fn scroll_animation_did_finish(&mut self, id: AnimationId) -> bool {
        let Some(animation) = self.animation.filter(|animation| animation.id == id) else {
            tracing::trace!(id, "stale animation completion");
            return false;
        };
        self.animation = None;
        self.held_pages.clear();
        self.pool.unpin_all();

        self.state.scroll_offset = animation.target_offset;
        self.sync_pool();
        self.pool.trim();

        if animation.notify_page_change {
            self.notify(|delegate| delegate.page_did_change(animation.page));
        }

        tracing::debug!(id, page = animation.page, "animated scroll finished");
        true
    }

    /// Re-reads the document and restores the current page.
    pub fn reload_data(&mut self) {
        self.reload_data_preserving(true);
    }

    /// Re-reads the document. Without `preserve_current_page` the viewer
    /// returns to page 0.
    pub fn reload_data_preserving(&mut self, preserve_current_page: bool) {
        let page = if preserve_current_page { self.state.page } else { 0 };
        self.reload_to(page);
    }

    pub fn reload_data_and_scroll_to_page(&mut self, page: u32) {
        self.reload_to(page);
    }

    // Configuration

    pub fn set_page_mode(&mut self, mode: PageMode) {
        self.settings.page_mode = mode;
        self.reload_data();
    }

    pub fn set_page_scrolling(&mut self, direction: ScrollDirection) {
        self.settings.page_scrolling = direction;
        self.reload_data();
    }

    pub fn set_double_page_mode_on_first_page(&mut self, enabled: bool) {
        self.settings.double_page_mode_on_first_page = enabled;
        self.reload_data();
    }

    /// Ignores negative or non-finite padding and returns false.
    pub fn set_page_padding(&mut self, padding: f32) -> bool {
        if !padding.is_finite() || padding < 0.0 {
            tracing::warn!(padding, "ignoring invalid page padding");
            return false;
        }

        self.settings.page_padding = padding;
        self.reload_data();
        true
    }

    pub fn set_zooming_small_documents_enabled(&mut self, enabled: bool) {
        self.settings.zooming_small_documents_enabled = enabled;
        self.reload_data();
    }

    pub fn set_status_bar_style_setting(&mut self, setting: StatusBarStyleSetting) {
        self.settings.status_bar_style_setting = setting;
        self.hud.set_style_setting(setting);
    }

    pub fn set_scroll_on_tap_page_end_enabled(&mut self, enabled: bool) {
        self.settings.scroll_on_tap_page_end_enabled = enabled;
    }

    pub fn set_scrobble_bar_enabled(&mut self, enabled: bool) {
        self.settings.scrobble_bar_enabled = enabled;
        self.hud.set_scrobble_bar_enabled(enabled);
    }

    pub fn set_toolbar_enabled(&mut self, enabled: bool) {
        self.settings.toolbar_enabled = enabled;
        self.hud.set_toolbar_enabled(enabled);
    }

    pub fn set_device_idiom(&mut self, idiom: DeviceIdiom) {
        self.settings.device_idiom = idiom;
        self.hud.set_device_idiom(idiom);
    }

    pub fn view_mode(&self) -> ViewMode {
        self.settings.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.settings.view_mode == mode {
            return;
        }

        self.settings.view_mode = mode;
        self.hud.set_view_mode(mode);
        self.notify(|delegate| delegate.view_mode_did_change(mode));
    }

    // HUD

    pub fn is_hud_visible(&self) -> bool {
        self.hud.is_visible()
    }

    /// Shows or hides the HUD. Returns true when visibility changed.
    pub fn set_hud_visible(&mut self, visible: bool, animated: bool) -> bool {
        let changed = self.hud.set_visible(self.chrome.as_mut(), visible, animated);
        if changed {
            self.notify(|delegate| delegate.hud_visibility_did_change(visible));
        }
        changed
    }

    pub fn show_hud(&mut self, animated: bool) -> bool {
        self.set_hud_visible(true, animated)
    }

    pub fn hide_hud(&mut self, animated: bool) -> bool {
        self.set_hud_visible(false, animated)
    }

    /// Returns the new visibility.
    pub fn toggle_hud(&mut self, animated: bool) -> bool {
        let visible = !self.hud.is_visible();
        self.set_hud_visible(visible, animated);
        self.hud.is_visible()
    }

    pub fn scrobble_bar_visible(&self) -> bool {
        self.hud.scrobble_bar_visible()
    }

    pub fn toolbar_visible(&self) -> bool {
        self.hud.toolbar_visible()
    }

    /// Keeps the HUD up for the next drag.
    pub fn suppress_hud_hide_once(&mut self) {
        self.suppress_hud_hide = true;
    }

    /// The user started dragging the content.
    pub fn did_begin_dragging(&mut self) {
        if std::mem::take(&mut self.suppress_hud_hide) {
            return;
        }
        self.hide_hud(true);
    }

    /// Routes a tap at (`x`, `y`) in viewport coordinates.
    ///
    /// Taps within the edge margin along the scroll axis turn the page when
    /// scroll-on-tap is enabled. Every other tap, including an edge tap at
    /// the first or last spread, toggles the HUD.
    pub fn handle_tap(&mut self, x: f32, y: f32) -> TapAction {
        if self.settings.scroll_on_tap_page_end_enabled && self.settings.view_mode == ViewMode::Document {
            let direction = self.settings.page_scrolling;
            let extent = self.geometry.viewport.along(direction);
            let position = match direction {
                ScrollDirection::Horizontal => x,
                ScrollDirection::Vertical => y,
            };
            let margin = extent * self.settings.tap_page_end_margin.clamp(0.0, 0.5);

            if position < margin && self.scroll_to_previous_page(true) {
                return TapAction::PreviousPage;
            }
            if position > extent - margin && self.scroll_to_next_page(true) {
                return TapAction::NextPage;
            }
        }

        TapAction::ToggleHud { visible: self.toggle_hud(true) }
    }

    // Geometry changes

    /// The viewport is about to change size or orientation.
    pub fn viewport_will_change(&mut self) {
        self.cancel_animation();
        self.rotation.begin(self.state.page);
    }

    /// The new viewport size is known. Lays out without moving the offset.
    pub fn viewport_did_change(&mut self, geometry: Geometry) {
        self.geometry = geometry;
        self.relayout();
        self.rotation.layout_applied(self.state.page);
    }

    /// The host finished its layout pass; jumps to the recorded page.
    pub fn layout_pass_did_finish(&mut self) {
        let Some(page) = self.rotation.finish() else {
            return;
        };

        let page_count = self.page_count();
        if page_count == 0 || self.layout.is_empty() {
            return;
        }

        let (page, spread) = self.resolve_page(page.min(page_count - 1));
        self.jump_to(page, spread);
        tracing::debug!(page, spread, "rotation restored page");
    }

    /// Runs a complete geometry change in one step.
    pub fn apply_geometry_change(&mut self, geometry: Geometry) {
        self.viewport_will_change();
        self.viewport_did_change(geometry);
        self.layout_pass_did_finish();
    }

    /// Restores any status bar override and releases every slot.
    pub fn teardown(&mut self) {
        self.hud.teardown(self.chrome.as_mut());
        self.animation = None;
        self.held_pages.clear();
        self.rotation.cancel();
        self.pool.reset();
    }

    fn notify(&mut self, event: impl FnOnce(&mut dyn ViewerDelegate)) {
        if let Some(delegate) = self.delegate.as_mut() {
            event(delegate.as_mut());
        }
    }

    fn relayout(&mut self) {
        let params = LayoutParams::from_settings(&self.settings, self.geometry);
        self.layout = match self.document.as_deref() {
            Some(document) => Layout::for_document(document, params),
            None => Layout::empty(params),
        };

        let visible = self.layout.max_visible_spreads().max(1);
        self.pool.set_capacity(PoolCapacity::for_layout(visible, params.pages_per_spread()));

        tracing::debug!(
            spreads = self.layout.len(),
            double = self.layout.is_double(),
            extent = self.layout.content_extent(),
            "layout computed"
        );
    }

    fn reload_to(&mut self, page: u32) {
        self.cancel_animation();
        self.relayout();

        let page_count = self.page_count();
        if page_count == 0 || self.layout.is_empty() {
            self.state = ViewportState::default();
            for bound in self.pool.bound_pages() {
                self.pool.recycle(bound);
            }
            return;
        }

        let (page, spread) = self.resolve_page(page.min(page_count - 1));
        self.jump_to(page, spread);
    }

    /// Spread owning `page`. Pages missing from a fallback layout map to its first page.
    fn resolve_page(&self, page: u32) -> (u32, usize) {
        match self.layout.spread_index_for_page(page) {
            Some(spread) => (page, spread),
            None => (self.layout.spread(0).map(|spread| spread.pages.first()).unwrap_or(0), 0),
        }
    }

    fn jump_to(&mut self, page: u32, spread: usize) {
        self.state.scroll_offset = self.layout.offset_for_spread(spread);
        self.change_page(page, spread);
        self.sync_pool();
    }

    fn change_page(&mut self, page: u32, spread: usize) {
        let from = self.state.page;
        self.state.current_spread = spread;

        if from == page {
            return;
        }

        self.notify(|delegate| delegate.page_will_change(from, page));
        self.state.page = page;
        self.notify(|delegate| delegate.page_did_change(page));
        tracing::debug!(from, page, spread, "page changed");
    }

    fn cancel_animation(&mut self) {
        if let Some(animation) = self.animation.take() {
            tracing::debug!(id = animation.id, "animation superseded");
            self.held_pages.clear();
            self.pool.unpin_all();
        }
    }

    /// Binds every page of `spread` and returns them.
    fn activate_spread(&mut self, spread: usize) -> Vec<u32> {
        let pages: Vec<u32> = self.layout.spread(spread).map(|spread| spread.pages.iter().collect()).unwrap_or_default();
        for page in &pages {
            self.pool.activate(*page, spread);
        }
        pages
    }

    /// Binds visible pages plus one page of lookahead on each side and
    /// releases the rest. While an animation is in flight held pages stay
    /// bound and newly bound pages are pinned, so the pool may overflow
    /// until the completion trims it.
    fn sync_pool(&mut self) {
        let Some(range) = self.layout.visible_range(self.state.scroll_offset) else {
            return;
        };

        let visible = &self.layout.spreads()[range];
        let mut wanted: Vec<(u32, usize)> = visible
            .iter()
            .flat_map(|spread| spread.pages.iter().map(move |page| (page, spread.index)))
            .collect();

        let first_page = visible.first().map(|spread| spread.pages.first());
        let last_page = visible.last().map(|spread| spread.pages.last());
        let neighbours = [first_page.and_then(|page| page.checked_sub(1)), last_page.map(|page| page + 1)];
        for page in neighbours.into_iter().flatten() {
            if let Some(spread) = self.layout.spread_index_for_page(page) {
                wanted.push((page, spread));
            }
        }

        for bound in self.pool.bound_pages() {
            if !wanted.iter().any(|(page, _)| *page == bound) && !self.held_pages.contains(&bound) {
                self.pool.recycle(bound);
            }
        }

        let animating = self.animation.is_some();
        for (page, spread) in wanted {
            self.pool.activate(page, spread);
            if animating {
                self.pool.pin(page);
            }
        }
    }
}

impl<V> Drop for ViewerController<V> {
    fn drop(&mut self) {
        self.hud.teardown(self.chrome.as_mut());
    }
}

impl<V> std::fmt::Debug for ViewerController<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerController")
            .field("settings", &self.settings)
            .field("geometry", &self.geometry)
            .field("state", &self.state)
            .field("spreads", &self.layout.len())
            .field("rotation", &self.rotation.phase())
            .field("hud_visible", &self.hud.is_visible())
            .field("animation", &self.animation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::{RecordingDelegate, ViewerEvent};
    use doc_model::UniformDocument;

    fn landscape() -> Geometry {
        Geometry::new(1000.0, 800.0)
    }

    fn portrait() -> Geometry {
        Geometry::new(800.0, 1000.0)
    }

    fn viewer(pages: u32, geometry: Geometry) -> ViewerController {
        ViewerController::with_document(UniformDocument::letter(pages), ViewerSettings::default(), geometry)
    }

    #[test]
    fn starts_on_first_page_with_slots_bound() {
        let viewer = viewer(10, portrait());

        assert_eq!(viewer.page(), 0);
        assert_eq!(viewer.scroll_offset(), 0.0);
        assert_eq!(viewer.visible_pages(), vec![0]);
        assert_eq!(viewer.pool().bound_pages(), vec![0, 1]);
    }

    #[test]
    fn scroll_to_page_clamps() {
        let mut viewer = viewer(10, portrait());

        viewer.scroll_to_page(42, false);
        assert_eq!(viewer.page(), 9);
        assert_eq!(viewer.scroll_offset(), 9.0 * 820.0);

        viewer.scroll_to_page(3, false);
        assert_eq!(viewer.page(), 3);
        assert_eq!(viewer.pool().bound_pages(), vec![2, 3, 4]);
    }

    #[test]
    fn navigation_without_document_is_a_no_op() {
        let mut viewer = ViewerController::new(ViewerSettings::default(), portrait());

        assert_eq!(viewer.scroll_to_page(3, false), None);
        assert!(!viewer.scroll_to_next_page(false));
        assert!(!viewer.scroll_to_previous_page(false));
        assert_eq!(viewer.page(), 0);
        assert_eq!(viewer.frame_for_page(0), Err(ViewerError::DocumentUnavailable));
    }

    #[test]
    fn next_and_previous_stop_at_bounds() {
        let mut viewer = viewer(3, portrait());

        assert!(!viewer.scroll_to_previous_page(false));
        assert!(viewer.scroll_to_next_page(false));
        assert!(viewer.scroll_to_next_page(false));
        assert_eq!(viewer.page(), 2);
        assert!(!viewer.scroll_to_next_page(false));
        assert!(viewer.scroll_to_previous_page(false));
        assert_eq!(viewer.page(), 1);
    }

    #[test]
    fn dual_mode_pages() {
        let mut viewer = viewer(5, landscape());
        assert!(viewer.is_dual_page_mode());

        viewer.scroll_to_page(1, false);
        assert_eq!(viewer.page(), 1);
        assert_eq!(viewer.real_page(), 2);
        assert_eq!(viewer.current_spread(), 1);

        assert!(viewer.scroll_to_next_page(false));
        assert_eq!(viewer.page(), 3);
        assert_eq!(viewer.real_page(), 4);
    }

    #[test]
    fn right_page_is_second_page_of_a_pair_including_page_two() {
        let mut viewer = viewer(5, landscape());

        assert!(!viewer.is_right_page_in_double_page_mode(0));
        assert!(!viewer.is_right_page_in_double_page_mode(1));
        assert!(viewer.is_right_page_in_double_page_mode(2));
        assert!(!viewer.is_right_page_in_double_page_mode(3));
        assert!(viewer.is_right_page_in_double_page_mode(4));

        viewer.apply_geometry_change(portrait());
        assert!(!viewer.is_right_page_in_double_page_mode(2));
    }

    #[test]
    fn animated_scroll_defers_recycling_until_completion() {
        let mut viewer = viewer(10, portrait());
        let id = viewer.scroll_to_page(5, true).expect("animation expected");

        assert_eq!(viewer.page(), 5);
        assert!(viewer.pool().is_pinned(0));
        assert!(viewer.slot_for(5).is_some());

        viewer.did_scroll(2000.0);
        assert!(viewer.slot_for(0).is_some());

        assert!(viewer.scroll_animation_did_finish(id));
        assert_eq!(viewer.scroll_offset(), 5.0 * 820.0);
        assert_eq!(viewer.pool().bound_pages(), vec![4, 5, 6]);
        assert!(viewer.pool().live_slots() <= viewer.pool().capacity().slots());
        assert!(!viewer.scroll_animation_did_finish(id));
    }

    #[test]
    fn animated_jump_keeps_on_screen_pages_bound() {
        let mut viewer = viewer(20, landscape());
        viewer.did_scroll(1500.0);
        let on_screen = viewer.visible_pages();
        assert!(on_screen.len() > 2);

        let id = viewer.scroll_to_page(17, true).expect("animation expected");

        assert_eq!(viewer.scroll_offset(), 1500.0);
        for page in &on_screen {
            assert!(viewer.slot_for(*page).is_some(), "page {page} lost its slot");
            assert!(viewer.pool().is_pinned(*page));
        }
        assert!(viewer.slot_for(17).is_some());
        assert!(viewer.slot_for(18).is_some());

        assert!(viewer.scroll_animation_did_finish(id));
        assert!(viewer.pool().live_slots() <= viewer.pool().capacity().slots());
        assert!(viewer.slot_for(17).is_some());
    }

    #[test]
    fn newer_navigation_supersedes_animation() {
        let mut viewer = viewer(10, portrait());
        let first = viewer.scroll_to_page(5, true).expect("animation expected");
        viewer.scroll_to_page(2, false);

        assert!(!viewer.scroll_animation_did_finish(first));
        assert_eq!(viewer.page(), 2);
        assert_eq!(viewer.pool().bound_pages(), vec![1, 2, 3]);
        assert!(!viewer.pool().is_pinned(0));
    }

    #[test]
    fn user_scroll_updates_page_by_majority() {
        let mut viewer = viewer(10, portrait());
        let delegate = RecordingDelegate::new();
        viewer.set_delegate(delegate.clone());

        viewer.did_scroll(300.0);
        assert_eq!(viewer.page(), 0);

        viewer.did_scroll(500.0);
        assert_eq!(viewer.page(), 1);
        assert_eq!(viewer.visible_pages(), vec![0, 1]);
        assert_eq!(
            delegate.events(),
            vec![ViewerEvent::PageWillChange { from: 0, to: 1 }, ViewerEvent::PageDidChange { page: 1 }]
        );
    }

    #[test]
    fn reload_preserves_page_and_clamps_when_shrunk() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Growing(Rc<Cell<u32>>);
        impl PageSource for Growing {
            fn page_count(&self) -> u32 {
                self.0.get()
            }
            fn aspect_ratio(&self, _index: u32) -> f32 {
                0.75
            }
        }

        let count = Rc::new(Cell::new(10));
        let mut viewer =
            ViewerController::with_document(Growing(count.clone()), ViewerSettings::default(), portrait());
        viewer.scroll_to_page(7, false);

        count.set(20);
        viewer.reload_data();
        assert_eq!(viewer.page(), 7);
        assert_eq!(viewer.spreads().len(), 20);

        count.set(4);
        viewer.reload_data();
        assert_eq!(viewer.page(), 3);

        viewer.reload_data_preserving(false);
        assert_eq!(viewer.page(), 0);

        viewer.reload_data_and_scroll_to_page(2);
        assert_eq!(viewer.page(), 2);

        count.set(0);
        viewer.reload_data();
        assert_eq!(viewer.page(), 0);
        assert!(viewer.spreads().is_empty());
        assert!(viewer.pool().bound_pages().is_empty());
    }

    #[test]
    fn page_mode_change_keeps_page() {
        let mut viewer = viewer(9, landscape());
        viewer.scroll_to_page(6, false);
        assert_eq!(viewer.current_spread(), 3);

        viewer.set_page_mode(PageMode::Single);
        assert_eq!(viewer.page(), 6);
        assert_eq!(viewer.current_spread(), 6);
        assert!(!viewer.is_dual_page_mode());
    }

    #[test]
    fn invalid_page_padding_is_ignored() {
        let mut viewer = viewer(10, portrait());
        viewer.scroll_to_page(3, false);

        assert!(!viewer.set_page_padding(f32::INFINITY));
        assert!(!viewer.set_page_padding(f32::NAN));
        assert!(!viewer.set_page_padding(-1.0));
        assert_eq!(viewer.settings().page_padding, 20.0);
        assert_eq!(viewer.scroll_offset(), 3.0 * 820.0);

        assert!(viewer.set_page_padding(0.0));
        assert_eq!(viewer.page(), 3);
        assert_eq!(viewer.scroll_offset(), 3.0 * 800.0);
    }

    #[test]
    fn frame_for_page_reports_out_of_range() {
        let viewer = viewer(3, portrait());

        assert!(viewer.frame_for_page(2).is_ok());
        assert_eq!(
            viewer.frame_for_page(3),
            Err(ViewerError::IndexOutOfRange { index: 3, page_count: 3 })
        );
    }

    #[test]
    fn tap_routing() {
        let mut viewer = viewer(3, portrait());

        assert_eq!(viewer.handle_tap(790.0, 500.0), TapAction::NextPage);
        assert_eq!(viewer.handle_tap(400.0, 500.0), TapAction::ToggleHud { visible: true });
        assert_eq!(viewer.handle_tap(10.0, 500.0), TapAction::PreviousPage);

        // At the first spread an edge tap falls back to the HUD.
        let id = viewer.pending_animation().map(|animation| animation.id);
        if let Some(id) = id {
            viewer.scroll_animation_did_finish(id);
        }
        assert_eq!(viewer.handle_tap(10.0, 500.0), TapAction::ToggleHud { visible: false });

        viewer.set_scroll_on_tap_page_end_enabled(false);
        assert_eq!(viewer.handle_tap(790.0, 500.0), TapAction::ToggleHud { visible: true });
    }

    #[test]
    fn dragging_hides_hud_unless_suppressed() {
        let mut viewer = viewer(3, portrait());
        viewer.show_hud(false);

        viewer.suppress_hud_hide_once();
        viewer.did_begin_dragging();
        assert!(viewer.is_hud_visible());

        viewer.did_begin_dragging();
        assert!(!viewer.is_hud_visible());
    }

    #[test]
    fn scroll_hiding_hud() {
        let mut viewer = viewer(5, portrait());
        viewer.show_hud(false);

        viewer.scroll_to_page_hiding_hud(3, false, true);

        assert!(!viewer.is_hud_visible());
        assert_eq!(viewer.page(), 3);
    }

    #[test]
    fn view_mode_change_notifies_once() {
        let mut viewer = viewer(3, portrait());
        let delegate = RecordingDelegate::new();
        viewer.set_delegate(delegate.clone());
        viewer.show_hud(false);

        viewer.set_view_mode(ViewMode::Thumbnails);
        viewer.set_view_mode(ViewMode::Thumbnails);

        assert!(!viewer.scrobble_bar_visible());
        assert_eq!(
            delegate.take(),
            vec![
                ViewerEvent::HudVisibilityDidChange { visible: true },
                ViewerEvent::ViewModeDidChange { mode: ViewMode::Thumbnails },
            ]
        );
    }

    #[test]
    fn rotation_ignores_intermediate_scrolls() {
        let mut viewer = viewer(5, portrait());
        viewer.scroll_to_page(3, false);

        viewer.viewport_will_change();
        viewer.did_scroll(0.0);
        viewer.viewport_did_change(landscape());
        assert_eq!(viewer.rotation_phase(), RotationPhase::Restoring);
        assert_eq!(viewer.scroll_offset(), 3.0 * 820.0);

        viewer.layout_pass_did_finish();
        assert_eq!(viewer.rotation_phase(), RotationPhase::Stable);
        assert_eq!(viewer.page(), 3);
        assert_eq!(viewer.current_spread(), 2);
        assert_eq!(viewer.scroll_offset(), 2.0 * 1020.0);
    }

    #[test]
    fn scroll_during_rotation_retargets() {
        let mut viewer = viewer(8, portrait());

        viewer.viewport_will_change();
        assert_eq!(viewer.scroll_to_page(6, true), None);
        viewer.viewport_did_change(landscape());
        viewer.layout_pass_did_finish();

        assert_eq!(viewer.page(), 6);
    }

    #[test]
    fn thumbnail_size_follows_idiom() {
        let mut viewer = viewer(1, portrait());
        let base = Size::new(170.0, 220.0);

        assert_eq!(viewer.thumbnail_size(base), base);
        viewer.set_device_idiom(DeviceIdiom::Phone);
        assert_eq!(viewer.thumbnail_size(base), Size::new(100.0, 129.0));
    }
}
