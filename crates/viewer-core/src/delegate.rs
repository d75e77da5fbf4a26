//! Notifications from the viewer to an external collaborator.

use std::cell::RefCell;
use std::rc::Rc;

use doc_model::ViewMode;
use serde::Serialize;

/// Observer registered on a [`ViewerController`](crate::ViewerController).
///
/// Every method has an empty default body; implement only what you need.
pub trait ViewerDelegate {
    /// Called before the reported page changes.
    fn page_will_change(&mut self, _from: u32, _to: u32) {}

    /// Called once the reported page settled on `page`.
    fn page_did_change(&mut self, _page: u32) {}

    fn hud_visibility_did_change(&mut self, _visible: bool) {}

    fn view_mode_did_change(&mut self, _mode: ViewMode) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewerEvent {
    PageWillChange { from: u32, to: u32 },
    PageDidChange { page: u32 },
    HudVisibilityDidChange { visible: bool },
    ViewModeDidChange { mode: ViewMode },
}

/// Delegate that appends every notification to a shared log.
#[derive(Debug, Default, Clone)]
pub struct RecordingDelegate {
    events: Rc<RefCell<Vec<ViewerEvent>>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewerEvent> {
        self.events.borrow().clone()
    }

    /// Returns the recorded events and clears the log.
    pub fn take(&self) -> Vec<ViewerEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: ViewerEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl ViewerDelegate for RecordingDelegate {
    fn page_will_change(&mut self, from: u32, to: u32) {
        self.push(ViewerEvent::PageWillChange { from, to });
    }

    fn page_did_change(&mut self, page: u32) {
        self.push(ViewerEvent::PageDidChange { page });
    }

    fn hud_visibility_did_change(&mut self, visible: bool) {
        self.push(ViewerEvent::HudVisibilityDidChange { visible });
    }

    fn view_mode_did_change(&mut self, mode: ViewMode) {
        self.push(ViewerEvent::ViewModeDidChange { mode });
    }
}
