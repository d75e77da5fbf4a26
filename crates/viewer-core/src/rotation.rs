//! Rotation coordinator
//!
//! Keeps the logical page across a geometry change. The page is recorded
//! before the new layout exists and re-applied once it does; a second change
//! arriving in between simply overwrites the target.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPhase {
    #[default]
    Stable,
    /// Geometry change announced, new size not yet known.
    PendingLayout,
    /// New spreads computed, waiting for the corrective jump.
    Restoring,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationCoordinator {
    phase: RotationPhase,
    target_page: Option<u32>,
}

impl RotationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    pub fn is_stable(&self) -> bool {
        self.phase == RotationPhase::Stable
    }

    pub fn target_page(&self) -> Option<u32> {
        self.target_page
    }

    /// Records `page` and enters `PendingLayout`. Last call wins.
    pub fn begin(&mut self, page: u32) {
        if !self.is_stable() {
            tracing::debug!(previous = ?self.target_page, page, "rotation target overwritten");
        }
        self.target_page = Some(page);
        self.phase = RotationPhase::PendingLayout;
    }

    /// Replaces the target while a rotation is in flight. Ignored when stable.
    pub fn retarget(&mut self, page: u32) -> bool {
        if self.is_stable() {
            return false;
        }
        self.target_page = Some(page);
        true
    }

    /// The new layout has been computed. A layout without a preceding
    /// `begin` starts a rotation at `current_page`.
    pub fn layout_applied(&mut self, current_page: u32) {
        if self.is_stable() {
            self.target_page = Some(current_page);
        }
        self.phase = RotationPhase::Restoring;
    }

    /// Completes the rotation and hands back the page to jump to.
    pub fn finish(&mut self) -> Option<u32> {
        if self.is_stable() {
            return None;
        }
        self.phase = RotationPhase::Stable;
        self.target_page.take()
    }

    /// Drops any in-flight rotation (document swap).
    pub fn cancel(&mut self) {
        self.phase = RotationPhase::Stable;
        self.target_page = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_recorded_page() {
        let mut rotation = RotationCoordinator::new();

        rotation.begin(7);
        assert_eq!(rotation.phase(), RotationPhase::PendingLayout);

        rotation.layout_applied(0);
        assert_eq!(rotation.phase(), RotationPhase::Restoring);
        assert_eq!(rotation.target_page(), Some(7));

        assert_eq!(rotation.finish(), Some(7));
        assert!(rotation.is_stable());
        assert_eq!(rotation.target_page(), None);
    }

    #[test]
    fn last_rotation_wins() {
        let mut rotation = RotationCoordinator::new();

        rotation.begin(3);
        rotation.layout_applied(3);
        rotation.begin(5);

        assert_eq!(rotation.phase(), RotationPhase::PendingLayout);
        assert_eq!(rotation.finish(), Some(5));
    }

    #[test]
    fn retarget_only_applies_in_flight() {
        let mut rotation = RotationCoordinator::new();
        assert!(!rotation.retarget(4));

        rotation.begin(1);
        assert!(rotation.retarget(4));
        assert_eq!(rotation.finish(), Some(4));
    }

    #[test]
    fn finish_when_stable_is_a_no_op() {
        let mut rotation = RotationCoordinator::new();
        assert_eq!(rotation.finish(), None);
    }
}
