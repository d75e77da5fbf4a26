//! Folio viewer core
//!
//! Page virtualization and spread layout for a paged document viewer. The
//! [`ViewerController`] ties together the spread layout, the page slot pool,
//! the rotation coordinator and the HUD state machine; the host feeds it
//! scroll offsets, taps and geometry changes and renders whatever slots it
//! reports as bound.

pub mod controller;
pub mod delegate;
pub mod error;
pub mod geometry;
pub mod host;
pub mod hud;
pub mod layout;
pub mod rotation;

pub use controller::{AnimationId, ScrollAnimation, TapAction, ViewerController, ViewerSnapshot, ViewportState};
pub use delegate::{RecordingDelegate, ViewerDelegate, ViewerEvent};
pub use error::{ViewerError, ViewerResult};
pub use geometry::{thumbnail_size, Geometry, Rect, Size};
pub use host::{ChromeCall, NoChrome, RecordingChrome, SystemChrome};
pub use hud::Hud;
pub use layout::{compute_spreads, compute_spreads_for, page_pairing, Layout, LayoutParams, Spread, SpreadPages};
pub use rotation::{RotationCoordinator, RotationPhase};
