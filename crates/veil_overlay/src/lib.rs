//! Veil Overlay Lifecycle
//!
//! This crate owns the modal overlay lifecycle:
//!
//! - **OverlayController**: the show/hide state machine for one overlay --
//!   placement decision, popup and smoke-layer orchestration, focus
//!   save/restore, and closing sequenced through cancelable deferrals
//! - **OverlayRegistry**: per-context bookkeeping enforcing that at most one
//!   popup-hosted overlay is open, while inline overlays coexist under
//!   distinct anchors
//! - **ShowHandle**: the async, cancelable, single-result handle a show
//!   returns
//! - **Host traits**: the popup surface, focus locator and scheduler the
//!   embedding framework supplies
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use veil_overlay::prelude::*;
//!
//! let controller = OverlayController::new(env, visual);
//! controller.set_buttons([
//!     OverlayButton::new(ButtonKind::Primary).command(|| save()),
//!     OverlayButton::new(ButtonKind::Close),
//! ]);
//!
//! let handle = controller.show(PlacementPreference::Overlay)?;
//! handle.on_completed(|handle| {
//!     if handle.result() == OverlayResult::Primary {
//!         // the primary action went through
//!     }
//! });
//! ```

pub mod controller;
pub mod error;
pub mod events;
pub mod handle;
pub mod host;
pub mod placement;
pub mod position;
pub mod registry;
pub mod smoke;

pub use controller::{
    lifecycle_events, LifecyclePhase, OverlayController, OverlayEnvironment,
};
pub use error::{HostError, Result, ShowError};
pub use events::{
    ButtonClickArgs, ButtonKind, ClosedArgs, CloseTrigger, ClosingArgs, OpenedArgs, OverlayButton,
    OverlayCommand,
};
pub use handle::{OverlayResult, ShowHandle, ShowStatus};
pub use host::{
    AnchorId, BackRequestCallback, BoundsCallback, ClosedCallback, ElementId, FlowCallback,
    FlowDirection, FocusLocator, HostBounds, LoadedCallback, Point, PopupContent, PopupHandle,
    PresentationHost, SoundCue, VisualHandle,
};
pub use placement::{PlacementMode, PlacementPreference};
pub use registry::{LivenessToken, OverlayRegistry};
pub use smoke::SmokeLayer;

/// Convenience re-exports for embedding code
pub mod prelude {
    pub use crate::controller::{OverlayController, OverlayEnvironment};
    pub use crate::error::ShowError;
    pub use crate::events::{ButtonKind, CloseTrigger, OverlayButton};
    pub use crate::handle::{OverlayResult, ShowHandle, ShowStatus};
    pub use crate::host::{
        FlowDirection, FocusLocator, HostBounds, Point, PresentationHost, VisualHandle,
    };
    pub use crate::placement::{PlacementMode, PlacementPreference};
    pub use crate::registry::OverlayRegistry;
    pub use veil_core::events::Subscription;
    pub use veil_core::scheduler::Scheduler;
}
