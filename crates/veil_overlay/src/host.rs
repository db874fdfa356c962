//! Collaborator traits at the host seam
//!
//! The overlay core never talks to a compositor, a focus engine or an event
//! loop directly. The embedding UI framework supplies these capabilities:
//!
//! - [`PresentationHost`]: popup surfaces, host geometry, back navigation,
//!   sound cues
//! - [`PopupHandle`]: one hosted popup surface
//! - [`FocusLocator`]: focus queries and movement
//! - [`VisualHandle`]: the overlay's own visual subtree as the host sees it
//!
//! All notification attachments hand back a [`Subscription`] guard; the
//! controller drops its guards at teardown and every attachment dies with
//! them.

use std::sync::Arc;

use veil_core::events::Subscription;

use crate::error::HostError;

/// Identifies one focusable element in the host's presentation tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Identifies a logical parent under which an inline overlay anchors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// A point in host (window) coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The host's current viewport in host coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HostBounds {
    pub width: f32,
    pub height: f32,
}

impl HostBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Reading order of the host's layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// What a popup is asked to carry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupContent {
    /// The overlay's visual subtree, transplanted out of its container
    TransplantedSubtree,
    /// The entire overlay control
    WholeControl,
    /// The dimming scrim beneath a popup-hosted overlay
    SmokeLayer,
}

/// Sound cues the host may play for overlay transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    OverlayOpened,
    OverlayClosed,
}

/// Callback invoked when a popup reports closed/unloaded
pub type ClosedCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked when the host viewport changes
pub type BoundsCallback = Arc<dyn Fn(HostBounds) + Send + Sync>;

/// Callback invoked when the host flow direction changes
pub type FlowCallback = Arc<dyn Fn(FlowDirection) + Send + Sync>;

/// Callback invoked when the platform requests back navigation
pub type BackRequestCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked when a visual subtree finishes loading
pub type LoadedCallback = Arc<dyn Fn() + Send + Sync>;

/// One popup surface hosted by the presentation host
///
/// Implementations must deliver the closed notification from their own
/// dispatch, never synchronously from inside `close`; the controller calls
/// into the handle while sequencing a transition. Dropping the handle
/// releases the surface and restores any transplanted content to its
/// original container.
pub trait PopupHandle: Send {
    /// Make the popup visible
    fn open(&mut self);

    /// Request the popup close; the closed notification follows asynchronously
    fn close(&mut self);

    /// Whether the popup is currently open
    fn is_open(&self) -> bool;

    /// Offset of the popup in host coordinates
    fn set_offset(&mut self, offset: Point);

    /// Explicit size of the popup surface
    fn set_size(&mut self, width: f32, height: f32);

    /// Whether the popup's content participates in hit testing
    fn set_hit_testable(&mut self, hit_testable: bool);

    /// Attach the closed/unloaded notification
    fn set_on_closed(&mut self, callback: ClosedCallback);
}

/// Popup/compositing surface and platform services of one presentation context
pub trait PresentationHost: Send + Sync {
    /// Host content in a new popup surface
    ///
    /// `windowed` asks for a surface unconstrained by the host's layout
    /// bounds.
    fn host_in_popup(
        &self,
        content: PopupContent,
        windowed: bool,
    ) -> std::result::Result<Box<dyn PopupHandle>, HostError>;

    /// Whether this context can host popups at all
    fn supports_popups(&self) -> bool {
        true
    }

    /// Whether this context can host windowed (unconstrained) popups
    fn supports_windowed_popups(&self) -> bool {
        false
    }

    /// Current host viewport
    fn bounds(&self) -> HostBounds;

    /// Current flow direction
    fn flow_direction(&self) -> FlowDirection {
        FlowDirection::LeftToRight
    }

    /// Attach a viewport-change notification
    fn subscribe_bounds_changed(&self, callback: BoundsCallback) -> Subscription;

    /// Attach a flow-direction-change notification
    fn subscribe_flow_changed(&self, callback: FlowCallback) -> Subscription;

    /// Register for platform back-navigation requests
    fn register_back_handler(&self, callback: BackRequestCallback) -> Subscription;

    /// Play a transition sound cue; hosts without audio ignore this
    fn play_sound(&self, _cue: SoundCue) {}
}

/// Focus queries against the host's presentation tree
pub trait FocusLocator: Send + Sync {
    /// The currently focused element, if any
    fn focused(&self) -> Option<ElementId>;

    /// Move focus; returns false when the element no longer exists
    fn set_focus(&self, element: ElementId) -> bool;

    /// First focusable element within a subtree
    fn first_focusable(&self, subtree_root: ElementId) -> Option<ElementId>;
}

/// The overlay's visual subtree as the host sees it
///
/// The controller consults this to resolve placement, to find the logical
/// parent anchor for inline exclusivity, and to learn when deferred content
/// preparation may run.
pub trait VisualHandle: Send + Sync {
    /// Root element of the overlay subtree
    fn root(&self) -> ElementId;

    /// Whether the subtree is attached to the presentation tree
    fn is_attached(&self) -> bool;

    /// Whether the subtree's content has been realized
    fn is_loaded(&self) -> bool;

    /// Logical parent the subtree anchors under, when attached
    fn logical_parent(&self) -> Option<AnchorId>;

    /// Origin of the subtree in host coordinates
    fn origin_in_host(&self) -> Point {
        Point::ZERO
    }

    /// Whether the container and inner root parts required for
    /// transplanting into a popup exist
    fn has_transplant_parts(&self) -> bool;

    /// One-time layout/host preparation before first display
    fn prepare_for_display(&self) {}

    /// Attach a loaded notification
    fn subscribe_loaded(&self, callback: LoadedCallback) -> Subscription;
}
