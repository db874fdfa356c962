//! Error types for veil_overlay

use thiserror::Error;

/// Errors surfaced by showing an overlay
///
/// A failed show leaves the controller exactly as it was before the call: no
/// registry entry is added, no handle is created, no flag changes.
#[derive(Error, Debug)]
pub enum ShowError {
    /// Show was invoked while a show handle is already active on this controller
    #[error("overlay is already showing")]
    AlreadyShowing,

    /// The open-overlay exclusivity invariant would be violated
    #[error("a conflicting overlay is already open in this context")]
    ConflictingOverlay,

    /// Required popup-hosting parts are missing for the resolved placement
    ///
    /// A host-integration contract violation; never silently downgraded to
    /// inline placement.
    #[error("required popup hosting parts are missing")]
    InvalidTemplateParts,

    /// The presentation host failed while hosting the overlay
    #[error("presentation host error: {0}")]
    Host(#[from] HostError),
}

/// Errors reported by the presentation host
#[derive(Error, Debug)]
pub enum HostError {
    /// The context cannot host popups and the overlay cannot be placed inline
    #[error("popups are unavailable in this context")]
    PopupsUnavailable,

    /// Popup surface creation failed
    #[error("popup creation failed: {0}")]
    PopupCreate(String),

    /// Generic host failure
    #[error("{0}")]
    Other(String),
}

/// Result type for veil_overlay operations
pub type Result<T> = std::result::Result<T, ShowError>;
