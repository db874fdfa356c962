//! Placement strategy for one show cycle
//!
//! An overlay is either rendered inline, in its natural position in the
//! existing UI tree, or hosted in a popup floating above all other content.
//! The popup-hosted strategy splits in two: a subtree that has lived in the
//! tree at least once is transplanted into the popup (and moved back on
//! close), while a control that was never attached is carried into the popup
//! wholesale. The mode is decided once per show cycle and reset after the
//! cycle fully closes.

use crate::error::{HostError, ShowError};
use crate::host::{PresentationHost, VisualHandle};

/// Caller's placement request passed to show
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlacementPreference {
    /// Render in place within the existing tree
    Inline,
    /// Float above content, constrained to the host's bounds
    #[default]
    Overlay,
    /// Float above content, unconstrained by the host's layout bounds
    UnconstrainedOverlay,
}

/// Resolved placement for the current show cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlacementMode {
    /// No show cycle in progress
    #[default]
    Undetermined,
    /// Rendered in the overlay's natural tree position
    Inline,
    /// Subtree transplanted into a popup, placeholder left behind
    TransplantedOverlay,
    /// Entire control hosted in a popup
    WholeControlOverlay,
}

impl PlacementMode {
    /// Whether this mode floats the overlay in a popup
    pub fn is_popup_hosted(&self) -> bool {
        matches!(
            self,
            PlacementMode::TransplantedOverlay | PlacementMode::WholeControlOverlay
        )
    }

    /// Whether this mode renders the overlay in place
    pub fn is_inline(&self) -> bool {
        matches!(self, PlacementMode::Inline)
    }
}

/// Resolve the placement mode for a show cycle
///
/// Inline wins when the subtree is attached and the caller asked for it, or
/// when the context cannot host popups. A subtree that was never attached
/// cannot render inline and cannot be transplanted, so it defaults to
/// carrying the whole control into the popup. Transplanting without the
/// required container parts is a contract violation, never downgraded.
pub fn resolve(
    preference: PlacementPreference,
    visual: &dyn VisualHandle,
    host: &dyn PresentationHost,
) -> Result<PlacementMode, ShowError> {
    let attached = visual.is_attached();
    let inline_only = !host.supports_popups();

    if attached && (preference == PlacementPreference::Inline || inline_only) {
        return Ok(PlacementMode::Inline);
    }

    if inline_only {
        // Never attached and nowhere to float
        return Err(ShowError::Host(HostError::PopupsUnavailable));
    }

    if attached {
        if !visual.has_transplant_parts() {
            return Err(ShowError::InvalidTemplateParts);
        }
        Ok(PlacementMode::TransplantedOverlay)
    } else {
        Ok(PlacementMode::WholeControlOverlay)
    }
}
