//! Smoke layer behind popup-hosted overlays
//!
//! The dimming scrim lives in its own popup beneath the overlay's popup. It
//! opens before the overlay popup and closes after it, and it always spans
//! the full host viewport, re-sizing whenever the host bounds change.

use crate::error::HostError;
use crate::host::{HostBounds, Point, PopupContent, PopupHandle, PresentationHost};
use crate::position;

/// The scrim popup paired with one popup-hosted show cycle
pub struct SmokeLayer {
    popup: Box<dyn PopupHandle>,
}

impl SmokeLayer {
    /// Create the scrim popup, sized to the current host viewport
    pub fn create(host: &dyn PresentationHost) -> Result<Self, HostError> {
        let mut popup = host.host_in_popup(PopupContent::SmokeLayer, false)?;
        let (width, height) = position::smoke_size(host.bounds());
        popup.set_size(width, height);
        popup.set_offset(Point::ZERO);
        popup.set_hit_testable(true);
        Ok(Self { popup })
    }

    /// Open the scrim; called before the overlay popup opens
    pub fn open(&mut self) {
        tracing::trace!("smoke layer opening");
        self.popup.open();
    }

    /// Close the scrim; called after the overlay popup reported closed
    pub fn close(&mut self) {
        tracing::trace!("smoke layer closing");
        self.popup.close();
    }

    /// Whether the scrim popup is open
    pub fn is_open(&self) -> bool {
        self.popup.is_open()
    }

    /// Re-span the new host viewport
    pub fn resize(&mut self, bounds: HostBounds) {
        let (width, height) = position::smoke_size(bounds);
        self.popup.set_size(width, height);
    }
}

impl std::fmt::Debug for SmokeLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmokeLayer")
            .field("open", &self.popup.is_open())
            .finish()
    }
}
