//! Popup positioning in host coordinates
//!
//! A transplanted subtree carries whatever layout position its placeholder
//! container happens to occupy, so its popup must be offset by the negated
//! subtree origin to land at the host origin. Under right-to-left flow the
//! host mirrors the horizontal axis and the horizontal offset flips sign.
//! Re-run whenever host bounds or flow direction change.

use crate::host::{FlowDirection, HostBounds, Point};

/// Offset that places a popup's content in host coordinates
///
/// `origin` is where the overlay's subtree currently sits in host
/// coordinates; the returned offset cancels it out.
pub fn popup_offset(origin: Point, flow: FlowDirection) -> Point {
    let x = match flow {
        FlowDirection::LeftToRight => -origin.x,
        FlowDirection::RightToLeft => origin.x,
    };
    Point::new(x, -origin.y)
}

/// Size of the smoke layer popup: the full host viewport
pub fn smoke_size(bounds: HostBounds) -> (f32, f32) {
    (bounds.width, bounds.height)
}
