//! Open-overlay registry
//!
//! One registry exists per top-level presentation context (one per
//! window/root). It is the only state shared across controllers in a
//! context, and it encodes the exclusivity rule: popup-hosted overlays are
//! globally exclusive within their context, while inline overlays are
//! exclusive per distinct logical parent anchor, so several inline overlays
//! may be open at once under different anchors.
//!
//! Entries are weak back-references: the registry never extends a
//! controller's lifetime, and entries whose controller has been dropped are
//! pruned on every query.

use std::sync::{Arc, Mutex, Weak};

use indexmap::IndexMap;

use crate::host::AnchorId;
use crate::placement::PlacementMode;

/// Marker owned by a controller for the duration of one show cycle
///
/// The registry holds a weak reference to it; when the cycle ends (or the
/// controller is dropped mid-cycle) the entry goes dead and is pruned.
#[derive(Debug, Default)]
pub struct LivenessToken;

struct OpenEntry {
    alive: Weak<LivenessToken>,
    mode: PlacementMode,
    anchor: Option<AnchorId>,
}

struct RegistryInner {
    open: IndexMap<u64, OpenEntry>,
}

/// Per-context bookkeeping of currently open overlays
///
/// Cheap to clone; clones share the same table. Passing the registry is
/// passing the context: controllers shown against the same registry contend
/// for the same exclusivity slots.
#[derive(Clone)]
pub struct OverlayRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for OverlayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRegistry {
    /// Create an empty registry for one presentation context
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                open: IndexMap::new(),
            })),
        }
    }

    /// Whether opening an overlay with this placement would violate exclusivity
    ///
    /// Popup-hosted placements conflict with any open popup-hosted overlay.
    /// Inline placements conflict only with an open inline overlay under the
    /// same logical parent anchor.
    pub fn would_conflict(&self, mode: PlacementMode, anchor: Option<AnchorId>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        Self::prune(&mut inner);

        if mode.is_popup_hosted() {
            inner.open.values().any(|e| e.mode.is_popup_hosted())
        } else {
            inner
                .open
                .values()
                .any(|e| e.mode.is_inline() && e.anchor == anchor)
        }
    }

    /// Record an overlay as open
    ///
    /// Called after the exclusivity check passed; the caller keeps the
    /// `alive` token for the duration of the show cycle.
    pub fn register(
        &self,
        controller_id: u64,
        alive: &Arc<LivenessToken>,
        mode: PlacementMode,
        anchor: Option<AnchorId>,
    ) {
        debug_assert!(mode != PlacementMode::Undetermined);
        let mut inner = self.inner.lock().unwrap();
        tracing::debug!(controller_id, ?mode, ?anchor, "overlay registered");
        inner.open.insert(
            controller_id,
            OpenEntry {
                alive: Arc::downgrade(alive),
                mode,
                anchor,
            },
        );
    }

    /// Remove an overlay's entry; a no-op when absent
    pub fn unregister(&self, controller_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if inner.open.shift_remove(&controller_id).is_some() {
            tracing::debug!(controller_id, "overlay unregistered");
        }
    }

    /// Whether a controller currently holds an entry
    pub fn contains(&self, controller_id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        Self::prune(&mut inner);
        inner.open.contains_key(&controller_id)
    }

    /// Number of live entries
    pub fn open_count(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        Self::prune(&mut inner);
        inner.open.len()
    }

    /// Whether any live popup-hosted overlay is open in this context
    pub fn has_popup_overlay(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        Self::prune(&mut inner);
        inner.open.values().any(|e| e.mode.is_popup_hosted())
    }

    fn prune(inner: &mut RegistryInner) {
        inner.open.retain(|_, e| e.alive.strong_count() > 0);
    }
}
