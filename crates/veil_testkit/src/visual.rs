//! Scripted visual subtree

use std::sync::{Arc, Mutex};

use veil_core::events::{EventSink, Subscription};
use veil_overlay::host::{AnchorId, ElementId, LoadedCallback, Point, VisualHandle};

struct VisualState {
    root: ElementId,
    attached: bool,
    loaded: bool,
    parent: Option<AnchorId>,
    origin: Point,
    transplant_parts: bool,
}

/// A controllable stand-in for the overlay's visual subtree
pub struct ScriptedVisual {
    state: Mutex<VisualState>,
    loaded_sink: EventSink<()>,
    prepared: Mutex<u32>,
}

impl ScriptedVisual {
    /// A subtree that lives in the presentation tree under `anchor`
    pub fn attached(root: ElementId, anchor: AnchorId) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(VisualState {
                root,
                attached: true,
                loaded: true,
                parent: Some(anchor),
                origin: Point::ZERO,
                transplant_parts: true,
            }),
            loaded_sink: EventSink::new(),
            prepared: Mutex::new(0),
        })
    }

    /// A subtree that was never attached to the presentation tree
    pub fn detached(root: ElementId) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(VisualState {
                root,
                attached: false,
                loaded: false,
                parent: None,
                origin: Point::ZERO,
                transplant_parts: false,
            }),
            loaded_sink: EventSink::new(),
            prepared: Mutex::new(0),
        })
    }

    /// Move the subtree's origin in host coordinates
    pub fn set_origin(&self, origin: Point) {
        self.state.lock().unwrap().origin = origin;
    }

    /// Remove the parts transplanting requires
    pub fn set_transplant_parts(&self, present: bool) {
        self.state.lock().unwrap().transplant_parts = present;
    }

    /// Mark the subtree loaded, notifying subscribers
    pub fn finish_loading(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.loaded {
                return;
            }
            state.loaded = true;
        }
        self.loaded_sink.emit(&());
    }

    /// How many times preparation ran
    pub fn prepare_count(&self) -> u32 {
        *self.prepared.lock().unwrap()
    }
}

impl VisualHandle for ScriptedVisual {
    fn root(&self) -> ElementId {
        self.state.lock().unwrap().root
    }

    fn is_attached(&self) -> bool {
        self.state.lock().unwrap().attached
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().unwrap().loaded
    }

    fn logical_parent(&self) -> Option<AnchorId> {
        self.state.lock().unwrap().parent
    }

    fn origin_in_host(&self) -> Point {
        self.state.lock().unwrap().origin
    }

    fn has_transplant_parts(&self) -> bool {
        self.state.lock().unwrap().transplant_parts
    }

    fn prepare_for_display(&self) {
        *self.prepared.lock().unwrap() += 1;
    }

    fn subscribe_loaded(&self, callback: LoadedCallback) -> Subscription {
        self.loaded_sink.subscribe(move |_| callback())
    }
}
