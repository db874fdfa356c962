//! Scripted focus table

use std::sync::{Arc, Mutex};

use rustc_hash::{FxHashMap, FxHashSet};
use veil_overlay::host::{ElementId, FocusLocator};

struct FocusInner {
    focused: Option<ElementId>,
    alive: FxHashSet<ElementId>,
    focusables: FxHashMap<ElementId, Vec<ElementId>>,
}

/// An in-memory focus engine
///
/// Elements are registered as alive, optionally grouped under a subtree
/// root for `first_focusable` lookups, and can be killed to simulate the
/// pre-show focus target disappearing while the overlay is up.
pub struct ScriptedFocus {
    inner: Mutex<FocusInner>,
}

impl ScriptedFocus {
    /// Create an empty focus table
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FocusInner {
                focused: None,
                alive: FxHashSet::default(),
                focusables: FxHashMap::default(),
            }),
        })
    }

    /// Register a live element
    pub fn add_element(&self, element: ElementId) {
        self.inner.lock().unwrap().alive.insert(element);
    }

    /// Kill an element; focus moves away if it was focused
    pub fn remove_element(&self, element: ElementId) {
        let mut inner = self.inner.lock().unwrap();
        inner.alive.remove(&element);
        if inner.focused == Some(element) {
            inner.focused = None;
        }
    }

    /// Declare the focusable elements under a subtree root, in tab order
    ///
    /// The elements are registered as alive.
    pub fn set_focusables(&self, root: ElementId, elements: Vec<ElementId>) {
        let mut inner = self.inner.lock().unwrap();
        for element in &elements {
            inner.alive.insert(*element);
        }
        inner.focusables.insert(root, elements);
    }

    /// Focus an element directly from the test
    pub fn focus(&self, element: ElementId) {
        let mut inner = self.inner.lock().unwrap();
        assert!(inner.alive.contains(&element), "focusing a dead element");
        inner.focused = Some(element);
    }
}

impl FocusLocator for ScriptedFocus {
    fn focused(&self) -> Option<ElementId> {
        self.inner.lock().unwrap().focused
    }

    fn set_focus(&self, element: ElementId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.alive.contains(&element) {
            inner.focused = Some(element);
            true
        } else {
            false
        }
    }

    fn first_focusable(&self, subtree_root: ElementId) -> Option<ElementId> {
        let inner = self.inner.lock().unwrap();
        inner
            .focusables
            .get(&subtree_root)
            .and_then(|els| els.iter().find(|e| inner.alive.contains(e)))
            .copied()
    }
}
