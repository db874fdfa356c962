//! Notification trace recorder

use std::sync::{Arc, Mutex};

use veil_core::events::Subscription;
use veil_overlay::controller::OverlayController;

/// Captures a controller's notifications as a flat event trace
///
/// Entries look like `opened`, `closing:Primary`, `closed:Primary`,
/// `click:Secondary`. Tests assert on ordering and absence.
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to all four controller notifications
    pub fn attach(&self, controller: &OverlayController) {
        let mut subs = self.subscriptions.lock().unwrap();

        let events = Arc::clone(&self.events);
        subs.push(controller.on_opened(move |_| {
            events.lock().unwrap().push("opened".to_string());
        }));

        let events = Arc::clone(&self.events);
        subs.push(controller.on_closing(move |args| {
            events
                .lock()
                .unwrap()
                .push(format!("closing:{:?}", args.result()));
        }));

        let events = Arc::clone(&self.events);
        subs.push(controller.on_closed(move |args| {
            events
                .lock()
                .unwrap()
                .push(format!("closed:{:?}", args.result));
        }));

        let events = Arc::clone(&self.events);
        subs.push(controller.on_button_click(move |args| {
            events
                .lock()
                .unwrap()
                .push(format!("click:{:?}", args.button()));
        }));
    }

    /// Push a manual marker into the trace
    pub fn record(&self, label: impl Into<String>) {
        self.events.lock().unwrap().push(label.into());
    }

    /// The trace so far
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Whether the trace contains an entry
    pub fn contains(&self, label: &str) -> bool {
        self.events.lock().unwrap().iter().any(|e| e == label)
    }

    /// Empty the trace, keeping subscriptions alive
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}
