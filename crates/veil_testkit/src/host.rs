//! Scripted presentation host

use std::sync::{Arc, Mutex};

use veil_core::events::Subscription;
use veil_core::Scheduler;
use veil_overlay::error::HostError;
use veil_overlay::host::{
    BackRequestCallback, BoundsCallback, ClosedCallback, FlowCallback, FlowDirection, HostBounds,
    Point, PopupContent, PopupHandle, PresentationHost, SoundCue,
};

use crate::scheduler::ManualScheduler;

type EventLog = Arc<Mutex<Vec<String>>>;
type SubList<C> = Arc<Mutex<Vec<(u64, C)>>>;

fn kind_label(content: PopupContent) -> &'static str {
    match content {
        PopupContent::TransplantedSubtree => "transplanted",
        PopupContent::WholeControl => "whole-control",
        PopupContent::SmokeLayer => "smoke",
    }
}

struct PopupState {
    content: PopupContent,
    open: bool,
    ever_opened: bool,
    offset: Point,
    size: Option<(f32, f32)>,
    hit_testable: bool,
    on_closed: Option<ClosedCallback>,
}

/// Test-side view of one hosted popup
///
/// Cheap to clone; shared with the [`PopupHandle`] the controller holds.
/// `force_close` simulates the app closing the popup through means other
/// than the controller.
#[derive(Clone)]
pub struct SharedPopup {
    state: Arc<Mutex<PopupState>>,
    scheduler: Arc<ManualScheduler>,
    log: EventLog,
}

impl SharedPopup {
    /// Whether the popup is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    /// Whether the popup was ever opened
    pub fn ever_opened(&self) -> bool {
        self.state.lock().unwrap().ever_opened
    }

    /// Last offset applied to the popup
    pub fn offset(&self) -> Point {
        self.state.lock().unwrap().offset
    }

    /// Last explicit size applied to the popup
    pub fn size(&self) -> Option<(f32, f32)> {
        self.state.lock().unwrap().size
    }

    /// Whether the popup's content is hit-testable
    pub fn hit_testable(&self) -> bool {
        self.state.lock().unwrap().hit_testable
    }

    /// Close the popup from outside the controller
    ///
    /// The closed notification is delivered on the next scheduler tick, as a
    /// real compositor would.
    pub fn force_close(&self) {
        let content = {
            let mut state = self.state.lock().unwrap();
            if !state.open {
                return;
            }
            state.open = false;
            state.content
        };
        self.log
            .lock()
            .unwrap()
            .push(format!("force-close:{}", kind_label(content)));
        self.schedule_closed_notification();
    }

    fn schedule_closed_notification(&self) {
        let state = Arc::clone(&self.state);
        self.scheduler.run_next_tick(Box::new(move || {
            let callback = state.lock().unwrap().on_closed.clone();
            if let Some(callback) = callback {
                callback();
            }
        }));
    }
}

struct ScriptedPopupHandle {
    shared: SharedPopup,
}

impl Drop for ScriptedPopupHandle {
    fn drop(&mut self) {
        // Dropping the handle releases the surface
        let content = {
            let mut state = self.shared.state.lock().unwrap();
            state.open = false;
            state.content
        };
        self.shared
            .log
            .lock()
            .unwrap()
            .push(format!("drop:{}", kind_label(content)));
    }
}

impl PopupHandle for ScriptedPopupHandle {
    fn open(&mut self) {
        let content = {
            let mut state = self.shared.state.lock().unwrap();
            state.open = true;
            state.ever_opened = true;
            state.content
        };
        self.shared
            .log
            .lock()
            .unwrap()
            .push(format!("open:{}", kind_label(content)));
    }

    fn close(&mut self) {
        let content = {
            let mut state = self.shared.state.lock().unwrap();
            if !state.open {
                return;
            }
            state.open = false;
            state.content
        };
        self.shared
            .log
            .lock()
            .unwrap()
            .push(format!("close:{}", kind_label(content)));
        self.shared.schedule_closed_notification();
    }

    fn is_open(&self) -> bool {
        self.shared.state.lock().unwrap().open
    }

    fn set_offset(&mut self, offset: Point) {
        self.shared.state.lock().unwrap().offset = offset;
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.shared.state.lock().unwrap().size = Some((width, height));
    }

    fn set_hit_testable(&mut self, hit_testable: bool) {
        self.shared.state.lock().unwrap().hit_testable = hit_testable;
    }

    fn set_on_closed(&mut self, callback: ClosedCallback) {
        self.shared.state.lock().unwrap().on_closed = Some(callback);
    }
}

/// Record of one `host_in_popup` call
#[derive(Clone)]
pub struct PopupRecord {
    /// What the popup was asked to carry
    pub content: PopupContent,
    /// Whether an unconstrained surface was requested
    pub windowed: bool,
    /// Test-side view of the popup
    pub popup: SharedPopup,
}

struct HostConfig {
    supports_popups: bool,
    supports_windowed: bool,
    bounds: HostBounds,
    flow: FlowDirection,
}

/// Scripted popup/compositing surface
///
/// Records every hosted popup, open/close ordering and sound cues; lets the
/// test move the viewport, flip flow direction and press the platform back
/// button.
pub struct ScriptedHost {
    scheduler: Arc<ManualScheduler>,
    config: Mutex<HostConfig>,
    popups: Mutex<Vec<PopupRecord>>,
    sounds: Mutex<Vec<SoundCue>>,
    log: EventLog,
    next_sub: Mutex<u64>,
    bounds_subs: SubList<BoundsCallback>,
    flow_subs: SubList<FlowCallback>,
    back_subs: SubList<BackRequestCallback>,
}

impl ScriptedHost {
    /// Create a host delivering async notifications through `scheduler`
    pub fn new(scheduler: Arc<ManualScheduler>) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            config: Mutex::new(HostConfig {
                supports_popups: true,
                supports_windowed: true,
                bounds: HostBounds::new(800.0, 600.0),
                flow: FlowDirection::LeftToRight,
            }),
            popups: Mutex::new(Vec::new()),
            sounds: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            next_sub: Mutex::new(1),
            bounds_subs: Arc::new(Mutex::new(Vec::new())),
            flow_subs: Arc::new(Mutex::new(Vec::new())),
            back_subs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Allow or forbid popup hosting in this context
    pub fn set_supports_popups(&self, supports: bool) {
        self.config.lock().unwrap().supports_popups = supports;
    }

    /// Allow or forbid windowed (unconstrained) popups
    pub fn set_supports_windowed(&self, supports: bool) {
        self.config.lock().unwrap().supports_windowed = supports;
    }

    /// Move the viewport and notify subscribers
    pub fn set_bounds(&self, bounds: HostBounds) {
        self.config.lock().unwrap().bounds = bounds;
        let subs: Vec<BoundsCallback> = {
            let list = self.bounds_subs.lock().unwrap();
            list.iter().map(|(_, c)| Arc::clone(c)).collect()
        };
        for callback in subs {
            callback(bounds);
        }
    }

    /// Flip flow direction and notify subscribers
    pub fn set_flow(&self, flow: FlowDirection) {
        self.config.lock().unwrap().flow = flow;
        let subs: Vec<FlowCallback> = {
            let list = self.flow_subs.lock().unwrap();
            list.iter().map(|(_, c)| Arc::clone(c)).collect()
        };
        for callback in subs {
            callback(flow);
        }
    }

    /// Simulate a platform back-navigation request
    ///
    /// Returns how many handlers were notified.
    pub fn press_back(&self) -> usize {
        let subs: Vec<BackRequestCallback> = {
            let list = self.back_subs.lock().unwrap();
            list.iter().map(|(_, c)| Arc::clone(c)).collect()
        };
        let count = subs.len();
        for callback in subs {
            callback();
        }
        count
    }

    /// All popups hosted so far, in creation order
    pub fn popups(&self) -> Vec<PopupRecord> {
        self.popups.lock().unwrap().clone()
    }

    /// The popups hosted for `content`, in creation order
    pub fn popups_of(&self, content: PopupContent) -> Vec<PopupRecord> {
        self.popups
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.content == content)
            .cloned()
            .collect()
    }

    /// Sound cues played so far
    pub fn sounds(&self) -> Vec<SoundCue> {
        self.sounds.lock().unwrap().clone()
    }

    /// Flat trace of host-side popup activity
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Number of live back-navigation registrations
    pub fn back_handler_count(&self) -> usize {
        self.back_subs.lock().unwrap().len()
    }

    /// Number of live bounds-change subscriptions
    pub fn bounds_sub_count(&self) -> usize {
        self.bounds_subs.lock().unwrap().len()
    }

    fn next_sub_id(&self) -> u64 {
        let mut next = self.next_sub.lock().unwrap();
        let id = *next;
        *next += 1;
        id
    }

    fn subscribe<C: Send + 'static>(&self, list: &SubList<C>, callback: C) -> Subscription {
        let id = self.next_sub_id();
        list.lock().unwrap().push((id, callback));
        let list = Arc::clone(list);
        Subscription::new(move || {
            list.lock().unwrap().retain(|(sid, _)| *sid != id);
        })
    }
}

impl PresentationHost for ScriptedHost {
    fn host_in_popup(
        &self,
        content: PopupContent,
        windowed: bool,
    ) -> Result<Box<dyn PopupHandle>, HostError> {
        if !self.config.lock().unwrap().supports_popups {
            return Err(HostError::PopupsUnavailable);
        }
        let shared = SharedPopup {
            state: Arc::new(Mutex::new(PopupState {
                content,
                open: false,
                ever_opened: false,
                offset: Point::ZERO,
                size: None,
                hit_testable: true,
                on_closed: None,
            })),
            scheduler: Arc::clone(&self.scheduler),
            log: Arc::clone(&self.log),
        };
        self.log
            .lock()
            .unwrap()
            .push(format!("host:{}", kind_label(content)));
        self.popups.lock().unwrap().push(PopupRecord {
            content,
            windowed,
            popup: shared.clone(),
        });
        Ok(Box::new(ScriptedPopupHandle { shared }))
    }

    fn supports_popups(&self) -> bool {
        self.config.lock().unwrap().supports_popups
    }

    fn supports_windowed_popups(&self) -> bool {
        self.config.lock().unwrap().supports_windowed
    }

    fn bounds(&self) -> HostBounds {
        self.config.lock().unwrap().bounds
    }

    fn flow_direction(&self) -> FlowDirection {
        self.config.lock().unwrap().flow
    }

    fn subscribe_bounds_changed(&self, callback: BoundsCallback) -> Subscription {
        self.subscribe(&self.bounds_subs, callback)
    }

    fn subscribe_flow_changed(&self, callback: FlowCallback) -> Subscription {
        self.subscribe(&self.flow_subs, callback)
    }

    fn register_back_handler(&self, callback: BackRequestCallback) -> Subscription {
        self.subscribe(&self.back_subs, callback)
    }

    fn play_sound(&self, cue: SoundCue) {
        self.sounds.lock().unwrap().push(cue);
    }
}
