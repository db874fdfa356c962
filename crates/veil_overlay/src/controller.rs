//! Overlay lifecycle controller
//!
//! One [`OverlayController`] owns one overlay instance: it decides where the
//! overlay is hosted (inline in the existing tree, or floated in a popup),
//! registers the overlay with its context's [`OverlayRegistry`], hands the
//! caller an async [`ShowHandle`], and sequences closing through cancelable,
//! deferrable notifications.
//!
//! # Lifecycle
//!
//! `show` resolves a [`PlacementMode`], checks exclusivity, snapshots focus,
//! hosts popups when floating, and returns the handle. Popup opening is
//! deferred by one scheduler tick so enter transitions always play; a hide
//! that lands before the tick means the popup never opens and no closing
//! notification fires. Closing runs `Showing → ClosingRequested →
//! Deferred → Unwinding → Closed`: the closing notification may be vetoed
//! (while the popup is still up) or delayed through a deferral; unwinding
//! releases the registry entry, restores focus and tears the popups down in
//! reverse order of opening.
//!
//! # Threading
//!
//! Everything runs on the presentation thread. Re-entrant calls (a command
//! handler invoking `hide`, a listener subscribing mid-dispatch) are
//! tolerated through the phase guards, never through blocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use smallvec::SmallVec;

use veil_core::deferral::DeferralManager;
use veil_core::events::{EventSink, Subscription};
use veil_core::fsm::StateTransitions;

use crate::error::ShowError;
use crate::events::{
    ButtonClickArgs, ButtonKind, ClosedArgs, CloseTrigger, ClosingArgs, OpenedArgs, OverlayButton,
    OverlayCommand,
};
use crate::handle::{OverlayResult, ShowHandle, ShowStatus};
use crate::host::{
    ElementId, FocusLocator, HostBounds, PopupContent, PopupHandle, PresentationHost, SoundCue,
    VisualHandle,
};
use crate::placement::{self, PlacementMode, PlacementPreference};
use crate::position;
use crate::registry::{LivenessToken, OverlayRegistry};
use crate::smoke::SmokeLayer;

/// Global counter for unique controller ids.
static CONTROLLER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// Lifecycle phase FSM
// =============================================================================

/// Events driving the lifecycle phase machine
pub mod lifecycle_events {
    /// Show began acting (Closed -> Showing)
    pub const SHOW: u32 = 30001;
    /// A close was requested (Showing -> ClosingRequested)
    pub const CLOSE_REQUESTED: u32 = 30002;
    /// The closing notification was dispatched (ClosingRequested -> Deferred)
    pub const DEFERRAL_STARTED: u32 = 30003;
    /// The close goes through (-> Unwinding)
    pub const PROCEED: u32 = 30004;
    /// The close was vetoed (-> Showing)
    pub const ABORT: u32 = 30005;
    /// Teardown finished (Unwinding -> Closed)
    pub const FINISHED: u32 = 30006;
}

/// Phase of one overlay's lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LifecyclePhase {
    /// No show cycle in progress
    #[default]
    Closed,
    /// Visible (or becoming visible) and not closing
    Showing,
    /// A close was requested, the closing notification not yet dispatched
    ClosingRequested,
    /// The closing notification is out, possibly gated by a deferral
    Deferred,
    /// The close goes through; releasing resources
    Unwinding,
}

impl LifecyclePhase {
    /// True from the moment show begins acting until teardown completes
    pub fn is_showing(&self) -> bool {
        !matches!(self, LifecyclePhase::Closed)
    }

    /// True between the start of a close and the completion of the sequence
    pub fn hide_in_progress(&self) -> bool {
        matches!(
            self,
            LifecyclePhase::ClosingRequested | LifecyclePhase::Deferred | LifecyclePhase::Unwinding
        )
    }
}

impl StateTransitions for LifecyclePhase {
    fn on_event(&self, event: u32) -> Option<Self> {
        use lifecycle_events::*;
        use LifecyclePhase::*;

        match (self, event) {
            (Closed, SHOW) => Some(Showing),
            (Showing, CLOSE_REQUESTED) => Some(ClosingRequested),
            (ClosingRequested, DEFERRAL_STARTED) => Some(Deferred),
            // Skip paths go straight to unwinding without a dispatch
            (ClosingRequested, PROCEED) | (Deferred, PROCEED) => Some(Unwinding),
            // A veto puts the overlay back in plain showing
            (ClosingRequested, ABORT) | (Deferred, ABORT) => Some(Showing),
            (Unwinding, FINISHED) => Some(Closed),
            _ => None,
        }
    }
}

// =============================================================================
// Environment
// =============================================================================

/// The collaborators one controller runs against
///
/// Passing the same [`OverlayRegistry`] to several controllers puts them in
/// the same presentation context; they then contend for the same exclusivity
/// slots.
#[derive(Clone)]
pub struct OverlayEnvironment {
    /// Popup/compositing surface and platform services
    pub host: Arc<dyn PresentationHost>,
    /// Focus queries and movement
    pub focus: Arc<dyn FocusLocator>,
    /// Next-tick scheduling
    pub scheduler: Arc<dyn veil_core::scheduler::Scheduler>,
    /// The context's open-overlay registry
    pub registry: OverlayRegistry,
}

// =============================================================================
// Controller state
// =============================================================================

struct ControllerState {
    phase: LifecyclePhase,
    placement_mode: PlacementMode,
    skip_closing_event: bool,
    has_prepared_content: bool,
    is_windowed: bool,
    show_handle: Option<ShowHandle>,
    focused_before_show: Option<ElementId>,
    pending_result: OverlayResult,
    popup: Option<Box<dyn PopupHandle>>,
    smoke: Option<SmokeLayer>,
    alive: Option<Arc<LivenessToken>>,
    open_tick: u64,
    buttons: Vec<OverlayButton>,
    default_button: Option<ButtonKind>,
    button_deferrals: DeferralManager<ButtonClickArgs>,
    subscriptions: SmallVec<[Subscription; 4]>,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: LifecyclePhase::Closed,
            placement_mode: PlacementMode::Undetermined,
            skip_closing_event: false,
            has_prepared_content: false,
            is_windowed: false,
            show_handle: None,
            focused_before_show: None,
            pending_result: OverlayResult::None,
            popup: None,
            smoke: None,
            alive: None,
            open_tick: 0,
            buttons: Vec::new(),
            default_button: None,
            button_deferrals: DeferralManager::new(),
            subscriptions: SmallVec::new(),
        }
    }
}

struct ControllerCore {
    id: u64,
    env: OverlayEnvironment,
    visual: Arc<dyn VisualHandle>,
    state: Mutex<ControllerState>,
    opened: EventSink<OpenedArgs>,
    closing: EventSink<ClosingArgs>,
    closed: EventSink<ClosedArgs>,
    button_click: EventSink<ButtonClickArgs>,
    closing_deferrals: DeferralManager<ClosingArgs>,
}

enum AfterDecision {
    Aborted,
    FinishNow,
    AwaitPopupClosed,
}

enum PopupClosedAction {
    Finish,
    BeginClose,
    Nothing,
}

impl ControllerCore {
    // --- Show ---

    fn show(
        self: &Arc<Self>,
        preference: PlacementPreference,
    ) -> Result<ShowHandle, ShowError> {
        // Validate first; a failed show must leave the controller untouched.
        {
            let state = self.state.lock().unwrap();
            if state.show_handle.is_some() {
                return Err(ShowError::AlreadyShowing);
            }
        }

        let mode = placement::resolve(preference, &*self.visual, &*self.env.host)?;
        let anchor = if mode.is_inline() {
            self.visual.logical_parent()
        } else {
            None
        };
        if self.env.registry.would_conflict(mode, anchor) {
            return Err(ShowError::ConflictingOverlay);
        }

        // Host popup resources next: still fallible, still nothing committed.
        let windowed = preference == PlacementPreference::UnconstrainedOverlay
            && self.env.host.supports_windowed_popups();
        let mut popup = None;
        let mut smoke = None;
        if mode.is_popup_hosted() {
            smoke = Some(SmokeLayer::create(&*self.env.host)?);

            let content = match mode {
                PlacementMode::TransplantedOverlay => PopupContent::TransplantedSubtree,
                _ => PopupContent::WholeControl,
            };
            let mut hosted = self.env.host.host_in_popup(content, windowed)?;
            hosted.set_offset(position::popup_offset(
                self.visual.origin_in_host(),
                self.env.host.flow_direction(),
            ));
            let weak = Arc::downgrade(self);
            hosted.set_on_closed(Arc::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.handle_popup_closed();
                }
            }));
            popup = Some(hosted);
        }

        // Commit.
        let handle = ShowHandle::new();
        {
            let weak = Arc::downgrade(self);
            handle.set_cancel_hook(Arc::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.begin_close(OverlayResult::None);
                }
            }));
        }
        let alive = Arc::new(LivenessToken);
        let focused_before = self.env.focus.focused();

        let mut subscriptions: SmallVec<[Subscription; 4]> = SmallVec::new();
        {
            let weak = Arc::downgrade(self);
            subscriptions.push(self.env.host.register_back_handler(Arc::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.request_close(CloseTrigger::BackRequest);
                }
            })));
        }
        if mode.is_popup_hosted() {
            let weak = Arc::downgrade(self);
            subscriptions.push(self.env.host.subscribe_bounds_changed(Arc::new(
                move |bounds| {
                    if let Some(core) = weak.upgrade() {
                        core.handle_host_bounds_changed(bounds);
                    }
                },
            )));
            let weak = Arc::downgrade(self);
            subscriptions.push(self.env.host.subscribe_flow_changed(Arc::new(move |_| {
                if let Some(core) = weak.upgrade() {
                    core.reposition_popup();
                }
            })));
        }

        let tick;
        {
            let mut state = self.state.lock().unwrap();
            if state.show_handle.is_some() {
                // A host call above re-entered show; keep the first cycle.
                return Err(ShowError::AlreadyShowing);
            }
            state.phase.transition(lifecycle_events::SHOW);
            state.placement_mode = mode;
            state.skip_closing_event = mode.is_popup_hosted();
            state.has_prepared_content = false;
            state.is_windowed = windowed;
            state.show_handle = Some(handle.clone());
            state.focused_before_show = focused_before;
            state.pending_result = OverlayResult::None;
            state.popup = popup;
            state.smoke = smoke;
            state.alive = Some(Arc::clone(&alive));
            state.button_deferrals = DeferralManager::new();
            state.subscriptions = subscriptions;
            state.open_tick += 1;
            tick = state.open_tick;
        }

        if mode.is_inline() {
            self.prepare_content();
        } else {
            if self.visual.is_loaded() {
                self.prepare_content();
            } else {
                let weak = Arc::downgrade(self);
                let sub = self.visual.subscribe_loaded(Arc::new(move || {
                    if let Some(core) = weak.upgrade() {
                        core.prepare_content();
                    }
                }));
                self.state.lock().unwrap().subscriptions.push(sub);
            }
            // One tick later, so a popup detached and reattached within the
            // same tick still replays its enter transition.
            let weak = Arc::downgrade(self);
            self.env.scheduler.run_next_tick(Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.run_deferred_open(tick);
                }
            }));
        }

        self.env.registry.register(self.id, &alive, mode, anchor);
        tracing::debug!(id = self.id, ?mode, handle = handle.id(), "overlay showing");

        if mode.is_inline() {
            self.mark_opened();
        }

        Ok(handle)
    }

    fn run_deferred_open(self: &Arc<Self>, tick: u64) {
        {
            let mut state = self.state.lock().unwrap();
            if state.open_tick != tick || state.phase != LifecyclePhase::Showing {
                // Hide already won this cycle; the popup must never open.
                tracing::debug!(id = self.id, "deferred popup open skipped");
                return;
            }
            if state
                .show_handle
                .as_ref()
                .is_some_and(|h| h.status() == ShowStatus::Canceled)
            {
                return;
            }
            // Smoke layer first, the overlay's popup second.
            if let Some(smoke) = state.smoke.as_mut() {
                smoke.open();
            }
            if let Some(popup) = state.popup.as_mut() {
                popup.open();
            }
        }
        self.mark_opened();
    }

    fn mark_opened(self: &Arc<Self>) {
        let placement = {
            let mut state = self.state.lock().unwrap();
            if !state.phase.is_showing() {
                return;
            }
            state.skip_closing_event = false;
            state.placement_mode
        };
        self.env.host.play_sound(SoundCue::OverlayOpened);
        tracing::debug!(id = self.id, ?placement, "overlay opened");
        self.opened.emit(&OpenedArgs { placement });
    }

    fn prepare_content(self: &Arc<Self>) {
        let default_focus = {
            let mut state = self.state.lock().unwrap();
            if !state.phase.is_showing() || state.has_prepared_content {
                return;
            }
            state.has_prepared_content = true;
            state
                .default_button
                .and_then(|kind| state.buttons.iter().find(|b| b.kind == kind))
                .and_then(|b| b.element)
        };

        self.visual.prepare_for_display();

        let target = default_focus.or_else(|| self.env.focus.first_focusable(self.visual.root()));
        if let Some(element) = target {
            let _ = self.env.focus.set_focus(element);
        }
    }

    // --- Closing sequence ---

    fn begin_close(self: &Arc<Self>, result: OverlayResult) {
        let skip = {
            let mut state = self.state.lock().unwrap();
            if state.show_handle.is_none() || !state.phase.is_showing() {
                // Idempotent: hiding something that is not showing is a no-op.
                return;
            }
            if state.phase.hide_in_progress() {
                return;
            }
            state.phase.transition(lifecycle_events::CLOSE_REQUESTED);
            state.pending_result = result;

            let canceled = state
                .show_handle
                .as_ref()
                .is_some_and(|h| h.status() == ShowStatus::Canceled);
            state.skip_closing_event || canceled
        };

        if skip {
            // Content the user never saw, or a canceled handle: no closing
            // notification, straight to unwinding.
            self.finish_closing_decision(false);
            return;
        }

        let (_generation, in_use) = self.closing_deferrals.prepare();
        if in_use {
            // Two closing cycles on one controller is a sequencing bug in
            // this controller, not app misuse.
            debug_assert!(!in_use, "closing deferral already outstanding");
            tracing::error!(id = self.id, "closing deferral already outstanding");
            self.state
                .lock()
                .unwrap()
                .phase
                .transition(lifecycle_events::ABORT);
            return;
        }

        {
            let mut state = self.state.lock().unwrap();
            state.phase.transition(lifecycle_events::DEFERRAL_STARTED);
        }

        let args = Arc::new(ClosingArgs::new(result, self.closing_deferrals.source()));
        tracing::debug!(id = self.id, ?result, "closing dispatched");
        self.closing.emit(&args);

        let weak = Arc::downgrade(self);
        self.closing_deferrals.continue_with(
            args,
            Box::new(move |args| {
                if let Some(core) = weak.upgrade() {
                    core.finish_closing_decision(args.is_canceled());
                }
            }),
        );
    }

    fn finish_closing_decision(self: &Arc<Self>, canceled: bool) {
        let after = {
            let mut state = self.state.lock().unwrap();
            if !state.phase.hide_in_progress() {
                return;
            }

            let popup_open = state.popup.as_ref().is_some_and(|p| p.is_open());
            if canceled && (state.placement_mode.is_inline() || popup_open) {
                state.phase.transition(lifecycle_events::ABORT);
                tracing::debug!(id = self.id, "close vetoed, overlay stays up");
                AfterDecision::Aborted
            } else {
                state.phase.transition(lifecycle_events::PROCEED);

                // Unwinding: release the slot before completing anything.
                self.env.registry.unregister(self.id);
                state.alive = None;

                if let Some(handle) = &state.show_handle {
                    handle.set_result(state.pending_result);
                }

                if let Some(element) = state.focused_before_show.take() {
                    if !self.env.focus.set_focus(element) {
                        tracing::debug!(id = self.id, "pre-show focus target is gone");
                    }
                }

                if state.placement_mode.is_popup_hosted() {
                    match state.popup.as_mut() {
                        Some(popup) if popup.is_open() => {
                            popup.set_hit_testable(false);
                            popup.close();
                            AfterDecision::AwaitPopupClosed
                        }
                        _ => AfterDecision::FinishNow,
                    }
                } else {
                    AfterDecision::FinishNow
                }
            }
        };

        match after {
            AfterDecision::Aborted | AfterDecision::AwaitPopupClosed => {}
            AfterDecision::FinishNow => self.finish_closing(),
        }
    }

    fn handle_popup_closed(self: &Arc<Self>) {
        let action = {
            let mut state = self.state.lock().unwrap();
            match state.phase {
                LifecyclePhase::Unwinding => {
                    // Reverse of the opening order: the smoke layer goes
                    // down only after the overlay's popup reported closed.
                    if let Some(smoke) = state.smoke.as_mut() {
                        if smoke.is_open() {
                            smoke.close();
                        }
                    }
                    PopupClosedAction::Finish
                }
                LifecyclePhase::Showing => {
                    // The app closed the popup through means other than this
                    // controller; run the closing sequence anyway.
                    tracing::debug!(id = self.id, "popup closed externally");
                    PopupClosedAction::BeginClose
                }
                _ => PopupClosedAction::Nothing,
            }
        };

        match action {
            PopupClosedAction::Finish => self.finish_closing(),
            PopupClosedAction::BeginClose => self.begin_close(OverlayResult::None),
            PopupClosedAction::Nothing => {}
        }
    }

    fn finish_closing(self: &Arc<Self>) {
        let (handle, result, content_shown) = {
            let mut state = self.state.lock().unwrap();
            if state.phase != LifecyclePhase::Unwinding {
                return;
            }
            state.phase.transition(lifecycle_events::FINISHED);

            let handle = state.show_handle.take();
            let result = state.pending_result;
            let content_shown = !state.skip_closing_event;

            state.placement_mode = PlacementMode::Undetermined;
            state.skip_closing_event = false;
            state.has_prepared_content = false;
            state.is_windowed = false;
            state.focused_before_show = None;
            state.pending_result = OverlayResult::None;
            // Dropping the guards detaches every host/visual attachment.
            state.subscriptions.clear();
            // Dropping the popups releases the surfaces and restores any
            // transplanted content to its original container.
            state.popup = None;
            state.smoke = None;
            state.alive = None;
            // A pending click deferral from this cycle must never resolve
            // into a freshly reopened overlay.
            state.button_deferrals.disconnect();

            (handle, result, content_shown)
        };

        tracing::debug!(id = self.id, ?result, "overlay finished closing");

        if content_shown {
            self.env.host.play_sound(SoundCue::OverlayClosed);
            self.closed.emit(&ClosedArgs { result });
        }
        if let Some(handle) = handle {
            handle.complete();
        }
    }

    // --- External close triggers ---

    fn request_close(self: &Arc<Self>, trigger: CloseTrigger) {
        tracing::debug!(id = self.id, ?trigger, "close requested");
        self.begin_close(OverlayResult::None);
    }

    // --- Button clicks ---

    fn command_button_clicked(self: &Arc<Self>, kind: ButtonKind) {
        let (deferrals, command): (DeferralManager<ButtonClickArgs>, Option<OverlayCommand>) = {
            let state = self.state.lock().unwrap();
            if !state.phase.is_showing() || state.phase.hide_in_progress() {
                return;
            }
            (
                state.button_deferrals.clone(),
                state
                    .buttons
                    .iter()
                    .find(|b| b.kind == kind)
                    .and_then(|b| b.command.clone()),
            )
        };

        let (_generation, in_use) = deferrals.prepare();
        if in_use {
            // Rapid double input while a click is still being decided.
            tracing::trace!(id = self.id, ?kind, "button click ignored");
            return;
        }

        let args = Arc::new(ButtonClickArgs::new(kind, deferrals.source()));
        tracing::debug!(id = self.id, ?kind, "button click dispatched");
        self.button_click.emit(&args);

        let weak = Arc::downgrade(self);
        deferrals.continue_with(
            args,
            Box::new(move |args| {
                if args.is_canceled() {
                    return;
                }
                if let Some(command) = &command {
                    command();
                }
                if let Some(core) = weak.upgrade() {
                    core.begin_close(kind.implied_result());
                }
            }),
        );
    }

    // --- Host geometry ---

    fn handle_host_bounds_changed(self: &Arc<Self>, bounds: HostBounds) {
        {
            let mut state = self.state.lock().unwrap();
            if !state.phase.is_showing() {
                return;
            }
            if let Some(smoke) = state.smoke.as_mut() {
                smoke.resize(bounds);
            }
        }
        self.reposition_popup();
    }

    fn reposition_popup(self: &Arc<Self>) {
        let offset = position::popup_offset(
            self.visual.origin_in_host(),
            self.env.host.flow_direction(),
        );
        let mut state = self.state.lock().unwrap();
        if let Some(popup) = state.popup.as_mut() {
            popup.set_offset(offset);
        }
    }
}

// =============================================================================
// OverlayController
// =============================================================================

/// The state machine owning one overlay instance
///
/// See the module docs for the lifecycle. All methods are safe to call
/// re-entrantly from listeners and commands running on the presentation
/// thread.
pub struct OverlayController {
    core: Arc<ControllerCore>,
}

impl OverlayController {
    /// Create a controller for one overlay
    pub fn new(env: OverlayEnvironment, visual: Arc<dyn VisualHandle>) -> Self {
        Self {
            core: Arc::new(ControllerCore {
                id: CONTROLLER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                env,
                visual,
                state: Mutex::new(ControllerState::new()),
                opened: EventSink::new(),
                closing: EventSink::new(),
                closed: EventSink::new(),
                button_click: EventSink::new(),
                closing_deferrals: DeferralManager::new(),
            }),
        }
    }

    /// Process-unique controller id
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// Replace the overlay's action buttons
    pub fn set_buttons(&self, buttons: impl IntoIterator<Item = OverlayButton>) {
        self.core.state.lock().unwrap().buttons = buttons.into_iter().collect();
    }

    /// Mark which button receives initial focus after preparation
    pub fn set_default_button(&self, kind: Option<ButtonKind>) {
        self.core.state.lock().unwrap().default_button = kind;
    }

    /// Show the overlay
    ///
    /// Fails with [`ShowError::AlreadyShowing`] while a show handle is
    /// active, with [`ShowError::ConflictingOverlay`] when the context's
    /// exclusivity invariant would be violated, and with
    /// [`ShowError::InvalidTemplateParts`] when popup hosting parts are
    /// missing. On failure the controller is exactly as it was before the
    /// call.
    pub fn show(&self, preference: PlacementPreference) -> Result<ShowHandle, ShowError> {
        self.core.show(preference)
    }

    /// Start the closing sequence with the supplied result
    ///
    /// A no-op when the overlay is not showing or a close is already in
    /// progress.
    pub fn hide(&self, result: OverlayResult) {
        self.core.begin_close(result);
    }

    /// Route an external close trigger into the closing sequence
    pub fn request_close(&self, trigger: CloseTrigger) {
        self.core.request_close(trigger);
    }

    /// Route a button click into the click sequencing
    pub fn on_command_button_clicked(&self, kind: ButtonKind) {
        self.core.command_button_clicked(kind);
    }

    /// True from the moment show begins acting until teardown completes
    pub fn is_showing(&self) -> bool {
        self.core.state.lock().unwrap().phase.is_showing()
    }

    /// True between the start of a close and the completion of the sequence
    pub fn hide_in_progress(&self) -> bool {
        self.core.state.lock().unwrap().phase.hide_in_progress()
    }

    /// Placement resolved for the current show cycle
    pub fn placement_mode(&self) -> PlacementMode {
        self.core.state.lock().unwrap().placement_mode
    }

    /// Whether the current cycle's popup is unconstrained by host bounds
    pub fn is_windowed(&self) -> bool {
        self.core.state.lock().unwrap().is_windowed
    }

    /// The active show handle, while a cycle is in progress
    pub fn show_handle(&self) -> Option<ShowHandle> {
        self.core.state.lock().unwrap().show_handle.clone()
    }

    /// Listen for the overlay becoming visible
    pub fn on_opened<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&OpenedArgs) + Send + Sync + 'static,
    {
        self.core.opened.subscribe(listener)
    }

    /// Listen for the cancelable closing notification
    pub fn on_closing<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ClosingArgs) + Send + Sync + 'static,
    {
        self.core.closing.subscribe(listener)
    }

    /// Listen for the closed notification with the final result
    pub fn on_closed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ClosedArgs) + Send + Sync + 'static,
    {
        self.core.closed.subscribe(listener)
    }

    /// Listen for cancelable button clicks
    pub fn on_button_click<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ButtonClickArgs) + Send + Sync + 'static,
    {
        self.core.button_click.subscribe(listener)
    }
}

impl std::fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.core.state.lock().unwrap();
        f.debug_struct("OverlayController")
            .field("id", &self.core.id)
            .field("phase", &state.phase)
            .field("placement", &state.placement_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_phase_transitions() {
        use lifecycle_events::*;

        let mut phase = LifecyclePhase::Closed;

        assert!(phase.transition(SHOW));
        assert_eq!(phase, LifecyclePhase::Showing);

        assert!(phase.transition(CLOSE_REQUESTED));
        assert_eq!(phase, LifecyclePhase::ClosingRequested);

        assert!(phase.transition(DEFERRAL_STARTED));
        assert_eq!(phase, LifecyclePhase::Deferred);

        assert!(phase.transition(PROCEED));
        assert_eq!(phase, LifecyclePhase::Unwinding);

        assert!(phase.transition(FINISHED));
        assert_eq!(phase, LifecyclePhase::Closed);
    }

    #[test]
    fn test_veto_returns_to_showing() {
        use lifecycle_events::*;

        let mut phase = LifecyclePhase::Showing;
        phase.transition(CLOSE_REQUESTED);
        phase.transition(DEFERRAL_STARTED);
        assert!(phase.transition(ABORT));
        assert_eq!(phase, LifecyclePhase::Showing);
    }

    #[test]
    fn test_skip_path_bypasses_deferred() {
        use lifecycle_events::*;

        let mut phase = LifecyclePhase::Showing;
        phase.transition(CLOSE_REQUESTED);
        assert!(phase.transition(PROCEED));
        assert_eq!(phase, LifecyclePhase::Unwinding);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        use lifecycle_events::*;

        let mut phase = LifecyclePhase::Closed;
        assert!(!phase.transition(CLOSE_REQUESTED));
        assert!(!phase.transition(FINISHED));
        assert_eq!(phase, LifecyclePhase::Closed);

        phase.transition(SHOW);
        assert!(!phase.transition(SHOW));
    }

    #[test]
    fn test_phase_queries() {
        assert!(!LifecyclePhase::Closed.is_showing());
        assert!(LifecyclePhase::Showing.is_showing());
        assert!(LifecyclePhase::Unwinding.is_showing());

        assert!(!LifecyclePhase::Showing.hide_in_progress());
        assert!(LifecyclePhase::ClosingRequested.hide_in_progress());
        assert!(LifecyclePhase::Deferred.hide_in_progress());
        assert!(LifecyclePhase::Unwinding.hide_in_progress());
    }
}
