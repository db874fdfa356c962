//! End-to-end lifecycle tests driven through scripted host collaborators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use veil_core::deferral::Deferral;
use veil_core::events::CancelFlag;
use veil_overlay::controller::{OverlayController, OverlayEnvironment};
use veil_overlay::error::ShowError;
use veil_overlay::events::{ButtonKind, CloseTrigger, ClosingArgs, OverlayButton};
use veil_overlay::handle::{OverlayResult, ShowStatus};
use veil_overlay::host::{
    AnchorId, ElementId, FlowDirection, HostBounds, Point, PopupContent, SoundCue,
};
use veil_overlay::FocusLocator;
use veil_overlay::placement::{PlacementMode, PlacementPreference};
use veil_overlay::registry::OverlayRegistry;
use veil_testkit::{ManualScheduler, Recorder, ScriptedFocus, ScriptedHost, ScriptedVisual};

struct Fixture {
    scheduler: Arc<ManualScheduler>,
    host: Arc<ScriptedHost>,
    focus: Arc<ScriptedFocus>,
    registry: OverlayRegistry,
}

impl Fixture {
    fn new() -> Self {
        let scheduler = ManualScheduler::new();
        Self {
            host: ScriptedHost::new(Arc::clone(&scheduler)),
            focus: ScriptedFocus::new(),
            registry: OverlayRegistry::new(),
            scheduler,
        }
    }

    fn env(&self) -> OverlayEnvironment {
        OverlayEnvironment {
            host: self.host.clone(),
            focus: self.focus.clone(),
            scheduler: self.scheduler.clone(),
            registry: self.registry.clone(),
        }
    }

    fn controller(&self, visual: &Arc<ScriptedVisual>) -> OverlayController {
        OverlayController::new(self.env(), Arc::clone(visual) as _)
    }
}

fn log_index(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry:?} not in {log:?}"))
}

// --- Full popup cycle ---

#[test]
fn test_popup_show_hide_full_cycle() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    assert_eq!(handle.status(), ShowStatus::Started);
    assert_eq!(fx.registry.open_count(), 1);
    assert_eq!(controller.placement_mode(), PlacementMode::WholeControlOverlay);

    // The popup must not open on the dispatch that created it
    assert!(!recorder.contains("opened"));
    let dialog = fx.host.popups_of(PopupContent::WholeControl)[0].popup.clone();
    let smoke = fx.host.popups_of(PopupContent::SmokeLayer)[0].popup.clone();
    assert!(!dialog.is_open());
    assert!(!smoke.is_open());

    // Content preparation was deferred until the subtree loads
    assert_eq!(visual.prepare_count(), 0);
    visual.finish_loading();
    assert_eq!(visual.prepare_count(), 1);

    fx.scheduler.run_pending();
    assert!(smoke.is_open());
    assert!(dialog.is_open());
    assert!(recorder.contains("opened"));

    // Smoke layer opens first, the overlay's popup second
    let log = fx.host.log();
    assert!(log_index(&log, "open:smoke") < log_index(&log, "open:whole-control"));

    controller.hide(OverlayResult::Primary);
    assert!(recorder.contains("closing:Primary"));
    assert!(!recorder.contains("closed:Primary"));
    assert!(controller.is_showing());
    assert!(controller.hide_in_progress());
    assert!(!dialog.hit_testable());

    // The closed notification arrives on the host's dispatch
    fx.scheduler.run_until_idle();
    assert!(recorder.contains("closed:Primary"));
    assert_eq!(fx.registry.open_count(), 0);
    assert_eq!(handle.status(), ShowStatus::Completed);
    assert_eq!(handle.result(), OverlayResult::Primary);
    assert!(!controller.is_showing());
    assert_eq!(controller.placement_mode(), PlacementMode::Undetermined);

    // Closing order is the reverse of opening
    let log = fx.host.log();
    assert!(log_index(&log, "close:whole-control") < log_index(&log, "close:smoke"));

    assert_eq!(
        fx.host.sounds(),
        vec![SoundCue::OverlayOpened, SoundCue::OverlayClosed]
    );
}

#[test]
fn test_handle_completion_continuation_fires_once() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    let fired = Arc::new(AtomicU32::new(0));
    let f = Arc::clone(&fired);
    handle.on_completed(move |h| {
        assert_eq!(h.result(), OverlayResult::Secondary);
        f.fetch_add(1, Ordering::SeqCst);
    });

    fx.scheduler.run_pending();
    controller.hide(OverlayResult::Secondary);
    controller.hide(OverlayResult::Primary); // re-entrant hide is blocked
    fx.scheduler.run_until_idle();

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

// --- Exclusivity ---

#[test]
fn test_second_popup_overlay_conflicts() {
    let fx = Fixture::new();
    let first = ScriptedVisual::detached(ElementId(10));
    let second = ScriptedVisual::detached(ElementId(20));
    let c1 = fx.controller(&first);
    let c2 = fx.controller(&second);

    let _handle = c1.show(PlacementPreference::Overlay).unwrap();
    let err = c2.show(PlacementPreference::Overlay).unwrap_err();
    assert!(matches!(err, ShowError::ConflictingOverlay));

    // The failed show changed nothing
    assert_eq!(fx.registry.open_count(), 1);
    assert!(!c2.is_showing());
    assert!(c2.show_handle().is_none());

    // Once the first closes, the second succeeds
    c1.hide(OverlayResult::None);
    fx.scheduler.run_until_idle();
    assert_eq!(fx.registry.open_count(), 0);
    c2.show(PlacementPreference::Overlay).unwrap();
    assert_eq!(fx.registry.open_count(), 1);
}

#[test]
fn test_inline_overlays_coexist_under_distinct_anchors() {
    let fx = Fixture::new();
    let first = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let second = ScriptedVisual::attached(ElementId(20), AnchorId(2));
    let c1 = fx.controller(&first);
    let c2 = fx.controller(&second);

    c1.show(PlacementPreference::Inline).unwrap();
    c2.show(PlacementPreference::Inline).unwrap();
    assert_eq!(fx.registry.open_count(), 2);
    assert!(c1.is_showing());
    assert!(c2.is_showing());
}

#[test]
fn test_inline_overlays_conflict_under_same_anchor() {
    let fx = Fixture::new();
    let first = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let second = ScriptedVisual::attached(ElementId(20), AnchorId(1));
    let c1 = fx.controller(&first);
    let c2 = fx.controller(&second);

    c1.show(PlacementPreference::Inline).unwrap();
    let err = c2.show(PlacementPreference::Inline).unwrap_err();
    assert!(matches!(err, ShowError::ConflictingOverlay));
    assert_eq!(fx.registry.open_count(), 1);
}

#[test]
fn test_inline_and_popup_do_not_conflict() {
    let fx = Fixture::new();
    let inline = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let floating = ScriptedVisual::detached(ElementId(20));
    let c1 = fx.controller(&inline);
    let c2 = fx.controller(&floating);

    c1.show(PlacementPreference::Inline).unwrap();
    c2.show(PlacementPreference::Overlay).unwrap();
    assert_eq!(fx.registry.open_count(), 2);
}

// --- Idempotent hide ---

#[test]
fn test_hide_when_not_showing_is_noop() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    controller.hide(OverlayResult::Primary);
    assert!(recorder.events().is_empty());
    assert!(!controller.is_showing());
    assert_eq!(fx.registry.open_count(), 0);
}

// --- Skip on fast close ---

#[test]
fn test_hide_before_open_tick_skips_popup_and_notifications() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    // Hide lands before the deferred open tick runs
    controller.hide(OverlayResult::None);
    fx.scheduler.run_until_idle();

    let dialog = fx.host.popups_of(PopupContent::WholeControl)[0].popup.clone();
    let smoke = fx.host.popups_of(PopupContent::SmokeLayer)[0].popup.clone();
    assert!(!dialog.ever_opened(), "popup must never open");
    assert!(!smoke.ever_opened(), "smoke layer must never open");

    assert!(!recorder.contains("closing:None"));
    assert!(!recorder.contains("closed:None"));
    assert!(!recorder.contains("opened"));
    assert!(fx.host.sounds().is_empty());

    // The handle still completes exactly once
    assert_eq!(handle.status(), ShowStatus::Completed);
    assert_eq!(handle.result(), OverlayResult::None);
    assert_eq!(fx.registry.open_count(), 0);
    assert!(!controller.is_showing());
}

// --- Cancelable close ---

#[test]
fn test_closing_veto_keeps_overlay_up() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    let veto = controller.on_closing(|args| args.cancel());
    controller.hide(OverlayResult::Primary);

    assert!(recorder.contains("closing:Primary"));
    assert!(controller.is_showing());
    assert!(!controller.hide_in_progress());
    assert_eq!(handle.status(), ShowStatus::Started);
    assert_eq!(fx.registry.open_count(), 1);
    let dialog = fx.host.popups_of(PopupContent::WholeControl)[0].popup.clone();
    assert!(dialog.is_open());

    // Without the veto the overlay closes normally
    drop(veto);
    controller.hide(OverlayResult::Primary);
    fx.scheduler.run_until_idle();
    assert_eq!(handle.status(), ShowStatus::Completed);
    assert!(!controller.is_showing());
}

#[test]
fn test_deferred_closing_veto() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    type Taken = (CancelFlag, Deferral<ClosingArgs>);
    let slot: Arc<Mutex<Option<Taken>>> = Arc::new(Mutex::new(None));
    let s = Arc::clone(&slot);
    let _sub = controller.on_closing(move |args| {
        *s.lock().unwrap() = Some((args.cancel_flag(), args.defer()));
    });

    controller.hide(OverlayResult::None);
    // The close is gated on the deferral
    assert!(controller.hide_in_progress());
    assert!(controller.is_showing());

    let (flag, deferral) = slot.lock().unwrap().take().unwrap();
    flag.cancel();
    deferral.complete();

    assert!(controller.is_showing());
    assert!(!controller.hide_in_progress());
}

#[test]
fn test_veto_is_ignored_once_popup_is_gone() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    type Taken = (CancelFlag, Deferral<ClosingArgs>);
    let slot: Arc<Mutex<Option<Taken>>> = Arc::new(Mutex::new(None));
    let s = Arc::clone(&slot);
    let _sub = controller.on_closing(move |args| {
        *s.lock().unwrap() = Some((args.cancel_flag(), args.defer()));
    });

    controller.hide(OverlayResult::None);
    let dialog = fx.host.popups_of(PopupContent::WholeControl)[0].popup.clone();
    let smoke = fx.host.popups_of(PopupContent::SmokeLayer)[0].popup.clone();

    // The app closes the popup while the deferral is outstanding
    dialog.force_close();
    fx.scheduler.run_until_idle();

    // A veto cannot keep up an overlay whose popup is already gone
    let (flag, deferral) = slot.lock().unwrap().take().unwrap();
    flag.cancel();
    deferral.complete();
    fx.scheduler.run_until_idle();

    assert!(!controller.is_showing());
    assert_eq!(handle.status(), ShowStatus::Completed);
    assert_eq!(fx.registry.open_count(), 0);
    assert!(!smoke.is_open());
}

// --- Handle cancellation ---

#[test]
fn test_canceled_handle_unwinds_without_closing_notification() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    let fired = Arc::new(AtomicU32::new(0));
    let f = Arc::clone(&fired);
    handle.on_completed(move |h| {
        assert_eq!(h.status(), ShowStatus::Canceled);
        f.fetch_add(1, Ordering::SeqCst);
    });

    handle.cancel();
    fx.scheduler.run_until_idle();

    // No closing notification for a canceled handle
    assert!(!recorder.contains("closing:None"));
    assert!(recorder.contains("closed:None"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(handle.status(), ShowStatus::Canceled);
    assert_eq!(fx.registry.open_count(), 0);
    assert!(!controller.is_showing());

    let dialog = fx.host.popups_of(PopupContent::WholeControl)[0].popup.clone();
    assert!(!dialog.is_open());
}

// --- Focus ---

#[test]
fn test_focus_moves_in_and_is_restored() {
    let fx = Fixture::new();
    fx.focus.add_element(ElementId(100));
    fx.focus.focus(ElementId(100));
    fx.focus
        .set_focusables(ElementId(10), vec![ElementId(11), ElementId(12)]);

    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let controller = fx.controller(&visual);

    controller.show(PlacementPreference::Inline).unwrap();
    assert_eq!(fx.focus.focused(), Some(ElementId(11)));

    controller.hide(OverlayResult::None);
    assert_eq!(fx.focus.focused(), Some(ElementId(100)));
}

#[test]
fn test_focus_restore_skips_dead_element() {
    let fx = Fixture::new();
    fx.focus.add_element(ElementId(100));
    fx.focus.focus(ElementId(100));
    fx.focus.set_focusables(ElementId(10), vec![ElementId(11)]);

    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let controller = fx.controller(&visual);

    controller.show(PlacementPreference::Inline).unwrap();
    fx.focus.remove_element(ElementId(100));

    controller.hide(OverlayResult::None);
    // The dead element cannot regain focus; whatever held it keeps it
    assert_eq!(fx.focus.focused(), Some(ElementId(11)));
    assert!(!controller.is_showing());
}

#[test]
fn test_default_button_receives_initial_focus() {
    let fx = Fixture::new();
    fx.focus.add_element(ElementId(21));
    fx.focus
        .set_focusables(ElementId(10), vec![ElementId(11), ElementId(21)]);

    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let controller = fx.controller(&visual);
    controller.set_buttons([
        OverlayButton::new(ButtonKind::Primary).element(ElementId(21)),
        OverlayButton::new(ButtonKind::Close),
    ]);
    controller.set_default_button(Some(ButtonKind::Primary));

    controller.show(PlacementPreference::Inline).unwrap();
    assert_eq!(fx.focus.focused(), Some(ElementId(21)));
}

// --- Button clicks ---

#[test]
fn test_button_click_runs_command_then_hides() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let runs = Arc::new(AtomicU32::new(0));
    let r = Arc::clone(&runs);
    controller.set_buttons([OverlayButton::new(ButtonKind::Primary).command(move || {
        r.fetch_add(1, Ordering::SeqCst);
    })]);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    controller.on_command_button_clicked(ButtonKind::Primary);
    fx.scheduler.run_until_idle();

    assert!(recorder.contains("click:Primary"));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(recorder.contains("closed:Primary"));
    assert_eq!(handle.result(), OverlayResult::Primary);
    assert_eq!(handle.status(), ShowStatus::Completed);
}

#[test]
fn test_button_click_veto_blocks_command_and_close() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let runs = Arc::new(AtomicU32::new(0));
    let r = Arc::clone(&runs);
    controller.set_buttons([OverlayButton::new(ButtonKind::Primary).command(move || {
        r.fetch_add(1, Ordering::SeqCst);
    })]);

    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    let _veto = controller.on_button_click(|args| args.cancel());
    controller.on_command_button_clicked(ButtonKind::Primary);
    fx.scheduler.run_until_idle();

    assert!(recorder.contains("click:Primary"));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(controller.is_showing());
    assert!(!recorder.contains("closing:Primary"));
}

#[test]
fn test_rapid_second_click_is_ignored_while_deferral_outstanding() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let clicks = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&clicks);
    let slot = Arc::new(Mutex::new(None));
    let s = Arc::clone(&slot);
    let _sub = controller.on_button_click(move |args| {
        c.fetch_add(1, Ordering::SeqCst);
        *s.lock().unwrap() = Some(args.defer());
    });

    let runs = Arc::new(AtomicU32::new(0));
    let r = Arc::clone(&runs);
    controller.set_buttons([OverlayButton::new(ButtonKind::Primary).command(move || {
        r.fetch_add(1, Ordering::SeqCst);
    })]);

    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    controller.on_command_button_clicked(ButtonKind::Primary);
    controller.on_command_button_clicked(ButtonKind::Primary);
    assert_eq!(clicks.load(Ordering::SeqCst), 1);

    let deferral: Deferral<_> = slot.lock().unwrap().take().unwrap();
    deferral.complete();
    fx.scheduler.run_until_idle();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!controller.is_showing());
}

#[test]
fn test_button_close_composes_with_closing_veto() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    controller.set_buttons([OverlayButton::new(ButtonKind::Close)]);
    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    // The app vetoes the overall close; the button's own intent went through
    let _veto = controller.on_closing(|args| args.cancel());
    controller.on_command_button_clicked(ButtonKind::Close);
    fx.scheduler.run_until_idle();

    assert!(recorder.contains("click:Close"));
    assert!(recorder.contains("closing:None"));
    assert!(controller.is_showing());

    // The click deferral cycle completed, so the button works again
    controller.on_command_button_clicked(ButtonKind::Close);
    assert_eq!(
        recorder.events().iter().filter(|e| *e == "click:Close").count(),
        2
    );
}

#[test]
fn test_stale_click_deferral_cannot_act_on_reopened_overlay() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let runs = Arc::new(AtomicU32::new(0));
    let r = Arc::clone(&runs);
    controller.set_buttons([OverlayButton::new(ButtonKind::Primary).command(move || {
        r.fetch_add(1, Ordering::SeqCst);
    })]);

    let slot = Arc::new(Mutex::new(None));
    let s = Arc::clone(&slot);
    let sub = controller.on_button_click(move |args| {
        *s.lock().unwrap() = Some(args.defer());
    });

    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();
    controller.on_command_button_clicked(ButtonKind::Primary);

    // The overlay closes while the click deferral is still outstanding
    controller.hide(OverlayResult::None);
    fx.scheduler.run_until_idle();
    assert!(!controller.is_showing());

    // A fresh cycle begins; the stale deferral must be inert
    drop(sub);
    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    let deferral: Deferral<_> = slot.lock().unwrap().take().unwrap();
    deferral.complete();
    assert_eq!(runs.load(Ordering::SeqCst), 0, "stale click must not run");
    assert!(controller.is_showing());

    // The fresh cycle's button path still works
    controller.on_command_button_clicked(ButtonKind::Primary);
    fx.scheduler.run_until_idle();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!controller.is_showing());
}

// --- External close paths ---

#[test]
fn test_externally_closed_popup_still_finishes() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    let dialog = fx.host.popups_of(PopupContent::WholeControl)[0].popup.clone();
    dialog.force_close();
    fx.scheduler.run_until_idle();

    assert!(recorder.contains("closing:None"));
    assert!(recorder.contains("closed:None"));
    assert_eq!(handle.status(), ShowStatus::Completed);
    assert_eq!(fx.registry.open_count(), 0);
    assert!(!controller.is_showing());
}

#[test]
fn test_back_request_closes_overlay() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();
    assert_eq!(fx.host.back_handler_count(), 1);

    assert_eq!(fx.host.press_back(), 1);
    fx.scheduler.run_until_idle();

    assert_eq!(handle.status(), ShowStatus::Completed);
    assert_eq!(handle.result(), OverlayResult::None);
    // Teardown dropped the registration
    assert_eq!(fx.host.back_handler_count(), 0);
}

#[test]
fn test_escape_and_light_dismiss_funnel_into_closing() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    controller.request_close(CloseTrigger::Escape);
    // A second trigger while the close is in flight is ignored
    controller.request_close(CloseTrigger::LightDismiss);
    fx.scheduler.run_until_idle();

    assert_eq!(
        recorder
            .events()
            .iter()
            .filter(|e| e.starts_with("closing:"))
            .count(),
        1
    );
    assert!(recorder.contains("closed:None"));
    assert_eq!(handle.result(), OverlayResult::None);
    assert_eq!(handle.status(), ShowStatus::Completed);
}

// --- Host geometry ---

#[test]
fn test_smoke_layer_spans_viewport_and_tracks_bounds() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();

    let smoke = fx.host.popups_of(PopupContent::SmokeLayer)[0].popup.clone();
    assert_eq!(smoke.size(), Some((800.0, 600.0)));

    fx.host.set_bounds(HostBounds::new(1024.0, 768.0));
    assert_eq!(smoke.size(), Some((1024.0, 768.0)));

    assert_eq!(fx.host.bounds_sub_count(), 1);
    controller.hide(OverlayResult::None);
    fx.scheduler.run_until_idle();
    assert_eq!(fx.host.bounds_sub_count(), 0);
}

#[test]
fn test_popup_offset_tracks_origin_and_flow() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    visual.set_origin(Point::new(30.0, 40.0));
    let controller = fx.controller(&visual);

    controller.show(PlacementPreference::Overlay).unwrap();
    assert_eq!(controller.placement_mode(), PlacementMode::TransplantedOverlay);
    fx.scheduler.run_pending();

    let dialog = fx.host.popups_of(PopupContent::TransplantedSubtree)[0]
        .popup
        .clone();
    assert_eq!(dialog.offset(), Point::new(-30.0, -40.0));

    // The horizontal offset flips sign under right-to-left flow
    fx.host.set_flow(FlowDirection::RightToLeft);
    assert_eq!(dialog.offset(), Point::new(30.0, -40.0));
}

#[test]
fn test_windowed_popup_honors_host_capability() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    controller
        .show(PlacementPreference::UnconstrainedOverlay)
        .unwrap();
    assert!(controller.is_windowed());
    assert!(fx.host.popups_of(PopupContent::WholeControl)[0].windowed);
    controller.hide(OverlayResult::None);
    fx.scheduler.run_until_idle();

    fx.host.set_supports_windowed(false);
    controller
        .show(PlacementPreference::UnconstrainedOverlay)
        .unwrap();
    assert!(!controller.is_windowed());
    assert!(!fx.host.popups_of(PopupContent::WholeControl)[1].windowed);
}

// --- Show errors ---

#[test]
fn test_show_while_showing_fails() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let handle = controller.show(PlacementPreference::Overlay).unwrap();
    let err = controller.show(PlacementPreference::Overlay).unwrap_err();
    assert!(matches!(err, ShowError::AlreadyShowing));

    // The active cycle is untouched
    assert_eq!(controller.show_handle().unwrap().id(), handle.id());
    assert_eq!(fx.registry.open_count(), 1);
}

#[test]
fn test_missing_transplant_parts_fails_cleanly() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    visual.set_transplant_parts(false);
    let controller = fx.controller(&visual);

    let err = controller.show(PlacementPreference::Overlay).unwrap_err();
    assert!(matches!(err, ShowError::InvalidTemplateParts));
    assert!(!controller.is_showing());
    assert_eq!(fx.registry.open_count(), 0);
    assert!(fx.host.popups().is_empty());

    // Inline still works on the same controller
    controller.show(PlacementPreference::Inline).unwrap();
    assert!(controller.is_showing());
}

// --- Inline placement ---

#[test]
fn test_inline_show_opens_without_popups_or_ticks() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let controller = fx.controller(&visual);
    let recorder = Recorder::new();
    recorder.attach(&controller);

    controller.show(PlacementPreference::Inline).unwrap();
    assert_eq!(controller.placement_mode(), PlacementMode::Inline);
    assert!(recorder.contains("opened"));
    assert!(fx.host.popups().is_empty());
    assert_eq!(visual.prepare_count(), 1);

    controller.hide(OverlayResult::Secondary);
    // Inline teardown completes synchronously
    assert!(recorder.contains("closed:Secondary"));
    assert!(!controller.is_showing());
}

#[test]
fn test_inline_closing_veto_keeps_overlay_up() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::attached(ElementId(10), AnchorId(1));
    let controller = fx.controller(&visual);

    controller.show(PlacementPreference::Inline).unwrap();
    let _veto = controller.on_closing(|args| args.cancel());

    controller.hide(OverlayResult::None);
    assert!(controller.is_showing());
    assert!(!controller.hide_in_progress());
    assert_eq!(fx.registry.open_count(), 1);
}

// --- Controller reuse ---

#[test]
fn test_controller_reuse_across_cycles() {
    let fx = Fixture::new();
    let visual = ScriptedVisual::detached(ElementId(10));
    let controller = fx.controller(&visual);

    let first = controller.show(PlacementPreference::Overlay).unwrap();
    fx.scheduler.run_pending();
    controller.hide(OverlayResult::Primary);
    fx.scheduler.run_until_idle();
    assert_eq!(first.status(), ShowStatus::Completed);

    let second = controller.show(PlacementPreference::Overlay).unwrap();
    assert!(second.id() > first.id());
    fx.scheduler.run_pending();
    controller.hide(OverlayResult::Secondary);
    fx.scheduler.run_until_idle();

    assert_eq!(second.status(), ShowStatus::Completed);
    assert_eq!(second.result(), OverlayResult::Secondary);
    assert_eq!(first.result(), OverlayResult::Primary);
}
