//! Overlay notifications and action buttons
//!
//! The controller raises four notifications over one show cycle: `opened`,
//! `closing`, `closed` and `button_click`. Closing and button clicks carry
//! cancelable args; a listener flips the cancel flag to veto the transition,
//! or takes a deferral off the args to answer asynchronously before the
//! controller inspects the flag.

use std::sync::Arc;

use veil_core::deferral::{Deferral, DeferralSource};
use veil_core::events::CancelFlag;

use crate::handle::OverlayResult;
use crate::host::ElementId;
use crate::placement::PlacementMode;

/// Command invoked when a button's click goes through
pub type OverlayCommand = Arc<dyn Fn() + Send + Sync>;

/// The action buttons an overlay exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    /// The primary action
    Primary,
    /// The secondary action
    Secondary,
    /// The dismissing action
    Close,
}

impl ButtonKind {
    /// The show result a click on this button implies
    pub fn implied_result(self) -> OverlayResult {
        match self {
            ButtonKind::Primary => OverlayResult::Primary,
            ButtonKind::Secondary => OverlayResult::Secondary,
            ButtonKind::Close => OverlayResult::None,
        }
    }
}

/// One configured action button
#[derive(Clone)]
pub struct OverlayButton {
    /// Which slot this button occupies
    pub kind: ButtonKind,
    /// Command to run when the click goes through; parameters are captured
    /// by the closure
    pub command: Option<OverlayCommand>,
    /// The button's focusable element, used for default-button focus
    pub element: Option<ElementId>,
}

impl OverlayButton {
    /// Create a button with no command
    pub fn new(kind: ButtonKind) -> Self {
        Self {
            kind,
            command: None,
            element: None,
        }
    }

    /// Set the command invoked when the click goes through
    pub fn command<F>(mut self, command: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.command = Some(Arc::new(command));
        self
    }

    /// Set the button's focusable element
    pub fn element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }
}

impl std::fmt::Debug for OverlayButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayButton")
            .field("kind", &self.kind)
            .field("has_command", &self.command.is_some())
            .field("element", &self.element)
            .finish()
    }
}

/// External close triggers outside the button path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloseTrigger {
    /// Escape key
    Escape,
    /// Platform back navigation
    BackRequest,
    /// Interaction outside the overlay (smoke layer click)
    LightDismiss,
}

/// Args for the `opened` notification
#[derive(Clone, Copy, Debug)]
pub struct OpenedArgs {
    /// Placement resolved for this show cycle
    pub placement: PlacementMode,
}

/// Cancelable, deferrable args for the `closing` notification
pub struct ClosingArgs {
    result: OverlayResult,
    cancel: CancelFlag,
    deferral: DeferralSource<ClosingArgs>,
}

impl ClosingArgs {
    pub(crate) fn new(result: OverlayResult, deferral: DeferralSource<ClosingArgs>) -> Self {
        Self {
            result,
            cancel: CancelFlag::new(),
            deferral,
        }
    }

    /// The result the overlay will close with
    pub fn result(&self) -> OverlayResult {
        self.result
    }

    /// Veto the close; the overlay stays open
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Overwrite the veto
    pub fn set_canceled(&self, canceled: bool) {
        self.cancel.set_canceled(canceled);
    }

    /// Whether a listener vetoed the close
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// A clone of the cancel flag, for deciding after the dispatch returns
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Take a deferral to answer asynchronously
    pub fn defer(&self) -> Deferral<ClosingArgs> {
        self.deferral.take_deferral()
    }
}

impl std::fmt::Debug for ClosingArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosingArgs")
            .field("result", &self.result)
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

/// Args for the `closed` notification
#[derive(Clone, Copy, Debug)]
pub struct ClosedArgs {
    /// The final result of the show cycle
    pub result: OverlayResult,
}

/// Cancelable, deferrable args for a button's click notification
pub struct ButtonClickArgs {
    button: ButtonKind,
    cancel: CancelFlag,
    deferral: DeferralSource<ButtonClickArgs>,
}

impl ButtonClickArgs {
    pub(crate) fn new(button: ButtonKind, deferral: DeferralSource<ButtonClickArgs>) -> Self {
        Self {
            button,
            cancel: CancelFlag::new(),
            deferral,
        }
    }

    /// Which button was clicked
    pub fn button(&self) -> ButtonKind {
        self.button
    }

    /// Veto the click; no command runs and the overlay stays open
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether a listener vetoed the click
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// A clone of the cancel flag, for deciding after the dispatch returns
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Take a deferral to answer asynchronously
    pub fn defer(&self) -> Deferral<ButtonClickArgs> {
        self.deferral.take_deferral()
    }
}

impl std::fmt::Debug for ButtonClickArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ButtonClickArgs")
            .field("button", &self.button)
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
