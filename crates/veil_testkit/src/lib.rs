//! Veil Test Kit
//!
//! Deterministic, scripted stand-ins for the collaborators the overlay
//! lifecycle needs, so the full show/close machinery runs in tests without a
//! live windowing environment:
//!
//! - [`ManualScheduler`]: queued ticks pumped explicitly by the test
//! - [`ScriptedHost`] / [`SharedPopup`]: records popup hosting, open/close
//!   ordering and offsets; delivers closed notifications on the next tick
//! - [`ScriptedFocus`]: an in-memory focus table with killable elements
//! - [`ScriptedVisual`]: a controllable visual subtree (attachment, loaded
//!   state, anchor, origin)
//! - [`Recorder`]: captures the controller's notifications as a flat event
//!   trace for ordering assertions
//!
//! # Example
//!
//! ```ignore
//! let scheduler = ManualScheduler::new();
//! let host = ScriptedHost::new(Arc::clone(&scheduler));
//! let focus = ScriptedFocus::new();
//! let visual = ScriptedVisual::detached();
//!
//! let env = OverlayEnvironment {
//!     host: host.clone(),
//!     focus: focus.clone(),
//!     scheduler: scheduler.clone(),
//!     registry: OverlayRegistry::new(),
//! };
//! let controller = OverlayController::new(env, visual.clone());
//!
//! let handle = controller.show(PlacementPreference::Overlay).unwrap();
//! scheduler.run_until_idle(); // popup opens here
//! ```

mod focus;
mod host;
mod recorder;
mod scheduler;
mod visual;

pub use focus::ScriptedFocus;
pub use host::{PopupRecord, ScriptedHost, SharedPopup};
pub use recorder::Recorder;
pub use scheduler::ManualScheduler;
pub use visual::ScriptedVisual;
