//! Veil Core Runtime
//!
//! This crate provides the foundational primitives for the Veil overlay
//! toolkit:
//!
//! - **Deferrals**: One-shot, generation-stamped async gates that let event
//!   listeners delay or veto an in-progress transition
//! - **Event Sinks**: Ordered listener tables with subscription-guard detach
//! - **State Machines**: Event-driven transition tables for lifecycle states
//! - **Scheduling**: A pluggable "run on the next tick" abstraction
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use veil_core::deferral::DeferralManager;
//!
//! let manager: DeferralManager<String> = DeferralManager::new();
//!
//! // Start a dispatch cycle
//! let (generation, in_use) = manager.prepare();
//! assert!(!in_use);
//!
//! // No listener took a deferral, so the continuation runs immediately
//! let args = Arc::new("closing".to_string());
//! manager.continue_with(args, Box::new(|args| {
//!     assert_eq!(args.as_str(), "closing");
//! }));
//! # let _ = generation;
//! ```

pub mod deferral;
pub mod events;
pub mod fsm;
pub mod scheduler;

pub use deferral::{Deferral, DeferralManager, DeferralSource};
pub use events::{CancelFlag, EventSink, Subscription};
pub use fsm::StateTransitions;
pub use scheduler::{Scheduler, TickCallback};
