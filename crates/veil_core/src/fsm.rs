//! Event-driven state transitions
//!
//! Lifecycle states in Veil are plain enums that advance by handling numeric
//! events. A transition table lives in the enum's `on_event` implementation;
//! callers drive it and observe whether a transition actually happened.
//!
//! # Example
//!
//! ```rust
//! use veil_core::fsm::StateTransitions;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Light {
//!     Red,
//!     Green,
//! }
//!
//! const GO: u32 = 1;
//! const STOP: u32 = 2;
//!
//! impl StateTransitions for Light {
//!     fn on_event(&self, event: u32) -> Option<Self> {
//!         match (self, event) {
//!             (Light::Red, GO) => Some(Light::Green),
//!             (Light::Green, STOP) => Some(Light::Red),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! assert_eq!(Light::Red.on_event(GO), Some(Light::Green));
//! assert_eq!(Light::Red.on_event(STOP), None);
//! ```

use std::hash::Hash;

/// Trait for enum states that advance via numeric events
pub trait StateTransitions:
    Clone + Copy + PartialEq + Eq + Hash + Send + Sync + std::fmt::Debug + 'static
{
    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: u32) -> Option<Self>;

    /// Apply an event in place, returning true if a transition happened
    fn transition(&mut self, event: u32) -> bool {
        if let Some(next) = self.on_event(event) {
            *self = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Toggle {
        Off,
        On,
    }

    const FLIP: u32 = 1;

    impl StateTransitions for Toggle {
        fn on_event(&self, event: u32) -> Option<Self> {
            match (self, event) {
                (Toggle::Off, FLIP) => Some(Toggle::On),
                (Toggle::On, FLIP) => Some(Toggle::Off),
                _ => None,
            }
        }
    }

    #[test]
    fn test_transition_applies_in_place() {
        let mut state = Toggle::Off;
        assert!(state.transition(FLIP));
        assert_eq!(state, Toggle::On);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let mut state = Toggle::Off;
        assert!(!state.transition(99));
        assert_eq!(state, Toggle::Off);
    }
}
