//! One-shot deferrals gating a single event dispatch
//!
//! A [`DeferralManager`] wraps one cancelable notification: the owner calls
//! [`prepare`](DeferralManager::prepare), dispatches its event with args that
//! expose a [`DeferralSource`], and then registers a continuation via
//! [`continue_with`](DeferralManager::continue_with). Listeners that need to
//! answer asynchronously take a [`Deferral`] token off the source; the
//! continuation runs once the last outstanding token resolves (explicitly or
//! by drop), or immediately if no listener took one.
//!
//! Every `prepare` stamps a new generation. Tokens minted for an older
//! generation are inert, so a deferral left over from a discarded dispatch
//! can never resolve into a newer one.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use veil_core::deferral::DeferralManager;
//!
//! let manager: DeferralManager<u32> = DeferralManager::new();
//! let (_generation, in_use) = manager.prepare();
//! assert!(!in_use);
//!
//! // A listener takes a deferral during dispatch
//! let deferral = manager.source().take_deferral();
//!
//! let args = Arc::new(5u32);
//! manager.continue_with(args, Box::new(|args| assert_eq!(*args, 5)));
//!
//! // Continuation runs here, once the token resolves
//! deferral.complete();
//! ```

use std::sync::{Arc, Mutex, Weak};

/// Continuation registered for one dispatch cycle
pub type Continuation<A> = Box<dyn FnOnce(&A) + Send>;

struct ManagerState<A> {
    generation: u64,
    in_use: bool,
    pending: u32,
    resolution: Option<(Arc<A>, Continuation<A>)>,
    disconnected: bool,
}

impl<A> ManagerState<A> {
    fn new() -> Self {
        Self {
            generation: 0,
            in_use: false,
            pending: 0,
            resolution: None,
            disconnected: false,
        }
    }
}

/// One-shot, generation-stamped async gate around a single event dispatch
pub struct DeferralManager<A> {
    state: Arc<Mutex<ManagerState<A>>>,
}

impl<A> Clone for DeferralManager<A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<A> Default for DeferralManager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DeferralManager<A> {
    /// Create a manager with no dispatch in progress
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManagerState::new())),
        }
    }

    /// Begin a dispatch cycle
    ///
    /// Returns `(generation, was_already_in_use)`. When a cycle for the
    /// current generation is still outstanding no new generation is minted
    /// and the second element is true; the caller must not dispatch.
    pub fn prepare(&self) -> (u64, bool) {
        let mut state = self.state.lock().unwrap();
        if state.in_use && !state.disconnected {
            tracing::trace!(
                generation = state.generation,
                "deferral prepare refused, cycle outstanding"
            );
            return (state.generation, true);
        }
        state.generation += 1;
        state.in_use = true;
        state.pending = 0;
        state.resolution = None;
        state.disconnected = false;
        (state.generation, false)
    }

    /// Source handed to dispatched args, stamped with the current generation
    pub fn source(&self) -> DeferralSource<A> {
        let generation = self.state.lock().unwrap().generation;
        DeferralSource {
            state: Arc::downgrade(&self.state),
            generation,
        }
    }

    /// Register the continuation for the current dispatch cycle
    ///
    /// Runs the continuation immediately when no deferral token is
    /// outstanding; otherwise it runs when the last token resolves. The args
    /// are retained so a late-resolving token can still hand them to the
    /// continuation.
    pub fn continue_with(&self, args: Arc<A>, continuation: Continuation<A>) {
        let run_now = {
            let mut state = self.state.lock().unwrap();
            if state.disconnected {
                state.in_use = false;
                return;
            }
            if state.pending == 0 {
                state.in_use = false;
                true
            } else {
                state.resolution = Some((Arc::clone(&args), continuation));
                return;
            }
        };
        if run_now {
            continuation(&args);
        }
    }

    /// Whether a dispatch cycle is currently outstanding
    pub fn is_in_use(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.in_use && !state.disconnected
    }

    /// Invalidate the manager
    ///
    /// Any stored continuation is dropped and outstanding tokens become
    /// inert, so a continuation captured by a discarded owner can never run.
    /// A later `prepare` revives the manager with a fresh generation.
    pub fn disconnect(&self) {
        let mut state = self.state.lock().unwrap();
        state.disconnected = true;
        state.in_use = false;
        state.pending = 0;
        state.resolution = None;
    }
}

/// Cheap handle embedded in dispatched args for taking deferrals
pub struct DeferralSource<A> {
    state: Weak<Mutex<ManagerState<A>>>,
    generation: u64,
}

impl<A> Clone for DeferralSource<A> {
    fn clone(&self) -> Self {
        Self {
            state: Weak::clone(&self.state),
            generation: self.generation,
        }
    }
}

impl<A> DeferralSource<A> {
    /// Take a deferral for the dispatch this source belongs to
    ///
    /// The continuation will not run until the returned token resolves. A
    /// source from a stale generation (or a disconnected manager) yields an
    /// inert token.
    pub fn take_deferral(&self) -> Deferral<A> {
        if let Some(state) = self.state.upgrade() {
            let mut guard = state.lock().unwrap();
            if !guard.disconnected && guard.generation == self.generation {
                guard.pending += 1;
                drop(guard);
                return Deferral {
                    state: Weak::clone(&self.state),
                    generation: self.generation,
                    resolved: false,
                };
            }
        }
        Deferral {
            state: Weak::new(),
            generation: self.generation,
            resolved: true,
        }
    }
}

impl<A> std::fmt::Debug for DeferralSource<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferralSource")
            .field("generation", &self.generation)
            .finish()
    }
}

/// An outstanding deferral token
///
/// Resolves on [`complete`](Deferral::complete) or when dropped, whichever
/// comes first. Resolving the last token for the current generation runs the
/// registered continuation on the resolving call stack.
pub struct Deferral<A> {
    state: Weak<Mutex<ManagerState<A>>>,
    generation: u64,
    resolved: bool,
}

impl<A> Deferral<A> {
    /// Resolve the deferral explicitly
    pub fn complete(mut self) {
        self.resolve();
    }

    fn resolve(&mut self) {
        if self.resolved {
            return;
        }
        self.resolved = true;

        let Some(state) = self.state.upgrade() else {
            return;
        };
        let resolution = {
            let mut guard = state.lock().unwrap();
            if guard.disconnected || guard.generation != self.generation {
                return;
            }
            guard.pending = guard.pending.saturating_sub(1);
            if guard.pending == 0 && guard.resolution.is_some() {
                guard.in_use = false;
                guard.resolution.take()
            } else {
                None
            }
        };
        if let Some((args, continuation)) = resolution {
            tracing::trace!(generation = self.generation, "deferral resolved");
            continuation(&args);
        }
    }
}

impl<A> Drop for Deferral<A> {
    fn drop(&mut self) {
        self.resolve();
    }
}

impl<A> std::fmt::Debug for Deferral<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferral")
            .field("generation", &self.generation)
            .field("resolved", &self.resolved)
            .finish()
    }
}
