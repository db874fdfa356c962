//! Async show handles
//!
//! `show` returns a [`ShowHandle`]: the caller's view of one show/close
//! cycle. The handle carries a process-unique id, the cycle's status and its
//! final result, and fires a completion continuation exactly once when the
//! cycle finishes. The caller may cancel the handle while the overlay is
//! still up; the controller then unwinds without dispatching the closing
//! notification, and the continuation still fires so the caller can observe
//! the canceled status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Global counter for unique show handle ids.
static SHOW_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Outcome of one show/close cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverlayResult {
    /// Closed without a button choice (light dismiss, escape, programmatic)
    #[default]
    None,
    /// The primary action was chosen
    Primary,
    /// The secondary action was chosen
    Secondary,
}

/// Status of a show handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShowStatus {
    /// The show cycle is in progress
    Started,
    /// The caller canceled the cycle before a result was produced
    Canceled,
    /// The cycle finished and the result is final
    Completed,
}

/// Continuation invoked exactly once when the cycle finishes
pub type CompletionFn = Box<dyn FnOnce(&ShowHandle) + Send>;

/// Hook the controller installs to react to an external cancel
pub(crate) type CancelHook = Arc<dyn Fn() + Send + Sync>;

struct HandleInner {
    status: ShowStatus,
    result: OverlayResult,
    continuation: Option<CompletionFn>,
    fired: bool,
    cancel_hook: Option<CancelHook>,
}

/// The async, cancelable, single-result handle returned by show
///
/// Cheap to clone; clones observe the same cycle.
#[derive(Clone)]
pub struct ShowHandle {
    id: u64,
    inner: Arc<Mutex<HandleInner>>,
}

impl ShowHandle {
    pub(crate) fn new() -> Self {
        Self {
            id: SHOW_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(Mutex::new(HandleInner {
                status: ShowStatus::Started,
                result: OverlayResult::None,
                continuation: None,
                fired: false,
                cancel_hook: None,
            })),
        }
    }

    /// Process-unique, monotonically increasing id
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current status of the cycle
    pub fn status(&self) -> ShowStatus {
        self.inner.lock().unwrap().status
    }

    /// Result value; final once the handle completes
    pub fn result(&self) -> OverlayResult {
        self.inner.lock().unwrap().result
    }

    /// Cancel the cycle externally
    ///
    /// A no-op once the handle has completed. The owning controller still
    /// unwinds its state and releases its resources, but the closing
    /// notification is not dispatched.
    pub fn cancel(&self) {
        let hook = {
            let mut inner = self.inner.lock().unwrap();
            if inner.status != ShowStatus::Started {
                return;
            }
            inner.status = ShowStatus::Canceled;
            inner.cancel_hook.clone()
        };
        tracing::debug!(id = self.id, "show handle canceled");
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Register the completion continuation
    ///
    /// Fires exactly once, when the cycle finishes; registering after
    /// completion fires immediately. The handle's status at that point is
    /// either `Completed` or `Canceled`.
    pub fn on_completed<F>(&self, continuation: F)
    where
        F: FnOnce(&ShowHandle) + Send + 'static,
    {
        let run_now = {
            let mut inner = self.inner.lock().unwrap();
            if inner.fired {
                true
            } else {
                inner.continuation = Some(Box::new(continuation));
                return;
            }
        };
        if run_now {
            continuation(self);
        }
    }

    pub(crate) fn set_cancel_hook(&self, hook: CancelHook) {
        self.inner.lock().unwrap().cancel_hook = Some(hook);
    }

    pub(crate) fn set_result(&self, result: OverlayResult) {
        let mut inner = self.inner.lock().unwrap();
        if inner.status != ShowStatus::Completed {
            inner.result = result;
        }
    }

    /// Finish the cycle and fire the continuation exactly once
    pub(crate) fn complete(&self) {
        let continuation = {
            let mut inner = self.inner.lock().unwrap();
            if inner.fired {
                return;
            }
            inner.fired = true;
            if inner.status == ShowStatus::Started {
                inner.status = ShowStatus::Completed;
            }
            inner.cancel_hook = None;
            inner.continuation.take()
        };
        tracing::debug!(id = self.id, status = ?self.status(), "show handle completed");
        if let Some(continuation) = continuation {
            continuation(self);
        }
    }
}

impl std::fmt::Debug for ShowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("result", &self.result())
            .finish()
    }
}
