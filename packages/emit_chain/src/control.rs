use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::{Drive, Slot};

/// Flow control over one listener invocation of a dispatch chain.
///
/// Every listener invocation receives its own handle. A listener that ignores the handle behaves
/// like a plain synchronous listener: as soon as it returns, the chain continues with the next
/// listener. To take control, the listener uses one of:
///
/// * [`wait()`][Self::wait] or [`wait_with()`][Self::wait_with] to keep the chain suspended after
///   the listener returns, until it is resumed via [`next()`][Self::next] or terminated via
///   [`abort()`][Self::abort].
/// * [`abort()`][Self::abort] to terminate the chain, skipping all remaining listeners.
///
/// A handle is valid only for the invocation it was issued for. Once the invocation resolves
/// (via `next()`, `abort()` or the completion of a `wait_with()` resolver), or once the listener
/// returns without suspending the chain, every operation on the handle is a silent no-op. Clones
/// are the same handle, so a listener can retain a clone and resume the chain from any code path.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use emit_chain::{Control, Emitter};
///
/// let emitter = Emitter::<()>::new();
/// let parked: Rc<RefCell<Option<Control>>> = Rc::default();
///
/// emitter.on("save", {
///     let parked = Rc::clone(&parked);
///     move |_: &(), control: &Control| {
///         control.wait();
///         *parked.borrow_mut() = Some(control.clone());
///     }
/// });
///
/// let emission = emitter.emit_object("save", ()).unwrap();
/// assert!(emission.is_running());
///
/// let control = parked.borrow_mut().take().unwrap();
/// control.next();
/// assert!(!emission.is_running());
///
/// // The handle has been used up; this does nothing.
/// control.next();
/// ```
#[derive(Clone)]
pub struct Control {
    chain: Rc<dyn Drive>,
    slot: Rc<Slot>,
}

impl Control {
    pub(crate) fn new(chain: Rc<dyn Drive>, slot: Rc<Slot>) -> Self {
        Self { chain, slot }
    }

    /// Declares this listener done and continues with the next listener.
    ///
    /// Effective once, and only while the chain can still advance. If the chain is suspended, it
    /// resumes on the caller's stack, so this call returns only once the chain has finished or
    /// has been suspended again by a later listener.
    pub fn next(&self) {
        let state = self.chain.state();

        if !self.slot.is_live() || !state.can_advance() {
            trace!(event = state.event(), "ignoring next() on a resolved handle");
            return;
        }

        self.slot.neutralize();
        state.release();

        Rc::clone(&self.chain).drive();
    }

    /// Terminates the chain. No further listener is invoked.
    ///
    /// The first abort of a chain wins: once any handle has aborted the chain, every operation on
    /// every handle of that chain is a no-op. Finish callbacks observe the chain as aborted.
    ///
    /// A listener invocation that is in progress is not interrupted; only further ones are
    /// prevented.
    pub fn abort(&self) {
        let state = self.chain.state();

        if !self.slot.is_live() || !state.abort() {
            trace!(event = state.event(), "ignoring abort() on a resolved handle");
            return;
        }

        self.slot.neutralize();

        Rc::clone(&self.chain).drive();
    }

    /// Keeps the chain suspended after the listener returns.
    ///
    /// The listener is responsible for eventually calling [`next()`][Self::next] or
    /// [`abort()`][Self::abort] on this handle (or a clone of it). Until then, the emission is
    /// reported as running. If neither ever happens, the chain stays suspended forever.
    ///
    /// Only the first call per listener invocation has any effect.
    pub fn wait(&self) {
        self.begin_wait();
    }

    /// Suspends the chain and hands its continuation to `resolver`.
    ///
    /// The resolver is invoked immediately with a secondary handle and a single-use [`Done`]
    /// completion. Both resolve the same invocation as this handle does: whichever of the
    /// listener or the resolver resolves it first wins, and later attempts by the other side are
    /// silently ignored. The secondary handle cannot wait again.
    ///
    /// Only the first call to [`wait()`][Self::wait] or `wait_with()` per listener invocation
    /// has any effect; later calls do not invoke the resolver.
    ///
    /// # Example
    ///
    /// ```
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use emit_chain::{Control, Done, Emitter};
    ///
    /// let emitter = Emitter::<()>::new();
    /// let pending: Rc<RefCell<Option<Done>>> = Rc::default();
    ///
    /// emitter.on("fetch", {
    ///     let pending = Rc::clone(&pending);
    ///     move |_: &(), control: &Control| {
    ///         let pending = Rc::clone(&pending);
    ///         control.wait_with(move |_secondary, done| {
    ///             *pending.borrow_mut() = Some(done);
    ///         });
    ///     }
    /// });
    ///
    /// let emission = emitter.emit_object("fetch", ()).unwrap();
    /// assert!(emission.is_running());
    ///
    /// // The asynchronous operation completes.
    /// pending.borrow_mut().take().unwrap().next();
    /// assert!(!emission.is_running());
    /// ```
    pub fn wait_with<F>(&self, resolver: F)
    where
        F: FnOnce(Self, Done),
    {
        if self.begin_wait() {
            resolver(self.clone(), Done::new(self.clone()));
        }
    }

    /// Whether operations on this handle still have any effect.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.slot.is_live() && self.chain.state().can_advance()
    }

    /// The name of the event being dispatched.
    #[must_use]
    pub fn event(&self) -> &str {
        self.chain.state().event()
    }

    fn begin_wait(&self) -> bool {
        let state = self.chain.state();

        if !self.slot.is_live() || !state.can_advance() || !self.slot.mark_waited() {
            trace!(event = state.event(), "ignoring wait() on a resolved or waiting handle");
            return false;
        }

        state.suspend();
        true
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("event", &self.event())
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

/// Single-use completion of a [`Control::wait_with()`] resolver.
///
/// Consuming the completion resolves the listener invocation, unless the listener (or the
/// resolver's secondary handle) already did, in which case it does nothing. Dropping it without
/// using it leaves the chain suspended.
#[must_use = "the chain stays suspended until the completion is used"]
pub struct Done {
    control: Control,
}

impl Done {
    const fn new(control: Control) -> Self {
        Self { control }
    }

    /// Resolves the invocation successfully; the chain continues with the next listener.
    pub fn next(self) {
        self.control.next();
    }

    /// Resolves the invocation by aborting the chain.
    pub fn abort(self) {
        self.control.abort();
    }

    /// Resolves the invocation from the outcome of an operation.
    ///
    /// `Ok` continues the chain like [`next()`][Self::next]; `Err` aborts it like
    /// [`abort()`][Self::abort]. The error itself is discarded.
    #[expect(
        clippy::needless_pass_by_value,
        reason = "taking the outcome by value lets callers pass operation results directly"
    )]
    pub fn finish<E>(self, result: Result<(), E>) {
        match result {
            Ok(()) => self.next(),
            Err(_) => self.abort(),
        }
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("control", &self.control)
            .finish()
    }
}
