//! The dispatch chain of one emitted event.
//!
//! A chain walks the listener snapshot of one emission in order. Each listener invocation gets a
//! fresh [`Control`] bound to its own [`Slot`]; the slot is the validity token of that handle.
//!
//! State transitions:
//!
//! ```text
//! Idle -> Running -> (Suspended <-> Running) -> Finished (aborted or not)
//! ```
//!
//! The loop is iterative. While it is on the stack (`active`), handle operations only update the
//! flags and return; the loop observes them once the current listener returns. When the loop is
//! not on the stack (the chain is suspended), a handle operation re-enters the loop itself, on
//! whatever call stack the operation was invoked from.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::{Control, EventName, FinishCallback, FinishNotifier, Listener, Stats};

/// Validity token shared by all handles issued for one listener invocation.
#[derive(Debug)]
pub(crate) struct Slot {
    /// Whether `next()`, `abort()` and `wait()` still have any effect.
    live: Cell<bool>,

    /// Whether `wait()` has already been used for this invocation.
    waited: Cell<bool>,
}

impl Slot {
    fn new() -> Self {
        Self {
            live: Cell::new(true),
            waited: Cell::new(false),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Renders every handle of this invocation inert.
    pub(crate) fn neutralize(&self) {
        self.live.set(false);
    }

    /// Marks `wait()` as used. Returns `false` if it had already been used.
    pub(crate) fn mark_waited(&self) -> bool {
        !self.waited.replace(true)
    }
}

/// Resumes the dispatch loop of a chain without knowing its argument type.
pub(crate) trait Drive {
    fn state(&self) -> &ChainState;

    /// Runs the dispatch loop until the chain suspends or finishes.
    ///
    /// Returns immediately if the loop is already running further up the stack.
    fn drive(self: Rc<Self>);
}

/// The per-emission state that outlives the listener snapshot and arguments.
///
/// This is what an [`Emission`][crate::Emission] observes.
pub(crate) struct ChainState {
    event: EventName,
    listeners: usize,

    /// Index of the next listener to invoke.
    cursor: Cell<usize>,
    executed: Cell<usize>,

    can_advance: Cell<bool>,
    aborted: Cell<bool>,
    suspended: Cell<bool>,
    finished: Cell<bool>,

    /// Whether the dispatch loop is on the stack right now.
    active: Cell<bool>,

    /// The slot of the most recent listener invocation, neutralized once the chain moves on.
    current: RefCell<Option<Rc<Slot>>>,

    finish: FinishNotifier,
}

impl ChainState {
    fn new(event: EventName, listeners: usize) -> Self {
        Self {
            event,
            listeners,
            cursor: Cell::new(0),
            executed: Cell::new(0),
            can_advance: Cell::new(true),
            aborted: Cell::new(false),
            suspended: Cell::new(false),
            finished: Cell::new(false),
            active: Cell::new(false),
            current: RefCell::new(None),
            finish: FinishNotifier::default(),
        }
    }

    pub(crate) fn event(&self) -> &str {
        &self.event
    }

    pub(crate) fn listeners(&self) -> usize {
        self.listeners
    }

    pub(crate) fn executed(&self) -> usize {
        self.executed.get()
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.finished.get() && self.can_advance.get()
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.get()
    }

    pub(crate) fn can_advance(&self) -> bool {
        self.can_advance.get()
    }

    pub(crate) fn stats(&self) -> Stats {
        Stats::new(
            self.event.clone(),
            self.is_running(),
            self.is_aborted(),
            self.listeners,
            self.executed(),
        )
    }

    /// Queues a finish callback, or runs it right away if the chain has already finished.
    pub(crate) fn on_finish(&self, callback: FinishCallback) {
        if self.finished.get() {
            callback(&self.stats());
        } else {
            self.finish.register(callback);
        }
    }

    pub(crate) fn suspend(&self) {
        self.suspended.set(true);
        debug!(event = %self.event, executed = self.executed(), "chain suspended");
    }

    pub(crate) fn release(&self) {
        self.suspended.set(false);
    }

    /// Stops the chain from invoking any further listener.
    ///
    /// Returns `false` if the chain could no longer advance anyway, in which case nothing changes.
    pub(crate) fn abort(&self) -> bool {
        if !self.can_advance.replace(false) {
            return false;
        }

        self.aborted.set(true);
        self.suspended.set(false);
        debug!(event = %self.event, executed = self.executed(), "chain aborted");
        true
    }

    /// Creates the slot for the next listener invocation, retiring the previous one.
    fn issue_slot(&self) -> Rc<Slot> {
        let slot = Rc::new(Slot::new());

        if let Some(previous) = self.current.replace(Some(Rc::clone(&slot))) {
            previous.neutralize();
        }

        slot
    }

    fn retire_current(&self) {
        if let Some(current) = self.current.borrow_mut().take() {
            current.neutralize();
        }
    }

    fn advance_cursor(&self) {
        self.cursor.set(
            self.cursor
                .get()
                .checked_add(1)
                .expect("cursor never exceeds the listener count, which fits in usize"),
        );
        self.executed.set(
            self.executed
                .get()
                .checked_add(1)
                .expect("executed count never exceeds the cursor, which fits in usize"),
        );
    }
}

impl fmt::Debug for ChainState {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainState")
            .field("event", &self.event)
            .field("listeners", &self.listeners)
            .field("cursor", &self.cursor.get())
            .field("executed", &self.executed.get())
            .field("can_advance", &self.can_advance.get())
            .field("aborted", &self.aborted.get())
            .field("suspended", &self.suspended.get())
            .field("finished", &self.finished.get())
            .field("active", &self.active.get())
            .field("finish", &self.finish)
            .finish_non_exhaustive()
    }
}

/// The dispatch chain of one emission: the shared state plus what only the loop needs.
///
/// The listener snapshot and the arguments are released as soon as the chain finishes.
pub(crate) struct Chain<A> {
    state: Rc<ChainState>,
    listeners: RefCell<Option<Rc<[Listener<A>]>>>,
    args: RefCell<Option<Rc<A>>>,
}

impl<A> Chain<A>
where
    A: 'static,
{
    pub(crate) fn new(event: EventName, listeners: Vec<Listener<A>>, args: A) -> Rc<Self> {
        Rc::new(Self {
            state: Rc::new(ChainState::new(event, listeners.len())),
            listeners: RefCell::new(Some(listeners.into())),
            args: RefCell::new(Some(Rc::new(args))),
        })
    }

    pub(crate) fn state_rc(&self) -> Rc<ChainState> {
        Rc::clone(&self.state)
    }

    /// Starts the dispatch loop. Returns once the chain has finished or is suspended.
    pub(crate) fn start(self: Rc<Self>) {
        debug!(
            event = %self.state.event,
            listeners = self.state.listeners,
            "chain started"
        );

        self.drive();
    }

    /// The listener at `index` together with the arguments to invoke it with.
    fn invocation(&self, index: usize) -> Option<(Listener<A>, Rc<A>)> {
        let listener = self.listeners.borrow().as_ref()?.get(index).cloned()?;
        let args = self.args.borrow().as_ref().map(Rc::clone)?;

        Some((listener, args))
    }

    fn finish(&self) {
        let state = &self.state;

        state.retire_current();

        if state.finished.replace(true) {
            return;
        }

        state.can_advance.set(false);
        state.suspended.set(false);

        // Nothing of the emission except its statistics is needed anymore.
        drop(self.listeners.borrow_mut().take());
        drop(self.args.borrow_mut().take());

        debug!(
            event = %state.event,
            listeners = state.listeners,
            executed = state.executed(),
            aborted = state.is_aborted(),
            "chain finished"
        );

        state.finish.notify(&state.stats());
    }
}

impl<A> Drive for Chain<A>
where
    A: 'static,
{
    fn state(&self) -> &ChainState {
        &self.state
    }

    fn drive(self: Rc<Self>) {
        let state = Rc::clone(&self.state);

        if state.active.replace(true) {
            // The loop further up the stack picks up whatever the caller changed.
            return;
        }

        // A panicking listener leaves the chain as it was, but must not leave it marked as
        // active, otherwise a retained handle could never resume it.
        let _active = scopeguard::guard((), |()| state.active.set(false));

        loop {
            if !state.can_advance.get() {
                break;
            }

            if state.suspended.get() {
                return;
            }

            let Some((listener, args)) = self.invocation(state.cursor.get()) else {
                state.can_advance.set(false);
                break;
            };

            state.advance_cursor();
            let slot = state.issue_slot();
            let control = Control::new(Rc::clone(&self) as Rc<dyn Drive>, Rc::clone(&slot));

            listener(&*args, &control);

            if !state.suspended.get() {
                // The listener is done with its handle, whether it used it or not.
                slot.neutralize();
            }
        }

        self.finish();
    }
}

impl<A> fmt::Debug for Chain<A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
