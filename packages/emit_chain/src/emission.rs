use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::{ChainState, Emitter, EventName, ResultTransform};

/// A snapshot of the statistics of one dispatch chain.
///
/// Passed to finish callbacks registered via [`Emission::ready()`] and returned by
/// [`Emission::stats()`]. A snapshot does not change when the chain makes progress.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stats {
    event: EventName,
    running: bool,
    aborted: bool,
    listeners: usize,
    executed: usize,
}

impl Stats {
    pub(crate) const fn new(
        event: EventName,
        running: bool,
        aborted: bool,
        listeners: usize,
        executed: usize,
    ) -> Self {
        Self {
            event,
            running,
            aborted,
            listeners,
            executed,
        }
    }

    /// The name of the event the chain dispatched.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether the chain had not yet reached its terminal state when the snapshot was taken.
    ///
    /// Always `false` in the snapshot given to finish callbacks.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a listener aborted the chain.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// The number of listeners that were registered when the event was emitted.
    #[must_use]
    pub const fn listeners(&self) -> usize {
        self.listeners
    }

    /// The number of listeners that have been invoked.
    #[must_use]
    pub const fn executed(&self) -> usize {
        self.executed
    }
}

/// The result of emitting an event via [`Emitter::emit_object()`].
///
/// The accessors observe the dispatch chain as it is at the time of the call, so an emission that
/// reports [`is_running()`][Self::is_running] now may report otherwise later, once a suspended
/// listener resumes the chain. To be notified when the chain finishes, register a callback via
/// [`ready()`][Self::ready].
///
/// Cloning an emission is cheap; clones observe the same chain.
///
/// # Example
///
/// ```
/// use emit_chain::{Control, Emitter};
///
/// let emitter = Emitter::<()>::new();
/// emitter.on("tick", |_: &(), _: &Control| {});
///
/// let emission = emitter.emit_object("tick", ()).unwrap();
///
/// assert_eq!(emission.event(), "tick");
/// assert!(!emission.is_running());
/// assert_eq!(emission.listeners(), 1);
/// assert_eq!(emission.executed(), 1);
/// ```
#[derive(Clone)]
pub struct Emission {
    chain: Rc<ChainState>,
}

impl Emission {
    pub(crate) const fn new(chain: Rc<ChainState>) -> Self {
        Self { chain }
    }

    /// Registers a callback to run once the chain reaches its terminal state.
    ///
    /// Callbacks run exactly once, in registration order, after the last listener resolved (or
    /// a listener aborted the chain). If the chain has already finished, the callback runs
    /// immediately, before this method returns.
    ///
    /// Returns `self` so that registrations can be chained.
    ///
    /// # Example
    ///
    /// ```
    /// use emit_chain::{Control, Emitter};
    ///
    /// let emitter = Emitter::<()>::new();
    /// emitter.on("tick", |_: &(), control: &Control| control.abort());
    ///
    /// emitter
    ///     .emit_object("tick", ())
    ///     .unwrap()
    ///     .ready(|stats| assert!(stats.is_aborted()))
    ///     .ready(|stats| assert!(!stats.is_running()));
    /// ```
    pub fn ready<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&Stats) + 'static,
    {
        self.chain.on_finish(Box::new(callback));
        self
    }

    /// Forwards the completion of the chain to another emitter as a `"ready"` event.
    ///
    /// Once the chain finishes, `target` dispatches `"ready"` with the final [`Stats`] as its
    /// arguments. The target is kept alive until then.
    ///
    /// # Example
    ///
    /// ```
    /// use std::rc::Rc;
    ///
    /// use emit_chain::{Control, Emitter, Stats};
    ///
    /// let emitter = Emitter::<u8>::new();
    /// emitter.on("load", |_: &u8, _: &Control| {});
    ///
    /// let monitor = Rc::new(Emitter::<Stats>::new());
    /// monitor.on("ready", |stats: &Stats, _: &Control| {
    ///     assert_eq!(stats.event(), "load");
    /// });
    ///
    /// emitter.emit_object("load", 1).unwrap().ready_via(&monitor);
    /// ```
    pub fn ready_via<T>(&self, target: &Rc<Emitter<Stats, T>>) -> &Self
    where
        T: ResultTransform + 'static,
    {
        let target = Rc::clone(target);

        self.ready(move |stats| {
            if let Err(error) = target.emit_object("ready", stats.clone()) {
                warn!(%error, "finish notification was not delivered");
            }
        })
    }

    /// The name of the event being dispatched.
    #[must_use]
    pub fn event(&self) -> &str {
        self.chain.event()
    }

    /// Whether the chain has not yet reached its terminal state.
    ///
    /// A chain whose listener suspended it and never resumes it stays running forever.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.chain.is_running()
    }

    /// Whether a listener aborted the chain.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.chain.is_aborted()
    }

    /// The number of listeners that were registered when the event was emitted.
    #[must_use]
    pub fn listeners(&self) -> usize {
        self.chain.listeners()
    }

    /// The number of listeners invoked so far.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.chain.executed()
    }

    /// Takes a snapshot of the current statistics of the chain.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.chain.stats()
    }
}

impl fmt::Debug for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emission")
            .field("stats", &self.stats())
            .finish()
    }
}
