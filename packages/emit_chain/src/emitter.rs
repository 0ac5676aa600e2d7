use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{
    Chain, Control, Emission, EmitterBuilder, EventName, ListenerId, PassThrough, Registry,
    ResultTransform, UnhandledError,
};

/// An event emitter whose listeners can suspend, resume and abort the dispatch chain.
///
/// Listeners are closures invoked with the emitted arguments of type `A` and a [`Control`]
/// handle for their invocation. Multiple values are typically emitted as a tuple. Listeners that
/// ignore the handle run back-to-back in registration order, like in a conventional emitter.
///
/// Each emission snapshots the listeners registered for the event at that moment. Registering
/// or removing listeners afterwards (including from within a listener) does not affect
/// emissions already in progress.
///
/// There are three emit methods, differing only in what they return:
///
/// * [`emit_object()`][Self::emit_object] returns the [`Emission`], which reports on the chain
///   and accepts finish callbacks.
/// * [`emit_bool()`][Self::emit_bool] returns whether any listener was invoked by the time the
///   call returned.
/// * [`emit()`][Self::emit] returns whatever the configured [`ResultTransform`] makes of the
///   [`Emission`]; by default the [`Emission`] itself.
///
/// All of them fail with [`UnhandledError`] when the reserved error event is emitted while no
/// listener is registered for it.
///
/// This type is single-threaded. Listeners may capture an `Rc` of the emitter to register
/// listeners or emit events themselves.
///
/// # Example
///
/// ```
/// use emit_chain::{Control, Emitter};
///
/// let emitter = Emitter::<(u32, bool)>::new();
///
/// emitter.on("event1", |(number, flag): &(u32, bool), _: &Control| {
///     println!("called with {number} and {flag}");
/// });
///
/// assert!(emitter.emit_bool("event1", (42, true)).unwrap());
/// assert!(!emitter.emit_bool("event2", (42, true)).unwrap());
/// ```
pub struct Emitter<A, T = PassThrough> {
    registry: RefCell<Registry<A>>,
    error_event: EventName,
    transform: T,
}

impl<A> Emitter<A>
where
    A: 'static,
{
    /// Creates an emitter with the default configuration.
    ///
    /// To customize the emitter, use [`builder()`][Self::builder].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for configuring an emitter.
    #[must_use]
    pub fn builder() -> EmitterBuilder<A> {
        EmitterBuilder::new()
    }
}

impl<A> Default for Emitter<A>
where
    A: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> Emitter<A, T>
where
    A: 'static,
    T: ResultTransform,
{
    pub(crate) fn from_parts(error_event: EventName, transform: T) -> Self {
        Self {
            registry: RefCell::new(Registry::new()),
            error_event,
            transform,
        }
    }

    /// Registers a listener for `event`, after any listeners already registered for it.
    ///
    /// The same closure can be registered multiple times; each registration is invoked.
    pub fn on<F>(&self, event: impl Into<EventName>, listener: F) -> ListenerId
    where
        F: Fn(&A, &Control) + 'static,
    {
        self.registry
            .borrow_mut()
            .append(event.into(), Rc::new(listener), false)
    }

    /// Registers a listener for `event`, before any listeners already registered for it.
    pub fn prepend<F>(&self, event: impl Into<EventName>, listener: F) -> ListenerId
    where
        F: Fn(&A, &Control) + 'static,
    {
        self.registry
            .borrow_mut()
            .prepend(event.into(), Rc::new(listener), false)
    }

    /// Registers a listener that takes part in only the next emission of `event`.
    ///
    /// The listener is removed when that emission takes its snapshot, before any listener runs,
    /// so it is not invoked again even if the emission is suspended and the event emitted anew.
    ///
    /// # Example
    ///
    /// ```
    /// use emit_chain::{Control, Emitter};
    ///
    /// let emitter = Emitter::<()>::new();
    /// emitter.once("connect", |_: &(), _: &Control| println!("connected"));
    ///
    /// assert!(emitter.emit_bool("connect", ()).unwrap());
    /// assert!(!emitter.emit_bool("connect", ()).unwrap());
    /// ```
    pub fn once<F>(&self, event: impl Into<EventName>, listener: F) -> ListenerId
    where
        F: Fn(&A, &Control) + 'static,
    {
        self.registry
            .borrow_mut()
            .append(event.into(), Rc::new(listener), true)
    }

    /// Removes a listener registration from `event`.
    ///
    /// Returns `false` if the listener was not (or no longer) registered for `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.registry.borrow_mut().remove(event, id)
    }

    /// Removes every listener registered for `event`, returning how many were removed.
    pub fn remove_all(&self, event: &str) -> usize {
        self.registry.borrow_mut().remove_all(event)
    }

    /// The number of listeners currently registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.borrow().count(event)
    }

    /// The names of all events that currently have at least one listener, in no particular order.
    #[must_use]
    pub fn event_names(&self) -> Vec<EventName> {
        self.registry.borrow().event_names()
    }

    /// The name of the reserved error event.
    #[must_use]
    pub fn error_event(&self) -> &str {
        &self.error_event
    }

    /// Emits `event`, returning what the configured [`ResultTransform`] makes of the
    /// [`Emission`].
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledError`] if `event` is the reserved error event and no listener is
    /// registered for it. No listener is invoked in that case.
    pub fn emit(
        &self,
        event: impl Into<EventName>,
        args: A,
    ) -> Result<T::Output, UnhandledError<A>> {
        self.emit_object(event, args)
            .map(|emission| self.transform.transform(emission))
    }

    /// Emits `event`, returning the [`Emission`] that reports on the dispatch chain.
    ///
    /// The call returns once the chain has finished or a listener has suspended it. Use
    /// [`Emission::ready()`] to learn when a suspended chain finishes.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledError`] if `event` is the reserved error event and no listener is
    /// registered for it. No listener is invoked in that case.
    pub fn emit_object(
        &self,
        event: impl Into<EventName>,
        args: A,
    ) -> Result<Emission, UnhandledError<A>> {
        let event = event.into();

        // The borrow must end before any listener runs, as listeners may use the registry.
        let listeners = self.registry.borrow_mut().snapshot(&event);

        if listeners.is_empty() && event == self.error_event {
            return Err(UnhandledError::new(event, args));
        }

        let chain = Chain::new(event, listeners, args);
        let emission = Emission::new(chain.state_rc());

        chain.start();

        Ok(emission)
    }

    /// Emits `event`, returning whether any listener was invoked by the time the call returned.
    ///
    /// For chains that no listener suspends, this means whether there was any listener at all.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledError`] if `event` is the reserved error event and no listener is
    /// registered for it. No listener is invoked in that case.
    pub fn emit_bool(
        &self,
        event: impl Into<EventName>,
        args: A,
    ) -> Result<bool, UnhandledError<A>> {
        self.emit_object(event, args)
            .map(|emission| emission.executed() > 0)
    }
}

impl<A, T> fmt::Debug for Emitter<A, T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("registry", &self.registry)
            .field("error_event", &self.error_event)
            .finish_non_exhaustive()
    }
}
