use std::fmt;
use std::marker::PhantomData;

use crate::{Emitter, EventName, PassThrough, ResultTransform};

/// The reserved error event name used unless configured otherwise.
pub const DEFAULT_ERROR_EVENT: &str = "error";

/// Creates instances of [`Emitter`].
///
/// Use `Emitter::builder()` to create a new instance of this builder. There are no required
/// parameters; [`Emitter::new()`] is equivalent to building with all defaults.
///
/// # Example
///
/// ```
/// use emit_chain::{Control, Emitter, ExecutedAny};
///
/// let emitter = Emitter::<String>::builder()
///     .error_event("failure")
///     .returns(ExecutedAny)
///     .build();
///
/// emitter.on("message", |_: &String, _: &Control| {});
///
/// assert!(emitter.emit("message", "hi".to_string()).unwrap());
/// assert!(emitter.emit("failure", "bad".to_string()).is_err());
/// ```
pub struct EmitterBuilder<A, T = PassThrough> {
    error_event: EventName,
    transform: T,

    _args: PhantomData<fn(&A)>,
}

impl<A> EmitterBuilder<A> {
    pub(crate) fn new() -> Self {
        Self {
            error_event: EventName::Borrowed(DEFAULT_ERROR_EVENT),
            transform: PassThrough,
            _args: PhantomData,
        }
    }
}

impl<A, T> EmitterBuilder<A, T>
where
    A: 'static,
    T: ResultTransform,
{
    /// Sets the name of the reserved error event.
    ///
    /// Emitting this event while no listener is registered for it fails with
    /// [`UnhandledError`][crate::UnhandledError] instead of dispatching.
    ///
    /// The default is [`DEFAULT_ERROR_EVENT`].
    #[must_use]
    pub fn error_event(self, name: impl Into<EventName>) -> Self {
        Self {
            error_event: name.into(),
            ..self
        }
    }

    /// Sets the transform that decides what [`Emitter::emit()`] returns.
    ///
    /// The default is [`PassThrough`], returning the [`Emission`][crate::Emission] itself.
    #[must_use]
    pub fn returns<U>(self, transform: U) -> EmitterBuilder<A, U>
    where
        U: ResultTransform,
    {
        EmitterBuilder {
            error_event: self.error_event,
            transform,
            _args: PhantomData,
        }
    }

    /// Builds the emitter.
    #[must_use]
    pub fn build(self) -> Emitter<A, T> {
        Emitter::from_parts(self.error_event, self.transform)
    }
}

impl<A, T> fmt::Debug for EmitterBuilder<A, T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("error_event", &self.error_event)
            .finish_non_exhaustive()
    }
}
