use std::fmt;

use thiserror::Error;

use crate::EventName;

/// The reserved error event was emitted while no listener was registered for it.
///
/// Returned by every emit method of [`Emitter`][crate::Emitter] instead of running a dispatch
/// chain. Nobody is listening for errors, so the failure is surfaced to the caller that emitted
/// it. The emitted arguments are handed back and can be recovered via [`into_args()`][Self::into_args].
///
/// # Example
///
/// ```
/// use emit_chain::Emitter;
///
/// let emitter = Emitter::<std::io::Error>::new();
///
/// let error = emitter
///     .emit_bool("error", std::io::Error::other("disk on fire"))
///     .unwrap_err();
///
/// assert_eq!(error.event(), "error");
/// assert_eq!(error.into_args().to_string(), "disk on fire");
/// ```
#[derive(Error)]
#[error("unhandled '{event}' event: no listener is registered for it")]
pub struct UnhandledError<A> {
    event: EventName,
    args: A,
}

impl<A> UnhandledError<A> {
    pub(crate) fn new(event: EventName, args: A) -> Self {
        Self { event, args }
    }

    /// The name of the event that nobody was listening to.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// The arguments the event was emitted with.
    #[must_use]
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Consumes the error, returning the arguments the event was emitted with.
    #[must_use]
    pub fn into_args(self) -> A {
        self.args
    }
}

// The arguments are not required to be `Debug`, so like `std::sync::mpsc::SendError`
// we leave them out of the debug output.
impl<A> fmt::Debug for UnhandledError<A> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnhandledError")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}
