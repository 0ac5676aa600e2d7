use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::Control;

/// The name of an event.
///
/// Typically event names are `&'static str` but for rare cases when the exact
/// set of events is not known in advance, we also support owned strings via `Cow`.
pub type EventName = Cow<'static, str>;

/// A listener as stored by the emitter and snapshotted by a dispatch chain.
pub(crate) type Listener<A> = Rc<dyn Fn(&A, &Control)>;

/// Identifies one listener registration on an [`Emitter`][crate::Emitter].
///
/// Returned by the registration methods and accepted by [`Emitter::off()`][crate::Emitter::off].
/// Registering the same closure twice yields two different identifiers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ListenerId {
    #[cfg_attr(test, mutants::skip)] // No API contract for the display format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener #{}", self.0)
    }
}
