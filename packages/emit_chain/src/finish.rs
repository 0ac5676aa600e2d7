use std::cell::RefCell;
use std::fmt;
use std::mem;

use crate::Stats;

/// A callback to run once a dispatch chain reaches its terminal state.
pub(crate) type FinishCallback = Box<dyn FnOnce(&Stats)>;

/// Collects the finish callbacks of one dispatch chain and runs them exactly once.
///
/// Callbacks may be registered at any time before the chain finishes, including from code that
/// runs long after the emit call returned. Registration after the chain finished is handled by
/// the owner of the notifier, which invokes such callbacks directly instead of queueing them.
#[derive(Default)]
pub(crate) struct FinishNotifier {
    callbacks: RefCell<Vec<FinishCallback>>,
}

impl FinishNotifier {
    pub(crate) fn register(&self, callback: FinishCallback) {
        self.callbacks.borrow_mut().push(callback);
    }

    /// Invokes every registered callback in registration order, leaving the notifier empty.
    ///
    /// No borrow is held while a callback runs, so callbacks are free to register more callbacks
    /// (which the owner is expected to invoke directly at that point).
    pub(crate) fn notify(&self, stats: &Stats) {
        let callbacks = mem::take(&mut *self.callbacks.borrow_mut());

        for callback in callbacks {
            callback(stats);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl fmt::Debug for FinishNotifier {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinishNotifier")
            .field("pending", &self.callbacks.borrow().len())
            .finish()
    }
}
