#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in emit_chain packages.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How long a test may run before the watchdog declares it hung.
const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs a test with a timeout to prevent infinite hangs.
///
/// A dispatch chain that is resumed incorrectly can loop forever instead of failing, so tests
/// that drive chains run on a separate thread and fail if they do not complete in time.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test function is executed directly, so that mutation testing can detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout or if the test itself panics.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has already timed out.
        drop(tx.send(result));
    });

    match rx.recv_timeout(WATCHDOG_TIMEOUT) {
        Ok(result) => {
            test_handle.join().expect("test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded the {WATCHDOG_TIMEOUT:?} watchdog timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => unreachable!("test thread exited without sending a result or panicking"),
            Err(payload) => std::panic::resume_unwind(payload),
        },
    }
}

/// An ordered record of what happened during a test, shared by the listeners that record it.
///
/// Clones record into the same journal.
///
/// # Example
///
/// ```rust
/// use testing::Journal;
///
/// let journal = Journal::new();
/// let recorder = journal.clone();
///
/// recorder.record("first");
/// journal.record("second");
///
/// assert_eq!(journal.entries(), ["first", "second"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<&'static str>>>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: &'static str) {
        self.entries.borrow_mut().push(entry);
    }

    /// The entries recorded so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<&'static str> {
        self.entries.borrow().clone()
    }
}
