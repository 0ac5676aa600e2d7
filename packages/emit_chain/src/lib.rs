#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! An event emitter whose listeners can take control of the dispatch chain.
//!
//! A classic event emitter invokes every listener of an event back-to-back and returns once the
//! last one is done. The [`Emitter`] in this crate does the same for listeners that ignore the
//! flow-control features, but every listener also receives a [`Control`] handle for its own
//! invocation that lets it:
//!
//! * [`wait()`][Control::wait] - suspend the chain until the listener later resumes it,
//!   from any code path (a timer, an I/O completion, another event).
//! * [`next()`][Control::next] - finish this listener and continue with the next one.
//! * [`abort()`][Control::abort] - terminate the chain; no further listeners are invoked.
//!
//! The emit call returns as soon as the chain either finishes or becomes suspended. The returned
//! [`Emission`] reports the state of the chain and accepts [`ready()`][Emission::ready] callbacks
//! that run exactly once when the chain reaches its end (or immediately, if it already has).
//!
//! This is a single-threaded mechanism: "asynchronous" means the chain can be suspended on one
//! call stack and resumed on another, never that two listeners run at the same time.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use emit_chain::{Control, Emitter};
//!
//! let emitter = Emitter::<String>::new();
//!
//! // Handles retained by listeners so the chain can be resumed later.
//! let parked: Rc<RefCell<Option<Control>>> = Rc::default();
//!
//! emitter.on("greet", |name: &String, _: &Control| println!("hello, {name}"));
//! emitter.on("greet", {
//!     let parked = Rc::clone(&parked);
//!     move |_: &String, control: &Control| {
//!         control.wait();
//!         *parked.borrow_mut() = Some(control.clone());
//!     }
//! });
//! emitter.on("greet", |name: &String, _: &Control| println!("goodbye, {name}"));
//!
//! let emission = emitter.emit_object("greet", "world".to_string()).unwrap();
//! assert!(emission.is_running());
//! assert_eq!(emission.executed(), 2);
//!
//! emission.ready(|stats| println!("{} listeners executed", stats.executed()));
//!
//! // Some time later...
//! parked.borrow_mut().take().unwrap().next();
//! assert!(!emission.is_running());
//! assert_eq!(emission.executed(), 3);
//! ```
//!
//! # Waiting with a resolver
//!
//! [`Control::wait_with()`] hands continuation to a resolver that receives a secondary handle
//! and a single-use [`Done`] completion. Whichever of the listener or the resolver resolves the
//! invocation first wins; the other side's later attempts are silently ignored.
//!
//! ```
//! use emit_chain::{Control, Emitter};
//!
//! let emitter = Emitter::<u32>::new();
//!
//! emitter.on("job", |_: &u32, control: &Control| {
//!     control.wait_with(|_secondary, done| {
//!         // Hand `done` to some asynchronous operation; here we complete synchronously.
//!         done.finish(Err::<(), _>("disk full"));
//!     });
//! });
//! emitter.on("job", |_: &u32, _: &Control| unreachable!("the chain was aborted"));
//!
//! let emission = emitter.emit_object("job", 7).unwrap();
//! assert!(emission.is_aborted());
//! assert_eq!(emission.executed(), 1);
//! ```
//!
//! # Reserved error event
//!
//! Emitting the reserved error event (by default `"error"`, see
//! [`EmitterBuilder::error_event()`]) while no listener is registered for it does not run a chain
//! at all. Instead, every emit method returns [`UnhandledError`], handing the arguments back.

mod builder;
mod chain;
mod control;
mod emission;
mod emitter;
mod error;
mod finish;
mod listener;
mod registry;
mod transform;

pub use builder::*;
pub use control::*;
pub use emission::*;
pub use emitter::*;
pub use error::*;
pub use listener::*;
pub use transform::*;

pub(crate) use chain::*;
pub(crate) use finish::*;
pub(crate) use registry::*;
