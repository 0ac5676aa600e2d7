//! Demonstrates listeners that suspend, resume and abort a dispatch chain.
//!
//! Deferred work is simulated with a simple run queue that is drained after the emit call
//! returns, standing in for timers or I/O completions of a real event loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use emit_chain::{Control, Emitter};

type RunQueue = Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let queue = RunQueue::default();
    let emitter = Emitter::<(&'static str, bool)>::new();

    emitter.on("event1", |args: &(&'static str, bool), _: &Control| {
        println!("g1: called with arguments {args:?}");
    });

    emitter.on("event1", {
        let queue = Rc::clone(&queue);
        move |args: &(&'static str, bool), control: &Control| {
            println!("g2: pausing the chain");
            control.wait();

            let control = control.clone();
            let args = *args;
            queue.borrow_mut().push_back(Box::new(move || {
                println!("g2: later, continuing the chain (arguments were {args:?})");
                control.next();
            }));

            println!("g2: this runs before the chain continues");
        }
    });

    emitter.on("event1", {
        let queue = Rc::clone(&queue);
        move |_: &(&'static str, bool), control: &Control| {
            println!("g3: handing the continuation to a resolver");

            let queue = Rc::clone(&queue);
            let outer = control.clone();
            control.wait_with(move |_secondary, done| {
                queue.borrow_mut().push_back(Box::new(move || {
                    println!("g3: later, aborting the chain");
                    done.finish(Err::<(), _>("no longer needed"));

                    // The chain is already aborted; these do nothing.
                    outer.abort();
                    outer.next();
                }));
            });
        }
    });

    emitter.on("event1", |_: &(&'static str, bool), _: &Control| {
        println!("g4: never runs, the chain is aborted before reaching it");
    });

    let emission = emitter
        .emit_object("event1", ("myparam1", true))
        .expect("event1 is not the reserved error event");

    println!(
        "emit returned while the chain is still running: {}",
        emission.is_running()
    );

    emission.ready(|stats| {
        println!("'{}' has finished", stats.event());
        println!("listeners registered: {}", stats.listeners());
        println!("listeners executed: {}", stats.executed());
        println!("chain aborted: {}", stats.is_aborted());
        println!("still running: {}", stats.is_running());
    });

    loop {
        let next_task = queue.borrow_mut().pop_front();
        let Some(task) = next_task else {
            break;
        };
        task();
    }

    match emitter.emit_bool("error", ("nobody is listening", false)) {
        Ok(_) => unreachable!("no listener is registered for the error event"),
        Err(error) => println!("emitting an unhandled error event fails: {error}"),
    }
}
