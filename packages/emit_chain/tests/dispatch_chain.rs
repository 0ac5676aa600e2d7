//! End-to-end behavior of dispatch chains through the public API only.

use std::cell::RefCell;
use std::rc::Rc;

use emit_chain::{Control, Done, Emitter, ExecutedAny, Stats};
use testing::{Journal, with_watchdog};

type Parked = Rc<RefCell<Option<Control>>>;

fn recorder(journal: &Journal, label: &'static str) -> impl Fn(&u32, &Control) + 'static {
    let journal = journal.clone();
    move |_, _| journal.record(label)
}

fn suspender(
    journal: &Journal,
    label: &'static str,
    parked: &Parked,
) -> impl Fn(&u32, &Control) + 'static {
    let journal = journal.clone();
    let parked = Rc::clone(parked);

    move |_, control| {
        journal.record(label);
        control.wait();
        *parked.borrow_mut() = Some(control.clone());
    }
}

fn take(parked: &Parked) -> Control {
    parked
        .borrow_mut()
        .take()
        .expect("listener should have parked its handle")
}

#[test]
fn synchronous_listeners_all_run_in_order() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        let labels = ["l0", "l1", "l2", "l3", "l4", "l5", "l6", "l7"];

        for label in labels {
            emitter.on("e", recorder(&journal, label));
        }

        let emission = emitter.emit_object("e", 0).unwrap();

        assert_eq!(journal.entries(), labels);
        assert_eq!(emission.executed(), labels.len());
        assert_eq!(emission.listeners(), labels.len());
        assert!(!emission.is_running());
    });
}

#[test]
fn abort_at_each_position_truncates_chain() {
    with_watchdog(|| {
        const LISTENERS: usize = 5;

        for abort_at in 0..LISTENERS {
            let emitter = Emitter::new();
            let invoked = Rc::new(RefCell::new(Vec::new()));

            for index in 0..LISTENERS {
                let invoked = Rc::clone(&invoked);
                emitter.on("e", move |_: &u32, control: &Control| {
                    invoked.borrow_mut().push(index);
                    if index == abort_at {
                        control.abort();
                    }
                });
            }

            let emission = emitter.emit_object("e", 0).unwrap();

            assert_eq!(*invoked.borrow(), (0..=abort_at).collect::<Vec<_>>());
            assert!(emission.is_aborted());
            assert_eq!(emission.executed(), abort_at + 1);
            assert!(!emission.is_running());
        }
    });
}

#[test]
fn repeated_handle_calls_have_effect_once() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        let first = Parked::default();
        let second = Parked::default();

        emitter.on("e", suspender(&journal, "first", &first));
        emitter.on("e", suspender(&journal, "second", &second));
        emitter.on("e", recorder(&journal, "third"));

        let emission = emitter.emit_object("e", 0).unwrap();
        let control = take(&first);

        for _ in 0..3 {
            control.next();
            control.wait();
            control.abort();
        }

        assert_eq!(journal.entries(), ["first", "second"]);
        assert!(!emission.is_aborted());
        assert!(emission.is_running());
        assert_eq!(emission.executed(), 2);
    });
}

#[test]
fn suspended_chain_resumes_to_completion() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        let parked = Parked::default();

        emitter.on("e", recorder(&journal, "before"));
        emitter.on("e", suspender(&journal, "suspender", &parked));
        emitter.on("e", recorder(&journal, "after"));

        let emission = emitter.emit_object("e", 0).unwrap();

        assert!(emission.is_running());
        assert_eq!(emission.executed(), 2);

        take(&parked).next();

        assert_eq!(journal.entries(), ["before", "suspender", "after"]);
        assert_eq!(emission.executed(), 3);
        assert!(!emission.is_running());
    });
}

#[test]
fn resolver_race_resumes_only_once() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        let pending = Rc::new(RefCell::new(None::<Done>));
        let later = Parked::default();

        emitter.on("e", {
            let pending = Rc::clone(&pending);
            move |_: &u32, control: &Control| {
                let pending = Rc::clone(&pending);
                control.wait_with(move |_, done| *pending.borrow_mut() = Some(done));
                // The listener wins the race against its own resolver.
                control.next();
            }
        });
        emitter.on("e", suspender(&journal, "second", &later));
        emitter.on("e", recorder(&journal, "third"));

        let emission = emitter.emit_object("e", 0).unwrap();
        assert_eq!(journal.entries(), ["second"]);

        pending.borrow_mut().take().unwrap().next();

        assert_eq!(journal.entries(), ["second"]);
        assert_eq!(emission.executed(), 2);
        assert!(emission.is_running());
    });
}

#[test]
fn finish_callbacks_fire_once_in_order() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        let parked = Parked::default();

        emitter.on("e", suspender(&journal, "suspender", &parked));

        let emission = emitter.emit_object("e", 0).unwrap();
        let snapshots = Rc::new(RefCell::new(Vec::<Stats>::new()));

        for label in ["ready 1", "ready 2"] {
            let journal = journal.clone();
            let snapshots = Rc::clone(&snapshots);
            emission.ready(move |stats| {
                journal.record(label);
                snapshots.borrow_mut().push(stats.clone());
            });
        }

        assert_eq!(journal.entries(), ["suspender"]);

        take(&parked).next();

        assert_eq!(journal.entries(), ["suspender", "ready 1", "ready 2"]);
        assert!(snapshots.borrow().iter().all(|stats| !stats.is_running()));

        // Registering after the end runs immediately.
        let late = Rc::new(RefCell::new(None));
        emission.ready({
            let late = Rc::clone(&late);
            move |stats| *late.borrow_mut() = Some(stats.clone())
        });

        let late = late.borrow_mut().take().expect("late callback should run immediately");
        assert!(!late.is_running());
        assert_eq!(late.executed(), 1);
        assert_eq!(journal.entries(), ["suspender", "ready 1", "ready 2"]);
    });
}

#[test]
fn unhandled_error_event_never_dispatches() {
    with_watchdog(|| {
        let emitter = Emitter::<u32>::new();
        let journal = Journal::new();
        emitter.on("not error", recorder(&journal, "unrelated"));

        let error = emitter.emit_object("error", 13).unwrap_err();

        assert_eq!(error.event(), "error");
        assert_eq!(*error.args(), 13);
        assert!(journal.entries().is_empty());
    });
}

#[test]
fn boolean_result_reflects_executed_listeners() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        emitter.on("sync", recorder(&journal, "sync"));
        emitter.on("aborts", |_: &u32, control: &Control| control.abort());
        emitter.on("aborts", recorder(&journal, "never"));

        assert!(emitter.emit_bool("sync", 0).unwrap());
        assert!(emitter.emit_bool("aborts", 0).unwrap());
        assert!(!emitter.emit_bool("none", 0).unwrap());

        let transformed = Emitter::<u32>::builder().returns(ExecutedAny).build();
        transformed.on("sync", recorder(&journal, "transformed"));
        assert!(transformed.emit("sync", 0).unwrap());
        assert!(!transformed.emit("none", 0).unwrap());

        assert_eq!(journal.entries(), ["sync", "transformed"]);
    });
}

#[test]
fn suspend_then_abort_from_deferred_code() {
    with_watchdog(|| {
        // Listeners g1..g4 mirror a typical mixed chain: plain, suspending, resolver-driven
        // (which aborts), and one that must never run.
        let emitter = Emitter::<(&'static str, bool)>::new();
        let journal = Journal::new();
        let g2 = Parked::default();
        let g3 = Rc::new(RefCell::new(None::<(Control, Done)>));

        emitter.on("event1", {
            let journal = journal.clone();
            move |args: &(&'static str, bool), _: &Control| {
                assert_eq!(*args, ("myparam1", true));
                journal.record("g1");
            }
        });
        emitter.on("event1", {
            let journal = journal.clone();
            let g2 = Rc::clone(&g2);
            move |_: &(&'static str, bool), control: &Control| {
                journal.record("g2");
                control.wait();
                *g2.borrow_mut() = Some(control.clone());
            }
        });
        emitter.on("event1", {
            let journal = journal.clone();
            let g3 = Rc::clone(&g3);
            move |_: &(&'static str, bool), control: &Control| {
                journal.record("g3");
                let g3 = Rc::clone(&g3);
                let outer = control.clone();
                control.wait_with(move |_, done| *g3.borrow_mut() = Some((outer, done)));
            }
        });
        emitter.on("event1", {
            let journal = journal.clone();
            move |_: &(&'static str, bool), _: &Control| journal.record("g4")
        });

        let emission = emitter.emit_object("event1", ("myparam1", true)).unwrap();
        assert!(emission.is_running());
        assert_eq!(journal.entries(), ["g1", "g2"]);

        let finished = Rc::new(RefCell::new(None));
        emission.ready({
            let finished = Rc::clone(&finished);
            move |stats| *finished.borrow_mut() = Some(stats.clone())
        });

        take(&g2).next();
        assert_eq!(journal.entries(), ["g1", "g2", "g3"]);
        assert!(finished.borrow().is_none());

        let (outer, done) = g3.borrow_mut().take().unwrap();
        done.abort();

        // Everything after the abort is ignored.
        outer.abort();
        outer.next();
        let journal_for_wait = journal.clone();
        outer.wait_with(move |_, _| journal_for_wait.record("will not run"));

        assert_eq!(journal.entries(), ["g1", "g2", "g3"]);

        let stats = finished.borrow_mut().take().unwrap();
        assert_eq!(stats.event(), "event1");
        assert_eq!(stats.listeners(), 4);
        assert_eq!(stats.executed(), 3);
        assert!(stats.is_aborted());
        assert!(!stats.is_running());
    });
}

#[test]
fn example_scenario_resumes_last_listener() {
    with_watchdog(|| {
        let emitter = Emitter::<(&'static str, bool)>::new();
        let journal = Journal::new();
        let parked = Parked::default();

        emitter.on("event1", {
            let journal = journal.clone();
            move |_: &(&'static str, bool), _: &Control| journal.record("A")
        });
        emitter.on("event1", {
            let journal = journal.clone();
            let parked = Rc::clone(&parked);
            move |_: &(&'static str, bool), control: &Control| {
                journal.record("B");
                control.wait();
                *parked.borrow_mut() = Some(control.clone());
            }
        });
        emitter.on("event1", {
            let journal = journal.clone();
            move |_: &(&'static str, bool), _: &Control| journal.record("C")
        });

        let emission = emitter.emit_object("event1", ("p1", true)).unwrap();

        assert!(emission.is_running());
        assert_eq!(emission.executed(), 2);
        assert_eq!(emission.listeners(), 3);

        let aborted = Rc::new(RefCell::new(None));
        emission.ready({
            let aborted = Rc::clone(&aborted);
            move |stats| *aborted.borrow_mut() = Some(stats.is_aborted())
        });

        take(&parked).next();

        assert_eq!(journal.entries(), ["A", "B", "C"]);
        assert_eq!(emission.executed(), 3);
        assert!(!emission.is_running());
        assert_eq!(*aborted.borrow(), Some(false));
    });
}

#[test]
fn never_resolved_chain_stays_running() {
    with_watchdog(|| {
        let emitter = Emitter::new();
        let journal = Journal::new();
        let finished = Rc::new(RefCell::new(false));

        emitter.on("e", |_: &u32, control: &Control| control.wait());
        emitter.on("e", recorder(&journal, "never"));

        let emission = emitter.emit_object("e", 0).unwrap();
        emission.ready({
            let finished = Rc::clone(&finished);
            move |_| *finished.borrow_mut() = true
        });

        assert!(emission.is_running());
        assert!(!*finished.borrow());
        assert!(journal.entries().is_empty());
        assert!(emission.stats().is_running());
    });
}
