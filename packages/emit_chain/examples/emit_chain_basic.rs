//! Basic example of using the emitter like a conventional event emitter.
//!
//! Listeners that ignore their control handle run back-to-back in registration order and the
//! emit call returns only after all of them have run.

use emit_chain::{Control, Emitter};

fn main() {
    println!("=== emit_chain Basic Example ===");

    let emitter = Emitter::<String>::new();

    emitter.on("message", |text: &String, _: &Control| {
        println!("first listener received: {text}");
    });

    emitter.on("message", |text: &String, _: &Control| {
        println!("second listener received {} bytes", text.len());
    });

    let emission = emitter
        .emit_object("message", "Hello from emit_chain!".to_string())
        .expect("message is not the reserved error event");

    println!(
        "executed {} of {} listeners, still running: {}",
        emission.executed(),
        emission.listeners(),
        emission.is_running()
    );

    let anyone_listening = emitter
        .emit_bool("unknown", "nobody hears this".to_string())
        .expect("unknown is not the reserved error event");
    println!("anyone listening to 'unknown': {anyone_listening}");
}
