//! # Callback Table Demo
//!
//! Shows token registration, at-most-once resolution, blocking waiters and
//! teardown.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example callback_table_demo
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use wonderpush_bridge::CallbackTable;

fn main() {
    println!("=== WonderPush Bridge: Callback Table Demo ===\n");

    let table = Arc::new(CallbackTable::new());

    // Step 1: Register and resolve
    println!("Step 1: Registering an action...");
    let token = table.register(|value| println!("  Action invoked with {}", value));
    println!("  Token: {}", token);
    println!("  Pending: {}", table.len());
    println!();

    println!("Step 2: Resolving twice...");
    println!("  First:  {:?}", table.resolve(&token, json!("hello")));
    println!("  Second: {:?}", table.resolve(&token, json!("again")));
    println!("  Unknown token: {:?}", table.resolve("not-a-token", json!(null)));
    println!();

    // Step 3: A native thread blocks until another thread resolves
    println!("Step 3: Blocking waiter...");
    let (token, waiter) = table.register_waiter();
    let resolver = {
        let table = table.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            table.resolve(&token, json!("app://answer"));
        })
    };
    match waiter.wait(Duration::from_secs(1)) {
        Ok(value) => println!("  Waiter received {}", value),
        Err(e) => println!("  Waiter failed: {}", e),
    }
    resolver.join().expect("resolver panicked");
    println!();

    // Step 4: Unanswered waiters time out and stay pending
    println!("Step 4: Waiter timeout...");
    let (_token, waiter) = table.register_waiter();
    if let Err(e) = waiter.wait(Duration::from_millis(20)) {
        println!("  {}", e);
    }
    println!("  Pending: {}", table.len());
    if let Some(age) = table.oldest_pending_age() {
        println!("  Oldest pending: {} ms", age.as_millis());
    }
    println!();

    // Step 5: Teardown discards without invoking
    println!("Step 5: Teardown...");
    table.register(|_| println!("  never printed"));
    println!("  Discarded: {}", table.teardown());
    println!("  Pending: {}", table.len());

    println!("\n=== Demo Complete ===");
}
