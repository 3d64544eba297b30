//! # Bridge Demo
//!
//! Drives a bridge the way a script runtime would: commands, the event
//! forwarder, and a script delegate answering a deep-link question.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example bridge_demo
//! ```

use std::sync::{mpsc, Arc};
use std::thread;

use serde_json::{json, Value};
use wonderpush_bridge::{Bridge, BridgeConfig, MemorySdk, PluginResult, ScriptCallback};

fn show(label: &str, result: &PluginResult) {
    let status = if result.is_ok() { "OK" } else { "ERROR" };
    println!("  {:<28} [{}] {}", label, status, result.message);
}

fn main() {
    println!("=== WonderPush Bridge Demo ===\n");

    let sdk = Arc::new(MemorySdk::new());
    let bridge = Arc::new(
        Bridge::new(sdk.clone(), BridgeConfig::default()).expect("Failed to create bridge"),
    );

    // Step 1: Commands before and after initialization
    println!("Step 1: Running commands...");
    show("getInstallationId", &bridge.dispatch("getInstallationId", "[]"));
    show("initialize", &bridge.dispatch("initialize", r#"["demo-id", "demo-secret"]"#));
    show("getInstallationId", &bridge.dispatch("getInstallationId", "[]"));
    show("addTag", &bridge.dispatch("addTag", r#"[["news", "sports"]]"#));
    show("getTags", &bridge.dispatch("getTags", "[]"));
    show("setProperty int_age", &bridge.dispatch("setProperty", r#"["int_age", 42]"#));
    show("setProperty age", &bridge.dispatch("setProperty", r#"["age", 42]"#));
    show("getPropertyValue", &bridge.dispatch("getPropertyValue", r#"["int_age"]"#));
    show("nope", &bridge.dispatch("nope", "[]"));
    println!();

    // Step 2: Events are buffered until the forwarder attaches
    println!("Step 2: Forwarding events...");
    let delivered = bridge.notification_opened(
        json!({ "_wp": { "n": "demo" }, "alert": "Hello" })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        Some("standard".into()),
    );
    println!("  Delivered before attach: {}", delivered);

    let forwarder: ScriptCallback = Arc::new(|result: PluginResult| {
        println!("  Event -> script: {}", result.message);
    });
    show(
        "__setEventForwarder",
        &bridge.dispatch_with_callback("__setEventForwarder", "[]", Some(forwarder)),
    );
    bridge.registered_callback("onDemoButton", Some("clicked".into()));
    println!();

    // Step 3: The script delegate answers asynchronously through __callback
    println!("Step 3: Script delegate round trip...");
    let (tx, rx) = mpsc::channel::<String>();
    let delegate: ScriptCallback = Arc::new(move |result: PluginResult| {
        if let Some(token) = result.message.get("__callbackId").and_then(Value::as_str) {
            println!("  Delegate asked: {}", result.message);
            let _ = tx.send(token.to_string());
        }
    });
    show(
        "setDelegate",
        &bridge.dispatch_with_callback("setDelegate", "[true]", Some(delegate)),
    );

    let script = {
        let bridge = bridge.clone();
        thread::spawn(move || {
            if let Ok(token) = rx.recv() {
                let args = json!([token, "app://rewritten"]).to_string();
                bridge.dispatch("__callback", &args);
            }
        })
    };

    let target = sdk.open_deep_link("app://original");
    println!("  SDK opens: {:?}", target);
    script.join().expect("script thread panicked");
    println!();

    // Step 4: Teardown
    println!("Step 4: Tearing down...");
    println!("  Pending callbacks discarded: {}", bridge.teardown());
    show("getUserId", &bridge.dispatch("getUserId", "[]"));

    println!("\n=== Demo Complete ===");
}
