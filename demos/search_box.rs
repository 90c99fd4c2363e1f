//! A search box whose query settles 300ms after the last keystroke.
//!
//! Each settled query runs a (fake) search; failures land in an error slot
//! that a display would render with a dismiss button.
//!
//! Run with: `cargo run --example search_box`

use pacekeeper::{init_tracing, Debouncer, ErrorSlot, MonitoringConfig};
use std::time::Duration;
use tracing::{info, warn};

fn search(query: &str) -> Result<Vec<String>, String> {
    if query.contains('!') {
        return Err(format!("invalid query {:?}", query));
    }
    let catalog = ["rust", "rustup", "rustfmt", "ruby", "tokio", "tracing"];
    Ok(catalog
        .iter()
        .filter(|item| item.starts_with(query))
        .map(|item| item.to_string())
        .collect())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitoringConfig::from_env()?;
    init_tracing(&config)?;

    println!("=== Debounced Search Example ===\n");

    let errors = ErrorSlot::new();
    let query = Debouncer::builder(String::new())
        .with_delay(Duration::from_millis(300))
        .build()?;
    let mut settled = query.subscribe();

    let display = errors.clone();
    let results = tokio::spawn(async move {
        while settled.changed().await.is_ok() {
            let term = settled.borrow_and_update().clone();
            match search(&term) {
                Ok(hits) => {
                    display.clear_error();
                    info!(query = %term, hits = hits.len(), "search finished");
                    println!("  results for {:?}: {:?}", term, hits);
                }
                Err(e) => {
                    warn!(query = %term, "search failed");
                    display.report(e);
                }
            }
        }
    });

    // Fast typing: only "rust" reaches the search
    println!("Typing \"rust\" quickly:");
    for term in ["r", "ru", "rus", "rust"] {
        println!("  keystroke -> {:?}", term);
        query.set(term.to_string());
        tokio::time::sleep(Duration::from_millis(80)).await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;

    // A pause between words lets the partial query settle too
    println!("\nTyping \"to\", pausing, then \"tok\":");
    query.set("to".to_string());
    tokio::time::sleep(Duration::from_millis(500)).await;
    query.set("tok".to_string());
    tokio::time::sleep(Duration::from_millis(400)).await;

    println!("\nTyping a query the search rejects:");
    query.set("oops!".to_string());
    tokio::time::sleep(Duration::from_millis(400)).await;
    if let Some(message) = errors.error() {
        println!("  error shown: {}", message);
        errors.clear_error();
        println!("  dismissed: {}", !errors.has_error());
    }

    let snapshot = query.metrics().snapshot();
    println!(
        "\n{} keystrokes, {} searches",
        snapshot.calls_received, snapshot.invocations_deferred
    );

    // Dropping the holder closes the subscription
    drop(query);
    results.await?;

    println!("\n=== Example Complete ===");
    Ok(())
}
