//! Report a scroll position at most once every 100ms.
//!
//! A simulated scroll emits a position every 16ms (one frame). The handler
//! runs for the first frame, then once per window with the latest position.
//!
//! Run with: `cargo run --example scroll_throttle`

use pacekeeper::{init_tracing, MonitoringConfig, Throttler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitoringConfig::from_env()?;
    init_tracing(&config)?;

    println!("=== Throttled Scroll Example ===\n");

    let start = Instant::now();
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&handled);

    let on_scroll = Throttler::builder(move |y: f64| {
        counter.fetch_add(1, Ordering::SeqCst);
        println!("  t={:>4}ms  handled scrollY={}", start.elapsed().as_millis(), y);
    })
    .with_delay(Duration::from_millis(100))
    .build()?;

    let frames = 60;
    let mut frame = tokio::time::interval(Duration::from_millis(16));
    for i in 0..frames {
        frame.tick().await;
        on_scroll.call(f64::from(i) * 12.5);
    }

    // Let the trailing call for the final position run
    tokio::time::sleep(Duration::from_millis(150)).await;

    let snapshot = on_scroll.metrics().snapshot();
    println!(
        "\n{} scroll events, {} handled ({} leading, {} trailing)",
        frames,
        handled.load(Ordering::SeqCst),
        snapshot.invocations_immediate,
        snapshot.invocations_deferred
    );
    println!("coalesced: {:.1}%", snapshot.coalescing_rate() * 100.0);

    on_scroll.dispose();
    println!("\n=== Example Complete ===");
    Ok(())
}
