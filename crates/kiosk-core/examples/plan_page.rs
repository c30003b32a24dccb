//! Page planning example
//!
//! Simulates a three-video page and prints when each video holds focus.
//!
//! Run with: cargo run -p kiosk-core --example plan_page

use kiosk_core::{simulate_page, PageId, SessionConfig, VideoSlot};

fn main() -> kiosk_core::Result<()> {
    println!("Kiosk Core - Page Planning Example");
    println!("==========================================\n");

    let config = SessionConfig::default();
    let slots = vec![
        VideoSlot::from_minutes(1, Some(5.0), config.default_focus_seconds).with_title("Warm up"),
        VideoSlot::from_minutes(2, Some(10.0), config.default_focus_seconds).with_title("Squats"),
        // Missing duration falls back to the default focus window
        VideoSlot::from_minutes(3, None, config.default_focus_seconds).with_title("Stretch"),
    ];

    let report = simulate_page(PageId(1), config, slots)?;

    if let Some(ms) = report.countdown_ended_at_ms() {
        println!("Countdown ends at {:.1}s\n", ms as f64 / 1000.0);
    }

    for window in report.focus_windows() {
        println!(
            "Video {}: {:>7.1}s -> {:>7.1}s ({}s)",
            window.index + 1,
            window.start_ms as f64 / 1000.0,
            window.end_ms as f64 / 1000.0,
            window.initial_remaining
        );
    }

    match report.finished_at_ms {
        Some(ms) => println!("\nPage completes at {:.1}s", ms as f64 / 1000.0),
        None => println!("\nPage did not complete"),
    }

    Ok(())
}
