//! CLI command implementations

use crate::output::{clock, to_json, to_table, OutputFormat};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use kiosk_core::{
    simulate_page, Catalog, LogPresenter, PageId, PageOutcome, PageRunner, PageSource, Phase,
    PlaybackSequencer, SequencerSnapshot, SessionConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing::{info, warn};

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(path) => Ok(SessionConfig::load(&path).await?),
        None => Ok(SessionConfig::default()),
    }
}

/// Play a page in real time.
///
/// `progress` is the bar the log writer suspends around each line; it stays
/// hidden until playback begins.
pub async fn play(
    library: &Path,
    page: u32,
    config: Option<PathBuf>,
    format: &str,
    progress: ProgressBar,
) -> anyhow::Result<()> {
    let config = load_config(config).await?;
    let catalog = Catalog::load(library).await?;
    let resolved = catalog.resolve(PageId(page), config.default_focus_seconds).await?;

    println!(
        "Playing {} ({} videos)",
        style(&resolved.name).bold(),
        resolved.slots.len()
    );

    let countdown = u64::from(config.countdown_seconds);
    let mut sequencer = PlaybackSequencer::new(resolved.id, config, resolved.slots, LogPresenter)?;
    let durations: Vec<u64> = sequencer.slots().iter().map(|s| u64::from(s.duration())).collect();
    let completion = sequencer.subscribe_completion();

    progress.set_length(countdown + durations.iter().sum::<u64>());
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len}s {msg}")?
            .progress_chars("=> "),
    );

    progress.set_draw_target(ProgressDrawTarget::stderr());

    let handle = PageRunner::spawn(sequencer);
    let mut state = handle.subscribe_state();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                progress.set_position(elapsed_seconds(&snapshot, countdown, &durations));
                progress.set_message(describe(&snapshot));
                if snapshot.completed {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                warn!(page, "Interrupted, aborting page");
                handle.abort().await;
                break;
            }
        }
    }

    let outcome = handle.wait().await?;
    progress.finish_and_clear();

    let event = match outcome {
        PageOutcome::Completed(_) => completion.await.ok(),
        PageOutcome::Aborted(_) => None,
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => {
            println!(
                "{}",
                to_json(&serde_json::json!({ "outcome": outcome, "completion": event }))
            );
        }
        OutputFormat::Text | OutputFormat::Table => match (outcome, event) {
            (PageOutcome::Completed(page), Some(event)) => {
                let at = event.completed_at.with_timezone(&chrono::Local);
                println!(
                    "{} page {} at {}",
                    style("Completed").green().bold(),
                    page,
                    at.format("%H:%M:%S")
                );
            }
            (outcome, _) => {
                println!("{} page {}", style("Aborted").yellow().bold(), outcome.page());
            }
        },
    }

    Ok(())
}

fn elapsed_seconds(snapshot: &SequencerSnapshot, countdown: u64, durations: &[u64]) -> u64 {
    let focus_total: u64 = durations.iter().sum();
    match snapshot.phase {
        Phase::Countdown => countdown.saturating_sub(u64::from(snapshot.countdown_remaining)),
        Phase::Starting => countdown,
        Phase::Focusing(index) => {
            let before: u64 = durations[..index].iter().sum();
            let spent = durations[index].saturating_sub(u64::from(snapshot.focus_remaining));
            countdown + before + spent
        }
        Phase::Completed if snapshot.aborted => 0,
        Phase::Completed => countdown + focus_total,
    }
}

fn describe(snapshot: &SequencerSnapshot) -> String {
    let labels: Vec<String> = snapshot
        .slots
        .iter()
        .map(|s| format!("#{} {}", s.position, s.label))
        .collect();
    format!("{} | {}", snapshot.phase, labels.join("  "))
}

/// Row of a page plan
#[derive(Debug, Serialize, Tabled)]
struct PlanRow {
    #[tabled(rename = "At")]
    at: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Slot")]
    slot: String,
    #[tabled(rename = "Focus (s)")]
    focus: String,
}

/// Print the simulated timeline of a page
pub async fn plan(
    library: &Path,
    page: u32,
    config: Option<PathBuf>,
    format: &str,
) -> anyhow::Result<()> {
    let config = load_config(config).await?;
    let catalog = Catalog::load(library).await?;
    let resolved = catalog.resolve(PageId(page), config.default_focus_seconds).await?;

    let report = simulate_page(resolved.id, config, resolved.slots.clone())?;
    info!(
        page,
        completions = report.completions,
        finished_at_ms = ?report.finished_at_ms,
        "Page simulated"
    );

    let rows: Vec<PlanRow> = report
        .entries
        .iter()
        .map(|entry| {
            let slot = entry
                .phase
                .focused()
                .and_then(|i| resolved.slots.get(i))
                .map(|s| format!("#{} {}", s.display_number, s.title))
                .unwrap_or_default();
            let focus = match entry.phase {
                Phase::Focusing(_) => entry.focus_remaining.to_string(),
                _ => String::new(),
            };
            PlanRow {
                at: clock(entry.at_ms),
                phase: entry.phase.to_string(),
                slot,
                focus,
            }
        })
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&report)),
        OutputFormat::Table => println!("{}", to_table(&rows)),
        OutputFormat::Text => {
            println!("Plan for {}:", style(&resolved.name).bold());
            for row in &rows {
                println!("  {}  {:<12} {} {}", row.at, row.phase, row.slot, row.focus);
            }
            match report.finished_at_ms {
                Some(ms) => println!("\nCompletes at {}", clock(ms)),
                None => println!("\n{}", style("Page does not complete").red()),
            }
        }
    }

    Ok(())
}

/// Row of the library check
#[derive(Debug, Serialize, Tabled)]
struct CheckRow {
    #[tabled(rename = "Page")]
    page: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slots")]
    slots: usize,
    #[tabled(rename = "Durations (s)")]
    durations: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Validate config and library
pub async fn check(library: &Path, config: Option<PathBuf>, format: &str) -> anyhow::Result<()> {
    let config = load_config(config).await?;
    config.validate()?;
    let catalog = Catalog::load(library).await?;

    let mut rows = Vec::new();
    let mut failures = 0;

    for id in catalog.page_ids().await? {
        let row = match catalog.resolve(id, config.default_focus_seconds).await {
            Ok(page) => {
                let status = if page.slots.len() == kiosk_core::MAX_SLOTS {
                    "ok".to_string()
                } else {
                    format!("{} of {} slots", page.slots.len(), kiosk_core::MAX_SLOTS)
                };
                CheckRow {
                    page: id.0,
                    name: page.name,
                    slots: page.slots.len(),
                    durations: page
                        .slots
                        .iter()
                        .map(|s| s.duration_seconds.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    status,
                }
            }
            Err(e) => {
                failures += 1;
                CheckRow {
                    page: id.0,
                    name: String::new(),
                    slots: 0,
                    durations: String::new(),
                    status: format!("{} ({})", e, e.error_code()),
                }
            }
        };
        rows.push(row);
    }

    match OutputFormat::from(format) {
        OutputFormat::Json => {
            println!(
                "{}",
                to_json(&serde_json::json!({ "config": config, "pages": rows }))
            );
        }
        OutputFormat::Table => println!("{}", to_table(&rows)),
        OutputFormat::Text => {
            println!("Config: {:?}", config);
            for row in &rows {
                let status = if row.status == "ok" {
                    style(row.status.clone()).green()
                } else {
                    style(row.status.clone()).yellow()
                };
                println!("  Page {} {:<16} [{}] {}", row.page, row.name, row.durations, status);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} page(s) failed to resolve", failures);
    }
    Ok(())
}
