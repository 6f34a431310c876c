//! Console renderers for progress events and run summaries.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::output::OutputLayout;
use crate::progress::{ProgressCallback, ProgressInfo, ProgressPhase};
use crate::types::Statistics;

const BAR_TEMPLATE: &str = "{spinner:.green} {prefix:>9.bold} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";
const ITEM_WIDTH: usize = 30;

/// Time left at the current pace. Zero when nothing is known yet.
pub fn estimate_remaining(elapsed: Duration, percentage: f64) -> Duration {
    if percentage <= 0.0 || percentage >= 100.0 {
        return Duration::ZERO;
    }
    let total = elapsed.as_secs_f64() * 100.0 / percentage;
    Duration::from_secs_f64((total - elapsed.as_secs_f64()).max(0.0))
}

/// Items per second.
pub fn processing_rate(completed: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    completed as f64 / secs
}

/// Shorten to `max` characters, ending in `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

fn phase_title(phase: ProgressPhase) -> &'static str {
    match phase {
        ProgressPhase::Scanning => "Scanning",
        ProgressPhase::Indexing => "Indexing",
    }
}

struct RichState {
    phase: ProgressPhase,
    bar: ProgressBar,
}

fn new_bar(info: &ProgressInfo) -> ProgressBar {
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
    let bar = ProgressBar::new(info.total as u64);
    bar.set_style(style);
    bar.set_prefix(phase_title(info.phase));
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// An `indicatif` bar per phase, with rate, ETA and the current item.
pub fn rich_progress() -> ProgressCallback {
    let state: Mutex<Option<RichState>> = Mutex::new(None);

    Arc::new(move |info: &ProgressInfo| {
        let mut state = state.lock();
        let stale = state.as_ref().map(|s| s.phase != info.phase).unwrap_or(true);
        if stale {
            if let Some(old) = state.take() {
                old.bar.finish_and_clear();
            }
            *state = Some(RichState {
                phase: info.phase,
                bar: new_bar(info),
            });
        }

        let Some(current) = state.as_ref() else {
            return;
        };
        let bar = &current.bar;

        if info.is_complete() {
            bar.set_position(info.total as u64);
            bar.finish_with_message(format!(
                "{} in {:.1}s",
                "done".green().bold(),
                info.elapsed.as_secs_f64()
            ));
            return;
        }

        bar.set_position(info.completed as u64);
        let mut message = truncate(&info.current, ITEM_WIDTH);
        let rate = processing_rate(info.completed, info.elapsed);
        if rate > 0.0 {
            message.push_str(&format!(" | {:.1}/s", rate));
        }
        let eta = estimate_remaining(info.elapsed, info.percentage);
        if !eta.is_zero() {
            message.push_str(&format!(" | ETA {:.1}s", eta.as_secs_f64()));
        }
        bar.set_message(message);
    })
}

/// One plain line per event, for logs and dumb terminals.
pub fn simple_progress() -> ProgressCallback {
    Arc::new(|info: &ProgressInfo| {
        let title = phase_title(info.phase);
        if info.is_complete() {
            println!(
                "{} {} completed: {}/{} items",
                "✓".green(),
                title,
                info.completed,
                info.total
            );
        } else {
            println!(
                "{} {}: {:.1}% ({}/{}) - {}",
                "→".cyan(),
                title,
                info.percentage,
                info.completed,
                info.total,
                info.current
            );
        }
    })
}

pub fn print_header(title: &str) {
    println!("{}", title.bold());
}

pub fn print_statistics(version: &str, stats: &Statistics) {
    println!();
    println!("{} {}", "Provider index".bold(), version.cyan());
    println!("  {:<22}{}", "Services:", stats.service_count.to_string().green());
    println!("  {:<22}{}", "Resources:", stats.total_resources.to_string().green());
    println!("    {:<20}{}", "legacy:", stats.legacy_resources);
    println!("    {:<20}{}", "modern:", stats.modern_resources);
    println!("    {:<20}{}", "ephemeral:", stats.ephemeral_resources);
    println!("  {:<22}{}", "Data sources:", stats.total_data_sources.to_string().green());
}

pub fn print_outputs(output: &Path, layout: &OutputLayout, written: usize) {
    println!();
    println!("{} {} files written", "✓".green().bold(), written);
    println!("  {:<14}{}", "Summary:", layout.summary_path(output).display());
    let [resources, data_sources, ephemeral] = layout.category_dirs(output);
    println!("  {:<14}{}", "Resources:", resources.display());
    println!("  {:<14}{}", "Data sources:", data_sources.display());
    println!("  {:<14}{}", "Ephemeral:", ephemeral.display());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
