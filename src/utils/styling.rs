//! Terminal styling for the run output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::config::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static BRAIN: Emoji<'_, '_> = Emoji("🧠 ", "");
pub static SCISSORS: Emoji<'_, '_> = Emoji("✂️  ", "");

const BOX_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("aqpipe").cyan().bold(),
        style("config-driven classification pipeline").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the configuration card for a validated config
pub fn print_config(config_path: &Path, config: &PipelineConfig) {
    let line = "─".repeat(BOX_WIDTH - 2);
    let source = config.data_loader();
    let transform = config.transformation();
    let split = config.splitting();

    let scaling = if transform.normalize() {
        transform.scaling_method().to_string()
    } else {
        "off".to_string()
    };

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("Configuration").cyan().bold(),
        " ".repeat(BOX_WIDTH - 16)
    );
    println!("    ├{}┤", line);
    card_row(&GEAR, "Config", &truncate_path(config_path, 38));
    card_row(
        &FOLDER,
        "Data",
        &truncate_string(&format!("{} ({})", source.file_path().display(), source.file_type()), 38),
    );
    card_row(&TARGET, "Target", &truncate_string(source.target_column(), 38));
    println!("    ├{}┤", line);
    card_row(&BRAIN, "Model", config.model().kind().as_str());
    card_row(&GEAR, "Scaling", &scaling);
    card_row(
        &SCISSORS,
        "Split",
        &format!("test_size={} seed={}", split.test_size(), split.random_state()),
    );
    println!("    └{}┘", line);
    println!();
}

fn card_row(icon: &Emoji<'_, '_>, label: &str, value: &str) {
    println!(
        "    │  {} {:<8}{:<width$}│",
        icon,
        format!("{}:", label),
        style(value).yellow(),
        width = BOX_WIDTH - 16
    );
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: Duration) {
    println!("      {}", style(format!("({})", format_duration(elapsed))).dim());
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!("    {} {}", ROCKET, style("Pipeline complete!").green().bold());
    println!();
}

/// Print an error with its cause chain to stderr
pub fn print_error(err: &anyhow::Error) {
    eprintln!("    {} {}", style("✗").red().bold(), style(err).red().bold());
    for cause in err.chain().skip(1) {
        eprintln!("      {} {}", style("caused by:").dim(), cause);
    }
}

pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else {
        format!("{:.2}s", secs)
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len - max_len + 3).collect();
        format!("...{}", tail)
    }
}
