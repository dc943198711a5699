//! CLI output formatting

use crate::{
    core::{RunStatus, StepState},
    execution::RunEvent,
    persistence::RunSummary,
    proxy::RouteMatch,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "* ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Completed => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
        _ => INFO,
    };

    format!(
        "{} {} - {} - {} ({}/{}, exit {})",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        format_status(summary.status),
        summary.completed_steps,
        summary.total_steps,
        style(summary.exit_code).cyan()
    )
}

/// Format a routing decision for display
pub fn format_route_match(path: &str, route: &RouteMatch) -> String {
    match route {
        RouteMatch::Static { file } => format!(
            "{} {} -> {}",
            INFO,
            style(path).bold(),
            style(file.display()).green()
        ),
        RouteMatch::Upstream {
            name,
            addr,
            read_timeout,
        } => format!(
            "{} {} -> upstream {} ({}, read timeout {}s)",
            INFO,
            style(path).bold(),
            style(name).cyan(),
            addr,
            read_timeout.as_secs()
        ),
    }
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::RunStarted {
            run_id,
            pipeline_name,
        } => format!(
            "{} Starting pipeline {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        RunEvent::ServiceStarted { service_id, pid } => match pid {
            Some(pid) => format!(
                "{} Service {} up (pid {})",
                GEAR,
                style(service_id).cyan(),
                style(pid).dim()
            ),
            None => format!("{} Service {} up", GEAR, style(service_id).cyan()),
        },
        RunEvent::StepStarted {
            step_id,
            index,
            total,
        } => format!(
            "{} {} ({}/{})",
            SPINNER,
            style(step_id).cyan(),
            index + 1,
            total
        ),
        RunEvent::StepOutput { step_id, output } => {
            format!("{} Output from {}:\n{}", INFO, style(step_id).dim(), output)
        }
        RunEvent::StepCompleted { step_id } => format!("{} {}", CHECK, style(step_id).green()),
        RunEvent::StepFailed {
            step_id,
            exit_code,
            error,
            fatal,
        } => {
            if *fatal {
                format!(
                    "{} {} (exit {}): {}",
                    CROSS,
                    style(step_id).red(),
                    exit_code,
                    style(error).dim()
                )
            } else {
                format!(
                    "{} {} (exit {}, continuing): {}",
                    WARN,
                    style(step_id).yellow(),
                    exit_code,
                    style(error).dim()
                )
            }
        }
        RunEvent::StepSkipped { step_id, reason } => {
            format!(
                "{} {} skipped: {}",
                INFO,
                style(step_id).dim(),
                style(reason).dim()
            )
        }
        RunEvent::ServiceStopped { service_id } => {
            format!("{} Service {} stopped", GEAR, style(service_id).dim())
        }
        RunEvent::RunCompleted {
            run_id,
            status,
            exit_code,
        } => {
            let status_str = match status {
                RunStatus::Completed => format!("{} completed", style("successfully").green()),
                RunStatus::Failed => format!("{} (exit {})", style("failed").red(), exit_code),
                _ => format!("{:?}", status),
            };
            format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
