use std::time::Duration;

use action_primitives::ActionReport;
use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print `value` as one compact JSON line.
pub fn print_json_line<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_latency(ms: u64) -> String {
    humantime::format_duration(Duration::from_millis(ms)).to_string()
}

/// One human-readable line for an action report.
pub fn report_line(report: &ActionReport) -> String {
    let status = match (report.ok, report.performed) {
        (false, _) => "FAIL",
        (true, true) => "ok",
        (true, false) => "skip",
    };
    let mut line = format!(
        "{:<4} {} {} ({}, {} attempt{})",
        status,
        report.action,
        report.target,
        format_latency(report.latency_ms),
        report.attempts,
        if report.attempts == 1 { "" } else { "s" }
    );
    if let Some(selector) = &report.selector {
        line.push_str(&format!(" via {}", selector));
    }
    if let Some(heal) = &report.self_heal {
        line.push_str(&format!(
            " [healed {} -> {}]",
            heal.original_selector, heal.healed_selector
        ));
    }
    if let Some(error) = &report.error {
        line.push_str(&format!(": {}", error));
    }
    line
}
