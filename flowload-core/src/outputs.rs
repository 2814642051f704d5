use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use super::error::{Error, Result};
use super::outcome::{Outcome, Stage};
use super::report::{AggregateReport, StageSummary};

const RULE_WIDTH: usize = 50;

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Register => "Registration",
        Stage::Login => "Login",
        Stage::EndpointCall => "Endpoints",
    }
}

fn secs(d: Duration) -> String {
    format!("{:.4}", d.as_secs_f64())
}

fn render_stage(s: &StageSummary, out: &mut String) {
    writeln!(out, "\n{} analytics:", stage_title(s.stage)).ok();
    writeln!(out, "Total requests: {}", s.total).ok();
    if s.total == 0 {
        out.push_str("Success: no data\n");
    } else {
        writeln!(out, "Success: {:.2}%", s.success_rate * 100.0).ok();
    }
    writeln!(out, "Average response time: {} seconds", secs(s.mean_elapsed)).ok();
    writeln!(out, "Max response time: {} seconds", secs(s.max_elapsed)).ok();
    if let Some(p) = &s.latency {
        writeln!(
            out,
            "Percentiles: p50={}s p90={}s p99={}s",
            secs(p.p50),
            secs(p.p90),
            secs(p.p99)
        )
        .ok();
    }
    writeln!(out, "Errors: {}", s.errors).ok();
}

/// Per-stage analytics block (registration, login, endpoints).
pub fn render_analytics(report: &AggregateReport) -> String {
    let mut out = String::new();
    for s in report.stages() {
        render_stage(s, &mut out);
    }
    out
}

/// Two-section text artifact: summary first, then every request in collection order.
pub fn render_results(outcomes: &[Outcome], report: &AggregateReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str("Summary:\n");
    writeln!(out, "{rule}").ok();
    for line in render_analytics(report).lines() {
        writeln!(out, "{line}").ok();
    }
    writeln!(out, "{rule}\n").ok();

    out.push_str("Request details:\n");
    writeln!(out, "{rule}").ok();
    for (i, o) in outcomes.iter().enumerate() {
        writeln!(out, "Request #{}:", i + 1).ok();
        writeln!(out, "  Status: {}", o.status()).ok();
        writeln!(out, "  Elapsed: {} seconds", secs(o.elapsed())).ok();
        writeln!(out, "  Response code: {}", o.response_code()).ok();
        writeln!(out, "  Endpoint: {}", o.endpoint()).ok();
        if let Some(detail) = o.error_detail() {
            writeln!(out, "  Error message: {detail}").ok();
        }
        writeln!(out, "{thin}").ok();
    }

    out
}

/// Writes [`render_results`] to `path`, creating parent directories as needed.
pub fn write_results_file(path: &Path, outcomes: &[Outcome], report: &AggregateReport) -> Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Err(Error::InvalidOutputPath(path.display().to_string()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_results(outcomes, report))?;

    tracing::info!(path = %path.display(), outcomes = outcomes.len(), "results written");
    Ok(())
}
