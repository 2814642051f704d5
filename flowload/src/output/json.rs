use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use flowload_core::{
    AggregateReport, LatencyPercentiles, LoadConfig, ProgressFn, ProgressUpdate, RunResults,
    StageSummary,
};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _cfg: &LoadConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u| {
            if should_emit(&u) {
                emit_json_line(&build_progress_line(&u));
            }
        }))
    }

    fn print_summary(&self, results: &RunResults, report: &AggregateReport) -> anyhow::Result<()> {
        emit_json_line(&build_summary(results, report));
        Ok(())
    }
}

/// Roughly one progress line per percent of sessions, plus the last one.
fn should_emit(u: &ProgressUpdate) -> bool {
    let step = (u.sessions_total / 100).max(1);
    u.sessions_done % step == 0 || u.sessions_done >= u.sessions_total
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub elapsed_secs: f64,
    pub sessions_done: u64,
    pub sessions_total: u64,
    pub requests_total: u64,
    pub errors_total: u64,
}

fn build_progress_line(u: &ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        elapsed_secs: u.elapsed.as_secs_f64(),
        sessions_done: u.sessions_done,
        sessions_total: u.sessions_total,
        requests_total: u.outcomes_total,
        errors_total: u.failures_total,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummary {
    pub kind: &'static str,
    pub elapsed_secs: f64,
    pub sessions: JsonSessions,
    pub total_requests: u64,
    pub total_errors: u64,
    pub stages: Vec<JsonStage>,
    pub cumulative_errors: Vec<JsonErrorPoint>,
    pub endpoints: Vec<JsonEndpointSeries>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSessions {
    pub completed: u64,
    pub failed_at_register: u64,
    pub failed_at_login: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonStage {
    pub stage: String,
    pub total: u64,
    pub successes: u64,
    pub errors: u64,
    pub success_rate: f64,
    pub mean_secs: f64,
    pub max_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<JsonLatency>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonLatency {
    pub p50_secs: f64,
    pub p90_secs: f64,
    pub p99_secs: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonErrorPoint {
    pub elapsed_secs: f64,
    pub errors_so_far: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonEndpointSeries {
    pub endpoint: String,
    pub stage: String,
    pub elapsed_secs: Vec<f64>,
}

fn stage_line(s: &StageSummary) -> JsonStage {
    JsonStage {
        stage: s.stage.to_string(),
        total: s.total,
        successes: s.successes,
        errors: s.errors,
        success_rate: s.success_rate,
        mean_secs: s.mean_elapsed.as_secs_f64(),
        max_secs: s.max_elapsed.as_secs_f64(),
        latency: s.latency.as_ref().map(latency_line),
    }
}

fn latency_line(p: &LatencyPercentiles) -> JsonLatency {
    JsonLatency {
        p50_secs: p.p50.as_secs_f64(),
        p90_secs: p.p90.as_secs_f64(),
        p99_secs: p.p99.as_secs_f64(),
    }
}

/// Chart-ready document: stage comparison, cumulative errors, per-endpoint distribution.
pub(crate) fn build_summary(results: &RunResults, report: &AggregateReport) -> JsonSummary {
    JsonSummary {
        kind: "summary",
        elapsed_secs: results.elapsed.as_secs_f64(),
        sessions: JsonSessions {
            completed: results.sessions.completed,
            failed_at_register: results.sessions.failed_at_register,
            failed_at_login: results.sessions.failed_at_login,
        },
        total_requests: report.total_outcomes,
        total_errors: report.total_errors,
        stages: report.stages().into_iter().map(stage_line).collect(),
        cumulative_errors: report
            .cumulative_errors
            .iter()
            .map(|p| JsonErrorPoint {
                elapsed_secs: p.elapsed.as_secs_f64(),
                errors_so_far: p.errors_so_far,
            })
            .collect(),
        endpoints: report
            .by_endpoint
            .iter()
            .map(|e| JsonEndpointSeries {
                endpoint: e.endpoint.to_string(),
                stage: e.stage.to_string(),
                elapsed_secs: e.elapsed.iter().map(|d| d.as_secs_f64()).collect(),
            })
            .collect(),
    }
}

fn emit_json_line<T: Serialize>(value: &T) {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    if serde_json::to_writer(&mut lock, value).is_ok() {
        let _ = writeln!(lock);
    }
}
