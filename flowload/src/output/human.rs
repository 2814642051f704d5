use std::sync::Arc;

mod format;
mod progress;

use format::{format_duration, format_rate};
use progress::HumanProgress;

use flowload_core::{AggregateReport, LoadConfig, ProgressFn, RunResults, render_analytics};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, cfg: &LoadConfig) {
        println!("target: {}", cfg.base_url);
        println!(
            "users: {} concurrency: {} endpoints: {}",
            cfg.users,
            cfg.concurrency
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            cfg.endpoints.join(", ")
        );
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();
        Some(Arc::new(move |u| {
            let rate = u.sessions_done as f64 / u.elapsed.as_secs_f64().max(1e-9);
            let message = format!(
                "elapsed={} sessions/s={} requests={} errors={}",
                format_duration(u.elapsed),
                format_rate(rate),
                u.outcomes_total,
                u.failures_total
            );
            progress.update(u.sessions_done, u.sessions_total, message);
        }))
    }

    fn print_summary(&self, results: &RunResults, report: &AggregateReport) -> anyhow::Result<()> {
        self.progress.finish();

        let s = &results.sessions;
        println!(
            "sessions: {} completed, {} failed at registration, {} failed at login ({})",
            s.completed,
            s.failed_at_register,
            s.failed_at_login,
            format_duration(results.elapsed)
        );
        println!(
            "requests: {} total, {} errors",
            report.total_outcomes, report.total_errors
        );
        print!("{}", render_analytics(report));
        Ok(())
    }
}
