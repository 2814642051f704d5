use crate::cli::OutputFormat;

use flowload_core::{AggregateReport, LoadConfig, ProgressFn, RunResults};

mod human;
pub(crate) mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, cfg: &LoadConfig);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_summary(&self, results: &RunResults, report: &AggregateReport) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
