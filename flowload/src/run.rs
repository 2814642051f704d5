use anyhow::Context as _;
use std::path::Path;
use std::sync::Arc;

use flowload_core::{
    HttpCapability, HttpClient, LoadConfig, LoadOverrides, Target, run_sessions, summarize,
    write_results_file,
};

use crate::cli::RunArgs;
use crate::config_file::ConfigFile;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    let file = match &args.config {
        Some(path) => ConfigFile::load(path)
            .await
            .map_err(RunError::InvalidInput)?
            .into_overrides(),
        None => LoadOverrides::default(),
    };
    let cfg = LoadConfig::resolve(file, args.overrides())
        .map_err(|e| RunError::from_core(e, "invalid configuration"))?;

    out.print_header(&cfg);

    let client: Arc<dyn HttpCapability> = Arc::new(HttpClient::new(Some(cfg.connect_timeout)));
    let target = Arc::new(Target::from_config(&cfg));

    let results = run_sessions(
        client,
        target.clone(),
        cfg.users,
        cfg.concurrency,
        out.progress(),
    )
    .await
    .map_err(|e| RunError::from_core(e, "load run failed"))?;

    let report = summarize(&results.outcomes, &target);
    out.print_summary(&results, &report)
        .map_err(RunError::RuntimeError)?;

    if !args.no_results_file {
        write_results_file(&args.results_file, &results.outcomes, &report)
            .map_err(|e| RunError::from_core(e, "failed to write results file"))?;
    }

    if let Some(path) = &args.series_out {
        write_series(path, &output::json::build_summary(&results, &report))
            .await
            .map_err(RunError::RuntimeError)?;
        tracing::info!(path = %path.display(), "series written");
    }

    Ok(ExitCode::from_run(report.total_errors, args.fail_on_errors))
}

async fn write_series(path: &Path, summary: &output::json::JsonSummary) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(summary).context("failed to serialize series")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create dir: {}", parent.display()))?;
    }

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write series file: {}", path.display()))?;
    Ok(())
}
