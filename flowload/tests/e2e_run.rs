use std::process::Command;

use anyhow::Context as _;
use flowload_testserver::TestServer;

fn run_ok(out: &std::process::Output) -> anyhow::Result<()> {
    anyhow::ensure!(
        out.status.success(),
        "flowload failed ({:?})\nstdout:\n{}\nstderr:\n{}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[tokio::test]
async fn human_run_writes_results_file() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let base_url = server.base_url().to_string();
    let dir = tempfile::tempdir()?;
    let results = dir.path().join("out/test_results.txt");
    let results_arg = results.clone();
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg("--base-url")
            .arg(&base_url)
            .arg("--users")
            .arg("5")
            .arg("--concurrency")
            .arg("2")
            .arg("--results-file")
            .arg(&results_arg)
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run flowload binary")?;

    anyhow::ensure!(server.stats().registrations() == 5);
    anyhow::ensure!(server.stats().logins() == 5);
    anyhow::ensure!(server.stats().authorized_calls() == 10);
    server.shutdown().await;

    run_ok(&out)?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(stdout.contains("Registration analytics:"), "stdout:\n{stdout}");
    anyhow::ensure!(stdout.contains("Endpoints analytics:"), "stdout:\n{stdout}");
    anyhow::ensure!(stdout.contains("Success: 100.00%"), "stdout:\n{stdout}");

    let text = std::fs::read_to_string(&results).context("read results file")?;
    anyhow::ensure!(text.contains("Summary:"));
    anyhow::ensure!(text.contains("Request #20"));
    anyhow::ensure!(!text.contains("Request #21"));
    Ok(())
}

#[tokio::test]
async fn json_run_emits_summary_and_series() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let base_url = server.base_url().to_string();
    let dir = tempfile::tempdir()?;
    let series = dir.path().join("series.json");
    let series_arg = series.clone();
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg("--base-url")
            .arg(&base_url)
            .arg("--users")
            .arg("3")
            .arg("--endpoint")
            .arg("/api/v1/profile/me")
            .arg("--no-results-file")
            .arg("--series-out")
            .arg(&series_arg)
            .arg("--output")
            .arg("json")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run flowload binary")?;

    server.shutdown().await;
    run_ok(&out)?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    let summary = stdout
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .find(|v| v["kind"] == "summary")
        .context("no summary line in stdout")?;

    anyhow::ensure!(summary["total_requests"] == 9u64, "summary: {summary}");
    anyhow::ensure!(summary["total_errors"] == 0u64, "summary: {summary}");
    anyhow::ensure!(summary["sessions"]["completed"] == 3u64);

    let stages = summary["stages"].as_array().context("stages array")?;
    anyhow::ensure!(stages.len() == 3);
    anyhow::ensure!(stages[0]["stage"] == "register");
    anyhow::ensure!(stages[2]["total"] == 3u64);

    let endpoints = summary["endpoints"].as_array().context("endpoints array")?;
    anyhow::ensure!(
        endpoints
            .iter()
            .any(|e| e["endpoint"] == "/api/v1/profile/me"
                && e["elapsed_secs"].as_array().map(Vec::len) == Some(3))
    );

    let file: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&series).context("read series file")?)?;
    anyhow::ensure!(file["total_requests"] == 9u64);
    anyhow::ensure!(file["cumulative_errors"].as_array().map(Vec::len) == Some(9));
    Ok(())
}

#[tokio::test]
async fn config_file_values_are_overridden_by_flags() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let base_url = server.base_url().to_string();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("flowload.yaml");
    std::fs::write(
        &config,
        format!("baseUrl: {base_url}\nusers: 50\nendpoints:\n  - /api/v1/auth/get-me\n"),
    )?;
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg("--config")
            .arg(&config)
            .arg("--users")
            .arg("2")
            .arg("--no-results-file")
            .env_remove("FLOWLOAD_BASE_URL")
            .env_remove("FLOWLOAD_USERS")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run flowload binary")?;

    let registrations = server.stats().registrations();
    let calls = server.stats().authorized_calls();
    server.shutdown().await;
    run_ok(&out)?;

    anyhow::ensure!(registrations == 2, "registrations={registrations}");
    anyhow::ensure!(calls == 2, "authorized_calls={calls}");
    Ok(())
}
