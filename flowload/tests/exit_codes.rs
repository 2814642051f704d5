use std::process::Command;

use anyhow::Context as _;
use flowload_testserver::{TestServer, TestServerOptions};

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn ensure_code(out: &std::process::Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = Command::new(exe)
        .arg("run")
        .arg("--request-timeout")
        .arg("10x")
        .output()
        .context("run flowload binary")?;

    ensure_code(&out, 30)
}

#[test]
fn zero_users_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = Command::new(exe)
        .arg("run")
        .arg("--users")
        .arg("0")
        .arg("--no-results-file")
        .env_remove("FLOWLOAD_USERS")
        .output()
        .context("run flowload binary")?;

    ensure_code(&out, 30)
}

#[test]
fn oversized_concurrency_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = Command::new(exe)
        .arg("run")
        .arg("--concurrency")
        .arg(usize::MAX.to_string())
        .arg("--no-results-file")
        .env_remove("FLOWLOAD_CONCURRENCY")
        .output()
        .context("run flowload binary")?;

    ensure_code(&out, 30)
}

#[test]
fn duplicate_endpoint_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = Command::new(exe)
        .arg("run")
        .arg("--endpoint")
        .arg("/api/v1/auth/login")
        .arg("--no-results-file")
        .output()
        .context("run flowload binary")?;

    ensure_code(&out, 30)
}

#[test]
fn missing_config_file_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = Command::new(exe)
        .arg("run")
        .arg("--config")
        .arg("./definitely-not-here.yaml")
        .arg("--no-results-file")
        .output()
        .context("run flowload binary")?;

    ensure_code(&out, 30)
}

#[test]
fn unsupported_scheme_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = Command::new(exe)
        .arg("run")
        .arg("--base-url")
        .arg("ftp://127.0.0.1:21")
        .arg("--no-results-file")
        .env_remove("FLOWLOAD_BASE_URL")
        .output()
        .context("run flowload binary")?;

    ensure_code(&out, 30)
}

#[tokio::test]
async fn failures_exit_10_with_fail_on_errors() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerOptions {
        fail_every_nth_login: Some(1),
        ..TestServerOptions::default()
    })
    .await
    .context("start test server")?;
    let base_url = server.base_url().to_string();
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg("--base-url")
            .arg(&base_url)
            .arg("--users")
            .arg("3")
            .arg("--no-results-file")
            .arg("--fail-on-errors")
            .arg("--output")
            .arg("json")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run flowload binary")?;

    server.shutdown().await;

    ensure_code(&out, 10)
}

#[tokio::test]
async fn failures_without_flag_exit_0() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerOptions {
        fail_every_nth_login: Some(1),
        ..TestServerOptions::default()
    })
    .await
    .context("start test server")?;
    let base_url = server.base_url().to_string();
    let exe = env!("CARGO_BIN_EXE_flowload");

    let out = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg("--base-url")
            .arg(&base_url)
            .arg("--users")
            .arg("2")
            .arg("--no-results-file")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run flowload binary")?;

    server.shutdown().await;

    ensure_code(&out, 0)
}
