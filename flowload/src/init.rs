use anyhow::Context as _;
use std::path::Path;

use crate::cli::InitArgs;

pub(crate) const STARTER_CONFIG: &str = r#"# flowload configuration.
# CLI flags and FLOWLOAD_* environment variables override these values.

# Service under test.
baseUrl: http://localhost:8080

# POST with {username, email, password, confirmPassword}; expects 201.
registerPath: /api/v1/auth/register

# POST with {identity: email, password}; expects 200 and a `data.token` in the body.
loginPath: /api/v1/auth/login

# GET with `Authorization: Bearer <token>`, in this order; each expects 200.
endpoints:
  - /api/v1/profile/me
  - /api/v1/auth/get-me

# Simulated users. Each one registers, logs in, and calls every endpoint once.
users: 100

# Cap on sessions in flight. Remove to start every session at once.
# concurrency: 50

requestTimeout: 10s
connectTimeout: 3s
"#;

pub async fn init(args: InitArgs) -> anyhow::Result<()> {
    let root = &args.dir;
    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("failed to create dir: {}", root.display()))?;

    let path = root.join(&args.file);
    write_file(&path, STARTER_CONFIG, args.force).await?;
    println!("wrote {}", path.display());
    Ok(())
}

async fn write_file(path: &Path, contents: &str, force: bool) -> anyhow::Result<()> {
    if !force
        && tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("failed to check file existence: {}", path.display()))?
    {
        anyhow::bail!(
            "refusing to overwrite existing file (use --force): {}",
            path.display()
        );
    }

    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write file: {}", path.display()))?;

    Ok(())
}
