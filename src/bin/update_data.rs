// One-shot updater: download the worksheet CSV and save it as the local
// data file. Meant for cron; exits non-zero when every source fails so
// the job shows up as failed.
use anyhow::{Context, Result};
use reqwest::Client;
use rnc_pipeline::{config::Config, fetch};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = Config::load()?;
    let client = Client::new();

    let text = fetch::fetch_csv(&client, &config.sheet_id, &config.gid).await?;

    let path = Path::new(&config.local_csv);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;

    info!(
        path = %path.display(),
        kib = format!("{:.2}", text.len() as f64 / 1024.0),
        "local CSV updated"
    );
    Ok(())
}
