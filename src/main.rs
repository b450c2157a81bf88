use anyhow::{bail, Context, Result};
use reqwest::Client;
use rnc_pipeline::{
    config::Config,
    fetch, pipeline,
    pipeline::PipelineOptions,
    store::{Dataset, DatasetStore},
};
use std::sync::Arc;
use tokio::{
    sync::Mutex,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let config = Config::load()?;
    let opts = config.pipeline_options()?;
    let client = Client::new();
    let store = Arc::new(DatasetStore::new());

    // ─── 3) initial load: local CSV first, then online ───────────────
    let initial = match fetch::load_local(&config.local_csv) {
        Some(text) => Ok(text),
        None => fetch::fetch_csv(&client, &config.sheet_id, &config.gid).await,
    };
    match initial {
        Ok(text) => {
            if let Err(e) = apply_csv(&text, &opts, &store, &config) {
                error!("initial dataset rejected: {:#}", e);
            }
        }
        Err(e) => error!("initial load failed, will retry on schedule: {:#}", e),
    }

    // ─── 4) periodic refresh with a single-flight guard ──────────────
    // The ticker alone cannot overlap runs, but the guard makes that a
    // guarantee rather than a property of the loop shape.
    let in_flight = Arc::new(Mutex::new(()));
    let mut ticker = interval(Duration::from_secs(config.update_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // immediate first tick, already handled above

    info!(
        interval_secs = config.update_interval_secs,
        "refresh loop started"
    );
    loop {
        ticker.tick().await;
        let Ok(_guard) = in_flight.try_lock() else {
            warn!("previous refresh still running, skipping this tick");
            continue;
        };

        match refresh(&client, &opts, &store, &config).await {
            Ok(dataset) => info!(
                total = dataset.stats.total,
                open = dataset.stats.open,
                closed = dataset.stats.closed,
                "dataset refreshed"
            ),
            // Keep the last-good dataset; the presentation layer keeps
            // showing it untouched.
            Err(e) => warn!("refresh failed, keeping previous dataset: {:#}", e),
        }
    }
}

/// One refresh cycle: download, normalize, swap, publish snapshot.
async fn refresh(
    client: &Client,
    opts: &PipelineOptions,
    store: &DatasetStore,
    config: &Config,
) -> Result<Arc<Dataset>> {
    let text = fetch::fetch_csv(client, &config.sheet_id, &config.gid).await?;
    apply_csv(&text, opts, store, config)
}

fn apply_csv(
    text: &str,
    opts: &PipelineOptions,
    store: &DatasetStore,
    config: &Config,
) -> Result<Arc<Dataset>> {
    let records = pipeline::run(text, opts).context("normalizing CSV")?;
    if records.is_empty() {
        bail!("CSV contained no data rows");
    }

    let dataset = store.swap(Dataset::build(records));
    dataset.write_snapshot(&config.snapshot_path)?;
    Ok(dataset)
}
