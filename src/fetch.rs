// src/fetch.rs
use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Ordered export URLs for one worksheet. The direct export endpoint is
/// preferred; the gviz endpoint is a fallback that has historically kept
/// working when export was flaky, and the gid-less variants cover sheets
/// whose gid changed.
pub fn build_csv_urls(sheet_id: &str, gid: &str) -> Result<Vec<String>> {
    let base = format!("https://docs.google.com/spreadsheets/d/{}", sheet_id);

    let export_gid = Url::parse_with_params(
        &format!("{}/export", base),
        &[("format", "csv"), ("gid", gid)],
    )?;
    let export = Url::parse_with_params(&format!("{}/export", base), &[("format", "csv")])?;
    let gviz_gid = Url::parse_with_params(
        &format!("{}/gviz/tq", base),
        &[("tqx", "out:csv"), ("gid", gid)],
    )?;
    let gviz = Url::parse_with_params(&format!("{}/gviz/tq", base), &[("tqx", "out:csv")])?;

    Ok(vec![
        export_gid.to_string(),
        export.to_string(),
        gviz_gid.to_string(),
        gviz.to_string(),
    ])
}

/// Reject payloads that are clearly not the CSV export: empty bodies and
/// the HTML error/login pages the endpoint serves for private sheets.
pub fn validate_csv(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("empty response body");
    }
    if text.contains("<!DOCTYPE") || text.contains("<html") {
        bail!("received HTML instead of CSV; the sheet may not be public");
    }
    Ok(())
}

/// Download the worksheet CSV, walking the fallback URL list with a
/// small per-URL retry budget. First validated payload wins.
pub async fn fetch_csv(client: &Client, sheet_id: &str, gid: &str) -> Result<String> {
    let urls = build_csv_urls(sheet_id, gid)?;
    let mut last_err = None;

    for (i, url) in urls.iter().enumerate() {
        let mut attempt = 0;
        let text = loop {
            attempt += 1;
            match try_fetch(client, url).await {
                Ok(text) => break Some(text),
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(url = %url, attempt, error = %e, "fetch attempt failed, retrying");
                    sleep(RETRY_DELAY).await;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "URL exhausted, trying next");
                    last_err = Some(e);
                    break None;
                }
            }
        };

        if let Some(text) = text {
            info!(
                url = %url,
                fallback_index = i,
                bytes = text.len(),
                "CSV downloaded"
            );
            return Ok(text);
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no CSV URLs configured")))
        .context("all CSV sources failed")
}

async fn try_fetch(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header("Accept", "text/csv, text/plain, */*")
        .send()
        .await?
        .error_for_status()?;
    let text = resp.text().await?;
    validate_csv(&text)?;
    Ok(text)
}

/// Read the local CSV file if it exists and holds anything usable.
/// Absence is not an error; the caller goes online instead.
pub fn load_local(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => {
            info!(path = %path.display(), bytes = text.len(), "loaded local CSV");
            Some(text)
        }
        Ok(_) => {
            warn!(path = %path.display(), "local CSV is empty, ignoring");
            None
        }
        Err(_) => None,
    }
}
