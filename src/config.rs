// src/config.rs
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::{
    map::AliasTable,
    parse::ParseOptions,
    pipeline::PipelineOptions,
};

/// Runtime configuration. Every field has a production default; a config
/// file only needs the keys it wants to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spreadsheet document id (the `/d/<id>/` segment of the edit URL).
    pub sheet_id: String,
    /// Worksheet gid within the document.
    pub gid: String,
    /// Local CSV used before going online, and written by the updater.
    pub local_csv: String,
    /// JSON snapshot consumed by the presentation layer.
    pub snapshot_path: String,
    /// Seconds between refresh attempts.
    pub update_interval_secs: u64,
    /// Record-boundary pattern; data rows are lines matching this. The
    /// sheet's timestamp format has drifted before, hence configurable.
    pub record_start_pattern: String,
    pub aliases: AliasTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_id: "1Md5fP17bXGEEmRXlbsTTo68F9ILROsAD9iPisUoNJ6g".to_string(),
            gid: "1443492060".to_string(),
            local_csv: "dados/dados.csv".to_string(),
            snapshot_path: "dados/dados.json".to_string(),
            update_interval_secs: 15 * 60,
            record_start_pattern: r"^\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}:\d{2}".to_string(),
            aliases: AliasTable::default(),
        }
    }
}

impl Config {
    /// Load from `RNC_CONFIG`, else `config.yaml` if present, else
    /// built-in defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("RNC_CONFIG") {
            info!(%path, "loading config from RNC_CONFIG");
            return Self::from_file(&path);
        }
        let default_path = Path::new("config.yaml");
        if default_path.exists() {
            info!("loading config.yaml");
            return Self::from_file(default_path);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse_options(&self) -> Result<ParseOptions> {
        let record_start = Regex::new(&self.record_start_pattern)
            .with_context(|| format!("invalid record_start_pattern {:?}", self.record_start_pattern))?;
        Ok(ParseOptions { record_start })
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        Ok(PipelineOptions {
            parse: self.parse_options()?,
            aliases: self.aliases.clone(),
        })
    }
}
