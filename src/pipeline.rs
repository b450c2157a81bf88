// src/pipeline.rs
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    map::{self, AliasTable, NormalizedRecord},
    parse::{self, ParseOptions},
};

/// Only total failure surfaces from a pipeline run; individual bad rows
/// and fields degrade in place.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The CSV parsed into data rows but none produced a usable record.
    /// Distinct from empty input so the caller can keep its last-good
    /// dataset instead of blanking the presentation.
    #[error("no usable records among {parsed_rows} parsed rows")]
    NoUsableRecords { parsed_rows: usize },
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub parse: ParseOptions,
    pub aliases: AliasTable,
}

/// Full normalization pass: CSV text → normalized records.
///
/// Degenerate input (nothing parseable) is an `Ok` empty Vec; a
/// non-empty parse where every row is rejected is `NoUsableRecords`.
pub fn run(csv_text: &str, opts: &PipelineOptions) -> Result<Vec<NormalizedRecord>, PipelineError> {
    let rows = parse::parse_csv(csv_text, &opts.parse);
    if rows.is_empty() {
        warn!("no data rows in CSV input");
        return Ok(Vec::new());
    }

    let records = map::map_rows(&rows, &opts.aliases);
    if records.is_empty() {
        return Err(PipelineError::NoUsableRecords {
            parsed_rows: rows.len(),
        });
    }

    info!(
        rows = rows.len(),
        records = records.len(),
        "pipeline run complete"
    );
    Ok(records)
}
