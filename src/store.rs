// src/store.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

use crate::{
    image::{self, ResolvedImage},
    map::NormalizedRecord,
    stats::{self, MonthSeries, Stats, MONTH_LABELS},
};

/// One record plus its resolved image annotation. The annotation is
/// computed once at dataset build time and cached here, since records
/// never change after a build.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRecord {
    #[serde(flatten)]
    pub record: NormalizedRecord,
    pub image: ResolvedImage,
}

/// A fully derived view of one successful pipeline run: the records and
/// everything the presentation layer reads off them.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub updated_at: DateTime<Utc>,
    pub stats: Stats,
    pub month_labels: [&'static str; 12],
    pub months: MonthSeries,
    pub records: Vec<DatasetRecord>,
}

impl Dataset {
    pub fn build(records: Vec<NormalizedRecord>) -> Self {
        let stats = stats::calculate(&records);
        let months = stats::month_series(&records);
        let records = records
            .into_iter()
            .map(|record| {
                let image = image::process_reference(&record.image_reference);
                DatasetRecord { record, image }
            })
            .collect();
        Self {
            updated_at: Utc::now(),
            stats,
            month_labels: MONTH_LABELS,
            months,
            records,
        }
    }

    /// Write the JSON snapshot the presentation layer reads.
    pub fn write_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), records = self.records.len(), "snapshot written");
        Ok(())
    }
}

/// Last-good dataset holder. Swapped wholesale on full pipeline success;
/// a failed refresh leaves the previous dataset untouched, so the
/// presentation never blanks.
#[derive(Default)]
pub struct DatasetStore {
    current: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn swap(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        *self.current.lock().unwrap() = Some(Arc::clone(&dataset));
        dataset
    }

    pub fn latest(&self) -> Option<Arc<Dataset>> {
        self.current.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, image: &str) -> NormalizedRecord {
        NormalizedRecord {
            title: title.into(),
            origin: "JOB-1".into(),
            reported_by: "Fulano".into(),
            resolution_owner: "Ciclano".into(),
            deadline_days: 5,
            opened_date: "2024-03-15".into(),
            closed_date: None,
            image_reference: image.into(),
        }
    }

    #[test]
    fn build_derives_stats_and_image_annotations() {
        let ds = Dataset::build(vec![record(
            "Obra",
            "https://drive.google.com/file/d/ABC123/view",
        )]);
        assert_eq!(ds.stats.total, 1);
        assert_eq!(ds.months.opened[2], 1);
        assert_eq!(ds.records[0].image.file_id.as_deref(), Some("ABC123"));
    }

    #[test]
    fn store_keeps_last_good_until_next_swap() {
        let store = DatasetStore::new();
        assert!(store.latest().is_none());

        store.swap(Dataset::build(vec![record("Primeira", "")]));
        let first = store.latest().unwrap();
        assert_eq!(first.records[0].record.title, "Primeira");

        // A failed refresh performs no swap; the holder is untouched.
        let still = store.latest().unwrap();
        assert_eq!(still.records[0].record.title, "Primeira");

        store.swap(Dataset::build(vec![record("Segunda", "")]));
        assert_eq!(store.latest().unwrap().records[0].record.title, "Segunda");
    }

    #[test]
    fn snapshot_has_the_published_shape() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("dados").join("dados.json");

        let ds = Dataset::build(vec![record("Obra", "")]);
        ds.write_snapshot(&path)?;

        let text = std::fs::read_to_string(&path)?;
        let v: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(v["stats"]["total"], 1);
        assert_eq!(v["month_labels"][2], "Mar");
        assert_eq!(v["records"][0]["title"], "Obra");
        assert_eq!(v["records"][0]["image"]["file_id"], serde_json::Value::Null);
        Ok(())
    }
}
