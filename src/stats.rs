// src/stats.rs
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::map::NormalizedRecord;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Summary counters for the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    /// Mean deadline over records with a positive deadline, rounded to
    /// the nearest day; 0 when no record carries one.
    pub mean_deadline_days: u32,
}

/// Month-bucketed open/close counts, January..December.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthSeries {
    pub opened: [u32; 12],
    pub closed: [u32; 12],
}

/// Compute the header counters. Total-failure-proof: the empty
/// collection yields all zeros.
pub fn calculate(records: &[NormalizedRecord]) -> Stats {
    let total = records.len();
    let closed = records.iter().filter(|r| r.is_closed()).count();

    let with_deadline: Vec<u32> = records
        .iter()
        .map(|r| r.deadline_days)
        .filter(|&d| d > 0)
        .collect();
    let mean_deadline_days = if with_deadline.is_empty() {
        0
    } else {
        let sum: u64 = with_deadline.iter().map(|&d| u64::from(d)).sum();
        ((sum as f64 / with_deadline.len() as f64).round()) as u32
    };

    Stats {
        total,
        open: total - closed,
        closed,
        mean_deadline_days,
    }
}

/// Parse the sheet's date strings: ISO `YYYY-MM-DD` or day-first
/// `DD/MM/YYYY`, each with an optional ` HH:MM:SS` tail. Anything else
/// is `None`; callers skip, they never fail.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

/// Bucket openings and closings by month. Unparsable dates contribute to
/// neither series.
pub fn month_series(records: &[NormalizedRecord]) -> MonthSeries {
    let mut series = MonthSeries::default();

    for record in records {
        match parse_sheet_date(&record.opened_date) {
            Some(d) => series.opened[d.month0() as usize] += 1,
            None => debug!(date = %record.opened_date, title = %record.title, "unparsable opened date"),
        }
        if let Some(closed) = &record.closed_date {
            match parse_sheet_date(closed) {
                Some(d) => series.closed[d.month0() as usize] += 1,
                None => debug!(date = %closed, title = %record.title, "unparsable closed date"),
            }
        }
    }

    series
}
