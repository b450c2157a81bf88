// src/map/mod.rs
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub mod aliases;

pub use aliases::AliasTable;

use crate::parse::RawRow;

/// Placeholder used for people/origin fields the sheet left blank.
pub const NOT_INFORMED: &str = "Não informado";

/// Synthesized title prefix; a record whose final title is the bare
/// prefix is considered unusable and dropped.
const TITLE_PLACEHOLDER: &str = "RNC";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// One non-conformance record in the stable internal schema.
/// Immutable once built; the whole collection is replaced on refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    pub title: String,
    pub origin: String,
    pub reported_by: String,
    pub resolution_owner: String,
    /// Days granted to resolve; 0 when absent or unparsable.
    pub deadline_days: u32,
    /// Kept verbatim from the sheet; defaults to today (ISO) when absent.
    pub opened_date: String,
    /// `None` means the RNC is still open.
    pub closed_date: Option<String>,
    /// Raw external-storage reference, possibly empty.
    pub image_reference: String,
}

impl NormalizedRecord {
    pub fn is_closed(&self) -> bool {
        self.closed_date
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Resolve one logical field from a raw row: exact header match first,
/// then case/trim-insensitive, both in alias-list order. No match is an
/// empty string; the caller applies the field's default.
pub fn find_column<'a>(row: &'a RawRow, patterns: &[String]) -> &'a str {
    for pattern in patterns {
        if let Some(v) = row.get(pattern) {
            return v;
        }
        if let Some(v) = row.get_normalized(pattern) {
            return v;
        }
    }
    ""
}

/// First contiguous digit run in the resolved string, else 0.
/// "10 dias" → 10, "sem prazo" → 0.
fn extract_deadline_days(raw: &str) -> u32 {
    match DIGITS.find(raw) {
        Some(m) => m.as_str().parse().unwrap_or_else(|_| {
            warn!(raw, "deadline digits overflow, defaulting to 0");
            0
        }),
        None => {
            if !raw.trim().is_empty() {
                warn!(raw, "no digits in deadline field, defaulting to 0");
            }
            0
        }
    }
}

fn or_not_informed(v: &str) -> String {
    if v.trim().is_empty() {
        NOT_INFORMED.to_string()
    } else {
        v.to_string()
    }
}

/// Map one raw row to a record. `position` is the 1-based row position,
/// used only to synthesize a title of last resort. Returns `None` when
/// no usable title can be produced.
pub fn map_row(row: &RawRow, position: usize, aliases: &AliasTable) -> Option<NormalizedRecord> {
    let title = find_column(row, &aliases.title);
    let origin = find_column(row, &aliases.origin);
    let reported_by = find_column(row, &aliases.reported_by);
    let resolution_owner = find_column(row, &aliases.resolution_owner);
    let deadline_days = extract_deadline_days(find_column(row, &aliases.deadline));
    let opened_date = find_column(row, &aliases.opened_date).to_string();
    let closed_date = find_column(row, &aliases.closed_date).to_string();

    // Primary image group first, legacy columns only if it came up empty.
    let mut image_reference = find_column(row, &aliases.image_primary).to_string();
    if image_reference.trim().is_empty() {
        image_reference = find_column(row, &aliases.image_secondary).to_string();
    }

    // Title fallback chain: alias hit → first non-empty cell → "RNC <n>".
    let title = if title.trim().is_empty() {
        match row.first_non_empty_value() {
            Some(v) => v.to_string(),
            None => format!("{} {}", TITLE_PLACEHOLDER, position),
        }
    } else {
        title.trim().to_string()
    };

    if title.is_empty() || title == TITLE_PLACEHOLDER {
        debug!(position, "dropping row without usable title");
        return None;
    }

    Some(NormalizedRecord {
        title,
        origin: or_not_informed(origin),
        reported_by: or_not_informed(reported_by),
        resolution_owner: or_not_informed(resolution_owner),
        deadline_days,
        opened_date: if opened_date.trim().is_empty() {
            Local::now().date_naive().format("%Y-%m-%d").to_string()
        } else {
            opened_date
        },
        closed_date: if closed_date.trim().is_empty() {
            None
        } else {
            Some(closed_date)
        },
        image_reference,
    })
}

/// Map all raw rows, dropping the unusable ones.
pub fn map_rows(rows: &[RawRow], aliases: &AliasTable) -> Vec<NormalizedRecord> {
    let records: Vec<NormalizedRecord> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| map_row(row, i + 1, aliases))
        .collect();
    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!(dropped, kept = records.len(), "rows without usable titles");
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cols: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            cols.iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn aliases() -> AliasTable {
        AliasTable::default()
    }

    #[test]
    fn exact_alias_wins_over_normalized() {
        let r = row(&[("Título", "exato"), (" título ", "normalizado")]);
        assert_eq!(find_column(&r, &aliases().title), "exato");
    }

    #[test]
    fn alias_resolution_is_case_and_whitespace_insensitive() {
        let r = row(&[(" Título ", "Obra 12")]);
        assert_eq!(find_column(&r, &aliases().title), "Obra 12");
    }

    #[test]
    fn alias_order_is_priority_order() {
        let r = row(&[("Obra", "da coluna genérica"), ("Título", "da específica")]);
        assert_eq!(find_column(&r, &aliases().title), "da específica");
    }

    #[test]
    fn deadline_digit_extraction() {
        assert_eq!(extract_deadline_days("10 dias"), 10);
        assert_eq!(extract_deadline_days("prazo de 15 dias úteis"), 15);
        assert_eq!(extract_deadline_days("sem prazo"), 0);
        assert_eq!(extract_deadline_days(""), 0);
    }

    #[test]
    fn people_fields_default_to_not_informed() {
        let r = row(&[("Título", "Obra 1")]);
        let rec = map_row(&r, 1, &aliases()).unwrap();
        assert_eq!(rec.origin, NOT_INFORMED);
        assert_eq!(rec.reported_by, NOT_INFORMED);
        assert_eq!(rec.resolution_owner, NOT_INFORMED);
    }

    #[test]
    fn missing_opened_date_defaults_to_today() {
        let r = row(&[("Título", "Obra 1")]);
        let rec = map_row(&r, 1, &aliases()).unwrap();
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(rec.opened_date, today);
    }

    #[test]
    fn closed_date_none_is_the_open_discriminator() {
        let open = map_row(&row(&[("Título", "A")]), 1, &aliases()).unwrap();
        assert_eq!(open.closed_date, None);
        assert!(!open.is_closed());

        let closed = map_row(
            &row(&[("Título", "B"), ("Data Conclusão", "10/05/2024")]),
            1,
            &aliases(),
        )
        .unwrap();
        assert_eq!(closed.closed_date.as_deref(), Some("10/05/2024"));
        assert!(closed.is_closed());
    }

    #[test]
    fn dates_are_kept_verbatim() {
        let rec = map_row(
            &row(&[("Título", "A"), ("Data de emissão:", "01/02/2024 10:00:00")]),
            1,
            &aliases(),
        )
        .unwrap();
        assert_eq!(rec.opened_date, "01/02/2024 10:00:00");
    }

    #[test]
    fn title_falls_back_to_first_non_empty_cell() {
        let r = row(&[("Data", "01/02/2024 10:00:00"), ("Coluna X", "algo")]);
        let rec = map_row(&r, 3, &aliases()).unwrap();
        assert_eq!(rec.title, "01/02/2024 10:00:00");
    }

    #[test]
    fn title_synthesized_from_position_when_row_is_blank() {
        let r = row(&[("Data", ""), ("Coluna X", "")]);
        let rec = map_row(&r, 7, &aliases()).unwrap();
        assert_eq!(rec.title, "RNC 7");
    }

    #[test]
    fn bare_placeholder_title_drops_the_record() {
        let r = row(&[("Título", "RNC")]);
        assert!(map_row(&r, 1, &aliases()).is_none());
    }

    #[test]
    fn secondary_image_group_only_when_primary_empty() {
        let both = row(&[
            ("Título", "A"),
            ("Insira até 3 imagens", "ref-primaria"),
            ("Link da imagem", "ref-legada"),
        ]);
        let rec = map_row(&both, 1, &aliases()).unwrap();
        assert_eq!(rec.image_reference, "ref-primaria");

        let legacy_only = row(&[("Título", "A"), ("Link da imagem", "ref-legada")]);
        let rec = map_row(&legacy_only, 1, &aliases()).unwrap();
        assert_eq!(rec.image_reference, "ref-legada");
    }

    #[test]
    fn map_rows_drops_only_unusable() {
        let rows = vec![
            row(&[("Título", "Boa")]),
            row(&[("Título", "RNC")]),
            row(&[("Título", "Outra")]),
        ];
        let recs = map_rows(&rows, &aliases());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Boa");
        assert_eq!(recs[1].title, "Outra");
    }
}
