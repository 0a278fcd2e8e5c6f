use crate::domain::model::{ColumnCandidates, Movement, Notice, Record, SheetTable};
use crate::domain::services::capacity::{code_number, CapacityTable};
use crate::domain::services::columns::{first_non_empty, resolve_columns, ColumnMap};
use crate::domain::services::text::normalize_text;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub movements: Vec<Movement>,
    pub dropped: usize,
    pub notices: Vec<Notice>,
}

/// Tries each format in order; date-only formats mean midnight.
pub fn parse_timestamp(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format).ok().or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
    })
}

/// Turns raw rows into movements with derived volume and status key.
///
/// Rows without an identifier or with an unreadable timestamp are dropped and
/// counted; the count is surfaced as a single warning.
pub fn clean_records(
    table: &SheetTable,
    candidates: &ColumnCandidates,
    capacity: &CapacityTable,
) -> CleanOutcome {
    let (columns, mut notices) = resolve_columns(&table.headers, candidates);
    if !columns.is_usable() {
        notices.push(Notice::warning(
            "inventory",
            "Identifier or timestamp column missing; current inventory cannot be computed",
        ));
        return CleanOutcome {
            movements: Vec::new(),
            dropped: table.records.len(),
            notices,
        };
    }

    let mut movements = Vec::with_capacity(table.records.len());
    let mut dropped = 0;

    for record in &table.records {
        match to_movement(record, &columns, candidates, capacity) {
            Some(movement) => movements.push(movement),
            None => {
                tracing::debug!("Dropping sheet line {}: {:?}", record.line, record.values);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        notices.push(Notice::warning(
            "clean",
            format!(
                "{} of {} rows skipped (missing identifier or unreadable timestamp)",
                dropped,
                table.records.len()
            ),
        ));
    }

    CleanOutcome {
        movements,
        dropped,
        notices,
    }
}

fn to_movement(
    record: &Record,
    columns: &ColumnMap,
    candidates: &ColumnCandidates,
    capacity: &CapacityTable,
) -> Option<Movement> {
    let identifier = first_non_empty(record, &columns.identifier)?.to_string();
    let timestamp = first_non_empty(record, &columns.timestamp)
        .and_then(|v| parse_timestamp(v, &candidates.timestamp_formats))?;

    let status = first_non_empty(record, &columns.status)
        .unwrap_or_default()
        .to_string();
    let style = first_non_empty(record, &columns.style)
        .map(str::to_string)
        .unwrap_or_else(|| candidates.unknown_style.clone());

    Some(Movement {
        volume: capacity.volume_for(&identifier),
        code_number: code_number(&identifier),
        status_key: normalize_text(&status),
        customer: first_non_empty(record, &columns.customer).map(str::to_string),
        operator: first_non_empty(record, &columns.operator).map(str::to_string),
        identifier,
        timestamp,
        status,
        style,
        line: record.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn table(headers: &[&str], rows: &[&[&str]]) -> SheetTable {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, row)| Record {
                line: i + 2,
                values: row.iter().map(|v| v.to_string()).collect(),
            })
            .collect();
        SheetTable { headers, records }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let formats = ColumnCandidates::default().timestamp_formats;

        let ts = parse_timestamp("17/03/2024 14:05:33", &formats).unwrap();
        assert_eq!((ts.day(), ts.month(), ts.hour()), (17, 3, 14));

        let ts = parse_timestamp("2024-03-17 08:00:00", &formats).unwrap();
        assert_eq!(ts.day(), 17);

        let ts = parse_timestamp("05/01/2024", &formats).unwrap();
        assert_eq!((ts.day(), ts.month(), ts.hour()), (5, 1, 0));

        assert!(parse_timestamp("ayer", &formats).is_none());
        assert!(parse_timestamp("", &formats).is_none());
    }

    #[test]
    fn test_clean_derives_fields() {
        let sheet = table(
            &["Marca temporal", "Código", "Estado", "Estilo", "Estilo del barril", "Cliente"],
            &[
                &["17/03/2024 14:05:33", "20015", " Lleno ", "", "IPA", ""],
                &["18/03/2024 09:00:00", "58002", "En Cliente", "Stout", "", "Bar Sur"],
            ],
        );
        let out = clean_records(&sheet, &ColumnCandidates::default(), &CapacityTable::default());

        assert_eq!(out.dropped, 0);
        // no operator column is fine; customer is optional too
        assert!(out.notices.is_empty());
        assert_eq!(out.movements.len(), 2);

        let first = &out.movements[0];
        assert_eq!(first.identifier, "20015");
        assert_eq!(first.volume, 20);
        assert_eq!(first.status, "Lleno");
        assert_eq!(first.status_key, "lleno");
        assert_eq!(first.style, "IPA");
        assert_eq!(first.customer, None);
        assert_eq!(first.code_number, Some(20015.0));
        assert_eq!(first.line, 2);

        let second = &out.movements[1];
        assert_eq!(second.volume, 58);
        assert_eq!(second.status_key, "en cliente");
        assert_eq!(second.customer.as_deref(), Some("Bar Sur"));
    }

    #[test]
    fn test_clean_drops_and_reports_bad_rows() {
        let sheet = table(
            &["Marca temporal", "Código", "Estado", "Estilo"],
            &[
                &["17/03/2024 14:05:33", "", "Lleno", "IPA"],
                &["no es fecha", "20001", "Lleno", "IPA"],
                &["17/03/2024 14:05:33", "30001", "", ""],
            ],
        );
        let out = clean_records(&sheet, &ColumnCandidates::default(), &CapacityTable::default());

        assert_eq!(out.dropped, 2);
        assert_eq!(out.movements.len(), 1);
        assert_eq!(out.movements[0].style, "Sin estilo");
        assert_eq!(out.movements[0].status_key, "");
        assert_eq!(out.notices.len(), 1);
        assert!(out.notices[0].message.starts_with("2 of 3 rows"));
    }

    #[test]
    fn test_clean_keeps_first_of_duplicated_headers() {
        let sheet = table(
            &["Marca temporal", "Código", "Estado", "Estilo", "Estilo"],
            &[
                &["17/03/2024 10:00:00", "20001", "Lleno", "IPA", ""],
                &["17/03/2024 11:00:00", "30001", "Lleno", "", "Stout"],
            ],
        );
        let out = clean_records(&sheet, &ColumnCandidates::default(), &CapacityTable::default());

        assert_eq!(out.movements[0].style, "IPA");
        assert_eq!(out.movements[1].style, "Stout");
    }

    #[test]
    fn test_clean_without_identifier_column() {
        let sheet = table(&["Marca temporal", "Estado", "Estilo"], &[&["17/03/2024", "Lleno", "IPA"]]);
        let out = clean_records(&sheet, &ColumnCandidates::default(), &CapacityTable::default());

        assert!(out.movements.is_empty());
        assert_eq!(out.dropped, 1);
        assert!(out.notices.iter().any(|n| n.section == "inventory"));
    }
}
