use crate::domain::model::{
    CorrelationMatrix, DailyCount, GroupBy, GroupTotal, HistogramBin, Movement, StatusCount,
};
use crate::domain::services::text::normalize_text;
use std::collections::{BTreeMap, HashMap};

pub const NO_CUSTOMER: &str = "Sin cliente";
pub const NO_OPERATOR: &str = "Sin responsable";
pub const NO_STATUS: &str = "Sin estado";

pub fn group_key(movement: &Movement, group_by: GroupBy) -> &str {
    match group_by {
        GroupBy::Style => movement.style.as_str(),
        GroupBy::Customer => movement.customer.as_deref().unwrap_or(NO_CUSTOMER),
        GroupBy::Operator => movement.operator.as_deref().unwrap_or(NO_OPERATOR),
        GroupBy::Status if movement.status.is_empty() => NO_STATUS,
        GroupBy::Status => movement.status.as_str(),
    }
}

/// Units and litres per group, largest volume first.
pub fn group_volume(records: &[Movement], group_by: GroupBy) -> Vec<GroupTotal> {
    let mut groups: HashMap<&str, GroupTotal> = HashMap::new();
    for record in records {
        let key = group_key(record, group_by);
        let entry = groups.entry(key).or_insert_with(|| GroupTotal {
            group: key.to_string(),
            units: 0,
            volume: 0,
        });
        entry.units += 1;
        entry.volume += record.volume as u64;
    }

    let mut totals: Vec<GroupTotal> = groups.into_values().collect();
    totals.sort_by(|a, b| b.volume.cmp(&a.volume).then_with(|| a.group.cmp(&b.group)));
    totals
}

/// Units per status; spellings that normalise alike are counted together
/// under the first spelling seen.
pub fn status_counts(records: &[Movement]) -> Vec<StatusCount> {
    let mut by_key: HashMap<String, StatusCount> = HashMap::new();
    for record in records {
        let key = normalize_text(&record.status);
        by_key
            .entry(key)
            .or_insert_with(|| StatusCount {
                status: group_key(record, GroupBy::Status).to_string(),
                units: 0,
            })
            .units += 1;
    }

    let mut counts: Vec<StatusCount> = by_key.into_values().collect();
    counts.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.status.cmp(&b.status)));
    counts
}

/// Movement rows per calendar day, oldest first.
pub fn daily_movements(movements: &[Movement]) -> Vec<DailyCount> {
    let mut days = BTreeMap::new();
    for movement in movements {
        *days.entry(movement.timestamp.date()).or_insert(0usize) += 1;
    }
    days.into_iter()
        .map(|(date, movements)| DailyCount { date, movements })
        .collect()
}

/// Equal-width bins over `[min, max]`; the last bin is closed.
pub fn volume_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // a single distinct value still gets one visible bin
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    let bins = if max > min { bins } else { 1 };

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for value in values {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Pearson correlation, `None` for fewer than two points or a constant series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Correlation of every pair of columns, using only rows where both values exist.
pub fn correlation_matrix(columns: &[(&str, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, a)| {
            columns
                .iter()
                .map(|(_, b)| {
                    let (xs, ys): (Vec<f64>, Vec<f64>) = a
                        .iter()
                        .zip(b)
                        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                        .unzip();
                    pearson(&xs, &ys)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    }
}

/// Numeric columns of the current inventory, as used by the heatmap.
pub fn numeric_columns(records: &[Movement]) -> Vec<(&'static str, Vec<Option<f64>>)> {
    vec![
        ("Código", records.iter().map(|m| m.code_number).collect()),
        ("Litros", records.iter().map(|m| Some(m.volume as f64)).collect()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movement(id: &str, day: u32, style: &str, status: &str, volume: u32) -> Movement {
        Movement {
            identifier: id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            status: status.to_string(),
            status_key: normalize_text(status),
            style: style.to_string(),
            customer: None,
            operator: None,
            volume,
            code_number: id.parse().ok(),
            line: 2,
        }
    }

    #[test]
    fn test_group_sums_match_row_sums() {
        let rows = vec![
            movement("20001", 1, "IPA", "lleno", 20),
            movement("58001", 1, "IPA", "lleno", 58),
            movement("30001", 2, "Stout", "lleno", 30),
            movement("99001", 2, "Lager", "lleno", 0),
        ];
        let totals = group_volume(&rows, GroupBy::Style);

        assert_eq!(totals[0].group, "IPA");
        assert_eq!(totals[0].units, 2);
        assert_eq!(totals[0].volume, 78);
        assert_eq!(totals[1].group, "Stout");
        assert_eq!(totals[2].group, "Lager");
        assert_eq!(totals[2].volume, 0);

        let grouped: u64 = totals.iter().map(|t| t.volume).sum();
        let per_row: u64 = rows.iter().map(|r| r.volume as u64).sum();
        assert_eq!(grouped, per_row);
    }

    #[test]
    fn test_group_by_customer_uses_placeholder() {
        let mut with_customer = movement("20001", 1, "IPA", "en cliente", 20);
        with_customer.customer = Some("Bar Sur".to_string());
        let rows = vec![with_customer, movement("20002", 1, "IPA", "en cliente", 20)];

        let totals = group_volume(&rows, GroupBy::Customer);
        let names: Vec<&str> = totals.iter().map(|t| t.group.as_str()).collect();
        assert_eq!(names, vec!["Bar Sur", NO_CUSTOMER]);
    }

    #[test]
    fn test_status_counts_merge_spellings() {
        let rows = vec![
            movement("1", 1, "IPA", "Vacío", 0),
            movement("2", 1, "IPA", "vacio ", 0),
            movement("3", 1, "IPA", "Lleno", 0),
            movement("4", 1, "IPA", "", 0),
        ];
        let counts = status_counts(&rows);

        assert_eq!(counts[0].status, "Vacío");
        assert_eq!(counts[0].units, 2);
        assert_eq!(counts.iter().map(|c| c.units).sum::<usize>(), 4);
        assert!(counts.iter().any(|c| c.status == NO_STATUS));
    }

    #[test]
    fn test_daily_movements() {
        let rows = vec![
            movement("1", 3, "IPA", "lleno", 20),
            movement("2", 1, "IPA", "lleno", 20),
            movement("1", 3, "IPA", "vacio", 20),
        ];
        let daily = daily_movements(&rows);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(daily[1].movements, 2);
    }

    #[test]
    fn test_volume_histogram() {
        let bins = volume_histogram(&[20.0, 20.0, 30.0, 58.0], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[1].upper, 58.0);

        let flat = volume_histogram(&[20.0, 20.0], 10);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].count, 2);

        assert!(volume_histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-9);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn test_correlation_matrix_skips_missing_values() {
        let columns = vec![
            ("a", vec![Some(1.0), Some(2.0), None, Some(3.0)]),
            ("b", vec![Some(10.0), Some(20.0), Some(99.0), Some(30.0)]),
        ];
        let matrix = correlation_matrix(&columns);

        assert_eq!(matrix.columns, vec!["a", "b"]);
        let r = matrix.values[0][1].unwrap();
        assert!((r - 1.0).abs() < 1e-9);
        assert_eq!(matrix.values[0][1], matrix.values[1][0]);
    }
}
