use crate::domain::model::{Movement, StatusView, ViewSummary};
use crate::domain::services::aggregate::group_volume;
use crate::domain::services::text::normalize_text;

/// True when the normalised status equals any of the wanted statuses.
pub fn status_matches(status_key: &str, wanted: &[String]) -> bool {
    !status_key.is_empty() && wanted.iter().any(|w| normalize_text(w) == status_key)
}

/// Current records in the view's statuses, grouped and totalled.
pub fn apply_view(current: &[Movement], view: &StatusView) -> ViewSummary {
    let records: Vec<Movement> = current
        .iter()
        .filter(|m| status_matches(&m.status_key, &view.statuses))
        .cloned()
        .collect();

    let totals = group_volume(&records, view.group_by);
    let total_volume = records.iter().map(|m| m.volume as u64).sum();

    tracing::debug!(
        "View '{}': {} units, {} L",
        view.name,
        records.len(),
        total_volume
    );

    ViewSummary {
        view: view.clone(),
        total_units: records.len(),
        total_volume,
        totals,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::GroupBy;
    use chrono::NaiveDate;

    fn movement(id: &str, status: &str, style: &str, volume: u32) -> Movement {
        Movement {
            identifier: id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            status: status.to_string(),
            status_key: normalize_text(status),
            style: style.to_string(),
            customer: None,
            operator: None,
            volume,
            code_number: None,
            line: 2,
        }
    }

    #[test]
    fn test_status_matching_is_case_and_accent_insensitive() {
        let wanted = vec!["Vacío".to_string()];
        assert!(status_matches(&normalize_text("VACIO"), &wanted));
        assert!(status_matches(&normalize_text(" vacío "), &wanted));
        assert!(!status_matches(&normalize_text("vacia"), &wanted));
        assert!(!status_matches("", &["".to_string()]));
    }

    #[test]
    fn test_apply_view_filters_and_totals() {
        let current = vec![
            movement("20001", "Lleno", "IPA", 20),
            movement("58001", "EN BODEGA", "IPA", 58),
            movement("30001", "Vacío", "Stout", 30),
            movement("30002", "lleno", "Stout", 30),
        ];
        let view = StatusView::new("Llenos", &["lleno", "en bodega"], GroupBy::Style);
        let summary = apply_view(&current, &view);

        assert_eq!(summary.total_units, 3);
        assert_eq!(summary.total_volume, 108);
        assert_eq!(summary.totals[0].group, "IPA");
        assert_eq!(summary.totals[0].volume, 78);
        assert_eq!(
            summary.totals.iter().map(|t| t.volume).sum::<u64>(),
            summary.total_volume
        );
    }

    #[test]
    fn test_view_with_no_matches_is_empty() {
        let current = vec![movement("20001", "Lleno", "IPA", 20)];
        let view = StatusView::new("Perdidos", &["perdido"], GroupBy::Style);
        let summary = apply_view(&current, &view);
        assert_eq!(summary.total_units, 0);
        assert!(summary.totals.is_empty());
    }
}
