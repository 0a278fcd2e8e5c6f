use crate::domain::model::Movement;
use std::collections::BTreeMap;

/// Current state per identifier: the movement with the greatest timestamp.
///
/// On equal timestamps the row further down the sheet wins. Output is ordered
/// by identifier.
pub fn latest_per_identifier(movements: &[Movement]) -> Vec<Movement> {
    let mut latest: BTreeMap<&str, &Movement> = BTreeMap::new();

    for movement in movements {
        latest
            .entry(movement.identifier.as_str())
            .and_modify(|current| {
                if (movement.timestamp, movement.line) >= (current.timestamp, current.line) {
                    *current = movement;
                }
            })
            .or_insert(movement);
    }

    latest.into_values().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movement(id: &str, day: u32, hour: u32, status: &str, line: usize) -> Movement {
        Movement {
            identifier: id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            status: status.to_string(),
            status_key: status.to_lowercase(),
            style: "IPA".to_string(),
            customer: None,
            operator: None,
            volume: 20,
            code_number: None,
            line,
        }
    }

    #[test]
    fn test_keeps_max_timestamp_regardless_of_row_order() {
        let rows = vec![
            movement("20001", 5, 10, "en cliente", 2),
            movement("20001", 3, 10, "lleno", 3),
            movement("30001", 1, 8, "vacio", 4),
            movement("20001", 4, 23, "vacio", 5),
        ];
        let current = latest_per_identifier(&rows);

        assert_eq!(current.len(), 2);
        assert_eq!(current[0].identifier, "20001");
        assert_eq!(current[0].status, "en cliente");
        assert_eq!(current[1].identifier, "30001");
    }

    #[test]
    fn test_tie_goes_to_later_row() {
        let rows = vec![
            movement("58001", 2, 12, "lleno", 2),
            movement("58001", 2, 12, "en cliente", 3),
        ];
        let current = latest_per_identifier(&rows);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].status, "en cliente");
    }

    #[test]
    fn test_every_identifier_has_exactly_one_row_with_the_max_timestamp() {
        let rows: Vec<Movement> = (0..30)
            .map(|i| movement(&format!("20{:03}", i % 7), 1 + (i * 7 % 11) as u32, 9, "lleno", i + 2))
            .collect();
        let current = latest_per_identifier(&rows);

        assert_eq!(current.len(), 7);
        for kept in &current {
            let max = rows
                .iter()
                .filter(|m| m.identifier == kept.identifier)
                .map(|m| m.timestamp)
                .max()
                .unwrap();
            assert_eq!(kept.timestamp, max);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(latest_per_identifier(&[]).is_empty());
    }
}
