use crate::domain::model::{ColumnCandidates, Notice, Record};
use crate::domain::services::text::{non_blank, normalize_text};
use crate::utils::error::EtlError;

/// Sheet column indices for each logical field, in candidate order.
/// Repeated headers contribute every matching column, left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    pub identifier: Vec<usize>,
    pub timestamp: Vec<usize>,
    pub status: Vec<usize>,
    pub style: Vec<usize>,
    pub customer: Vec<usize>,
    pub operator: Vec<usize>,
}

impl ColumnMap {
    /// Without identifier and timestamp there is nothing to deduplicate.
    pub fn is_usable(&self) -> bool {
        !self.identifier.is_empty() && !self.timestamp.is_empty()
    }
}

fn present(header_keys: &[String], candidates: &[String]) -> Vec<usize> {
    let mut found = Vec::new();
    for candidate in candidates {
        let key = normalize_text(candidate);
        if key.is_empty() {
            continue;
        }
        for (index, header) in header_keys.iter().enumerate() {
            if *header == key && !found.contains(&index) {
                found.push(index);
            }
        }
    }
    found
}

/// Matches sheet headers against the candidate lists.
///
/// Required fields with no match produce a warning notice; optional ones
/// (customer, operator) are silently absent.
pub fn resolve_columns(headers: &[String], candidates: &ColumnCandidates) -> (ColumnMap, Vec<Notice>) {
    let keys: Vec<String> = headers.iter().map(|h| normalize_text(h)).collect();
    let map = ColumnMap {
        identifier: present(&keys, &candidates.identifier),
        timestamp: present(&keys, &candidates.timestamp),
        status: present(&keys, &candidates.status),
        style: present(&keys, &candidates.style),
        customer: present(&keys, &candidates.customer),
        operator: present(&keys, &candidates.operator),
    };

    let required = [
        ("identifier", &map.identifier, &candidates.identifier),
        ("timestamp", &map.timestamp, &candidates.timestamp),
        ("status", &map.status, &candidates.status),
        ("style", &map.style, &candidates.style),
    ];

    let notices = required
        .iter()
        .filter(|(_, found, _)| found.is_empty())
        .map(|(field, _, wanted)| {
            let missing = EtlError::MissingColumn {
                field: field.to_string(),
                candidates: wanted.join(", "),
            };
            Notice::warning("columns", missing.to_string())
        })
        .collect();

    tracing::debug!("Resolved columns: {:?}", map);
    (map, notices)
}

/// First non-blank cell among the `columns`, in order.
pub fn first_non_empty<'a>(record: &'a Record, columns: &[usize]) -> Option<&'a str> {
    columns
        .iter()
        .filter_map(|&i| record.get(i))
        .find_map(non_blank)
}
