use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixVolume {
    pub prefix: String,
    pub volume: u32,
}

/// Keg volume in litres, keyed by the leading digits of the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityTable {
    pub prefixes: Vec<PrefixVolume>,
    pub default_volume: u32,
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self {
            prefixes: [("20", 20), ("30", 30), ("58", 58)]
                .into_iter()
                .map(|(prefix, volume)| PrefixVolume {
                    prefix: prefix.to_string(),
                    volume,
                })
                .collect(),
            default_volume: 0,
        }
    }
}

impl CapacityTable {
    /// Longest matching prefix wins; unknown prefixes get `default_volume`.
    pub fn volume_for(&self, identifier: &str) -> u32 {
        let identifier = identifier.trim();
        self.prefixes
            .iter()
            .filter(|p| !p.prefix.is_empty() && identifier.starts_with(p.prefix.as_str()))
            .max_by_key(|p| p.prefix.len())
            .map(|p| p.volume)
            .unwrap_or(self.default_volume)
    }
}

/// Numeric reading of an identifier, when it is one.
pub fn code_number(identifier: &str) -> Option<f64> {
    identifier
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}
