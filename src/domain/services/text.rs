use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Comparison key for free text: trimmed, accent-free, lowercase, single-spaced.
pub fn normalize_text(value: &str) -> String {
    let folded: String = value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed value, or `None` when blank.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// File-name friendly form of a label, e.g. `"Barriles vacíos"` -> `"barriles_vacios"`.
pub fn slug(value: &str) -> String {
    let key = normalize_text(value);
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "view".to_string()
    } else {
        trimmed.to_string()
    }
}
