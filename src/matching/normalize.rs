/// Canonical key for exact name comparison.
///
/// Keeps only ASCII letters and digits, lowercased. `"Moss_Cloak 2"` and
/// `"mosscloak2"` share the key `"mosscloak2"`.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Text used for fuzzy distance: trimmed and lowercased, spaces kept.
pub fn fuzzy_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Splits on runs of anything that is not an ASCII letter or digit.
pub fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
}
