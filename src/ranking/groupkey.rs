// Groupkey: normalized title used to cluster probable duplicates

use crate::constants::DEFAULT_TRANSLITERATIONS;

/// Ordered (from, to) substitutions applied after lower-casing
pub type TransliterationTable = Vec<(String, String)>;

pub fn default_table() -> TransliterationTable {
    DEFAULT_TRANSLITERATIONS
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Lower-case, transliterate, then keep only ASCII letters and digits.
///
/// Titles differing only by case, punctuation, spacing or umlaut encoding
/// ("ä", "a\u{308}", "ae") map to the same key. The result is a fixed point:
/// applying it to its own output returns the same string.
pub fn make_groupkey(title: &str, table: &[(String, String)]) -> String {
    let mut line = title.to_lowercase();
    for (from, to) in table {
        if line.contains(from.as_str()) {
            line = line.replace(from.as_str(), to);
        }
    }

    line.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
