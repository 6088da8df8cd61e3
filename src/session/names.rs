//! Name detection from explicit self-introductions.

use once_cell::sync::Lazy;
use regex::Regex;

/// Self-introduction patterns, tried in order. Each captures a single word.
static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bme\s+llamo\s+(\w+)",
        r"(?i)\bmi\s+nombre\s+es\s+(\w+)",
        r"(?i)\bsoy\s+(\w+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Words that follow "soy" and friends without being a name ("soy de Lima").
const NOT_NAMES: &[&str] = &[
    "de", "del", "el", "la", "los", "las", "un", "una", "muy", "tu", "su", "yo", "en", "con",
    "nuevo", "nueva", "cliente",
];

fn is_name(word: &str) -> bool {
    !NOT_NAMES.contains(&word.to_lowercase().as_str())
}

/// Return the name a user gives in "me llamo X", "mi nombre es X" or "soy X".
///
/// Only the first word after the phrase is taken, so "me llamo Ana María"
/// yields "Ana". Articles, prepositions and similar words are never names.
pub fn detect_name(text: &str) -> Option<String> {
    NAME_PATTERNS.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|word| is_name(word))
            .map(str::to_string)
    })
}
