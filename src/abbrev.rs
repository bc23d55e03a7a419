//! Initials-based short codes for competency and topic names

use regex::Regex;
use std::sync::OnceLock;

fn delimiters() -> &'static Regex {
    static DELIMITERS: OnceLock<Regex> = OnceLock::new();
    DELIMITERS.get_or_init(|| Regex::new(r"[ /]+").expect("static pattern"))
}

/// Abbreviate a display name: split on runs of spaces or slashes, take the
/// first character of each token, uppercase, join.
///
/// "Effective Communication" -> "EC", "Stress/Handling Capacity" -> "SHC".
/// Empty tokens from leading/trailing delimiters are skipped.
pub fn abbreviate(name: &str) -> String {
    delimiters()
        .split(name)
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
