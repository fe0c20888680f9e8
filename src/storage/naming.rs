//! Recording id rules: sanitizing user names, timestamp ids and collision suffixes.

use crate::error::{RecorderError, Result};
use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::OnceLock;

/// Longest id accepted after sanitizing.
pub const MAX_ID_LEN: usize = 128;

/// Characters besides alphanumerics that may appear in an id.
const EXTRA_ALLOWED: &str = " -_()[]";

fn extension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.wav\s*$").expect("valid extension pattern"))
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Turns a user-supplied name into a filesystem-safe id.
///
/// Drops a trailing `.wav`, removes every character that is not alphanumeric,
/// whitespace or one of `-_()[]`, collapses whitespace and trims.
///
/// # Errors
/// `InvalidName` if nothing usable remains or the result is too long.
pub fn sanitize_name(raw: &str) -> Result<String> {
    let without_ext = extension_regex().replace(raw, "");
    let kept: String = without_ext
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || EXTRA_ALLOWED.contains(*c))
        .collect();
    let id = whitespace_regex().replace_all(kept.trim(), " ").into_owned();

    if id.is_empty() || id.chars().count() > MAX_ID_LEN {
        return Err(RecorderError::InvalidName(raw.to_string()));
    }
    Ok(id)
}

/// Default id for a recording saved at `at`; sorts lexicographically by time.
pub fn timestamp_id(at: DateTime<Local>) -> String {
    format!("recording_{}", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Returns `base` if free, otherwise the first free `base-N` for N = 2, 3, ...
pub fn disambiguate(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_name("  Team sync (v2) ").unwrap(), "Team sync (v2)");
        assert_eq!(sanitize_name("notes.WAV").unwrap(), "notes");
        assert_eq!(sanitize_name("../../etc/passwd").unwrap(), "etcpasswd");
        assert_eq!(sanitize_name("a\t\tb").unwrap(), "a b");
        assert_eq!(sanitize_name("día_1").unwrap(), "día_1");
    }

    #[test]
    fn test_sanitize_rejects_empty_results() {
        for raw in ["", "   ", "...", "/\\:*?", ".wav"] {
            assert_eq!(
                sanitize_name(raw).unwrap_err().kind(),
                ErrorKind::InvalidName,
                "{raw:?}"
            );
        }
        assert!(sanitize_name(&"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_timestamp_ids_sort_by_time() {
        let earlier = timestamp_id(Local.with_ymd_and_hms(2024, 9, 30, 23, 59, 59).unwrap());
        let later = timestamp_id(Local.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(earlier, "recording_2024-09-30_23-59-59");
        assert!(earlier < later);
    }

    #[test]
    fn test_disambiguate_appends_first_free_suffix() {
        let taken = ["demo", "demo-2"];
        assert_eq!(disambiguate("demo", |c| taken.contains(&c)), "demo-3");
        assert_eq!(disambiguate("other", |c| taken.contains(&c)), "other");
    }
}
