//! Text helpers for titles and tag names.

use regex::Regex;
use std::sync::OnceLock;

fn year_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(\d{4}\)\s*$").expect("valid regex"))
}

/// Strip a trailing `(YYYY)` year suffix from a title.
pub fn strip_year_suffix(title: &str) -> &str {
    match year_suffix().find(title) {
        Some(m) => title[..m.start()].trim_end(),
        None => title.trim_end(),
    }
}

/// Whether two titles name the same work once year suffixes are removed.
pub fn same_base_title(a: &str, b: &str) -> bool {
    strip_year_suffix(a).eq_ignore_ascii_case(strip_year_suffix(b))
}

/// Convert a production origin such as "japanese" to a country name.
pub fn origin_to_country(origin: &str) -> Option<&'static str> {
    match origin.trim().to_lowercase().as_str() {
        "american" => Some("United States"),
        "british" => Some("United Kingdom"),
        "korean" | "south korean" => Some("South Korea"),
        "japanese" => Some("Japan"),
        "chinese" => Some("China"),
        "taiwanese" => Some("Taiwan"),
        "french" => Some("France"),
        "german" => Some("Germany"),
        "spanish" => Some("Spain"),
        "italian" => Some("Italy"),
        "canadian" => Some("Canada"),
        "australian" => Some("Australia"),
        "indian" => Some("India"),
        "thai" => Some("Thailand"),
        "brazilian" => Some("Brazil"),
        "russian" => Some("Russia"),
        "polish" => Some("Poland"),
        "philippine" | "filipino" => Some("Philippines"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_year_suffix() {
        assert_eq!(strip_year_suffix("Kanon (2006)"), "Kanon");
        assert_eq!(strip_year_suffix("Kanon"), "Kanon");
        assert_eq!(strip_year_suffix("1999 (2004) "), "1999");
        assert_eq!(strip_year_suffix("Show (Part 2)"), "Show (Part 2)");
    }

    #[test]
    fn test_same_base_title() {
        assert!(same_base_title("Hellsing (2006)", "hellsing"));
        assert!(!same_base_title("Hellsing Ultimate", "Hellsing"));
    }

    #[test]
    fn test_origin_to_country() {
        assert_eq!(origin_to_country("Japanese"), Some("Japan"));
        assert_eq!(origin_to_country("martian"), None);
    }
}
