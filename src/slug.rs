//! Slug derivation and validation for posts and categories.

use regex::Regex;

/// Slug every new category and post falls back to.
pub const UNASSIGNED: &str = "unassigned";

lazy_static::lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and single hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    static ref NON_ALPHANUMERIC_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();

    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

pub fn is_hex_color(color: &str) -> bool {
    HEX_COLOR_REGEX.is_match(color)
}

/// Lowercase the title, collapse every run of non `[a-z0-9]` characters into
/// one hyphen, and strip hyphens from both ends.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Use the explicit slug when one was typed, otherwise derive it from `source`.
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Option<String> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Some(slug.to_string()),
        None => Some(generate_slug(source)).filter(|s| !s.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_collapses_runs() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Rust   &   Axum -- 2024 "), "rust-axum-2024");
        assert_eq!(generate_slug("AI-Related"), "ai-related");
    }

    #[test]
    fn test_generate_slug_has_no_edge_hyphens() {
        let slug = generate_slug("--Why? Because!--");
        assert_eq!(slug, "why-because");
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_generate_slug_drops_non_ascii_letters() {
        assert_eq!(generate_slug("Café Über"), "caf-ber");
    }

    #[test]
    fn test_resolve_slug_prefers_explicit() {
        assert_eq!(
            resolve_slug(Some("custom-slug"), "Some Title"),
            Some("custom-slug".to_string())
        );
        assert_eq!(
            resolve_slug(Some("   "), "Some Title"),
            Some("some-title".to_string())
        );
        assert_eq!(resolve_slug(None, "!!!"), None);
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("animal-welfare"));
        assert!(!is_valid_slug("Animal-Welfare"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#fbbf24"));
        assert!(is_hex_color("#FBBF24"));
        assert!(!is_hex_color("fbbf24"));
        assert!(!is_hex_color("#fff"));
    }
}
