//! Custom Askama template filters.

use std::fmt::Display;

/// Longest description shown on a storefront card.
const EXCERPT_CHARS: usize = 90;

/// Returns the current year for the footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens a description for the catalog cards, cutting on a word boundary.
///
/// Usage in templates: `{{ cupcake.description|excerpt }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), EXCERPT_CHARS))
}

fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let head = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
    format!("{}…", head.trim_end_matches([',', '.', ';', ' ']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_keeps_short_text() {
        assert_eq!(shorten("  Massa de cacau  ", 90), "Massa de cacau");
    }

    #[test]
    fn test_shorten_cuts_on_word_boundary() {
        assert_eq!(shorten("Massa de cacau, ganache e granulado", 16), "Massa de cacau…");
        assert_eq!(shorten("Recheadíssimo", 5), "Reche…");
    }
}
