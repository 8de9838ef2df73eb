//! Locale-agnostic keyword matching.
//!
//! A keyword matches case-insensitively when it starts at a word start, so
//! `preisvorteil` also matches `Preisvorteile`. Keywords of three characters
//! or fewer must also end at a word boundary (`bar` must not match `Barilla`).

/// Longest keyword that is still matched as a whole word only.
const SHORT_KEYWORD_LEN: usize = 3;

/// Whether `text` contains any of `keywords` at a word start.
pub fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|kw| keyword_at_word_start(&lower, kw))
}

/// Whether `keyword` occurs in the already lowercased `text` at a word start.
pub fn keyword_at_word_start(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let whole_word = keyword.chars().count() <= SHORT_KEYWORD_LEN;

    text.match_indices(keyword).any(|(pos, m)| {
        let starts_word = text[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let ends_word = !whole_word
            || text[pos + m.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
        starts_word && ends_word
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_match_at_word_start() {
        assert!(contains_keyword("Preisvorteile -0,40", &kws(&["preisvorteil"])));
        assert!(contains_keyword("Gesamtbetrag 12,00", &kws(&["gesamt"])));
        assert!(!contains_keyword("Zwischensumme", &kws(&["summe"])));
    }

    #[test]
    fn test_short_keywords_are_whole_words() {
        assert!(!contains_keyword("Barilla Spaghetti 1,29", &kws(&["bar"])));
        assert!(contains_keyword("Bar 20,00", &kws(&["bar"])));
        assert!(!contains_keyword("Coffee 2,50", &kws(&["off"])));
        assert!(contains_keyword("20% OFF", &kws(&["off"])));
    }

    #[test]
    fn test_cyrillic_keywords() {
        assert!(contains_keyword("ИТОГО 512,00", &kws(&["итого"])));
        assert!(contains_keyword("Скидка -10,00", &kws(&["скидка"])));
    }

    #[test]
    fn test_multiword_keyword() {
        assert!(contains_keyword("ZU ZAHLEN 143,37", &kws(&["zu zahlen"])));
        assert!(!contains_keyword("zahlen", &kws(&["zu zahlen"])));
    }
}
