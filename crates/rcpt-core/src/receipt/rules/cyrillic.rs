//! Replaces Cyrillic look-alike letters in Latin-script receipts.

use tracing::debug;

use crate::models::LocaleConfig;

use super::patterns::CYRILLIC;

const CONFUSABLES: &[(char, char)] = &[
    ('А', 'A'), ('В', 'B'), ('С', 'C'), ('Е', 'E'), ('Н', 'H'), ('К', 'K'),
    ('М', 'M'), ('О', 'O'), ('Р', 'P'), ('Т', 'T'), ('Х', 'X'), ('У', 'Y'),
    ('Я', 'R'), ('З', '3'),
    ('а', 'a'), ('с', 'c'), ('е', 'e'), ('о', 'o'), ('р', 'p'), ('х', 'x'), ('у', 'y'),
];

#[derive(Debug, Clone, PartialEq)]
pub struct CyrillicFixResult {
    pub text: String,
    pub was_fixed: bool,
    pub replacements: usize,
}

pub struct CyrillicFixer;

impl CyrillicFixer {
    pub fn new() -> Self {
        Self
    }

    /// No-op for Cyrillic locales.
    pub fn fix(&self, text: &str, locale: &LocaleConfig) -> CyrillicFixResult {
        if locale.is_cyrillic() || !CYRILLIC.is_match(text) {
            return CyrillicFixResult {
                text: text.to_string(),
                was_fixed: false,
                replacements: 0,
            };
        }

        let mut replacements = 0;
        let fixed: String = text
            .chars()
            .map(|c| match CONFUSABLES.iter().find(|(cyr, _)| *cyr == c) {
                Some((_, lat)) => {
                    replacements += 1;
                    *lat
                }
                None => c,
            })
            .collect();

        if replacements > 0 {
            debug!("replaced {} confusable chars in '{}'", replacements, text);
        }

        CyrillicFixResult {
            text: fixed,
            was_fixed: replacements > 0,
            replacements,
        }
    }
}

impl Default for CyrillicFixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_confusables_for_latin_locale() {
        let fixer = CyrillicFixer::new();
        // Cyrillic "М" and "В"
        let result = fixer.fix("Мilch 1,19 В", &LocaleConfig::default());
        assert_eq!(result.text, "Milch 1,19 B");
        assert_eq!(result.replacements, 2);
        assert!(result.was_fixed);
    }

    #[test]
    fn test_cyrillic_locale_untouched() {
        let fixer = CyrillicFixer::new();
        let result = fixer.fix("Молоко 89,90 А", &LocaleConfig::from_code("ru"));
        assert_eq!(result.text, "Молоко 89,90 А");
        assert!(!result.was_fixed);
    }

    #[test]
    fn test_plain_latin_untouched() {
        let fixer = CyrillicFixer::new();
        let result = fixer.fix("Milch 1,19 A", &LocaleConfig::default());
        assert!(!result.was_fixed);
    }
}
