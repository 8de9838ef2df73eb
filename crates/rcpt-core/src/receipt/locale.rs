//! Receipt locale detection from currency symbols and keywords.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rules::keywords::keyword_at_word_start;

/// Currency symbols that name a single locale.
const CURRENCY_LOCALES: &[(&str, &str)] = &[
    ("zł", "pl"),
    ("฿", "th"),
    ("₸", "kk"),
    ("₽", "ru"),
    ("£", "en"),
    ("$", "en"),
];

/// Keywords that tell euro-zone receipts apart, checked in order.
const EURO_HINTS: &[(&str, &[&str])] = &[
    ("de", &["gesamtbetrag", "summe", "zu zahlen", "belegsumme", "endbetrag"]),
    ("fr", &["tva", "montant", "espèces"]),
    ("es", &["iva", "importe", "efectivo"]),
    ("it", &["totale", "scontrino", "contanti"]),
];

/// Per-locale detection keywords.
const LOCALE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "de",
        &[
            "summe", "zu zahlen", "gesamtbetrag", "belegsumme", "endbetrag", "mwst",
            "preisvorteil", "rückgeld", "rueckgeld", "pfand", "kasse", "bar",
        ],
    ),
    (
        "en",
        &["total", "subtotal", "change", "cash", "tax", "vat", "thank you", "receipt"],
    ),
    (
        "pl",
        &["suma", "razem", "paragon", "fiskalny", "ptu", "gotówka", "reszta"],
    ),
    (
        "fr",
        &["tva", "montant", "espèces", "rendu", "merci", "remise"],
    ),
    (
        "es",
        &["iva", "importe", "efectivo", "cambio", "gracias", "descuento"],
    ),
    (
        "it",
        &["totale", "scontrino", "contanti", "resto", "grazie", "sconto"],
    ),
    (
        "cs",
        &["celkem", "dph", "hotovost", "účtenka", "vráceno", "sleva"],
    ),
    (
        "ru",
        &["итого", "сумма", "кассир", "ндс", "наличные", "сдача", "скидка"],
    ),
];

/// Keyword hits needed before a keyword vote is trusted.
const MIN_KEYWORD_SCORE: usize = 2;

/// Detected locale with its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleMatch {
    pub code: String,
    pub confidence: f32,
    /// Currency symbol or keywords that decided the locale.
    pub evidence: Vec<String>,
}

/// Detects the locale of a receipt; falls back to a configured code.
pub struct LocaleDetector {
    fallback: String,
}

impl LocaleDetector {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }

    /// Currency symbol first, then the best keyword score, then the fallback.
    pub fn detect(&self, text: &str) -> LocaleMatch {
        let lower = text.to_lowercase();

        let detected = self
            .by_currency(&lower)
            .or_else(|| self.by_keywords(&lower))
            .unwrap_or_else(|| {
                debug!("no locale evidence, using '{}'", self.fallback);
                LocaleMatch {
                    code: self.fallback.clone(),
                    confidence: 0.0,
                    evidence: Vec::new(),
                }
            });

        info!(
            "receipt locale: {} ({:.2}, {:?})",
            detected.code, detected.confidence, detected.evidence
        );
        detected
    }

    fn by_currency(&self, lower: &str) -> Option<LocaleMatch> {
        if lower.contains('€') {
            let code = EURO_HINTS
                .iter()
                .find(|(_, hints)| hints.iter().any(|h| keyword_at_word_start(lower, h)))
                .map(|(code, _)| *code)
                .unwrap_or("de");
            return Some(LocaleMatch {
                code: code.to_string(),
                confidence: 0.8,
                evidence: vec!["€".to_string()],
            });
        }

        CURRENCY_LOCALES
            .iter()
            .find(|(symbol, _)| lower.contains(symbol))
            .map(|(symbol, code)| LocaleMatch {
                code: code.to_string(),
                confidence: 0.9,
                evidence: vec![symbol.to_string()],
            })
    }

    /// Most keyword hits wins; ties go to the longer matched keywords.
    fn by_keywords(&self, lower: &str) -> Option<LocaleMatch> {
        let (code, keywords, matched) = LOCALE_KEYWORDS
            .iter()
            .map(|(code, keywords)| {
                let matched: Vec<&str> = keywords
                    .iter()
                    .copied()
                    .filter(|kw| keyword_at_word_start(lower, kw))
                    .collect();
                (*code, *keywords, matched)
            })
            .max_by_key(|(_, _, matched)| {
                (matched.len(), matched.iter().map(|kw| kw.len()).sum::<usize>())
            })?;

        debug!("best keyword score {} for '{}': {:?}", matched.len(), code, matched);
        if matched.len() < MIN_KEYWORD_SCORE {
            return None;
        }

        Some(LocaleMatch {
            code: code.to_string(),
            confidence: matched.len() as f32 / keywords.len() as f32,
            evidence: matched.into_iter().map(String::from).collect(),
        })
    }
}

impl Default for LocaleDetector {
    fn default() -> Self {
        Self::new("de")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_currency_symbol() {
        let detector = LocaleDetector::default();
        assert_eq!(detector.detect("Chleb 3,49 zł\nSUMA PLN 3,49").code, "pl");
        assert_eq!(detector.detect("Milk 1.29\nTOTAL $6.28").code, "en");
    }

    #[test]
    fn test_euro_disambiguation() {
        let detector = LocaleDetector::default();
        assert_eq!(detector.detect("Pain 1,20 €\nMontant TVA 0,06").code, "fr");
        assert_eq!(detector.detect("Brot 2,49 €\nSumme 2,49 €").code, "de");
        assert_eq!(detector.detect("Artikel 2,49 €").code, "de");
    }

    #[test]
    fn test_keyword_score() {
        let detector = LocaleDetector::default();
        let found = detector.detect("Coffee Beans 4.99\nSUBTOTAL 6.28\nCASH 10.00\nCHANGE 3.72");
        assert_eq!(found.code, "en");
        assert_eq!(found.evidence, vec!["subtotal", "change", "cash"]);

        assert_eq!(detector.detect("Хлеб 45,00\nИТОГО 45,00\nНаличные 50,00").code, "ru");
    }

    #[test]
    fn test_single_keyword_falls_back() {
        let detector = LocaleDetector::new("de");
        let found = detector.detect("Coffee Beans 4.99 A\nTOTAL 6.28");
        assert_eq!(found.code, "de");
        assert_eq!(found.confidence, 0.0);
    }
}
