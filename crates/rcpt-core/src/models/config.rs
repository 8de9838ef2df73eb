//! Configuration structures for the receipt parsing pipeline.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RcptError;
use crate::receipt::rules::keywords::contains_keyword;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Locale settings.
    pub locale: LocaleConfig,

    /// Keyword tables used by the classifier and extractors.
    pub keywords: KeywordTables,

    /// Item extraction tuning.
    pub extraction: ExtractionConfig,
}

impl RcptConfig {
    /// Default configuration for a locale code.
    pub fn for_locale(code: &str) -> Self {
        Self {
            locale: LocaleConfig::from_code(code),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, RcptError> {
        let content = std::fs::read_to_string(path)?;
        let config: RcptConfig = serde_json::from_str(&content)
            .map_err(|e| RcptError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), RcptError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RcptError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the extractor cannot work with.
    pub fn validate(&self) -> Result<(), RcptError> {
        if !matches!(self.locale.decimal_separator, ',' | '.') {
            return Err(RcptError::Config(format!(
                "decimal_separator must be ',' or '.', got '{}'",
                self.locale.decimal_separator
            )));
        }
        let ex = &self.extraction;
        if ex.arithmetic_tolerance.is_sign_negative()
            || ex.weight_tolerance.is_sign_negative()
            || ex.split_tolerance.is_sign_negative()
            || ex.reconcile_tolerance.is_sign_negative()
        {
            return Err(RcptError::Config("tolerances must be non-negative".to_string()));
        }
        if ex.max_lookback == 0 || ex.two_liner_lookback == 0 {
            return Err(RcptError::Config("lookback windows must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Locale-specific number formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Locale code (e.g. "de", "en", "ru").
    pub code: String,

    /// Decimal separator used on receipts of this locale.
    pub decimal_separator: char,

    /// Detect the locale per receipt; `code` is then only the fallback.
    pub detect: bool,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            code: "de".to_string(),
            decimal_separator: ',',
            detect: true,
        }
    }
}

impl LocaleConfig {
    /// Fixed locale settings for a code; unknown codes fall back to a comma separator.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or("").to_string();
        let decimal_separator = match primary.as_str() {
            "en" | "us" | "gb" | "uk" | "th" | "ja" | "zh" | "ko" | "he" => '.',
            _ => ',',
        };
        Self {
            code: primary,
            decimal_separator,
            detect: false,
        }
    }

    /// Whether Cyrillic script is expected on receipts of this locale.
    pub fn is_cyrillic(&self) -> bool {
        matches!(
            self.code.as_str(),
            "ru" | "ua" | "bg" | "sr" | "mk" | "be" | "by" | "kk" | "kz"
        )
    }
}

/// Keyword tables. All entries are lowercase and match at a word start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    /// Receipt total markers; the first matching line starts the dead zone.
    pub total: Vec<String>,

    /// Names that are summary lines rather than products.
    pub summary: Vec<String>,

    /// Discount markers.
    pub discount: Vec<String>,

    /// Lines summarising all discounts (not discounts themselves).
    pub discount_total: Vec<String>,

    /// Non-item lines: phone, address, terminal data.
    pub noise: Vec<String>,

    /// Tax breakdown markers.
    pub tax_info: Vec<String>,

    /// Lines excluded when counting price lines.
    pub count_skip: Vec<String>,

    /// Currency tokens ignored in names.
    pub currency: Vec<String>,

    /// Known store brands, matched as whole words.
    pub stores: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            total: strings(&[
                "zu zahlen", "summe", "zwischensumme", "belegsumme", "total", "subtotal",
                "gesamt", "gesamtbetrag", "итого", "сумма", "betrag", "brutto", "netto",
                "mwst",
            ]),
            summary: strings(&[
                "zu zahlen", "summe", "zwischensumme", "total", "subtotal", "gesamt",
                "итого", "сумма", "betrag", "karte", "kundenbeleg", "ta nr", "brutto",
                "netto", "mwst",
            ]),
            discount: strings(&[
                // German
                "preisvorteil", "rabatt", "ersparnis", "aktion", "angebot", "nachlass",
                "aktionsnachlass", "coupon",
                // English
                "discount", "off", "save", "savings", "deal",
                // Russian
                "скидка", "экономия", "акция", "выгода",
                // French
                "remise", "reduction", "promo",
                // Spanish
                "descuento", "oferta", "ahorro",
                // Italian
                "sconto", "offerta", "risparmio",
                // Polish
                "rabat", "znizka", "promocja",
                // Czech/Slovak
                "sleva", "akce", "zlava",
            ]),
            discount_total: strings(&[
                "gesamter preisvorteil", "gesamte ersparnis", "ihre ersparnis",
                "total savings", "total discount", "you saved", "your savings",
                "итого скидка", "всего сэкономлено", "ваша экономия",
                "total remise", "economie totale",
                "descuento total", "ahorro total",
                "sconto totale", "risparmio totale",
            ]),
            noise: strings(&[
                "tel.", "tel:", "fax", "obj.-nr.", "terminal", "beleg-nr.", "bon-nr.",
                "datum", "uhrzeit", "steuer-nr", "ust-id", "www.", "http", "kasse",
                "kassierer", "trace-nr", "телефон", "кассир",
            ]),
            tax_info: strings(&[
                "mwst", "ust", "vat", "tax", "steuer", "ндс", "iva", "tva", "dph",
            ]),
            count_skip: strings(&[
                "summe", "gesamt", "total", "subtotal", "netto", "brutto", "mwst", "vat",
                "tax", "iva", "tva", "dph", "zu zahlen", "to pay", "a payer", "a pagar",
                "karte", "card", "bar", "cash", "preisvorteil", "rabatt", "discount",
                "скидка", "pfand", "deposit", "залог", "lade dir", "download", "app",
            ]),
            currency: strings(&["eur", "euro", "usd", "chf", "pln", "czk", "rub", "руб"]),
            stores: strings(&[
                "aldi", "lidl", "rewe", "edeka", "netto", "penny", "kaufland", "norma",
                "globus", "rossmann", "dm", "hofer", "billa", "spar", "migros", "coop",
                "biedronka", "żabka", "carrefour", "auchan", "tesco", "albert",
                "пятёрочка", "пятерочка", "магнит", "перекрёсток", "walmart", "costco",
            ]),
        }
    }
}

impl KeywordTables {
    pub fn is_total(&self, text: &str) -> bool {
        contains_keyword(text, &self.total)
    }

    pub fn is_summary(&self, text: &str) -> bool {
        contains_keyword(text, &self.summary)
    }

    pub fn is_discount(&self, text: &str) -> bool {
        contains_keyword(text, &self.discount)
    }

    pub fn is_discount_total(&self, text: &str) -> bool {
        contains_keyword(text, &self.discount_total)
    }

    pub fn is_noise(&self, text: &str) -> bool {
        contains_keyword(text, &self.noise)
    }

    pub fn is_tax_info(&self, text: &str) -> bool {
        contains_keyword(text, &self.tax_info)
    }

    pub fn is_count_skip(&self, text: &str) -> bool {
        contains_keyword(text, &self.count_skip)
    }

    pub fn is_currency(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.currency.iter().any(|c| *c == token)
    }
}

/// Item extraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Allowed deviation for arithmetic-derived items.
    pub arithmetic_tolerance: Decimal,

    /// Allowed deviation for weight-based items.
    pub weight_tolerance: Decimal,

    /// Allowed deviation when deciding a math-pattern line split.
    pub split_tolerance: Decimal,

    /// Allowed deviation between item sum and receipt total before warning.
    pub reconcile_tolerance: Decimal,

    /// Look-back window for staircase and math-hybrid reconstruction.
    pub max_lookback: usize,

    /// Look-back window for simple two-liners.
    pub two_liner_lookback: usize,

    /// Minimum horizontal gap for a column split.
    pub min_column_gap: f32,

    /// Maximum length of derived discount names.
    pub discount_name_max_len: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            arithmetic_tolerance: dec!(0.05),
            weight_tolerance: dec!(0.15),
            split_tolerance: dec!(0.15),
            reconcile_tolerance: dec!(0.05),
            max_lookback: 5,
            two_liner_lookback: 3,
            min_column_gap: 30.0,
            discount_name_max_len: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locale_from_code() {
        assert_eq!(LocaleConfig::from_code("de-AT").decimal_separator, ',');
        assert_eq!(LocaleConfig::from_code("en_US").decimal_separator, '.');
        assert_eq!(LocaleConfig::from_code("en_US").code, "en");
        assert!(LocaleConfig::from_code("ru").is_cyrillic());
        assert!(!LocaleConfig::from_code("de").is_cyrillic());
        assert!(!LocaleConfig::from_code("de").detect);
        assert!(LocaleConfig::default().detect);
    }

    #[test]
    fn test_keyword_tables_word_start() {
        let kw = KeywordTables::default();
        assert!(kw.is_discount("Preisvorteile -0,40"));
        assert!(!kw.is_discount("Kaffee Crema 4,99"));
        assert!(kw.is_total("ZU ZAHLEN 143,37"));
        assert!(kw.is_discount_total("Gesamter Preisvorteil 4,44"));
        assert!(kw.is_currency("EUR"));
    }

    #[test]
    fn test_config_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::for_locale("en");
        config.extraction.max_lookback = 7;
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.locale.decimal_separator, '.');
        assert_eq!(loaded.extraction.max_lookback, 7);
        assert_eq!(loaded.extraction.weight_tolerance, dec!(0.15));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{"locale":{"code":"ru"}}"#).unwrap();
        assert_eq!(config.locale.code, "ru");
        assert_eq!(config.locale.decimal_separator, ',');
        assert!(!config.keywords.total.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_separator() {
        let mut config = RcptConfig::default();
        config.locale.decimal_separator = ';';
        assert!(config.validate().is_err());
    }
}
