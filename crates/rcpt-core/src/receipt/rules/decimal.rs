//! Repairs prices printed with a dot on comma-separator receipts.

use tracing::debug;

use super::patterns::{DATE_ANY, DOT_PRICE, DOT_PRICE_TAIL, DOT_PRICE_TOKEN};

#[derive(Debug, Clone, PartialEq)]
pub struct DecimalFixResult {
    pub text: String,
    pub was_fixed: bool,
    pub count: usize,
}

/// Rewrites `12.50` as `12,50` where the number sits in a price position.
///
/// Only applies to locales whose decimal separator is a comma. Lines that
/// carry a date are left alone.
pub struct DecimalFixer;

impl DecimalFixer {
    pub fn new() -> Self {
        Self
    }

    pub fn fix(&self, text: &str) -> DecimalFixResult {
        if text.is_empty() {
            return DecimalFixResult {
                text: text.to_string(),
                was_fixed: false,
                count: 0,
            };
        }

        let mut count = 0;
        let fixed: Vec<String> = text
            .split('\n')
            .map(|line| {
                let (line, n) = fix_line(line);
                count += n;
                line
            })
            .collect();
        let fixed = fixed.join("\n");

        if count > 0 {
            debug!("decimal fix: '{}' -> '{}'", text, fixed);
        }

        DecimalFixResult {
            text: fixed,
            was_fixed: count > 0,
            count,
        }
    }

    /// Fix a single word token; `None` when the token is not a dotted price.
    pub fn fix_token(&self, token: &str) -> Option<String> {
        if DOT_PRICE_TOKEN.is_match(token) {
            Some(token.replacen('.', ",", 1))
        } else {
            None
        }
    }
}

impl Default for DecimalFixer {
    fn default() -> Self {
        Self::new()
    }
}

fn fix_line(line: &str) -> (String, usize) {
    if DATE_ANY.is_match(line) {
        return (line.to_string(), 0);
    }

    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    let mut count = 0;

    for caps in DOT_PRICE.captures_iter(line) {
        let (Some(whole), Some(int), Some(frac)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !DOT_PRICE_TAIL.is_match(&line[whole.end()..]) {
            continue;
        }
        out.push_str(&line[last..whole.start()]);
        out.push_str(int.as_str());
        out.push(',');
        out.push_str(frac.as_str());
        last = whole.end();
        count += 1;
    }
    out.push_str(&line[last..]);

    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_price_before_tax_letter() {
        let fixer = DecimalFixer::new();
        let result = fixer.fix("Milch 1.19 A");
        assert_eq!(result.text, "Milch 1,19 A");
        assert!(result.was_fixed);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_fix_multiline() {
        let fixer = DecimalFixer::new();
        let result = fixer.fix("Brot 2.49\nRabatt -0.50");
        assert_eq!(result.text, "Brot 2,49\nRabatt -0,50");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_skip_dates_and_non_prices() {
        let fixer = DecimalFixer::new();
        assert!(!fixer.fix("Datum 24.12.2025").was_fixed);
        assert!(!fixer.fix("Art. 12.50x Stueck").was_fixed);
    }

    #[test]
    fn test_date_line_does_not_block_other_lines() {
        let fixer = DecimalFixer::new();
        let result = fixer.fix("Datum 24.12.2025\nBrot 2.49 A\nRabatt -0.50");
        assert_eq!(result.text, "Datum 24.12.2025\nBrot 2,49 A\nRabatt -0,50");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_fix_token() {
        let fixer = DecimalFixer::new();
        assert_eq!(fixer.fix_token("12.50"), Some("12,50".to_string()));
        assert_eq!(fixer.fix_token("-0.30"), Some("-0,30".to_string()));
        assert_eq!(fixer.fix_token("1.234"), None);
        assert_eq!(fixer.fix_token("Milch"), None);
    }
}
