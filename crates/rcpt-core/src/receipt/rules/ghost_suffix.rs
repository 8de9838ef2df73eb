//! Removes short garbage tokens that OCR picks up between a name and its price
//! (bleed-through from the back of thermal paper).

use regex::Captures;
use tracing::debug;

use super::patterns::{GHOST_SUFFIX, GHOST_WHITELIST};

#[derive(Debug, Clone, PartialEq)]
pub struct GhostSuffixResult {
    pub text: String,
    pub was_fixed: bool,
    pub removed_suffix: Option<String>,
}

pub struct GhostSuffixFixer;

impl GhostSuffixFixer {
    pub fn new() -> Self {
        Self
    }

    pub fn fix(&self, text: &str) -> GhostSuffixResult {
        let mut removed: Option<String> = None;

        let fixed = GHOST_SUFFIX.replace_all(text, |caps: &Captures| {
            let before = &caps[1];
            let suffix = &caps[3];

            // "0,29 x 30 8,70": the token after a multiplier is a quantity
            if matches!(before.to_lowercase().as_str(), "x" | "×") || !is_garbage(suffix) {
                return caps[0].to_string();
            }

            removed = Some(suffix.to_string());
            format!("{}{}{}", before, &caps[2], &caps[5])
        });
        let fixed = fixed.into_owned();

        if let Some(suffix) = &removed {
            debug!("removed ghost suffix '{}' from '{}'", suffix, text);
        }

        GhostSuffixResult {
            was_fixed: removed.is_some(),
            text: fixed,
            removed_suffix: removed,
        }
    }
}

impl Default for GhostSuffixFixer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_garbage(suffix: &str) -> bool {
    if GHOST_WHITELIST.iter().any(|rx| rx.is_match(suffix)) {
        return false;
    }

    let len = suffix.chars().count();
    if !(2..=4).contains(&len) || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let has_letter = suffix.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = suffix.chars().any(|c| c.is_ascii_digit());
    if has_letter && has_digit {
        return true;
    }

    // Digits only, but a year is kept
    has_digit && !(len == 4 && suffix.starts_with("20"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_mixed_garbage() {
        let fixer = GhostSuffixFixer::new();
        let result = fixer.fix("Joghurt a3F 0,99 A");
        assert_eq!(result.text, "Joghurt 0,99 A");
        assert_eq!(result.removed_suffix.as_deref(), Some("a3F"));
    }

    #[test]
    fn test_keeps_whitelisted_units() {
        let fixer = GhostSuffixFixer::new();
        assert!(!fixer.fix("Mehl 1kg 0,79 A").was_fixed);
        assert!(!fixer.fix("Cola 2L 1,49 A").was_fixed);
        assert!(!fixer.fix("Apfel Bio 2,49 A").was_fixed);
    }

    #[test]
    fn test_keeps_quantity_after_multiplier() {
        let fixer = GhostSuffixFixer::new();
        let result = fixer.fix("Wasser 0,29 x 30 8,70 B");
        assert_eq!(result.text, "Wasser 0,29 x 30 8,70 B");
    }

    #[test]
    fn test_keeps_years_and_words() {
        let fixer = GhostSuffixFixer::new();
        assert!(!fixer.fix("Wein 2021 7,99 A").was_fixed);
        assert!(!fixer.fix("Summe EUR 12,00").was_fixed);
    }
}
