//! Common regex patterns for receipt line analysis.
//!
//! The `regex` crate has no look-around; "not followed by a digit" and
//! similar tail conditions are checked by the callers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Prices: two decimals, either separator, optional minus
    pub static ref PRICE: Regex = Regex::new(
        r"-?\d+[.,]\d{2}"
    ).unwrap();

    // Weak prices: one or two decimals, OCR may insert a space after the separator
    pub static ref SOFT_PRICE: Regex = Regex::new(
        r"-?\d+[.,]\s?\d{1,2}"
    ).unwrap();

    pub static ref SOFT_PRICE_PARTS: Regex = Regex::new(
        r"(-?\d+)[.,]\s?(\d{0,2})"
    ).unwrap();

    // Dates (dd.mm.yy[yy]) and times (hh:mm[:ss])
    pub static ref DATE_OR_TIME: Regex = Regex::new(
        r"\d{2}\.\d{2}\.\d{2,4}|\d{2}:\d{2}"
    ).unwrap();

    pub static ref DATE_ANY: Regex = Regex::new(
        r"\d{2}\.\d{2}\.\d{2,4}|\d{4}\.\d{2}\.\d{2}"
    ).unwrap();

    // Receipt dates; OCR may put spaces around the separators
    pub static ref RECEIPT_DATE_DMY: Regex = Regex::new(
        r"(\d{2})\s?[.,]\s?(\d{2})\s?[.,]\s?(20\d{2})"
    ).unwrap();

    pub static ref RECEIPT_DATE_SLASH: Regex = Regex::new(
        r"(\d{2})/(\d{2})/(20\d{2}|\d{2})"
    ).unwrap();

    pub static ref RECEIPT_DATE_ISO: Regex = Regex::new(
        r"(20\d{2})-(\d{2})-(\d{2})"
    ).unwrap();

    pub static ref RECEIPT_DATE_SPACED: Regex = Regex::new(
        r"(\d{2})\s{1,2}(\d{2})\s{1,2}(20\d{2})"
    ).unwrap();

    pub static ref RECEIPT_DATE_SHORT: Regex = Regex::new(
        r"(\d{2})\s?[.,]\s?(\d{2})\s?[.,]\s?(\d{2})"
    ).unwrap();

    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?i)datum|data|date|дата"
    ).unwrap();

    // Tax codes
    pub static ref TAX_LETTER: Regex = Regex::new(
        r"(?:^|\s)([A-G])\b"
    ).unwrap();

    pub static ref TAX_PERCENT: Regex = Regex::new(
        r"(\d{1,2})\s?%\s*$"
    ).unwrap();

    pub static ref PERCENT_TOKEN: Regex = Regex::new(
        r"\d{1,2}\s?%"
    ).unwrap();

    // price x qty, e.g. "2,99 x 4"
    pub static ref MATH_PATTERN: Regex = Regex::new(
        r"(-?\d+[.,]\d{2})\s*[xX×х*]\s*(\d+(?:[.,]\d+)?)"
    ).unwrap();

    // weight unit x unit_price, e.g. "1,207 kg x 8,99"
    pub static ref WEIGHT_TIMES_PRICE: Regex = Regex::new(
        r"(?i)(\d+[.,]\d{2,3})\s*(?:kg|stk|шт)?\s*[xх×*]\s*(\d+[.,]\d{2})"
    ).unwrap();

    // count x unit_price, e.g. "2 x 0,99"
    pub static ref COUNT_TIMES_PRICE: Regex = Regex::new(
        r"(?i)(?:^|[^\d.,])(\d+)\s*[xх×*]\s*(\d+[.,]\d{2})"
    ).unwrap();

    // Bare quantity tokens: "x 4", "4x", "4 Stk"
    pub static ref QTY_TOKEN: Regex = Regex::new(
        r"(?i)(?:^|\s)(?:[xх×*]\s*(\d+)|(\d+)\s*(?:[xх×*]|stk\.?|шт\.?))(?:\s|$)"
    ).unwrap();

    // Weighed-goods continuation line, e.g. "1,234 kg x 1,39 EUR/kg"
    pub static ref KG_LINE: Regex = Regex::new(
        r"(?i)(\d+[.,]\d+)\s*(?:kg|g|lb|stk\.?|l|ml)\s*[xX×х*]\s*(\d+[.,]\d+)"
    ).unwrap();

    pub static ref METADATA: Regex = Regex::new(
        r"(?i)\d+[.,]\d+\s*(?:kg|g|l|ml|lb)\b|/\s*(?:kg|l|stk)\b|\bstk\b"
    ).unwrap();

    // Staircase fragments
    pub static ref STAIR_QTY: Regex = Regex::new(
        r"(?i)^\s*(\d+)\s*(?:stk|x)?\s*$"
    ).unwrap();

    pub static ref STAIR_X_QTY: Regex = Regex::new(
        r"(?i)^\s*x\s*(\d+)\s*$"
    ).unwrap();

    pub static ref STAIR_UNIT_PRICE: Regex = Regex::new(
        r"(\d+[.,]\d{1,2})\s*[xX×х]"
    ).unwrap();

    // Quantity near a price pair, used by the splitter
    pub static ref SPLIT_QTY: Regex = Regex::new(
        r"[xX×х]\s*(\d+(?:[.,]\d+)?)"
    ).unwrap();

    // Trailing price suffix in a candidate name
    pub static ref NAME_PRICE_SUFFIX: Regex = Regex::new(
        r"\s+-?\d+[.,]\d{2}"
    ).unwrap();

    // Discounts
    pub static ref NEGATIVE_PRICE: Regex = Regex::new(
        r"-\s*(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref ANY_PRICE: Regex = Regex::new(
        r"(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref DISCOUNT_NAME_TRAIL: Regex = Regex::new(
        r"-?\s*\d+[.,]\d{2}\s*$"
    ).unwrap();

    pub static ref LEADING_MINUS: Regex = Regex::new(
        r"^-\s*"
    ).unwrap();

    pub static ref PRICE_AT_LINE_END: Regex = Regex::new(
        r"\d+[.,]\d{2}\s*[ABab]?\s*$"
    ).unwrap();

    pub static ref PRICE_AND_REST: Regex = Regex::new(
        r"\s*\d+[.,]\d{2}.*$"
    ).unwrap();

    pub static ref TRAILING_UNIT_TIMES_QTY: Regex = Regex::new(
        r"\s*\d+[.,]\d+\s*x\s*\d+\s*$"
    ).unwrap();

    pub static ref LEADING_PRICE: Regex = Regex::new(
        r"^\d+[.,]\d{2}"
    ).unwrap();

    // Quantity marker: price x qty total [tax]
    pub static ref QTY_LINE: Regex = Regex::new(
        r"(\d+[.,]\d{2})\s*[xX×]\s*(\d+)\s+(\d+[.,]\d{2})\s*([ABab])?\s*$"
    ).unwrap();

    // Decimal repair
    pub static ref DOT_PRICE: Regex = Regex::new(
        r"(\d+)\.(\d{2})"
    ).unwrap();

    pub static ref DOT_PRICE_TAIL: Regex = Regex::new(
        r"^(?:\s*[ABM]?\s*$|\s+[ABM]\s|\s+EUR|\s+-)"
    ).unwrap();

    pub static ref DOT_PRICE_TOKEN: Regex = Regex::new(
        r"^-?\d+\.\d{2}$"
    ).unwrap();

    // Ghost suffix: word, short junk token, price
    pub static ref GHOST_SUFFIX: Regex = Regex::new(
        r"(\S+)(\s+)([A-Za-z\d]{2,4})(\s+)(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref GHOST_WHITELIST: Vec<Regex> = [
        r"^[XSML]{1,3}$", r"^[xsml]{1,3}$",
        r"^\d+[gG]$", r"^\d+[kK][gG]$",
        r"^\d+[mM][lL]$", r"^\d+[lL]$", r"^\d+[cC][lL]$",
        r"^\d+,?\d*%$",
        r"^[xX]\d+$", r"^\d+[xX]$",
        r"^\d+[eE][rR]$", r"^\d+[sS][tT]$", r"^\d+[pP][cC]$",
        r"^[Bb]io$", r"^[Öö]ko$", r"^[Oo]rganic$",
        r"^EM$", r"^M$", r"^QS$", r"^OGT$", r"^HT$", r"^HF$",
        r"^[Aa]$", r"^[Bb]$", r"^[Nn]eu$", r"^[Ww]$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    // Confusable script detection
    pub static ref CYRILLIC: Regex = Regex::new(
        r"[А-Яа-яЁё]"
    ).unwrap();

    // Receipt totals
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"\d{1,3}(?:\s?\d{3})*[.,]\d{2}"
    ).unwrap();

    pub static ref DATE_TAIL: Regex = Regex::new(
        r"^[./-](?:20\d{2}|\d{2})"
    ).unwrap();
}

/// Whether the byte position `end` in `text` is followed by an ASCII digit.
pub fn followed_by_digit(text: &str, end: usize) -> bool {
    text[end..].chars().next().is_some_and(|c| c.is_ascii_digit())
}
