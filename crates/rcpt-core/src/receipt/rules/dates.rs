//! Transaction date extraction.

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, trace};

use super::patterns::{
    DATE_LABEL, RECEIPT_DATE_DMY, RECEIPT_DATE_ISO, RECEIPT_DATE_SHORT, RECEIPT_DATE_SLASH,
    RECEIPT_DATE_SPACED,
};
use super::{ExtractionMatch, FieldExtractor};

const LABELED_CONFIDENCE: f32 = 0.95;
const PLAIN_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy)]
enum FieldOrder {
    DayMonthYear,
    YearMonthDay,
}

/// Date formats, most specific first. A short `dd.mm.yy` match inside an
/// already found `dd.mm.yyyy` is skipped.
fn formats() -> [(&'static Regex, FieldOrder); 5] {
    [
        (&*RECEIPT_DATE_DMY, FieldOrder::DayMonthYear),
        (&*RECEIPT_DATE_SLASH, FieldOrder::DayMonthYear),
        (&*RECEIPT_DATE_ISO, FieldOrder::YearMonthDay),
        (&*RECEIPT_DATE_SPACED, FieldOrder::DayMonthYear),
        (&*RECEIPT_DATE_SHORT, FieldOrder::DayMonthYear),
    ]
}

/// Receipt date extractor.
///
/// A date on a line labeled `Datum`/`Date`/`Дата`, or right below such a
/// label, wins over unlabeled dates.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let best = self
            .extract_all(text)
            .into_iter()
            .fold(None::<Self::Output>, |best, m| match best {
                Some(b) if b.confidence >= m.confidence => Some(b),
                _ => Some(m),
            })?;

        debug!("receipt date {} from '{}' ({:.2})", best.value, best.source, best.confidence);
        Some(best)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();
        let mut offset = 0;
        let mut prev_line = "";

        for line in text.split('\n') {
            let labeled = DATE_LABEL.is_match(line) || DATE_LABEL.is_match(prev_line);
            let confidence = if labeled { LABELED_CONFIDENCE } else { PLAIN_CONFIDENCE };
            let mut spans: Vec<(usize, usize)> = Vec::new();

            for (pattern, order) in formats() {
                for caps in pattern.captures_iter(line) {
                    let Some(whole) = caps.get(0) else {
                        continue;
                    };
                    if spans.iter().any(|&(s, e)| whole.start() < e && s < whole.end()) {
                        continue;
                    }
                    let Some(date) = to_date(&caps[1], &caps[2], &caps[3], order) else {
                        trace!("'{}' is not a calendar date", whole.as_str());
                        continue;
                    };

                    spans.push((whole.start(), whole.end()));
                    results.push(
                        ExtractionMatch::new(date, confidence, whole.as_str())
                            .with_position(offset + whole.start(), offset + whole.end()),
                    );
                }
            }

            offset += line.len() + 1;
            prev_line = line;
        }

        results
    }
}

fn to_date(first: &str, second: &str, third: &str, order: FieldOrder) -> Option<NaiveDate> {
    let (year, month, day) = match order {
        FieldOrder::DayMonthYear => (parse_year(third)?, second.parse().ok()?, first.parse().ok()?),
        FieldOrder::YearMonthDay => (parse_year(first)?, second.parse().ok()?, third.parse().ok()?),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Two-digit years are read as 20xx.
fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if year < 100 { 2000 + year } else { year })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_dotted_date() {
        let extractor = DateExtractor::new();
        let result = extractor.extract("24.12.2025 18:05 Bon 4711").unwrap();
        assert_eq!(result.value, date(2025, 12, 24));
        assert_eq!(result.source, "24.12.2025");
    }

    #[test]
    fn test_ocr_spacing_and_comma_separator() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("03 ,11. 2025").unwrap().value, date(2025, 11, 3));
        assert_eq!(extractor.extract("07 05 2024").unwrap().value, date(2024, 5, 7));
    }

    #[test]
    fn test_slash_iso_and_short_formats() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("15/01/24").unwrap().value, date(2024, 1, 15));
        assert_eq!(extractor.extract("2024-01-15").unwrap().value, date(2024, 1, 15));
        assert_eq!(extractor.extract("15.01.24").unwrap().value, date(2024, 1, 15));
    }

    #[test]
    fn test_short_match_inside_long_date_is_skipped() {
        let extractor = DateExtractor::new();
        let all = extractor.extract_all("24.12.2025");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, date(2025, 12, 24));
    }

    #[test]
    fn test_labeled_date_wins() {
        let extractor = DateExtractor::new();
        let text = "Gutschein gueltig bis 31.01.2026\nMilch 1,19 A\nDatum:\n24.12.2025 18:05";
        let result = extractor.extract(text).unwrap();
        assert_eq!(result.value, date(2025, 12, 24));
        assert_eq!(result.confidence, LABELED_CONFIDENCE);
        assert_eq!(result.start(), text.find("24.12").unwrap());
    }

    #[test]
    fn test_invalid_dates_and_prices_are_ignored() {
        let extractor = DateExtractor::new();
        assert!(extractor.extract("Beleg 31.02.2025").is_none());
        assert!(extractor.extract("Milch 1,19 A\nSumme 10,85").is_none());
    }
}
