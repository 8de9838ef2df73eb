//! Geometric word and line containers produced by OCR ingestion.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Horizontal units per character when geometry is synthesized from text.
pub const SYNTHETIC_CHAR_WIDTH: f32 = 10.0;

/// A single OCR word token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Recognized text.
    pub text: String,

    /// Left horizontal bound.
    pub left: f32,

    /// Right horizontal bound.
    pub right: f32,

    /// Width of the token.
    pub width: f32,

    /// Index of the OCR line this word was detected on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
}

impl Word {
    pub fn new(text: impl Into<String>, left: f32, right: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            width: right - left,
            line_index: None,
        }
    }

    /// Horizontal overlap with another word (negative when apart).
    pub fn overlap(&self, other: &Word) -> f32 {
        self.right.min(other.right) - self.left.max(other.left)
    }

    /// Gap between the right edge of this word and the left edge of the next.
    pub fn gap_to(&self, next: &Word) -> f32 {
        next.left - self.right
    }
}

/// An ordered sequence of words in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub words: Vec<Word>,
}

impl Line {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Build a line from plain text, synthesizing geometry from character offsets.
    pub fn from_text(text: &str) -> Self {
        let mut words = Vec::new();
        let mut offset = 0usize;
        let mut start: Option<usize> = None;

        for ch in text.chars() {
            if ch.is_whitespace() {
                if let Some(s) = start.take() {
                    words.push(synthetic_word(text, s, offset));
                }
            } else if start.is_none() {
                start = Some(offset);
            }
            offset += 1;
        }
        if let Some(s) = start {
            words.push(synthetic_word(text, s, offset));
        }

        Self { words }
    }

    /// Words joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

fn synthetic_word(text: &str, start: usize, end: usize) -> Word {
    let token: String = text.chars().skip(start).take(end - start).collect();
    Word::new(
        token,
        start as f32 * SYNTHETIC_CHAR_WIDTH,
        end as f32 * SYNTHETIC_CHAR_WIDTH,
    )
}

/// OCR output handed to the parsing core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrDocument {
    /// Detected lines in reading order.
    #[serde(default)]
    pub lines: Vec<Line>,

    /// Raw concatenated text of the receipt.
    #[serde(default)]
    pub text: String,
}

impl OcrDocument {
    /// Build a document from plain text, one line per non-empty text line.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(Line::from_text)
            .collect();

        Self {
            lines,
            text: text.to_string(),
        }
    }

    /// Decode and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let mut doc: OcrDocument = serde_json::from_str(json)?;
        doc.validate()?;

        if doc.lines.is_empty() {
            if doc.text.trim().is_empty() {
                return Err(DocumentError::Empty);
            }
            doc.lines = OcrDocument::from_text(&doc.text).lines;
        } else if doc.text.is_empty() {
            doc.text = doc.joined_text();
        }

        Ok(doc)
    }

    /// Check that every word carries usable geometry.
    pub fn validate(&self) -> Result<(), DocumentError> {
        for (li, line) in self.lines.iter().enumerate() {
            for (wi, word) in line.words.iter().enumerate() {
                let reason = if !(word.left.is_finite() && word.right.is_finite() && word.width.is_finite()) {
                    Some("non-finite bounds")
                } else if word.right < word.left {
                    Some("right bound is left of left bound")
                } else if word.width < 0.0 {
                    Some("negative width")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    return Err(DocumentError::Geometry {
                        line: li,
                        word: wi,
                        reason: reason.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Line texts joined with newlines.
    pub fn joined_text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_from_text_geometry() {
        let line = Line::from_text("Milch  1,19 A");
        assert_eq!(line.len(), 3);
        assert_eq!(line.words[0].text, "Milch");
        assert_eq!(line.words[0].left, 0.0);
        assert_eq!(line.words[0].right, 50.0);
        assert_eq!(line.words[1].left, 70.0);
        assert_eq!(line.text(), "Milch 1,19 A");
    }

    #[test]
    fn test_line_from_text_multibyte() {
        let line = Line::from_text("Итого 12,50");
        assert_eq!(line.words[0].text, "Итого");
        assert_eq!(line.words[1].left, 60.0);
    }

    #[test]
    fn test_document_from_text_drops_blank_lines() {
        let doc = OcrDocument::from_text("Brot 2,49 A\n\n   \nMilch 1,19 A\n");
        assert_eq!(doc.lines.len(), 2);
    }

    #[test]
    fn test_document_from_json_fills_text() {
        let json = r#"{"lines":[{"words":[{"text":"Brot","left":0,"right":40,"width":40},{"text":"2,49","left":200,"right":240,"width":40}]}]}"#;
        let doc = OcrDocument::from_json(json).unwrap();
        assert_eq!(doc.text, "Brot 2,49");
    }

    #[test]
    fn test_document_from_json_text_only() {
        let doc = OcrDocument::from_json(r#"{"text":"Brot 2,49\nMilch 1,19"}"#).unwrap();
        assert_eq!(doc.lines.len(), 2);
    }

    #[test]
    fn test_document_rejects_bad_geometry() {
        let json = r#"{"lines":[{"words":[{"text":"x","left":50,"right":10,"width":0}]}]}"#;
        let err = OcrDocument::from_json(json).unwrap_err();
        assert!(matches!(err, DocumentError::Geometry { line: 0, word: 0, .. }));
    }

    #[test]
    fn test_document_rejects_empty() {
        assert!(matches!(
            OcrDocument::from_json("{}"),
            Err(DocumentError::Empty)
        ));
    }
}
