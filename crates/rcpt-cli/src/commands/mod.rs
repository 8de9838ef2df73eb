//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod discounts;
pub mod mark;
pub mod parse;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use rcpt_core::models::{LocaleConfig, OcrDocument, RcptConfig};

/// Per-user configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Explicit config file, else the per-user file, else defaults; then the
/// locale override.
pub fn load_config(config_path: Option<&str>, locale: Option<&str>) -> anyhow::Result<RcptConfig> {
    let default_path = default_config_path();

    let mut config = match config_path {
        Some(path) => RcptConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None if default_path.exists() => {
            debug!("Using config file {}", default_path.display());
            RcptConfig::from_file(&default_path)?
        }
        None => RcptConfig::default(),
    };

    if let Some(code) = locale {
        config.locale = LocaleConfig::from_code(code);
    }
    config.validate()?;

    Ok(config)
}

/// Read a receipt: `.json` files are OCR documents, anything else plain text.
pub fn read_document(path: &Path) -> anyhow::Result<OcrDocument> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if is_json(path) {
        let document = OcrDocument::from_json(&content)
            .with_context(|| format!("Invalid OCR document {}", path.display()))?;
        Ok(document)
    } else {
        Ok(OcrDocument::from_text(&content))
    }
}

/// Raw receipt text of an input file.
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    let document = read_document(path)?;
    if document.text.trim().is_empty() {
        Ok(document.joined_text())
    } else {
        Ok(document.text)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
