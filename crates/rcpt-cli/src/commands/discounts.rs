//! Discounts command - standalone discount report.

use std::path::PathBuf;

use clap::Args;
use console::style;

use rcpt_core::models::{LocaleConfig, RcptConfig};
use rcpt_core::{DiscountExtractor, LocaleDetector};

use super::read_text;

/// Arguments for the discounts command.
#[derive(Args)]
pub struct DiscountsArgs {
    /// Input file (OCR document JSON or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub async fn run(args: DiscountsArgs, mut config: RcptConfig) -> anyhow::Result<()> {
    let text = read_text(&args.input)?;
    if config.locale.detect {
        let detected = LocaleDetector::new(config.locale.code.clone()).detect(&text);
        config.locale = LocaleConfig::from_code(&detected.code);
    }

    let extractor = DiscountExtractor::new(&config);
    let result = extractor.extract_discounts(&text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.discounts.is_empty() {
        println!("{} No discounts found.", style("ℹ").blue());
        return Ok(());
    }

    for discount in &result.discounts {
        println!(
            "{:>4}  {:<14} {:>8}  {}{}",
            discount.source_line_index,
            discount.kind.to_string(),
            discount.amount,
            discount.name,
            discount
                .related_item
                .as_deref()
                .map(|item| format!(" -> {}", item))
                .unwrap_or_default()
        );
    }

    println!();
    println!(
        "{} {} discounts totalling {}",
        style("✓").green(),
        result.discount_count,
        result.total_discount
    );
    println!(
        "   {} priced lines counted",
        extractor.count_price_lines(&text)
    );

    Ok(())
}
