//! Parse command - extract line items from a single receipt.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use rcpt_core::models::RcptConfig;
use rcpt_core::{ReceiptExtractor, ReceiptParser, ReceiptResult};

use super::read_document;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file (OCR document JSON or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print extraction warnings to stderr
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config: RcptConfig) -> anyhow::Result<()> {
    let start = Instant::now();

    info!("Processing file: {}", args.input.display());

    let document = read_document(&args.input)?;
    let parser = ReceiptParser::new(config);
    let result = parser.extract(&document);

    if args.show_warnings && !result.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ReceiptResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_items_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_items_csv(result: &ReceiptResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "name",
        "quantity",
        "unit_price",
        "total",
        "discount",
        "tax_code",
        "method",
        "lines",
    ])?;

    for item in &result.items {
        let lines = item
            .origin_line_indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(";");

        wtr.write_record([
            item.name.as_str(),
            &item.quantity.normalize().to_string(),
            &item.unit_price.to_string(),
            &item.total.to_string(),
            &item.discount.to_string(),
            &item.tax_code.map(|t| t.to_string()).unwrap_or_default(),
            item.extraction_method.as_str(),
            &lines,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ReceiptResult) -> String {
    let mut output = String::new();

    if let Some(store) = &result.store {
        output.push_str(&format!("Store:     {}\n", store.name));
    }
    if let Some(date) = result.date {
        output.push_str(&format!("Date:      {}\n", date.format("%d.%m.%Y")));
    }
    output.push_str(&format!("Locale:    {}\n\n", result.locale));

    output.push_str(&format!("Items ({}):\n", result.items.len()));
    for item in &result.items {
        output.push_str(&format!(
            "  {:<32} {:>7} x {:>8} = {:>8}",
            item.name,
            item.quantity.normalize(),
            item.unit_price,
            item.total
        ));
        if let Some(tax) = item.tax_code {
            output.push_str(&format!(" {}", tax));
        }
        if !item.discount.is_zero() {
            output.push_str(&format!("  (-{})", item.discount));
        }
        output.push('\n');
    }
    output.push('\n');

    output.push_str(&format!(
        "Discounts: {} totalling {}\n",
        result.discounts.discount_count, result.discounts.total_discount
    ));
    output.push_str(&format!("Item sum:  {}\n", result.net_total()));
    match result.receipt_total {
        Some(total) => output.push_str(&format!("Total:     {}\n", total)),
        None => output.push_str("Total:     not found\n"),
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
