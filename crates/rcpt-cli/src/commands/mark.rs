//! Mark command - rewrite `price x qty total` lines into the tagged form.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use rcpt_core::QuantityMarker;

use super::read_text;

/// Arguments for the mark command.
#[derive(Args)]
pub struct MarkArgs {
    /// Input file (OCR document JSON or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: MarkArgs) -> anyhow::Result<()> {
    let text = read_text(&args.input)?;
    let result = QuantityMarker::new().process(&text);
    info!("{} lines marked", result.lines_marked);

    if let Some(output_path) = &args.output {
        fs::write(output_path, &result.marked_text)?;
        println!(
            "{} Marked {} lines, output written to {}",
            style("✓").green(),
            result.lines_marked,
            output_path.display()
        );
    } else {
        println!("{}", result.marked_text);
    }

    Ok(())
}
