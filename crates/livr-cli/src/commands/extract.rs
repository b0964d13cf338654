//! Extract command - extract line items from a single delivery note.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use livr_core::{open_document, DeliveryParser, ExtractionResult, PageSelection};

use super::{load_config, load_parser, page_selection, profiles_path};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier profile store (JSON)
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Pages to read: "all", "3", "1-3" or "1,3,5-6"
    #[arg(long)]
    pages: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
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
    /// File extension for written outputs.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let pages = page_selection(args.pages.as_deref(), &config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading profiles...");
    pb.set_position(10);
    let parser = load_parser(&profiles_path(args.profiles.as_deref(), &config), &config)?;

    pb.set_message("Extracting items...");
    pb.set_position(40);
    let result = extract_file(&parser, &args.input, &pages)?;

    pb.finish_and_clear();

    let output = format_result(&result, args.format, args.pretty)?;

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

/// Open a document, run the pipeline and record the source file.
pub fn extract_file(
    parser: &DeliveryParser,
    path: &Path,
    pages: &PageSelection,
) -> anyhow::Result<ExtractionResult> {
    let source = open_document(path)?;
    let mut result = parser.process(source, pages)?;
    result.file = Some(path.display().to_string());
    Ok(result)
}

pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// One row per item: file, supplier and order reference, then every field
/// seen on any item in first-seen order.
fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut fields: Vec<&str> = Vec::new();
    for item in &result.items {
        for name in item.fields.keys() {
            if !fields.contains(&name.as_str()) {
                fields.push(name);
            }
        }
    }

    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["file", "supplier", "order_ref"];
    header.extend(&fields);
    wtr.write_record(&header)?;

    let file = result.file.as_deref().unwrap_or("");
    for item in &result.items {
        let mut record = vec![
            file.to_string(),
            result.supplier.clone(),
            item.order_ref.clone().unwrap_or_default(),
        ];
        record.extend(
            fields
                .iter()
                .map(|f| item.get(f).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    if let Some(file) = &result.file {
        output.push_str(&format!("File: {}\n", file));
    }
    output.push_str(&format!("Supplier: {}\n", result.supplier));
    if let Some(strategy) = result.strategy {
        output.push_str(&format!("Strategy: {}\n", strategy));
    }
    output.push_str(&format!(
        "Pages: {} of {}\n",
        result.pages_parsed.len(),
        result.page_count
    ));

    if let Some(date) = &result.metadata.date_document {
        output.push_str(&format!("Date: {}\n", date));
    }
    if !result.metadata.purchase_orders.is_empty() {
        output.push_str(&format!(
            "Purchase orders: {}\n",
            result.metadata.purchase_orders.join(", ")
        ));
    }
    output.push('\n');

    output.push_str(&format!("Items ({}):\n", result.line_count));
    for item in &result.items {
        let fields: Vec<String> = item
            .fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        match &item.order_ref {
            Some(order) => output.push_str(&format!("  [{}] {}\n", order, fields.join("  "))),
            None => output.push_str(&format!("  {}\n", fields.join("  "))),
        }
    }

    if let Some(orders) = &result.orders {
        output.push_str(&format!("\nOrders: {}\n", orders.len()));
        for order in orders {
            output.push_str(&format!(
                "  {}: {} items\n",
                order.reference().unwrap_or("-"),
                order.items.len()
            ));
        }
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
