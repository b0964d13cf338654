//! Detect command - identify the supplier without extracting items.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::warn;

use livr_core::{open_document, DeliveryParser, PageSelection, SourceDocument};

use super::{load_config, load_parser, page_selection, profiles_path};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Input files (PDF or text)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Supplier profile store (JSON)
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Pages to read: "all", "3", "1-3" or "1,3,5-6"
    #[arg(long)]
    pages: Option<String>,
}

#[derive(Serialize)]
struct Detection {
    file: String,
    supplier: String,
    profile_loaded: bool,
}

/// Print one JSON line per readable input. Unreadable inputs are reported on
/// stderr and fail the command once every input has been tried.
pub async fn run(args: DetectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let pages = page_selection(args.pages.as_deref(), &config)?;
    let parser = load_parser(&profiles_path(args.profiles.as_deref(), &config), &config)?;

    let mut failed = 0;
    for input in &args.inputs {
        match detect_file(&parser, input, &pages) {
            Ok(detection) => println!("{}", serde_json::to_string(&detection)?),
            Err(e) => {
                warn!("Failed to read {}: {}", input.display(), e);
                eprintln!("{} {}: {}", style("✗").red(), input.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, args.inputs.len());
    }
    Ok(())
}

fn detect_file(
    parser: &DeliveryParser,
    input: &Path,
    pages: &PageSelection,
) -> anyhow::Result<Detection> {
    let source = open_document(input)?;
    let document = SourceDocument::read(&source, pages)?;
    let resolution = parser.detect(&document);

    Ok(Detection {
        file: input.display().to_string(),
        profile_loaded: resolution.profile.is_some(),
        supplier: resolution.supplier,
    })
}
