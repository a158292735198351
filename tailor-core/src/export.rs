use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::MeasurementRecord;
use crate::render::{display_order, render};

/// Export formats supported by [`export_records`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => anyhow::bail!("Unknown export format '{}' (expected json or markdown)", other),
        }
    }
}

/// Renders records (storage order) in the given format
pub fn export_records(records: &[MeasurementRecord], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ExportFormat::Markdown => Ok(to_markdown(records)),
    }
}

/// Writes an export to disk
pub fn export_to_file(
    records: &[MeasurementRecord],
    format: ExportFormat,
    output_path: &Path,
) -> Result<()> {
    let content = export_records(records, format)?;
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write export to {:?}", output_path))?;
    log::info!(
        "Exported {} record(s) to {}",
        records.len(),
        output_path.display()
    );
    Ok(())
}

/// Markdown document with one section per client, most recent first
fn to_markdown(records: &[MeasurementRecord]) -> String {
    let mut output = String::from("# Client Measurements\n\n");

    if records.is_empty() {
        output.push_str("_No measurements recorded._\n");
        return output;
    }

    let list = render(&display_order(records));
    for card in &list.cards {
        output.push_str(&format!("## {}\n\n", card.name));
        output.push_str(&format!("**Phone:** {}  \n", card.phone));
        output.push_str(&format!("**Recorded:** {}\n\n", card.timestamp));

        output.push_str("| Measurement | Value |\n|---|---|\n");
        for row in &card.details {
            output.push_str(&format!("| {} | {} |\n", row.label, row.value));
        }
        output.push('\n');

        if let Some(comments) = &card.comments {
            output.push_str(&format!("**Comments:** {}\n\n", comments));
        }
    }

    output
}
