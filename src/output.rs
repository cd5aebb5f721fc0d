//! Text and JSON rendering for selections, classifications and reports.

use std::io::Write;

use colored::*;
use serde::Serialize;

use crate::buckets::BucketSelection;
use crate::classify::{Classification, FileCategory};
use crate::detector::ChangeReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(writer, "{}", json)?;
    Ok(())
}

/// `ALL` or one bucket id per line.
pub fn write_selection<W: Write>(
    writer: &mut W,
    selection: &BucketSelection,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(writer, selection),
        OutputFormat::Text => {
            match selection {
                BucketSelection::All => writeln!(writer, "ALL")?,
                BucketSelection::Only { buckets } => {
                    for bucket in buckets {
                        writeln!(writer, "{}", bucket)?;
                    }
                }
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ShouldRun<'a> {
    bucket: &'a str,
    run: bool,
}

pub fn write_should_run<W: Write>(
    writer: &mut W,
    bucket: &str,
    run: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(writer, &ShouldRun { bucket, run }),
        OutputFormat::Text => {
            writeln!(writer, "{}", run)?;
            Ok(())
        }
    }
}

/// `<category>\t<path>` lines.
pub fn write_classifications<W: Write>(
    writer: &mut W,
    classifications: &[Classification],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(writer, classifications),
        OutputFormat::Text => {
            for c in classifications {
                writeln!(writer, "{}\t{}", c.category, c.path)?;
            }
            Ok(())
        }
    }
}

fn paint_category(category: FileCategory) -> ColoredString {
    let label = category.as_str();
    match category {
        FileCategory::Infra | FileCategory::Unknown => label.red(),
        FileCategory::FatTest | FileCategory::UnitOrBvtTest => label.cyan(),
        FileCategory::Product | FileCategory::ProductFeature => label.green(),
    }
}

/// Human-readable walk through every stage of a change analysis.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &ChangeReport,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return write_json(writer, report);
    }

    writeln!(writer, "{}", "Changed paths".bold())?;
    for c in &report.classifications {
        let rule = c.rule.as_deref().unwrap_or("fallback");
        writeln!(
            writer,
            "  {:<18} {} {}",
            paint_category(c.category),
            c.path,
            format!("({})", rule).as_str().dimmed()
        )?;
    }

    if !report.direct_buckets.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "Buckets with changed sources".bold())?;
        for bucket in &report.direct_buckets {
            writeln!(writer, "  {}", bucket)?;
        }
    }

    if !report.changed_bundles.is_empty() || !report.changed_features.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "Changed bundles and features".bold())?;
        for bundle in &report.changed_bundles {
            writeln!(writer, "  bundle  {}", bundle)?;
        }
        for feature in &report.changed_features {
            writeln!(writer, "  feature {}", feature)?;
        }
    }

    if !report.impact.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "{} ({})",
            "Affected features".bold(),
            report.impact.len()
        )?;
        for (feature, cause) in &report.impact.causes {
            writeln!(writer, "  {} {}", feature, format!("<- {}", cause).as_str().dimmed())?;
        }
    }

    writeln!(writer)?;
    match (&report.selection, &report.all_reason) {
        (BucketSelection::All, Some(reason)) => {
            writeln!(writer, "{} {}", "Run ALL buckets:".yellow().bold(), reason)?;
        }
        (BucketSelection::All, None) => {
            writeln!(writer, "{}", "Run ALL buckets".yellow().bold())?;
        }
        (BucketSelection::Only { buckets }, _) => {
            writeln!(
                writer,
                "{}",
                format!("Run {} buckets", buckets.len()).as_str().green().bold()
            )?;
            for bucket in buckets {
                writeln!(writer, "  {}", bucket)?;
            }
        }
    }
    Ok(())
}
