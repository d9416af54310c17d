use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::models::{self, GradeRecord, RawGradeRecord};

/// Subject names are cut to this many characters.
pub const SUBJECT_NAME_LIMIT: usize = 20;

/// One upstream grade item. Fields are optional so a gap is reported
/// against the item's position rather than as a parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ExportItem {
    value: Option<f64>,
    content: Option<String>,
    date_modify: Option<ExportDate>,
    column: Option<ExportColumn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExportDate {
    timestamp: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ExportColumn {
    weight: Option<i64>,
    subject: Option<ExportSubject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExportSubject {
    name: Option<String>,
}

impl From<ExportItem> for RawGradeRecord {
    fn from(item: ExportItem) -> Self {
        let column = item.column.unwrap_or_default();
        RawGradeRecord {
            subject: column
                .subject
                .and_then(|s| s.name)
                .map(|name| truncate_subject(&name)),
            value: item.value,
            content: item.content,
            weight: column.weight,
            edited: item.date_modify.and_then(|d| d.timestamp),
        }
    }
}

pub fn truncate_subject(name: &str) -> String {
    name.chars().take(SUBJECT_NAME_LIMIT).collect()
}

pub fn extract(json: &str) -> anyhow::Result<Vec<GradeRecord>> {
    let items: Vec<ExportItem> =
        serde_json::from_str(json).context("raw export is not a list of grade items")?;
    let records = models::ingest(items.into_iter().map(RawGradeRecord::from).collect())?;
    Ok(records)
}

pub fn extract_file(raw_path: &Path) -> anyhow::Result<Vec<GradeRecord>> {
    let json = fs::read_to_string(raw_path)
        .with_context(|| format!("failed to read raw export {}", raw_path.display()))?;
    let records = extract(&json)?;
    log::info!("extracted {} grades from {}", records.len(), raw_path.display());
    Ok(records)
}

/// Runs the command that refreshes the raw export.
pub fn run_helper(command: &str, dir: Option<&Path>) -> anyhow::Result<()> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    log::info!("running export helper `{command}`");
    let status = cmd
        .status()
        .with_context(|| format!("failed to start helper `{command}`"))?;
    if !status.success() {
        bail!("helper `{command}` exited with {status}");
    }
    Ok(())
}
