use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::models::{self, GradeRecord, RawGradeRecord};

pub fn load(path: &Path) -> anyhow::Result<Vec<GradeRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read grade store {}", path.display()))?;
    let raw: Vec<RawGradeRecord> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON list of grades", path.display()))?;
    let records = models::ingest(raw)?;
    log::debug!("loaded {} grades from {}", records.len(), path.display());
    Ok(records)
}

/// Loads the store, treating a missing file as empty.
pub fn load_or_empty(path: &Path) -> anyhow::Result<Vec<GradeRecord>> {
    if path.exists() {
        load(path)
    } else {
        Ok(Vec::new())
    }
}

pub fn save(path: &Path, records: &[GradeRecord]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write grade store {}", path.display()))?;
    log::debug!("saved {} grades to {}", records.len(), path.display());
    Ok(())
}

/// Appends CSV rows to the store, skipping rows already present.
pub fn import_csv(path: &Path, csv_path: &Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut raw = Vec::new();
    for row in reader.deserialize::<RawGradeRecord>() {
        raw.push(row?);
    }
    let incoming = models::ingest(raw)?;

    let mut records = load_or_empty(path)?;
    let mut inserted = 0usize;
    for record in incoming {
        if records.contains(&record) {
            log::debug!(
                "skipping duplicate grade {} in {}",
                record.content(),
                record.subject()
            );
            continue;
        }
        records.push(record);
        inserted += 1;
    }

    save(path, &records)?;
    Ok(inserted)
}
