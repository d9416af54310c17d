use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::GradeError;
use crate::models::{GradeRecord, SubjectGroup, SubjectSummary};

const AVERAGE_DECIMALS: i32 = 3;

/// Groups records by subject in first-seen order. Within a subject the most
/// recently edited grade comes first.
pub fn group(records: &[GradeRecord]) -> Vec<SubjectGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<SubjectGroup> = Vec::new();

    for record in records {
        let slot = *index.entry(record.subject()).or_insert_with(|| {
            groups.push(SubjectGroup {
                subject: record.subject().to_string(),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record.clone());
    }

    for group in groups.iter_mut() {
        group.records.sort_by_key(|r| Reverse(r.edited()));
    }
    groups
}

/// Weighted mean of the graded records, rounded half-to-even at 3 decimals.
pub fn average(group: &SubjectGroup) -> Result<f64, GradeError> {
    let (total, count) = group
        .records
        .iter()
        .filter_map(|r| r.value().map(|v| (v, r.weight())))
        .fold((0.0_f64, 0u64), |(total, count), (value, weight)| {
            (total + value * f64::from(weight), count + u64::from(weight))
        });

    if count == 0 {
        return Err(GradeError::NoGradedEntries {
            subject: group.subject.clone(),
        });
    }
    Ok(round_half_even(total / count as f64, AVERAGE_DECIMALS))
}

pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// `4.333`, `3.0`, `2.5`: up to three decimals, never fewer than one.
pub fn format_average(average: f64) -> String {
    let mut text = format!("{:.*}", AVERAGE_DECIMALS as usize, average);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.push('0');
    }
    text
}

/// Start of a window of at least one day. A window reaching past chrono's
/// date range keeps every record.
pub fn cutoff_timestamp(since_days: i64) -> i64 {
    TimeDelta::try_days(since_days.max(1))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .map_or(i64::MIN, |cutoff| cutoff.timestamp())
}

pub fn edited_since(records: &[GradeRecord], cutoff: i64) -> Vec<GradeRecord> {
    records
        .iter()
        .filter(|r| r.edited() >= cutoff)
        .cloned()
        .collect()
}

pub fn summarize(groups: &[SubjectGroup]) -> Vec<SubjectSummary> {
    groups
        .iter()
        .map(|group| {
            let last_edited = group
                .records
                .iter()
                .map(GradeRecord::edited)
                .max()
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.date_naive());

            SubjectSummary {
                subject: group.subject.clone(),
                grade_count: group.records.len(),
                graded_count: group.records.iter().filter(|r| r.value().is_some()).count(),
                average: average(group).ok(),
                last_edited,
            }
        })
        .collect()
}
