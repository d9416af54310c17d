use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// One grade as kept in the store. Only built through [`GradeRecord::new`].
///
/// `new` checks a single record, so its `InvalidRecord` carries index 0;
/// [`ingest`] re-points it at the record's position in the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    subject: String,
    value: Option<f64>,
    content: String,
    weight: u32,
    edited: i64,
}

impl GradeRecord {
    pub fn new(
        subject: impl Into<String>,
        value: Option<f64>,
        content: impl Into<String>,
        weight: i64,
        edited: i64,
    ) -> Result<Self, GradeError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(GradeError::invalid(0, "subject is empty"));
        }
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(GradeError::invalid(0, format!("value {v} is not finite")));
            }
        }
        let weight = u32::try_from(weight)
            .ok()
            .filter(|w| *w >= 1)
            .ok_or_else(|| GradeError::invalid(0, format!("weight {weight} must be at least 1")))?;

        Ok(GradeRecord {
            subject,
            value,
            content: content.into(),
            weight,
            edited,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn edited(&self) -> i64 {
        self.edited
    }
}

/// Store shape before validation. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGradeRecord {
    pub subject: Option<String>,
    pub value: Option<f64>,
    pub content: Option<String>,
    pub weight: Option<i64>,
    pub edited: Option<i64>,
}

impl RawGradeRecord {
    fn into_record(self) -> Result<GradeRecord, GradeError> {
        let missing = |field: &str| GradeError::invalid(0, format!("missing field `{field}`"));
        GradeRecord::new(
            self.subject.ok_or_else(|| missing("subject"))?,
            self.value,
            self.content.ok_or_else(|| missing("content"))?,
            self.weight.ok_or_else(|| missing("weight"))?,
            self.edited.ok_or_else(|| missing("edited"))?,
        )
    }
}

/// Validates a raw list, failing on the first bad record.
pub fn ingest(raw: Vec<RawGradeRecord>) -> Result<Vec<GradeRecord>, GradeError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| record.into_record().map_err(|e| e.at(index)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectGroup {
    pub subject: String,
    pub records: Vec<GradeRecord>,
}

/// A grade token plus the length it had before colouring.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeCell {
    pub text: String,
    pub weight: u32,
    pub raw_len: usize,
}

/// Per-row render state. Raw lengths are captured here, before any colour is
/// applied, and stay authoritative for padding afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRow {
    pub subject: String,
    pub subject_len: usize,
    pub grades: Vec<GradeCell>,
    pub average: String,
    pub average_len: usize,
    pub mean: Option<f64>,
}

impl RenderRow {
    pub fn new<'a>(
        subject: &str,
        grades: impl IntoIterator<Item = (&'a str, u32)>,
        average: String,
        mean: Option<f64>,
    ) -> Self {
        let grades = grades
            .into_iter()
            .map(|(text, weight)| GradeCell {
                text: text.to_string(),
                weight,
                raw_len: text_len(text),
            })
            .collect();

        RenderRow {
            subject: subject.to_string(),
            subject_len: text_len(subject),
            grades,
            average_len: text_len(&average),
            average,
            mean,
        }
    }

    /// Uncoloured length of the grade tokens joined by single spaces.
    pub fn grades_len(&self) -> usize {
        let tokens: usize = self.grades.iter().map(|g| g.raw_len).sum();
        tokens + self.grades.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    pub subject: usize,
    pub grades: usize,
    pub average: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub subject: String,
    pub grades: String,
    pub average: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub subject: String,
    pub grade_count: usize,
    pub graded_count: usize,
    pub average: Option<f64>,
    pub last_edited: Option<NaiveDate>,
}

pub fn text_len(text: &str) -> usize {
    text.chars().count()
}
