use thiserror::Error;

/// Failures raised while ingesting records or averaging a subject.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("invalid grade record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("subject `{subject}` has no graded entries")]
    NoGradedEntries { subject: String },
}

impl GradeError {
    pub fn invalid(index: usize, reason: impl Into<String>) -> Self {
        GradeError::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Re-points an `InvalidRecord` at its position in the input list.
    pub fn at(self, index: usize) -> Self {
        match self {
            GradeError::InvalidRecord { reason, .. } => GradeError::InvalidRecord { index, reason },
            other => other,
        }
    }
}

/// Palette lookups that miss. Both are recovered by the annotator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    #[error("no colour defined for weight {0}")]
    UnknownWeight(u32),

    #[error("average {0} falls outside the 1..=6 colour buckets")]
    UnknownAverageBucket(f64),
}
