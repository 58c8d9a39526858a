//! Error types for the scheduling model.
//!
//! Every failure is reported to the caller. Nothing here is retried or
//! silently defaulted; recovery belongs to whatever assignment procedure
//! drives the model.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PmspError>;

/// Errors raised by lookups, construction, mutation and decoding.
#[derive(Debug, Error)]
pub enum PmspError {
    /// A job or machine id is absent from the instance.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: usize },

    /// A matrix or list disagrees with the instance cardinalities.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// No candidate yields a defined value for an aggregate query.
    #[error("no defined value for {what}")]
    UndefinedLookup { what: String },

    /// A serialized id points at a job or machine that does not exist.
    #[error("invalid reference in {what}: {id}")]
    InvalidReference { what: String, id: i64 },

    /// A matrix cell outside the stored shape was requested.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// An entity is stored at a position different from its id.
    #[error("{entity} at position {position} has id {id}")]
    IdPositionMismatch {
        entity: &'static str,
        position: usize,
        id: usize,
    },

    /// A processing or setup time is negative.
    #[error("negative time in {what}: {value}")]
    NegativeTime { what: String, value: i64 },

    /// A start or completion time does not fit in [`Time`](crate::models::Time).
    #[error("time overflow in {what}")]
    TimeOverflow { what: String },

    /// The job has already been committed to a machine.
    #[error("job {job} is already scheduled")]
    AlreadyScheduled { job: usize },

    /// A serialized machine row disagrees with the instance matrix.
    #[error("{matrix} row of machine {machine} disagrees with the instance matrix")]
    RowMismatch {
        machine: usize,
        matrix: &'static str,
    },

    /// Decoded scheduling state breaks a job or machine invariant.
    #[error("inconsistent scheduling state: {0}")]
    InconsistentState(String),

    /// A generator setting is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The serialized form could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PmspError {
    pub(crate) fn job_not_found(id: usize) -> Self {
        PmspError::NotFound { entity: "job", id }
    }

    pub(crate) fn machine_not_found(id: usize) -> Self {
        PmspError::NotFound {
            entity: "machine",
            id,
        }
    }

    /// Returns true if this error is an absent job or machine id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PmspError::NotFound { .. })
    }

    /// Returns true if this error reports inconsistent shapes or ids.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PmspError::DimensionMismatch { .. } | PmspError::IdPositionMismatch { .. }
        )
    }

    /// Returns true if an aggregate had no candidate to work with.
    pub fn is_undefined(&self) -> bool {
        matches!(self, PmspError::UndefinedLookup { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = PmspError::job_not_found(7);
        assert_eq!(e.to_string(), "job 7 not found");
        assert!(e.is_not_found());

        let e = PmspError::DimensionMismatch {
            what: "ptime rows".into(),
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            e.to_string(),
            "dimension mismatch in ptime rows: expected 2, got 3"
        );
        assert!(e.is_structural());
        assert!(!e.is_undefined());
    }

    #[test]
    fn test_overflow_message() {
        let e = PmspError::TimeOverflow {
            what: "completion of job 3 on machine 1".into(),
        };
        assert_eq!(
            e.to_string(),
            "time overflow in completion of job 3 on machine 1"
        );
    }

    #[test]
    fn test_json_conversion() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let e: PmspError = err.into();
        assert!(matches!(e, PmspError::Json(_)));
    }
}
