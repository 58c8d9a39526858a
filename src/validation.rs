//! Integrity checks for scheduling state.
//!
//! [`Instance::new`] already enforces structure (ids, matrix shapes,
//! references). This module checks what structure cannot: that job state,
//! machine timelines and availability tell the same story. It reports
//! every issue found instead of stopping at the first. Detects:
//! - Jobs ending before they start
//! - Half-committed jobs
//! - Timelines that disagree with job state or overlap
//! - Availability behind or ahead of the last committed job
//! - Jobs committed to more than one machine
//! - Machines flagged identical whose timings differ

use std::collections::HashMap;

use tracing::warn;

use crate::models::Instance;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A job's end precedes its start.
    JobTimeOrder,
    /// A job is complete without machine or end, or has state while not complete.
    IncompleteCommitment,
    /// A machine timeline disagrees with job state, or bars overlap.
    HistoryMismatch,
    /// `available` differs from the end of the last bar.
    AvailabilityMismatch,
    /// A job appears in more than one timeline slot.
    DoubleAssignment,
    /// `identical_mch` is set but machine timings differ.
    NonIdenticalMachines,
}

impl ValidationErrorKind {
    /// Whether the issue is a broken hint rather than broken state.
    ///
    /// `identical_mch` only promises shared timings; nothing in the model
    /// depends on it.
    pub fn is_advisory(&self) -> bool {
        matches!(self, ValidationErrorKind::NonIdenticalMachines)
    }
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the scheduling state of an instance.
///
/// Checks:
/// 1. `end >= start` for every job with both set
/// 2. Complete jobs have a machine and an end; incomplete jobs have neither
/// 3. Each job appears in at most one timeline slot
/// 4. Every bar matches the job it names, and bars do not overlap
/// 5. Every complete job appears on the machine it names
/// 6. `available` equals the end of the last bar
/// 7. Identical machines really share their timings
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(inst: &Instance) -> ValidationResult {
    let mut errors = Vec::new();

    for job in inst.jobs() {
        if let (Some(start), Some(end)) = (job.start(), job.end()) {
            if end < start {
                errors.push(ValidationError::new(
                    ValidationErrorKind::JobTimeOrder,
                    format!("Job {} ends at {end} before it starts at {start}", job.id()),
                ));
            }
        }

        let has_state =
            job.assigned_mch().is_some() || job.start().is_some() || job.end().is_some();
        if job.is_complete() && (job.assigned_mch().is_none() || job.end().is_none()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::IncompleteCommitment,
                format!("Job {} is complete without a machine or end time", job.id()),
            ));
        } else if !job.is_complete() && has_state {
            errors.push(ValidationError::new(
                ValidationErrorKind::IncompleteCommitment,
                format!("Job {} carries scheduling state but is not complete", job.id()),
            ));
        }
    }

    // job id -> machine whose timeline holds it
    let mut placed: HashMap<usize, usize> = HashMap::new();

    for machine in inst.machines() {
        let mut prev_end = None;
        for bar in machine.schedules() {
            if let Some(other) = placed.insert(bar.job, machine.id()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DoubleAssignment,
                    format!(
                        "Job {} appears on machine {other} and machine {}",
                        bar.job,
                        machine.id()
                    ),
                ));
            }

            if let Ok(job) = inst.find_job(bar.job) {
                let matches = job.assigned_mch() == Some(machine.id())
                    && job.start() == Some(bar.start)
                    && job.end() == Some(bar.end);
                if !matches {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::HistoryMismatch,
                        format!(
                            "Machine {} timeline disagrees with state of job {}",
                            machine.id(),
                            bar.job
                        ),
                    ));
                }
            }

            if let Some(prev) = prev_end {
                if bar.start - bar.setup < prev {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::HistoryMismatch,
                        format!(
                            "Machine {} starts job {} before its predecessor ends at {prev}",
                            machine.id(),
                            bar.job
                        ),
                    ));
                }
            }
            prev_end = Some(bar.end);
        }

        if let Some(last) = machine.schedules().last() {
            if machine.available() != last.end {
                errors.push(ValidationError::new(
                    ValidationErrorKind::AvailabilityMismatch,
                    format!(
                        "Machine {} is available at {} but its last job ends at {}",
                        machine.id(),
                        machine.available(),
                        last.end
                    ),
                ));
            }
        }
    }

    for job in inst.jobs().iter().filter(|j| j.is_complete()) {
        if let Some(mch) = job.assigned_mch() {
            if placed.get(&job.id()) != Some(&mch) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::HistoryMismatch,
                    format!("Job {} is not on the timeline of machine {mch}", job.id()),
                ));
            }
        }
    }

    if inst.config().identical_mch {
        if let Some(err) = check_identical(inst) {
            errors.push(err);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        warn!(issues = errors.len(), "instance failed validation");
        Err(errors)
    }
}

/// Compares every machine's timings against machine 0.
fn check_identical(inst: &Instance) -> Option<ValidationError> {
    let ptime = inst.ptime().to_rows();
    let setup = inst.setup().to_rows();
    let first_p = ptime.first()?;
    let first_s = setup.first()?;

    let differs = ptime
        .iter()
        .zip(&setup)
        .position(|(p, s)| p != first_p || s != first_s)?;
    Some(ValidationError::new(
        ValidationErrorKind::NonIdenticalMachines,
        format!("Machine {differs} timings differ from machine 0 despite identical_mch"),
    ))
}
