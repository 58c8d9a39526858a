//! Timing context shared by jobs and machines.
//!
//! Jobs and machines never own matrices. Every timing query receives the
//! instance's [`Timing`], which bundles both matrices, the problem-variant
//! flags and the setup key of every job.

use serde::{Deserialize, Serialize};

use super::{InstanceConfig, PtimeMatrix, SetupMatrix, Time};
use crate::error::{PmspError, Result};

/// Read-only timing data of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    ptime: PtimeMatrix,
    setup: SetupMatrix,
    config: InstanceConfig,
    /// Setup key per job id: family tag under family setups, else the id.
    setup_keys: Vec<usize>,
}

impl Timing {
    pub(crate) fn new(
        ptime: PtimeMatrix,
        setup: SetupMatrix,
        config: InstanceConfig,
        setup_keys: Vec<usize>,
    ) -> Self {
        Self {
            ptime,
            setup,
            config,
            setup_keys,
        }
    }

    /// Processing-time matrix.
    pub fn ptime(&self) -> &PtimeMatrix {
        &self.ptime
    }

    /// Setup-time matrix.
    pub fn setup(&self) -> &SetupMatrix {
        &self.setup
    }

    /// Problem-variant flags.
    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// Key under which `job` is looked up in the setup matrix.
    pub fn setup_key(&self, job: usize) -> Result<usize> {
        self.setup_keys
            .get(job)
            .copied()
            .ok_or_else(|| PmspError::job_not_found(job))
    }
}

/// Minimum, maximum and mean of a timing value across machines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingBounds {
    pub min: Time,
    pub max: Time,
    pub avg: f64,
}

impl TimingBounds {
    /// Aggregates `values`; `None` if there are none.
    pub fn from_values(values: &[Time]) -> Option<Self> {
        let min = *values.iter().min()?;
        let max = *values.iter().max()?;
        let sum: Time = values.iter().sum();
        Some(Self {
            min,
            max,
            avg: sum as f64 / values.len() as f64,
        })
    }

    /// Spread between the best and worst candidate.
    pub fn range(&self) -> Time {
        self.max - self.min
    }
}

/// Earliest completion time together with the id that achieves it.
///
/// For a job query `id` is a machine; for a machine query it is a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub time: Time,
    pub id: usize,
}

impl Completion {
    /// Keeps the earlier completion; ties go to the lower id.
    pub(crate) fn earliest(best: Option<Self>, candidate: Self) -> Option<Self> {
        match best {
            Some(b) if (b.time, b.id) <= (candidate.time, candidate.id) => Some(b),
            _ => Some(candidate),
        }
    }
}
