//! Machine model.
//!
//! A machine processes one job at a time in commitment order. Its
//! processing and setup times are rows of the instance matrices, looked up
//! through the [`Timing`] passed into every query.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2.1
//! (unrelated machines in parallel, `Rm | s_jk | ·`)

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Completion, Job, Time, Timing};
use crate::error::{PmspError, Result};

/// Whether a machine sees its row of an instance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowBinding {
    /// Row `machine.id` of the matrix applies.
    #[default]
    Bound,
    /// No row; the machine has no defined value for this matrix.
    Unbound,
}

impl RowBinding {
    pub fn is_bound(self) -> bool {
        self == RowBinding::Bound
    }
}

/// One committed job on a machine's timeline.
///
/// The setup interval `[start - setup, start)` precedes processing
/// `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub job: usize,
    pub start: Time,
    pub end: Time,
    pub setup: Time,
}

impl Bar {
    /// Processing duration.
    #[inline]
    pub fn duration(&self) -> Time {
        self.end - self.start
    }

    /// Setup plus processing.
    #[inline]
    pub fn busy(&self) -> Time {
        self.duration() + self.setup
    }
}

/// A processing resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    id: usize,
    available: Time,
    assigned: Vec<usize>,
    schedules: Vec<Bar>,
    setup: RowBinding,
    ptime: RowBinding,
    priority: i32,
}

impl Machine {
    /// Creates an idle machine available at time 0 with both rows bound.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            available: 0,
            assigned: Vec::new(),
            schedules: Vec::new(),
            setup: RowBinding::Bound,
            ptime: RowBinding::Bound,
            priority: 0,
        }
    }

    /// Sets the initial availability offset.
    pub fn with_available(mut self, available: Time) -> Self {
        self.available = available;
        self
    }

    /// Sets the tie-break hint.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Binds or unbinds the setup row.
    pub fn with_setup_row(mut self, binding: RowBinding) -> Self {
        self.setup = binding;
        self
    }

    /// Binds or unbinds the processing-time row.
    pub fn with_ptime_row(mut self, binding: RowBinding) -> Self {
        self.ptime = binding;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Earliest time the next job can begin its setup.
    pub fn available(&self) -> Time {
        self.available
    }

    /// Job ids in commitment order.
    pub fn assigned(&self) -> &[usize] {
        &self.assigned
    }

    /// Timeline, one bar per committed job.
    pub fn schedules(&self) -> &[Bar] {
        &self.schedules
    }

    pub fn setup_row(&self) -> RowBinding {
        self.setup
    }

    pub fn ptime_row(&self) -> RowBinding {
        self.ptime
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Most recently committed job.
    pub fn last_job(&self) -> Option<usize> {
        self.assigned.last().copied()
    }

    /// Total setup plus processing time committed so far.
    pub fn busy_time(&self) -> Time {
        self.schedules.iter().map(Bar::busy).sum()
    }

    pub(crate) fn restore(
        id: usize,
        available: Time,
        schedules: Vec<Bar>,
        setup: RowBinding,
        ptime: RowBinding,
        priority: i32,
    ) -> Self {
        Self {
            id,
            available,
            assigned: schedules.iter().map(|b| b.job).collect(),
            schedules,
            setup,
            ptime,
            priority,
        }
    }

    /// Setup into `job` if it ran next here, or `None` when undefined.
    ///
    /// Undefined means setups are disabled for the instance or this
    /// machine's setup row is unbound. With no predecessor the setup is 0.
    pub fn lookup_setup(&self, job: &Job, timing: &Timing) -> Result<Option<Time>> {
        if !timing.config().with_setup || !self.setup.is_bound() {
            return Ok(None);
        }
        let Some(prev) = self.last_job() else {
            return Ok(Some(0));
        };
        let from = timing.setup_key(prev)?;
        let to = timing.setup_key(job.id())?;
        timing.setup().get(self.id, from, to).map(Some)
    }

    /// Setup into `job` if it ran next here; undefined setups count as 0.
    pub fn get_setup(&self, job: &Job, timing: &Timing) -> Result<Time> {
        Ok(self.lookup_setup(job, timing)?.unwrap_or(0))
    }

    /// Processing time of `job` here, or `None` if the row is unbound.
    pub fn lookup_ptime(&self, job: &Job, timing: &Timing) -> Result<Option<Time>> {
        if !self.ptime.is_bound() {
            return Ok(None);
        }
        timing.ptime().get(self.id, job.id()).map(Some)
    }

    /// Processing time of `job` here.
    pub fn get_ptime(&self, job: &Job, timing: &Timing) -> Result<Time> {
        self.lookup_ptime(job, timing)?
            .ok_or_else(|| PmspError::UndefinedLookup {
                what: format!("processing time of job {} on machine {}", job.id(), self.id),
            })
    }

    /// Start and end of `job` if it ran next here with the given times.
    pub(crate) fn span(&self, job: &Job, setup: Time, ptime: Time) -> Result<(Time, Time)> {
        self.available
            .checked_add(setup)
            .and_then(|start| Some((start, start.checked_add(ptime)?)))
            .ok_or_else(|| PmspError::TimeOverflow {
                what: format!("completion of job {} on machine {}", job.id(), self.id),
            })
    }

    /// Commits `job` as the next job on this machine.
    ///
    /// The job starts after the sequence-dependent setup and ends after its
    /// processing time; availability advances to the job's end. Every
    /// lookup happens before any write, so on error neither the machine
    /// nor the job changes.
    pub fn process(&mut self, job: &mut Job, timing: &Timing) -> Result<Bar> {
        if job.is_complete() {
            return Err(PmspError::AlreadyScheduled { job: job.id() });
        }
        let setup = self.get_setup(job, timing)?;
        let ptime = self.get_ptime(job, timing)?;

        let (start, end) = self.span(job, setup, ptime)?;
        let bar = Bar {
            job: job.id(),
            start,
            end,
            setup,
        };

        job.commit(self.id, start, end);
        self.available = end;
        self.assigned.push(job.id());
        self.schedules.push(bar);

        debug!(machine = self.id, job = bar.job, start, end, setup, "job committed");
        Ok(bar)
    }

    /// Earliest completion among `jobs` if one of them ran next here.
    ///
    /// Returns the completion time and the job achieving it (lowest job id
    /// on ties).
    pub fn get_min_comp<'a, I>(&self, jobs: I, timing: &Timing) -> Result<Completion>
    where
        I: IntoIterator<Item = &'a Job>,
    {
        let mut best = None;
        for job in jobs {
            let setup = self.get_setup(job, timing)?;
            let ptime = self.get_ptime(job, timing)?;
            let (_, time) = self.span(job, setup, ptime)?;
            let candidate = Completion { time, id: job.id() };
            best = Completion::earliest(best, candidate);
        }
        best.ok_or_else(|| PmspError::UndefinedLookup {
            what: format!("completion on machine {}", self.id),
        })
    }
}
