//! Job model.
//!
//! A job is a single unit of work that runs on exactly one machine. Its
//! static attributes (due date, weight, family) are fixed at construction;
//! its scheduling state is written once, by [`Machine::process`].
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2.1

use super::{Completion, Machine, Time, Timing, TimingBounds};
use crate::error::{PmspError, Result};

/// A job to be scheduled on one of the parallel machines.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: usize,
    due: Option<Time>,
    weight: f64,
    family: Option<usize>,
    priority: i32,
    complete: bool,
    start: Option<Time>,
    end: Option<Time>,
    assigned_mch: Option<usize>,
}

impl Job {
    /// Creates an unscheduled job with the given id.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            due: None,
            weight: 0.0,
            family: None,
            priority: 0,
            complete: false,
            start: None,
            end: None,
            assigned_mch: None,
        }
    }

    /// Sets the due date. [`Instance::new`](super::Instance::new) rejects negative values.
    pub fn with_due(mut self, due: Time) -> Self {
        self.due = Some(due);
        self
    }

    /// Sets the weight (negative values are clamped to 0).
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    /// Sets the family tag.
    pub fn with_family(mut self, family: usize) -> Self {
        self.family = Some(family);
        self
    }

    /// Sets the ranking hint.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn due(&self) -> Option<Time> {
        self.due
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn family(&self) -> Option<usize> {
        self.family
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the job has been committed to a machine.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn start(&self) -> Option<Time> {
        self.start
    }

    pub fn end(&self) -> Option<Time> {
        self.end
    }

    /// Machine the job was committed to.
    pub fn assigned_mch(&self) -> Option<usize> {
        self.assigned_mch
    }

    /// Lateness beyond the due date; `None` while unscheduled or undated.
    pub fn tardiness(&self) -> Option<Time> {
        match (self.end, self.due) {
            (Some(end), Some(due)) => Some((end - due).max(0)),
            _ => None,
        }
    }

    pub(crate) fn commit(&mut self, mch: usize, start: Time, end: Time) {
        self.start = Some(start);
        self.end = Some(end);
        self.assigned_mch = Some(mch);
        self.complete = true;
    }

    pub(crate) fn restore_state(
        &mut self,
        complete: bool,
        start: Option<Time>,
        end: Option<Time>,
        assigned_mch: Option<usize>,
    ) {
        self.complete = complete;
        self.start = start;
        self.end = end;
        self.assigned_mch = assigned_mch;
    }

    pub(crate) fn set_family(&mut self, family: Option<usize>) {
        self.family = family;
    }

    /// Setup time into this job across `machines`.
    ///
    /// Each machine contributes the setup from its last assigned job.
    /// Machines without a defined setup (setups disabled or setup row
    /// unbound) are left out; if every machine is left out the query
    /// fails with [`PmspError::UndefinedLookup`].
    pub fn get_setups<'a, I>(&self, machines: I, timing: &Timing) -> Result<TimingBounds>
    where
        I: IntoIterator<Item = &'a Machine>,
    {
        let mut values = Vec::new();
        for machine in machines {
            if let Some(setup) = machine.lookup_setup(self, timing)? {
                values.push(setup);
            }
        }
        TimingBounds::from_values(&values).ok_or_else(|| PmspError::UndefinedLookup {
            what: format!("setup of job {}", self.id),
        })
    }

    /// Processing time of this job across `machines`.
    pub fn get_ptimes<'a, I>(&self, machines: I, timing: &Timing) -> Result<TimingBounds>
    where
        I: IntoIterator<Item = &'a Machine>,
    {
        let mut values = Vec::new();
        for machine in machines {
            if let Some(ptime) = machine.lookup_ptime(self, timing)? {
                values.push(ptime);
            }
        }
        TimingBounds::from_values(&values).ok_or_else(|| PmspError::UndefinedLookup {
            what: format!("processing time of job {}", self.id),
        })
    }

    /// Earliest completion if this job ran next on one of `machines`.
    ///
    /// Returns the completion time and the machine achieving it (lowest
    /// machine id on ties). This is a bound, not an assignment.
    pub fn get_min_comp<'a, I>(&self, machines: I, timing: &Timing) -> Result<Completion>
    where
        I: IntoIterator<Item = &'a Machine>,
    {
        let mut best = None;
        for machine in machines {
            let Some(ptime) = machine.lookup_ptime(self, timing)? else {
                continue;
            };
            let setup = machine.get_setup(self, timing)?;
            let (_, time) = machine.span(self, setup, ptime)?;
            let candidate = Completion {
                time,
                id: machine.id(),
            };
            best = Completion::earliest(best, candidate);
        }
        best.ok_or_else(|| PmspError::UndefinedLookup {
            what: format!("completion of job {}", self.id),
        })
    }
}
