//! Serialized form of an instance.
//!
//! The record types mirror the JSON layout exchanged with other tools:
//! flat lists of jobs and machines, matrices as nested arrays, and every
//! cross-reference as an integer id. Unset times and references are `-1`.
//!
//! ```json
//! { "numJob": 2, "numMch": 1,
//!   "jobs": [{"ID": 0, "due": -1, "weight": 0.0, "family": null,
//!             "complete": false, "start": -1, "end": -1,
//!             "assignedMch": -1, "priority": 0}, ...],
//!   "machines": [{"ID": 0, "available": 0, "assigned": [],
//!                 "setup": [[0, 1], [1, 0]], "ptime": [3, 2],
//!                 "schedules": [], "priority": 0}],
//!   "ptime": [[3, 2]], "setup": [[[0, 1], [1, 0]]],
//!   "with_setup": true, "family_setup": false, "identical_mch": false,
//!   "objective": null }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PmspError, Result};
use crate::models::{
    Bar, Instance, InstanceConfig, Job, Machine, PtimeMatrix, RowBinding, SetupMatrix, Time,
};
use crate::validation::validate_instance;

const UNSET: i64 = -1;

/// Serialized instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(rename = "numJob")]
    pub num_job: usize,
    #[serde(rename = "numMch")]
    pub num_mch: usize,
    pub jobs: Vec<JobRecord>,
    pub machines: Vec<MachineRecord>,
    pub ptime: Vec<Vec<Time>>,
    pub setup: Vec<Vec<Vec<Time>>>,
    pub with_setup: bool,
    pub family_setup: bool,
    pub identical_mch: bool,
    pub objective: Option<String>,
}

/// Serialized job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "ID")]
    pub id: usize,
    pub due: i64,
    pub weight: f64,
    pub family: Option<usize>,
    pub complete: bool,
    pub start: i64,
    pub end: i64,
    #[serde(rename = "assignedMch")]
    pub assigned_mch: i64,
    pub priority: i32,
}

/// Serialized machine. `setup` and `ptime` are the machine's matrix rows,
/// or `null` when the row is unbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRecord {
    #[serde(rename = "ID")]
    pub id: usize,
    pub available: Time,
    pub assigned: Vec<usize>,
    pub setup: Option<Vec<Vec<Time>>>,
    pub ptime: Option<Vec<Time>>,
    pub schedules: Vec<Bar>,
    pub priority: i32,
}

fn to_wire(value: Option<i64>) -> i64 {
    value.unwrap_or(UNSET)
}

fn from_wire(what: impl FnOnce() -> String, value: i64) -> Result<Option<i64>> {
    match value {
        UNSET => Ok(None),
        v if v >= 0 => Ok(Some(v)),
        v => Err(PmspError::InvalidReference { what: what(), id: v }),
    }
}

impl JobRecord {
    fn from_job(job: &Job) -> Self {
        Self {
            id: job.id(),
            due: to_wire(job.due()),
            weight: job.weight(),
            family: job.family(),
            complete: job.is_complete(),
            start: to_wire(job.start()),
            end: to_wire(job.end()),
            assigned_mch: to_wire(job.assigned_mch().map(|m| m as i64)),
            priority: job.priority(),
        }
    }

    fn to_job(&self, num_mch: usize) -> Result<Job> {
        let id = self.id;
        let mut job = Job::new(id)
            .with_weight(self.weight)
            .with_priority(self.priority);
        if let Some(due) = from_wire(|| format!("due of job {id}"), self.due)? {
            job = job.with_due(due);
        }
        if let Some(family) = self.family {
            job = job.with_family(family);
        }
        let start = from_wire(|| format!("start of job {id}"), self.start)?;
        let end = from_wire(|| format!("end of job {id}"), self.end)?;
        let assigned_mch = from_wire(|| format!("assignedMch of job {id}"), self.assigned_mch)?
            .map(|m| m as usize);
        if let Some(mch) = assigned_mch {
            if mch >= num_mch {
                return Err(PmspError::InvalidReference {
                    what: format!("assignedMch of job {id}"),
                    id: mch as i64,
                });
            }
        }
        job.restore_state(self.complete, start, end, assigned_mch);
        Ok(job)
    }
}

impl MachineRecord {
    fn from_machine(machine: &Machine, inst: &Instance) -> Result<Self> {
        let id = machine.id();
        let setup = match machine.setup_row() {
            RowBinding::Bound => Some(inst.setup().table(id)?),
            RowBinding::Unbound => None,
        };
        let ptime = match machine.ptime_row() {
            RowBinding::Bound => Some(inst.ptime().row(id)?.to_vec()),
            RowBinding::Unbound => None,
        };
        Ok(Self {
            id,
            available: machine.available(),
            assigned: machine.assigned().to_vec(),
            setup,
            ptime,
            schedules: machine.schedules().to_vec(),
            priority: machine.priority(),
        })
    }

    fn to_machine(
        &self,
        num_job: usize,
        ptime: &PtimeMatrix,
        setup: &SetupMatrix,
    ) -> Result<Machine> {
        let id = self.id;
        for &job in self
            .assigned
            .iter()
            .chain(self.schedules.iter().map(|b| &b.job))
        {
            if job >= num_job {
                return Err(PmspError::InvalidReference {
                    what: format!("assigned jobs of machine {id}"),
                    id: job as i64,
                });
            }
        }
        if self.assigned.len() != self.schedules.len() {
            return Err(PmspError::DimensionMismatch {
                what: format!("schedules of machine {id}"),
                expected: self.assigned.len(),
                actual: self.schedules.len(),
            });
        }
        if let Some(pos) = self
            .assigned
            .iter()
            .zip(&self.schedules)
            .position(|(&job, bar)| job != bar.job)
        {
            return Err(PmspError::InvalidReference {
                what: format!("schedule bar {pos} of machine {id}"),
                id: self.schedules[pos].job as i64,
            });
        }

        let setup_row = match &self.setup {
            Some(table) => {
                if setup.table(id)? != *table {
                    return Err(PmspError::RowMismatch {
                        machine: id,
                        matrix: "setup",
                    });
                }
                RowBinding::Bound
            }
            None => RowBinding::Unbound,
        };
        let ptime_row = match &self.ptime {
            Some(row) => {
                if ptime.row(id)? != row.as_slice() {
                    return Err(PmspError::RowMismatch {
                        machine: id,
                        matrix: "ptime",
                    });
                }
                RowBinding::Bound
            }
            None => RowBinding::Unbound,
        };

        Ok(Machine::restore(
            id,
            self.available,
            self.schedules.clone(),
            setup_row,
            ptime_row,
            self.priority,
        ))
    }
}

/// Orders records by id, rejecting duplicates and ids outside `0..n`.
fn index_by_id<'a, T>(
    entity: &str,
    records: &'a [T],
    id_of: impl Fn(&T) -> usize,
) -> Result<Vec<&'a T>> {
    let n = records.len();
    let mut index: HashMap<usize, &'a T> = HashMap::with_capacity(n);
    for record in records {
        let id = id_of(record);
        if id >= n {
            return Err(PmspError::InvalidReference {
                what: format!("{entity} ID outside 0..{n}"),
                id: id as i64,
            });
        }
        if index.insert(id, record).is_some() {
            return Err(PmspError::InvalidReference {
                what: format!("duplicate {entity} ID"),
                id: id as i64,
            });
        }
    }
    Ok((0..n).filter_map(|id| index.get(&id).copied()).collect())
}

impl Instance {
    /// Exports the instance to its serialized form.
    pub fn to_record(&self) -> Result<InstanceRecord> {
        let config = self.config();
        Ok(InstanceRecord {
            num_job: self.num_job(),
            num_mch: self.num_mch(),
            jobs: self.jobs().iter().map(JobRecord::from_job).collect(),
            machines: self
                .machines()
                .iter()
                .map(|m| MachineRecord::from_machine(m, self))
                .collect::<Result<_>>()?,
            ptime: self.ptime().to_rows(),
            setup: self.setup().to_rows(),
            with_setup: config.with_setup,
            family_setup: config.family_setup,
            identical_mch: config.identical_mch,
            objective: config.objective.clone(),
        })
    }

    /// Rebuilds an instance and rejects inconsistent scheduling state.
    ///
    /// Advisory issues such as machines flagged identical with differing
    /// timings are logged and accepted.
    pub fn from_record(record: &InstanceRecord) -> Result<Self> {
        let inst = Self::from_record_lenient(record)?;
        let Err(errors) = validate_instance(&inst) else {
            return Ok(inst);
        };
        let (advisory, fatal): (Vec<_>, Vec<_>) =
            errors.into_iter().partition(|e| e.kind.is_advisory());
        for e in &advisory {
            warn!(issue = %e.message, "accepting instance despite advisory issue");
        }
        if fatal.is_empty() {
            return Ok(inst);
        }
        let summary = fatal
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(PmspError::InconsistentState(summary))
    }

    /// Rebuilds an instance, checking structure only.
    ///
    /// Ids are resolved through an id index, so record order does not
    /// matter. Scheduling state is taken as recorded.
    pub fn from_record_lenient(record: &InstanceRecord) -> Result<Self> {
        if record.jobs.len() != record.num_job {
            return Err(PmspError::DimensionMismatch {
                what: "jobs".into(),
                expected: record.num_job,
                actual: record.jobs.len(),
            });
        }
        if record.machines.len() != record.num_mch {
            return Err(PmspError::DimensionMismatch {
                what: "machines".into(),
                expected: record.num_mch,
                actual: record.machines.len(),
            });
        }

        let ptime = PtimeMatrix::from_rows(record.ptime.clone(), record.num_job)?;
        let setup = SetupMatrix::from_rows(record.setup.clone(), record.num_job)?;
        if ptime.num_mch() != record.num_mch || setup.num_mch() != record.num_mch {
            return Err(PmspError::DimensionMismatch {
                what: "matrix machine rows".into(),
                expected: record.num_mch,
                actual: if ptime.num_mch() != record.num_mch {
                    ptime.num_mch()
                } else {
                    setup.num_mch()
                },
            });
        }

        let jobs = index_by_id("job", &record.jobs, |j| j.id)?
            .into_iter()
            .map(|j| j.to_job(record.num_mch))
            .collect::<Result<Vec<_>>>()?;
        let machines = index_by_id("machine", &record.machines, |m| m.id)?
            .into_iter()
            .map(|m| m.to_machine(record.num_job, &ptime, &setup))
            .collect::<Result<Vec<_>>>()?;

        let config = InstanceConfig {
            with_setup: record.with_setup,
            family_setup: record.family_setup,
            identical_mch: record.identical_mch,
            objective: record.objective.clone(),
        };

        let inst = Self::new(jobs, machines, ptime, setup, config)?;
        debug!(
            num_job = inst.num_job(),
            num_mch = inst.num_mch(),
            "instance decoded"
        );
        Ok(inst)
    }

    /// Serializes to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record()?)?)
    }

    /// Serializes to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record()?)?)
    }

    /// Parses JSON and rebuilds the instance with [`Instance::from_record`].
    pub fn from_json(json: &str) -> Result<Self> {
        let record: InstanceRecord = serde_json::from_str(json).map_err(|e| {
            warn!(error = %e, "instance json rejected");
            e
        })?;
        Self::from_record(&record)
    }
}
