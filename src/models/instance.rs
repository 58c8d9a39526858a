//! Problem instance model.
//!
//! An instance is the aggregate root: it owns the job list, the machine
//! list and the timing matrices. Jobs and machines are stored densely with
//! `position == id`, and every cross-reference between them is an id.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Bar, Completion, Job, Machine, PtimeMatrix, SetupMatrix, Timing, TimingBounds};
use crate::error::{PmspError, Result};

/// Problem-variant flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Sequence-dependent setups apply.
    pub with_setup: bool,
    /// Setups are keyed by job family instead of job id.
    pub family_setup: bool,
    /// All machines share identical timing (a hint, not enforced).
    pub identical_mch: bool,
    /// Opaque label of the optimization criterion.
    pub objective: Option<String>,
}

impl InstanceConfig {
    pub fn with_setup(mut self, enabled: bool) -> Self {
        self.with_setup = enabled;
        self
    }

    pub fn with_family_setup(mut self, enabled: bool) -> Self {
        self.family_setup = enabled;
        self
    }

    pub fn with_identical_mch(mut self, identical: bool) -> Self {
        self.identical_mch = identical;
        self
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }
}

/// An unrelated parallel machine scheduling instance.
///
/// # Example
///
/// ```
/// use u_pmsp::models::{Instance, InstanceConfig, Job, Machine, PtimeMatrix, SetupMatrix};
///
/// let jobs = vec![Job::new(0), Job::new(1)];
/// let machines = vec![Machine::new(0)];
/// let ptime = PtimeMatrix::from_rows(vec![vec![3, 2]], 2).unwrap();
/// let setup = SetupMatrix::from_rows(vec![vec![vec![0, 1], vec![1, 0]]], 2).unwrap();
/// let mut inst = Instance::new(
///     jobs,
///     machines,
///     ptime,
///     setup,
///     InstanceConfig::default().with_setup(true),
/// )
/// .unwrap();
///
/// inst.process(0, 0).unwrap();
/// let bar = inst.process(0, 1).unwrap();
/// assert_eq!((bar.start, bar.end), (4, 6));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    timing: Timing,
}

impl Instance {
    /// Builds an instance, checking ids, matrix shapes and references.
    pub fn new(
        jobs: Vec<Job>,
        machines: Vec<Machine>,
        ptime: PtimeMatrix,
        setup: SetupMatrix,
        config: InstanceConfig,
    ) -> Result<Self> {
        let num_job = jobs.len();
        let num_mch = machines.len();

        for (position, job) in jobs.iter().enumerate() {
            if job.id() != position {
                return Err(PmspError::IdPositionMismatch {
                    entity: "job",
                    position,
                    id: job.id(),
                });
            }
        }
        for (position, machine) in machines.iter().enumerate() {
            if machine.id() != position {
                return Err(PmspError::IdPositionMismatch {
                    entity: "machine",
                    position,
                    id: machine.id(),
                });
            }
        }

        for job in &jobs {
            if let Some(due) = job.due().filter(|&d| d < 0) {
                return Err(PmspError::NegativeTime {
                    what: format!("due of job {}", job.id()),
                    value: due,
                });
            }
        }
        for machine in &machines {
            if machine.available() < 0 {
                return Err(PmspError::NegativeTime {
                    what: format!("available of machine {}", machine.id()),
                    value: machine.available(),
                });
            }
        }

        check_dim("ptime machines", num_mch, ptime.num_mch())?;
        check_dim("ptime jobs", num_job, ptime.num_job())?;
        check_dim("setup machines", num_mch, setup.num_mch())?;
        check_dim("setup jobs", num_job, setup.num_job())?;

        let mut setup_keys = Vec::with_capacity(num_job);
        for job in &jobs {
            let key = match job.family() {
                Some(family) if config.family_setup => family,
                _ => job.id(),
            };
            if key >= num_job {
                return Err(PmspError::InvalidReference {
                    what: format!("family of job {}", job.id()),
                    id: key as i64,
                });
            }
            setup_keys.push(key);
        }

        for job in &jobs {
            if let Some(mch) = job.assigned_mch() {
                if mch >= num_mch {
                    return Err(PmspError::InvalidReference {
                        what: format!("assigned machine of job {}", job.id()),
                        id: mch as i64,
                    });
                }
            }
        }
        for machine in &machines {
            for &job in machine.assigned() {
                if job >= num_job {
                    return Err(PmspError::InvalidReference {
                        what: format!("assigned jobs of machine {}", machine.id()),
                        id: job as i64,
                    });
                }
            }
        }

        Ok(Self {
            jobs,
            machines,
            timing: Timing::new(ptime, setup, config, setup_keys),
        })
    }

    /// Number of jobs.
    pub fn num_job(&self) -> usize {
        self.jobs.len()
    }

    /// Number of machines.
    pub fn num_mch(&self) -> usize {
        self.machines.len()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn config(&self) -> &InstanceConfig {
        self.timing.config()
    }

    pub fn ptime(&self) -> &PtimeMatrix {
        self.timing.ptime()
    }

    pub fn setup(&self) -> &SetupMatrix {
        self.timing.setup()
    }

    /// Looks up a job by id.
    pub fn find_job(&self, id: usize) -> Result<&Job> {
        self.jobs.get(id).ok_or_else(|| PmspError::job_not_found(id))
    }

    /// Looks up a machine by id.
    pub fn find_mch(&self, id: usize) -> Result<&Machine> {
        self.machines
            .get(id)
            .ok_or_else(|| PmspError::machine_not_found(id))
    }

    /// Jobs not yet committed to a machine, in id order.
    pub fn unscheduled_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|j| !j.is_complete())
    }

    /// Whether every job has been committed.
    pub fn is_fully_scheduled(&self) -> bool {
        self.jobs.iter().all(Job::is_complete)
    }

    fn machines_by_id(&self, ids: &[usize]) -> Result<Vec<&Machine>> {
        ids.iter().map(|&id| self.find_mch(id)).collect()
    }

    fn jobs_by_id(&self, ids: &[usize]) -> Result<Vec<&Job>> {
        ids.iter().map(|&id| self.find_job(id)).collect()
    }

    /// Commits job `job` to machine `mch`. See [`Machine::process`].
    pub fn process(&mut self, mch: usize, job: usize) -> Result<Bar> {
        let machine = self
            .machines
            .get_mut(mch)
            .ok_or_else(|| PmspError::machine_not_found(mch))?;
        let job = self
            .jobs
            .get_mut(job)
            .ok_or_else(|| PmspError::job_not_found(job))?;
        machine.process(job, &self.timing)
    }

    /// Setup bounds of `job` over the machines `mchs`.
    pub fn job_setups(&self, job: usize, mchs: &[usize]) -> Result<TimingBounds> {
        let machines = self.machines_by_id(mchs)?;
        self.find_job(job)?.get_setups(machines, &self.timing)
    }

    /// Processing-time bounds of `job` over the machines `mchs`.
    pub fn job_ptimes(&self, job: usize, mchs: &[usize]) -> Result<TimingBounds> {
        let machines = self.machines_by_id(mchs)?;
        self.find_job(job)?.get_ptimes(machines, &self.timing)
    }

    /// Earliest completion of `job` over the machines `mchs`.
    pub fn job_min_comp(&self, job: usize, mchs: &[usize]) -> Result<Completion> {
        let machines = self.machines_by_id(mchs)?;
        self.find_job(job)?.get_min_comp(machines, &self.timing)
    }

    /// Earliest completion on machine `mch` over the jobs `jobs`.
    pub fn machine_min_comp(&self, mch: usize, jobs: &[usize]) -> Result<Completion> {
        let jobs = self.jobs_by_id(jobs)?;
        self.find_mch(mch)?.get_min_comp(jobs, &self.timing)
    }

    /// Fully independent copy, matrices and scheduling state included.
    pub fn deepcopy(&self) -> Self {
        self.clone()
    }

    /// Sub-problem over the listed jobs and machines.
    ///
    /// Ids are renumbered to `0..k` in the order listed and both matrices
    /// are restricted accordingly. Static attributes carry over; scheduling
    /// state starts fresh, with each machine available where its parent
    /// machine currently is. Under family setups the families of the
    /// selected jobs are renumbered densely and become the jobs' tags.
    pub fn make_subprob(&self, job_ids: &[usize], mch_ids: &[usize]) -> Result<Self> {
        check_distinct("job ids of sub-problem", job_ids)?;
        check_distinct("machine ids of sub-problem", mch_ids)?;
        let parent_jobs = self.jobs_by_id(job_ids)?;
        let parent_machines = self.machines_by_id(mch_ids)?;
        let family_setup = self.config().family_setup;

        let mut keys: Vec<usize> = Vec::new();
        let mut jobs = Vec::with_capacity(job_ids.len());
        for (new_id, parent) in parent_jobs.iter().enumerate() {
            let mut job = Job::new(new_id)
                .with_weight(parent.weight())
                .with_priority(parent.priority());
            if let Some(due) = parent.due() {
                job = job.with_due(due);
            }
            if family_setup {
                let key = self.timing.setup_key(parent.id())?;
                let family = match keys.iter().position(|&k| k == key) {
                    Some(pos) => pos,
                    None => {
                        keys.push(key);
                        keys.len() - 1
                    }
                };
                job.set_family(Some(family));
            } else {
                job.set_family(parent.family());
            }
            jobs.push(job);
        }
        if !family_setup {
            keys = job_ids.to_vec();
        }

        let machines = parent_machines
            .iter()
            .enumerate()
            .map(|(new_id, parent)| {
                Machine::new(new_id)
                    .with_available(parent.available())
                    .with_priority(parent.priority())
                    .with_setup_row(parent.setup_row())
                    .with_ptime_row(parent.ptime_row())
            })
            .collect();

        let ptime = self.ptime().restrict(mch_ids, job_ids)?;
        let setup = self.setup().restrict(mch_ids, &keys, job_ids.len())?;

        debug!(
            jobs = job_ids.len(),
            machines = mch_ids.len(),
            "sub-problem created"
        );
        Self::new(jobs, machines, ptime, setup, self.config().clone())
    }
}

fn check_dim(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PmspError::DimensionMismatch {
            what: what.to_string(),
            expected,
            actual,
        })
    }
}

fn check_distinct(what: &str, ids: &[usize]) -> Result<()> {
    let mut seen = HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            return Err(PmspError::InvalidReference {
                what: format!("duplicate in {what}"),
                id: id as i64,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowBinding;

    fn sample_instance() -> Instance {
        let jobs = (0..3).map(Job::new).collect();
        let machines = (0..2).map(Machine::new).collect();
        let ptime = PtimeMatrix::from_rows(vec![vec![1, 2, 3], vec![2, 1, 4]], 3).unwrap();
        let setup = SetupMatrix::from_rows(
            vec![
                vec![vec![0, 1, 2], vec![1, 0, 3], vec![2, 3, 0]],
                vec![vec![0, 2, 1], vec![2, 0, 4], vec![1, 4, 0]],
            ],
            3,
        )
        .unwrap();
        Instance::new(
            jobs,
            machines,
            ptime,
            setup,
            InstanceConfig::default().with_setup(true),
        )
        .unwrap()
    }

    #[test]
    fn test_cardinalities() {
        let inst = sample_instance();
        assert_eq!(inst.num_job(), 3);
        assert_eq!(inst.num_mch(), 2);
        assert_eq!(inst.ptime().num_mch(), 2);
        assert_eq!(inst.setup().num_job(), 3);
    }

    #[test]
    fn test_id_position_enforced() {
        let err = Instance::new(
            vec![Job::new(1)],
            vec![Machine::new(0)],
            PtimeMatrix::zeros(1, 1),
            SetupMatrix::zeros(1, 1),
            InstanceConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PmspError::IdPositionMismatch { entity: "job", .. }
        ));
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let err = Instance::new(
            vec![Job::new(0), Job::new(1)],
            vec![Machine::new(0)],
            PtimeMatrix::zeros(1, 3),
            SetupMatrix::zeros(1, 2),
            InstanceConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_structural());

        let err = Instance::new(
            vec![Job::new(0)],
            vec![Machine::new(0)],
            PtimeMatrix::zeros(1, 1),
            SetupMatrix::zeros(2, 1),
            InstanceConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_negative_times_rejected() {
        for due in [-1, -5] {
            let err = Instance::new(
                vec![Job::new(0).with_due(due)],
                vec![Machine::new(0)],
                PtimeMatrix::zeros(1, 1),
                SetupMatrix::zeros(1, 1),
                InstanceConfig::default(),
            )
            .unwrap_err();
            assert!(matches!(err, PmspError::NegativeTime { value, .. } if value == due));
        }

        let err = Instance::new(
            vec![Job::new(0).with_due(0)],
            vec![Machine::new(0).with_available(-2)],
            PtimeMatrix::zeros(1, 1),
            SetupMatrix::zeros(1, 1),
            InstanceConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PmspError::NegativeTime { value: -2, .. }));
    }

    #[test]
    fn test_family_out_of_range() {
        let err = Instance::new(
            vec![Job::new(0).with_family(4)],
            vec![Machine::new(0)],
            PtimeMatrix::zeros(1, 1),
            SetupMatrix::zeros(1, 1),
            InstanceConfig::default().with_family_setup(true),
        )
        .unwrap_err();
        assert!(matches!(err, PmspError::InvalidReference { id: 4, .. }));
    }

    #[test]
    fn test_find() {
        let inst = sample_instance();
        assert_eq!(inst.find_job(2).unwrap().id(), 2);
        assert_eq!(inst.find_mch(1).unwrap().id(), 1);
        assert!(inst.find_job(3).unwrap_err().is_not_found());
        assert!(inst.find_mch(2).unwrap_err().is_not_found());
    }

    #[test]
    fn test_process_by_id() {
        let mut inst = sample_instance();
        inst.process(0, 0).unwrap();
        let bar = inst.process(0, 1).unwrap();
        assert_eq!((bar.start, bar.end), (2, 4));
        assert_eq!(inst.find_mch(0).unwrap().available(), 4);
        assert_eq!(inst.unscheduled_jobs().count(), 1);
        assert!(!inst.is_fully_scheduled());

        assert!(inst.process(5, 2).unwrap_err().is_not_found());
        assert!(inst.process(1, 9).unwrap_err().is_not_found());
        assert!(matches!(
            inst.process(1, 0),
            Err(PmspError::AlreadyScheduled { job: 0 })
        ));

        inst.process(1, 2).unwrap();
        assert!(inst.is_fully_scheduled());
    }

    #[test]
    fn test_bounds_by_id() {
        let inst = sample_instance();
        let p = inst.job_ptimes(1, &[0, 1]).unwrap();
        assert_eq!((p.min, p.max), (1, 2));

        let s = inst.job_setups(1, &[0, 1]).unwrap();
        assert_eq!((s.min, s.max), (0, 0));

        let c = inst.job_min_comp(2, &[0, 1]).unwrap();
        assert_eq!(c, Completion { time: 3, id: 0 });

        let c = inst.machine_min_comp(1, &[0, 1, 2]).unwrap();
        assert_eq!(c, Completion { time: 1, id: 1 });

        assert!(inst.job_ptimes(1, &[7]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_deepcopy_is_independent() {
        let inst = sample_instance();
        let mut copy = inst.deepcopy();
        assert_eq!(copy, inst);

        copy.process(1, 2).unwrap();
        assert_ne!(copy, inst);
        assert!(!inst.find_job(2).unwrap().is_complete());
        assert_eq!(inst.find_mch(1).unwrap().available(), 0);
        assert!(inst.find_mch(1).unwrap().assigned().is_empty());
    }

    #[test]
    fn test_make_subprob() {
        let inst = sample_instance();
        let sub = inst.make_subprob(&[1, 2], &[0]).unwrap();

        assert_eq!(sub.num_job(), 2);
        assert_eq!(sub.num_mch(), 1);
        assert_eq!(sub.ptime().to_rows(), vec![vec![2, 3]]);
        assert_eq!(sub.setup().to_rows(), vec![vec![vec![0, 3], vec![3, 0]]]);
        assert_eq!(sub.jobs()[1].id(), 1);
        assert_eq!(sub.config(), inst.config());
    }

    #[test]
    fn test_make_subprob_keeps_order_and_state_offsets() {
        let mut inst = sample_instance();
        inst.process(1, 0).unwrap();
        let sub = inst.make_subprob(&[2, 1], &[1, 0]).unwrap();

        assert_eq!(sub.ptime().to_rows(), vec![vec![4, 1], vec![3, 2]]);
        assert_eq!(sub.machines()[0].available(), 2);
        assert!(sub.machines()[0].assigned().is_empty());
        assert!(sub.jobs().iter().all(|j| !j.is_complete()));
    }

    #[test]
    fn test_make_subprob_rejects_bad_ids() {
        let inst = sample_instance();
        assert!(inst.make_subprob(&[0, 5], &[0]).unwrap_err().is_not_found());
        assert!(inst.make_subprob(&[0], &[2]).unwrap_err().is_not_found());
        assert!(matches!(
            inst.make_subprob(&[1, 1], &[0]),
            Err(PmspError::InvalidReference { id: 1, .. })
        ));
    }

    #[test]
    fn test_make_subprob_renumbers_families() {
        let jobs = vec![
            Job::new(0).with_family(2),
            Job::new(1).with_family(0),
            Job::new(2).with_family(2),
        ];
        let setup = SetupMatrix::from_rows(
            vec![vec![vec![0, 0, 5], vec![0, 0, 0], vec![7, 0, 0]]],
            3,
        )
        .unwrap();
        let inst = Instance::new(
            jobs,
            vec![Machine::new(0).with_ptime_row(RowBinding::Bound)],
            PtimeMatrix::from_rows(vec![vec![1, 1, 1]], 3).unwrap(),
            setup,
            InstanceConfig::default()
                .with_setup(true)
                .with_family_setup(true),
        )
        .unwrap();

        let sub = inst.make_subprob(&[2, 1, 0], &[0]).unwrap();
        let families: Vec<_> = sub.jobs().iter().map(|j| j.family()).collect();
        assert_eq!(families, vec![Some(0), Some(1), Some(0)]);
        // old family 2 -> new 0, old family 0 -> new 1
        assert_eq!(sub.setup().get(0, 0, 1).unwrap(), 7);
        assert_eq!(sub.setup().get(0, 1, 0).unwrap(), 5);
        assert_eq!(sub.setup().get(0, 2, 2).unwrap(), 0);
    }
}
