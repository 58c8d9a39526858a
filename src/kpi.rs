//! Schedule quality metrics (KPIs).
//!
//! Computes standard performance indicators from the committed state of
//! an instance. Only completed jobs are counted, so the metrics describe
//! a partial schedule just as well as a full one.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Total Tardiness | Sum of max(0, C_j - d_j) |
//! | Maximum Tardiness | Largest single delay |
//! | Total Weighted Tardiness | Sum of w_j * max(0, C_j - d_j) |
//! | Total Weighted Completion | Sum of w_j * C_j |
//! | On-Time Rate | Fraction meeting due dates |
//! | Total Setup | Sum of setup time over all bars |
//! | Avg Utilization | Mean machine busyness |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use crate::models::{Instance, Time};

/// Schedule performance indicators.
#[derive(Debug, Clone)]
pub struct ScheduleKpi {
    /// Latest completion time.
    pub makespan: Time,
    /// Sum of tardiness across completed jobs.
    pub total_tardiness: Time,
    /// Maximum tardiness of any single job.
    pub max_tardiness: Time,
    /// Weighted sum of tardiness.
    pub total_weighted_tardiness: f64,
    /// Weighted sum of completion times.
    pub total_weighted_completion: f64,
    /// Fraction of completed jobs meeting their due date (0.0..1.0).
    pub on_time_rate: f64,
    /// Setup time spent across all machines.
    pub total_setup: Time,
    /// Busy time over makespan, indexed by machine id.
    pub utilization_by_machine: Vec<f64>,
    /// Mean of `utilization_by_machine`.
    pub avg_utilization: f64,
    /// Number of completed jobs.
    pub completed: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from the committed state of `inst`.
    pub fn calculate(inst: &Instance) -> Self {
        let mut total_tardiness: Time = 0;
        let mut max_tardiness: Time = 0;
        let mut weighted_tardiness = 0.0;
        let mut weighted_completion = 0.0;
        let mut on_time_count: usize = 0;
        let mut completed: usize = 0;

        for job in inst.jobs().iter().filter(|j| j.is_complete()) {
            let Some(end) = job.end() else {
                continue;
            };
            completed += 1;
            weighted_completion += job.weight() * end as f64;

            match job.tardiness() {
                Some(tardiness) if tardiness > 0 => {
                    total_tardiness += tardiness;
                    max_tardiness = max_tardiness.max(tardiness);
                    weighted_tardiness += job.weight() * tardiness as f64;
                }
                // No due date → considered on-time
                _ => on_time_count += 1,
            }
        }

        let makespan = inst
            .machines()
            .iter()
            .filter_map(|m| m.schedules().last().map(|b| b.end))
            .max()
            .unwrap_or(0);

        let total_setup = inst
            .machines()
            .iter()
            .flat_map(|m| m.schedules())
            .map(|b| b.setup)
            .sum::<Time>();

        let utilization_by_machine: Vec<f64> = if makespan <= 0 {
            vec![0.0; inst.num_mch()]
        } else {
            inst.machines()
                .iter()
                .map(|m| m.busy_time() as f64 / makespan as f64)
                .collect()
        };
        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.iter().sum::<f64>() / utilization_by_machine.len() as f64
        };

        let on_time_rate = if completed == 0 {
            1.0
        } else {
            on_time_count as f64 / completed as f64
        };

        Self {
            makespan,
            total_tardiness,
            max_tardiness,
            total_weighted_tardiness: weighted_tardiness,
            total_weighted_completion: weighted_completion,
            on_time_rate,
            total_setup,
            utilization_by_machine,
            avg_utilization,
            completed,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_tardiness: Time, min_utilization: f64) -> bool {
        self.max_tardiness <= max_tardiness && self.avg_utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstanceConfig, Job, Machine, PtimeMatrix, SetupMatrix};

    fn make_instance(jobs: Vec<Job>) -> Instance {
        let n = jobs.len();
        let ptime = PtimeMatrix::from_rows(vec![vec![2; n], vec![4; n]], n).unwrap();
        let mut setup = SetupMatrix::zeros(2, n);
        for m in 0..2 {
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        setup.set(m, i, j, 1).unwrap();
                    }
                }
            }
        }
        Instance::new(
            jobs,
            vec![Machine::new(0), Machine::new(1)],
            ptime,
            setup,
            InstanceConfig::default().with_setup(true),
        )
        .unwrap()
    }

    #[test]
    fn test_kpi_basic() {
        let mut inst = make_instance(vec![
            Job::new(0).with_due(10).with_weight(1.0),
            Job::new(1).with_due(10).with_weight(2.0),
        ]);
        inst.process(0, 0).unwrap(); // [0, 2]
        inst.process(0, 1).unwrap(); // setup 1 → [3, 5]

        let kpi = ScheduleKpi::calculate(&inst);
        assert_eq!(kpi.makespan, 5);
        assert_eq!(kpi.total_tardiness, 0);
        assert_eq!(kpi.total_setup, 1);
        assert_eq!(kpi.completed, 2);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert!((kpi.total_weighted_completion - 12.0).abs() < 1e-10); // 1*2 + 2*5
    }

    #[test]
    fn test_kpi_tardiness() {
        let mut inst = make_instance(vec![
            Job::new(0).with_due(1).with_weight(3.0), // ends 2 → tardy 1
            Job::new(1).with_due(20),
            Job::new(2).with_due(2).with_weight(0.5), // ends 4 on m1 → tardy 2
        ]);
        inst.process(0, 0).unwrap();
        inst.process(0, 1).unwrap();
        inst.process(1, 2).unwrap();

        let kpi = ScheduleKpi::calculate(&inst);
        assert_eq!(kpi.total_tardiness, 3);
        assert_eq!(kpi.max_tardiness, 2);
        assert!((kpi.total_weighted_tardiness - 4.0).abs() < 1e-10);
        assert!((kpi.on_time_rate - 1.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_utilization() {
        let mut inst = make_instance(vec![Job::new(0), Job::new(1)]);
        inst.process(1, 0).unwrap(); // m1: [0, 4]
        inst.process(0, 1).unwrap(); // m0: [0, 2]

        let kpi = ScheduleKpi::calculate(&inst);
        assert_eq!(kpi.makespan, 4);
        assert!((kpi.utilization_by_machine[0] - 0.5).abs() < 1e-10);
        assert!((kpi.utilization_by_machine[1] - 1.0).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_partial_schedule() {
        let mut inst = make_instance(vec![Job::new(0).with_due(0), Job::new(1).with_due(0)]);
        inst.process(0, 1).unwrap();

        let kpi = ScheduleKpi::calculate(&inst);
        assert_eq!(kpi.completed, 1);
        assert_eq!(kpi.total_tardiness, 2);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = ScheduleKpi::calculate(&make_instance(vec![Job::new(0)]));
        assert_eq!(kpi.makespan, 0);
        assert_eq!(kpi.total_tardiness, 0);
        assert_eq!(kpi.completed, 0);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.0).abs() < 1e-10);
        assert_eq!(kpi.utilization_by_machine, vec![0.0, 0.0]);
    }

    #[test]
    fn test_meets_thresholds() {
        let mut inst = make_instance(vec![Job::new(0).with_due(1)]);
        inst.process(0, 0).unwrap(); // tardy by 1

        let kpi = ScheduleKpi::calculate(&inst);
        assert!(kpi.meets_thresholds(1, 0.0));
        assert!(!kpi.meets_thresholds(0, 0.0));
        assert!(!kpi.meets_thresholds(5, 1.5));
    }
}
