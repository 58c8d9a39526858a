//! Unrelated parallel machine scheduling with sequence-dependent setups.
//!
//! Provides the data model on which dispatching rules, local search or
//! exact methods operate: jobs, machines, processing-time and setup-time
//! matrices, timing bounds, and sequential commitment of jobs to machines.
//! Deciding the assignment order is left to the caller.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Job`, `Machine`, `Instance`, `Bar`,
//!   `PtimeMatrix`, `SetupMatrix`, `Timing`
//! - **`codec`**: Flat, id-referenced serialized form (JSON)
//! - **`validation`**: Consistency checks of scheduling state
//! - **`kpi`**: Makespan, tardiness and utilization of committed jobs
//! - **`generator`**: Seeded random benchmark instances
//!
//! # Example
//!
//! ```
//! use u_pmsp::models::{Instance, InstanceConfig, Job, Machine, PtimeMatrix, SetupMatrix};
//!
//! let jobs = (0..3).map(Job::new).collect();
//! let machines = (0..2).map(Machine::new).collect();
//! let ptime = PtimeMatrix::from_rows(vec![vec![1, 2, 3], vec![2, 1, 4]], 3).unwrap();
//! let setup = SetupMatrix::zeros(2, 3);
//! let mut inst = Instance::new(jobs, machines, ptime, setup, InstanceConfig::default()).unwrap();
//!
//! // Greedy: commit each job where it completes earliest.
//! for job in 0..inst.num_job() {
//!     let best = inst.job_min_comp(job, &[0, 1]).unwrap();
//!     inst.process(best.id, job).unwrap();
//! }
//! assert!(inst.is_fully_scheduled());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Allahverdi et al. (2008), "A survey of scheduling problems with setup
//!   times or costs"

pub mod codec;
pub mod error;
pub mod generator;
pub mod kpi;
pub mod models;
pub mod validation;

pub use error::{PmspError, Result};
