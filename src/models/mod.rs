//! Scheduling domain models.
//!
//! Data model of the unrelated parallel machine problem with
//! sequence-dependent setup times (`Rm | s_ijk | ·`): every job runs once
//! on one machine, and both processing and setup times depend on the
//! machine.
//!
//! # Ownership
//!
//! | Type | Owns | Refers to |
//! |------|------|-----------|
//! | Instance | jobs, machines, matrices | — |
//! | Machine | its timeline (`Bar`s) | jobs, by id |
//! | Job | its scheduling state | its machine, by id |
//! | Timing | nothing outside the instance | matrix rows, by machine id |

mod instance;
mod job;
mod machine;
mod matrix;
mod timing;

pub use instance::{Instance, InstanceConfig};
pub use job::Job;
pub use machine::{Bar, Machine, RowBinding};
pub use matrix::{PtimeMatrix, SetupMatrix, Time};
pub use timing::{Completion, Timing, TimingBounds};
