//! Random instance generation.
//!
//! Produces reproducible benchmark instances from a [`GeneratorConfig`]:
//! uniform processing and setup times, zero setup between a job (or
//! family) and itself, optional job families, and due dates spread over
//! the expected per-machine load.
//!
//! # Usage
//!
//! ```
//! use u_pmsp::generator::{generate, GeneratorConfig};
//!
//! let config = GeneratorConfig {
//!     num_job: 8,
//!     num_mch: 2,
//!     ..GeneratorConfig::default()
//! };
//! let inst = generate(&config).unwrap();
//! assert_eq!(inst.num_job(), 8);
//! assert_eq!(inst.setup().num_job(), 8);
//! ```
//!
//! # Reference
//! Vallada & Ruiz (2011), "A genetic algorithm for the unrelated parallel
//! machine scheduling problem with sequence dependent setup times"

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PmspError, Result};
use crate::models::{Instance, InstanceConfig, Job, Machine, PtimeMatrix, SetupMatrix, Time};

/// Settings for [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_job: usize,
    pub num_mch: usize,
    /// Inclusive processing-time range.
    pub ptime_min: Time,
    pub ptime_max: Time,
    /// Inclusive setup-time range for distinct predecessor/successor.
    pub setup_min: Time,
    pub setup_max: Time,
    pub with_setup: bool,
    /// Number of job families; enables family-keyed setups.
    pub num_families: Option<usize>,
    /// Give every machine the timings of machine 0.
    pub identical_mch: bool,
    /// Due-date tightness; 0 leaves jobs without due dates.
    pub due_slack: f64,
    pub objective: Option<String>,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_job: 10,
            num_mch: 3,
            ptime_min: 1,
            ptime_max: 99,
            setup_min: 1,
            setup_max: 24,
            with_setup: true,
            num_families: None,
            identical_mch: false,
            due_slack: 1.0,
            objective: None,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    fn check(&self) -> Result<()> {
        if self.num_mch == 0 {
            return Err(PmspError::InvalidConfig("num_mch must be at least 1".into()));
        }
        for (what, lo, hi) in [
            ("ptime", self.ptime_min, self.ptime_max),
            ("setup", self.setup_min, self.setup_max),
        ] {
            if lo < 0 {
                return Err(PmspError::NegativeTime {
                    what: format!("{what}_min"),
                    value: lo,
                });
            }
            if lo > hi {
                return Err(PmspError::InvalidConfig(format!(
                    "{what} range {lo}..={hi} is empty"
                )));
            }
        }
        if let Some(k) = self.num_families {
            if k == 0 || k > self.num_job {
                return Err(PmspError::InvalidConfig(format!(
                    "num_families must be within 1..={}, got {k}",
                    self.num_job
                )));
            }
        }
        if !self.due_slack.is_finite() || self.due_slack < 0.0 {
            return Err(PmspError::InvalidConfig(format!(
                "due_slack must be a nonnegative number, got {}",
                self.due_slack
            )));
        }
        Ok(())
    }
}

/// Generates a random instance with no job scheduled.
pub fn generate(config: &GeneratorConfig) -> Result<Instance> {
    config.check()?;
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let n = config.num_job;
    let m = config.num_mch;

    let mut ptime = PtimeMatrix::zeros(m, n);
    let mut setup = SetupMatrix::zeros(m, n);
    for mch in 0..m {
        for job in 0..n {
            let value = if config.identical_mch && mch > 0 {
                ptime.get(0, job)?
            } else {
                rng.random_range(config.ptime_min..=config.ptime_max)
            };
            ptime.set(mch, job, value)?;
        }
        if !config.with_setup {
            continue;
        }
        for from in 0..n {
            for to in 0..n {
                if from == to {
                    continue;
                }
                let value = if config.identical_mch && mch > 0 {
                    setup.get(0, from, to)?
                } else {
                    rng.random_range(config.setup_min..=config.setup_max)
                };
                setup.set(mch, from, to, value)?;
            }
        }
    }

    let total_mean: f64 = (0..n)
        .map(|job| mean_ptime(&ptime, job))
        .collect::<Result<Vec<_>>>()?
        .iter()
        .sum();
    let horizon = total_mean / m as f64;

    let mut jobs = Vec::with_capacity(n);
    for id in 0..n {
        let mut job = Job::new(id).with_weight(rng.random_range(1..=10) as f64);
        if let Some(k) = config.num_families {
            job = job.with_family(rng.random_range(0..k));
        }
        if config.due_slack > 0.0 {
            let slack = rng.random::<f64>() * horizon * config.due_slack;
            job = job.with_due((mean_ptime(&ptime, id)? + slack).round() as Time);
        }
        jobs.push(job);
    }
    let machines = (0..m).map(Machine::new).collect();

    let instance_config = InstanceConfig {
        with_setup: config.with_setup,
        family_setup: config.num_families.is_some(),
        identical_mch: config.identical_mch,
        objective: config.objective.clone(),
    };

    debug!(num_job = n, num_mch = m, seed = config.seed, "instance generated");
    Instance::new(jobs, machines, ptime, setup, instance_config)
}

fn mean_ptime(ptime: &PtimeMatrix, job: usize) -> Result<f64> {
    let mut sum = 0;
    for mch in 0..ptime.num_mch() {
        sum += ptime.get(mch, job)?;
    }
    Ok(sum as f64 / ptime.num_mch() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_instance;

    #[test]
    fn test_generate_shapes() {
        let config = GeneratorConfig {
            num_job: 6,
            num_mch: 3,
            ..GeneratorConfig::default()
        };
        let inst = generate(&config).unwrap();
        assert_eq!(inst.num_job(), 6);
        assert_eq!(inst.num_mch(), 3);
        assert_eq!(inst.ptime().num_mch(), 3);
        assert_eq!(inst.setup().num_job(), 6);
        assert!(inst.config().with_setup);
        assert!(validate_instance(&inst).is_ok());
    }

    #[test]
    fn test_generate_ranges() {
        let config = GeneratorConfig {
            ptime_min: 5,
            ptime_max: 9,
            setup_min: 2,
            setup_max: 3,
            ..GeneratorConfig::default()
        };
        let inst = generate(&config).unwrap();
        for row in inst.ptime().to_rows() {
            assert!(row.iter().all(|&p| (5..=9).contains(&p)));
        }
        for (m, table) in inst.setup().to_rows().iter().enumerate() {
            for (i, row) in table.iter().enumerate() {
                for (j, &s) in row.iter().enumerate() {
                    if i == j {
                        assert_eq!(s, 0, "diagonal of machine {m}");
                    } else {
                        assert!((2..=3).contains(&s));
                    }
                }
            }
        }
        assert!(inst.jobs().iter().all(|j| j.due().is_some()));
        assert!(inst.jobs().iter().all(|j| j.weight() >= 1.0));
    }

    #[test]
    fn test_generate_is_reproducible() {
        let config = GeneratorConfig::default();
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_identical_machines() {
        let config = GeneratorConfig {
            identical_mch: true,
            ..GeneratorConfig::default()
        };
        let inst = generate(&config).unwrap();
        let rows = inst.ptime().to_rows();
        assert!(rows.iter().all(|r| *r == rows[0]));
        assert!(validate_instance(&inst).is_ok());
    }

    #[test]
    fn test_generate_families() {
        let config = GeneratorConfig {
            num_job: 12,
            num_families: Some(3),
            ..GeneratorConfig::default()
        };
        let inst = generate(&config).unwrap();
        assert!(inst.config().family_setup);
        assert!(inst
            .jobs()
            .iter()
            .all(|j| matches!(j.family(), Some(f) if f < 3)));
    }

    #[test]
    fn test_generate_without_setups_or_dues() {
        let config = GeneratorConfig {
            with_setup: false,
            due_slack: 0.0,
            ..GeneratorConfig::default()
        };
        let inst = generate(&config).unwrap();
        assert!(inst.setup().to_rows().iter().flatten().flatten().all(|&s| s == 0));
        assert!(inst.jobs().iter().all(|j| j.due().is_none()));
    }

    #[test]
    fn test_invalid_config() {
        let bad = [
            GeneratorConfig {
                num_mch: 0,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                ptime_min: 10,
                ptime_max: 1,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                num_families: Some(0),
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                due_slack: -1.0,
                ..GeneratorConfig::default()
            },
        ];
        for config in &bad {
            assert!(matches!(generate(config), Err(PmspError::InvalidConfig(_))));
        }
        let negative = GeneratorConfig {
            setup_min: -1,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            generate(&negative),
            Err(PmspError::NegativeTime { .. })
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"num_job": 4, "seed": 7}"#).unwrap();
        assert_eq!(config.num_job, 4);
        assert_eq!(config.seed, 7);
        assert_eq!(config.num_mch, GeneratorConfig::default().num_mch);
    }
}
