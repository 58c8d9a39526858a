//! Processing-time and setup-time matrices.
//!
//! Both matrices are stored densely in a flat `Vec` and indexed by
//! machine id and job id. Because ids coincide with positions inside an
//! [`Instance`](super::Instance), a cell lookup is a bounds check plus
//! one multiplication.
//!
//! # Reference
//! Allahverdi et al. (2008), "A survey of scheduling problems with
//! setup times or costs"

use crate::error::{PmspError, Result};

/// Time unit shared by availability, processing and setup values.
pub type Time = i64;

/// Processing times `ptime[machine][job]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PtimeMatrix {
    num_mch: usize,
    num_job: usize,
    data: Vec<Time>,
}

impl PtimeMatrix {
    /// Creates an all-zero matrix of shape `[num_mch][num_job]`.
    pub fn zeros(num_mch: usize, num_job: usize) -> Self {
        Self {
            num_mch,
            num_job,
            data: vec![0; num_mch * num_job],
        }
    }

    /// Builds a matrix from nested rows, one per machine.
    ///
    /// `num_job` is passed explicitly so that an instance without machines
    /// still records its job dimension.
    pub fn from_rows(rows: Vec<Vec<Time>>, num_job: usize) -> Result<Self> {
        let num_mch = rows.len();
        let mut data = Vec::with_capacity(num_mch * num_job);
        for (m, row) in rows.into_iter().enumerate() {
            if row.len() != num_job {
                return Err(PmspError::DimensionMismatch {
                    what: format!("ptime row of machine {m}"),
                    expected: num_job,
                    actual: row.len(),
                });
            }
            for (j, value) in row.into_iter().enumerate() {
                if value < 0 {
                    return Err(PmspError::NegativeTime {
                        what: format!("ptime[{m}][{j}]"),
                        value,
                    });
                }
                data.push(value);
            }
        }
        Ok(Self {
            num_mch,
            num_job,
            data,
        })
    }

    /// Number of machine rows.
    pub fn num_mch(&self) -> usize {
        self.num_mch
    }

    /// Number of job columns.
    pub fn num_job(&self) -> usize {
        self.num_job
    }

    /// Processing time of `job` on `mch`.
    pub fn get(&self, mch: usize, job: usize) -> Result<Time> {
        check_index("machine", mch, self.num_mch)?;
        check_index("job", job, self.num_job)?;
        Ok(self.data[mch * self.num_job + job])
    }

    /// Sets the processing time of `job` on `mch`.
    pub fn set(&mut self, mch: usize, job: usize, value: Time) -> Result<()> {
        check_index("machine", mch, self.num_mch)?;
        check_index("job", job, self.num_job)?;
        if value < 0 {
            return Err(PmspError::NegativeTime {
                what: format!("ptime[{mch}][{job}]"),
                value,
            });
        }
        self.data[mch * self.num_job + job] = value;
        Ok(())
    }

    /// Row of machine `mch`.
    pub fn row(&self, mch: usize) -> Result<&[Time]> {
        check_index("machine", mch, self.num_mch)?;
        let start = mch * self.num_job;
        Ok(&self.data[start..start + self.num_job])
    }

    /// Nested copy, one `Vec` per machine.
    pub fn to_rows(&self) -> Vec<Vec<Time>> {
        (0..self.num_mch)
            .map(|m| self.data[m * self.num_job..(m + 1) * self.num_job].to_vec())
            .collect()
    }

    /// Restriction to the given machines and jobs, reindexed densely in
    /// the order the ids are listed.
    pub fn restrict(&self, mchs: &[usize], jobs: &[usize]) -> Result<Self> {
        let mut out = Self::zeros(mchs.len(), jobs.len());
        for (nm, &om) in mchs.iter().enumerate() {
            for (nj, &oj) in jobs.iter().enumerate() {
                out.data[nm * out.num_job + nj] = self.get(om, oj)?;
            }
        }
        Ok(out)
    }
}

/// Sequence-dependent setup times `setup[machine][from][to]`.
///
/// `from` and `to` are setup keys: job ids, or family tags when the
/// owning instance keys setups by family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetupMatrix {
    num_mch: usize,
    num_job: usize,
    data: Vec<Time>,
}

impl SetupMatrix {
    /// Creates an all-zero matrix of shape `[num_mch][num_job][num_job]`.
    pub fn zeros(num_mch: usize, num_job: usize) -> Self {
        Self {
            num_mch,
            num_job,
            data: vec![0; num_mch * num_job * num_job],
        }
    }

    /// Builds a matrix from nested rows, one square table per machine.
    pub fn from_rows(rows: Vec<Vec<Vec<Time>>>, num_job: usize) -> Result<Self> {
        let num_mch = rows.len();
        let mut data = Vec::with_capacity(num_mch * num_job * num_job);
        for (m, table) in rows.into_iter().enumerate() {
            if table.len() != num_job {
                return Err(PmspError::DimensionMismatch {
                    what: format!("setup table of machine {m}"),
                    expected: num_job,
                    actual: table.len(),
                });
            }
            for (i, row) in table.into_iter().enumerate() {
                if row.len() != num_job {
                    return Err(PmspError::DimensionMismatch {
                        what: format!("setup row {i} of machine {m}"),
                        expected: num_job,
                        actual: row.len(),
                    });
                }
                for (j, value) in row.into_iter().enumerate() {
                    if value < 0 {
                        return Err(PmspError::NegativeTime {
                            what: format!("setup[{m}][{i}][{j}]"),
                            value,
                        });
                    }
                    data.push(value);
                }
            }
        }
        Ok(Self {
            num_mch,
            num_job,
            data,
        })
    }

    /// Number of machine tables.
    pub fn num_mch(&self) -> usize {
        self.num_mch
    }

    /// Side length of each machine table.
    pub fn num_job(&self) -> usize {
        self.num_job
    }

    #[inline]
    fn offset(&self, mch: usize, from: usize, to: usize) -> usize {
        (mch * self.num_job + from) * self.num_job + to
    }

    /// Setup time on `mch` when `to` follows `from`.
    pub fn get(&self, mch: usize, from: usize, to: usize) -> Result<Time> {
        check_index("machine", mch, self.num_mch)?;
        check_index("setup key", from, self.num_job)?;
        check_index("setup key", to, self.num_job)?;
        Ok(self.data[self.offset(mch, from, to)])
    }

    /// Sets the setup time on `mch` when `to` follows `from`.
    pub fn set(&mut self, mch: usize, from: usize, to: usize, value: Time) -> Result<()> {
        check_index("machine", mch, self.num_mch)?;
        check_index("setup key", from, self.num_job)?;
        check_index("setup key", to, self.num_job)?;
        if value < 0 {
            return Err(PmspError::NegativeTime {
                what: format!("setup[{mch}][{from}][{to}]"),
                value,
            });
        }
        let idx = self.offset(mch, from, to);
        self.data[idx] = value;
        Ok(())
    }

    /// Nested copy of the table of machine `mch`.
    pub fn table(&self, mch: usize) -> Result<Vec<Vec<Time>>> {
        check_index("machine", mch, self.num_mch)?;
        Ok((0..self.num_job)
            .map(|i| {
                let start = self.offset(mch, i, 0);
                self.data[start..start + self.num_job].to_vec()
            })
            .collect())
    }

    /// Nested copy of every machine table.
    pub fn to_rows(&self) -> Vec<Vec<Vec<Time>>> {
        (0..self.num_mch)
            .map(|m| {
                (0..self.num_job)
                    .map(|i| {
                        let start = self.offset(m, i, 0);
                        self.data[start..start + self.num_job].to_vec()
                    })
                    .collect()
            })
            .collect()
    }

    /// Restriction to the given machines and setup keys.
    ///
    /// The result has side `num_job`; keys are renumbered densely in the
    /// order listed and any cell beyond `keys.len()` is zero.
    pub fn restrict(&self, mchs: &[usize], keys: &[usize], num_job: usize) -> Result<Self> {
        if keys.len() > num_job {
            return Err(PmspError::DimensionMismatch {
                what: "setup keys of sub-problem".into(),
                expected: num_job,
                actual: keys.len(),
            });
        }
        let mut out = Self::zeros(mchs.len(), num_job);
        for (nm, &om) in mchs.iter().enumerate() {
            for (a, &from) in keys.iter().enumerate() {
                for (b, &to) in keys.iter().enumerate() {
                    let idx = out.offset(nm, a, b);
                    out.data[idx] = self.get(om, from, to)?;
                }
            }
        }
        Ok(out)
    }
}

fn check_index(what: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(PmspError::IndexOutOfRange { what, index, len })
    }
}
