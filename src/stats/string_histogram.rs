use crate::error::DbError;
use crate::predicate::Op;
use crate::stats::int_histogram::IntHistogram;

const MIN_HASH: i32 = 0;
const MAX_HASH: i32 = 1 << 20;

/// Delegates to an [`IntHistogram`] over a fixed hash of each string. Only
/// `EQUALS`/`NOT_EQUALS`/`LIKE` (aliased to `EQUALS`) are meaningful;
/// ordering comparisons degrade to selectivity `1`, since a hash carries
/// no ordering information about the original strings.
#[derive(Debug, Clone)]
pub struct StringHistogram {
    inner: IntHistogram,
}

impl StringHistogram {
    pub fn new(num_buckets: usize) -> Self {
        StringHistogram {
            inner: IntHistogram::new(num_buckets, MIN_HASH, MAX_HASH),
        }
    }

    fn hash(value: &str) -> i32 {
        let mut acc: i64 = 0;
        for (i, byte) in value.as_bytes().iter().enumerate().take(16) {
            acc = acc.wrapping_add((*byte as i64 + 1) * (i as i64 + 1));
        }
        (acc.rem_euclid((MAX_HASH - MIN_HASH + 1) as i64) as i32) + MIN_HASH
    }

    pub fn add_value(&mut self, value: &str) -> Result<(), DbError> {
        self.inner.add_value(Self::hash(value))
    }

    pub fn estimate_selectivity(&self, op: Op, value: &str) -> f64 {
        match op {
            Op::Equals | Op::Like | Op::NotEquals => {
                self.inner.estimate_selectivity(op, Self::hash(value))
            }
            _ => 1.0,
        }
    }

    pub fn avg_selectivity(&self) -> f64 {
        self.inner.avg_selectivity()
    }
}
