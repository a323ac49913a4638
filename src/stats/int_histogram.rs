use crate::error::DbError;
use crate::predicate::Op;

/// Equi-width histogram over an inclusive integer range, used to estimate
/// selectivity without scanning the table.
#[derive(Debug, Clone)]
pub struct IntHistogram {
    min: i32,
    max: i32,
    bucket_width: i64,
    buckets: Vec<i64>,
    total: i64,
}

impl IntHistogram {
    /// `num_buckets` is the desired bucket count `B`; the effective count
    /// is `b = min(B, max - min + 1)`.
    pub fn new(num_buckets: usize, min: i32, max: i32) -> Self {
        let range = (max as i64 - min as i64 + 1).max(1);
        let b = (num_buckets as i64).min(range).max(1) as usize;
        let width = ((range as f64) / (b as f64)).ceil() as i64;
        IntHistogram {
            min,
            max,
            bucket_width: width.max(1),
            buckets: vec![0; b],
            total: 0,
        }
    }

    fn bucket_index(&self, v: i32) -> usize {
        (((v as i64 - self.min as i64) / self.bucket_width) as usize).min(self.buckets.len() - 1)
    }

    /// The inclusive bounds of bucket `i`.
    fn bucket_bounds(&self, i: usize) -> (i64, i64) {
        let left = self.min as i64 + i as i64 * self.bucket_width;
        let right = (self.max as i64).min(self.min as i64 + (i as i64 + 1) * self.bucket_width - 1);
        (left, right)
    }

    pub fn add_value(&mut self, v: i32) -> Result<(), DbError> {
        if v < self.min || v > self.max {
            return Err(DbError::SchemaMismatch(format!(
                "value {} outside histogram bounds [{}, {}]",
                v, self.min, self.max
            )));
        }
        let idx = self.bucket_index(v);
        self.buckets[idx] += 1;
        self.total += 1;
        Ok(())
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    /// Estimates the fraction of rows satisfying `field OP v`.
    pub fn estimate_selectivity(&self, op: Op, v: i32) -> f64 {
        if self.total == 0 {
            return if op == Op::NotEquals { 1.0 } else { 0.0 };
        }

        if (v as i64) < self.min as i64 {
            return match op {
                Op::Equals | Op::Like | Op::LessThan | Op::LessThanOrEq => 0.0,
                Op::GreaterThan | Op::GreaterThanOrEq | Op::NotEquals => 1.0,
            };
        }
        if (v as i64) > self.max as i64 {
            return match op {
                Op::Equals | Op::Like | Op::GreaterThan | Op::GreaterThanOrEq => 0.0,
                Op::LessThan | Op::LessThanOrEq | Op::NotEquals => 1.0,
            };
        }

        let n = self.total as f64;
        let i = self.bucket_index(v);
        let (left, _right) = self.bucket_bounds(i);
        let w_i = self.actual_width(i) as f64;
        let b_i = self.buckets[i] as f64;
        let h_i = b_i / n;

        match op {
            Op::Equals | Op::Like => b_i / w_i / n,
            Op::NotEquals => 1.0 - (b_i / w_i / n),
            Op::LessThan => {
                let within = ((v as i64 - left) as f64 / w_i) * h_i;
                let below: i64 = self.buckets[..i].iter().sum();
                within + (below as f64 / n)
            }
            Op::LessThanOrEq => {
                let within = ((v as i64 - left + 1) as f64 / w_i) * h_i;
                let below: i64 = self.buckets[..i].iter().sum();
                within + (below as f64 / n)
            }
            Op::GreaterThan => {
                let (_, right) = self.bucket_bounds(i);
                let within = ((right - v as i64) as f64 / w_i) * h_i;
                let above: i64 = self.buckets[i + 1..].iter().sum();
                within + (above as f64 / n)
            }
            Op::GreaterThanOrEq => {
                let (_, right) = self.bucket_bounds(i);
                let within = ((right - v as i64 + 1) as f64 / w_i) * h_i;
                let above: i64 = self.buckets[i + 1..].iter().sum();
                within + (above as f64 / n)
            }
        }
    }

    fn actual_width(&self, i: usize) -> i64 {
        let (left, right) = self.bucket_bounds(i);
        right - left + 1
    }

    /// Mean per-distinct-value selectivity across all buckets: divides by
    /// `n` inside the sum, then by `b`.
    pub fn avg_selectivity(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let n = self.total as f64;
        let sum: f64 = (0..self.buckets.len())
            .map(|i| {
                let w_i = self.actual_width(i) as f64;
                (self.buckets[i] as f64 / w_i) / n
            })
            .sum();
        sum / self.buckets.len() as f64
    }
}
