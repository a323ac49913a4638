use crate::buffer_pool::BufferPool;
use crate::error::DbError;
use crate::fields::FieldVal;
use crate::heap_file::DbFile;
use crate::operators::seq_scan::SeqScan;
use crate::operators::OpIterator;
use crate::predicate::Op;
use crate::stats::int_histogram::IntHistogram;
use crate::stats::string_histogram::StringHistogram;
use crate::transaction::TransactionId;
use crate::types::Type;
use std::sync::Arc;

/// Default number of buckets per histogram.
pub const N_BINS: usize = 100;
pub const DEFAULT_IO_COST_PER_PAGE: f64 = 1000.0;

enum Histogram {
    Int(IntHistogram),
    Str(StringHistogram),
}

/// Per-table selectivity/cardinality estimates, built by two passes over
/// the table's current contents. A `TableStats` is a snapshot: it does
/// not track subsequent mutation.
pub struct TableStats {
    page_count: usize,
    tuple_count: i64,
    io_cost_per_page: f64,
    histograms: Vec<Histogram>,
}

impl TableStats {
    pub fn compute(
        table: &Arc<dyn DbFile>,
        bp: &BufferPool,
        tid: TransactionId,
        io_cost_per_page: f64,
    ) -> Result<Self, DbError> {
        let td = table.get_tuple_desc().clone();
        let num_fields = td.num_fields();

        let mut int_bounds: Vec<Option<(i32, i32)>> = vec![None; num_fields];
        let mut tuple_count = 0i64;

        {
            let mut scan = SeqScan::new(bp, Arc::clone(table), "t", tid);
            scan.open()?;
            while let Some(t) = scan.next()? {
                for i in 0..num_fields {
                    if let Some(FieldVal::Int(f)) = t.get_field(i) {
                        let v = f.value();
                        int_bounds[i] = Some(match int_bounds[i] {
                            Some((min, max)) => (min.min(v), max.max(v)),
                            None => (v, v),
                        });
                    }
                }
                tuple_count += 1;
            }
            scan.close();
        }

        let mut histograms = Vec::with_capacity(num_fields);
        for i in 0..num_fields {
            histograms.push(match td.field_type(i).unwrap() {
                Type::Int => {
                    let (min, max) = int_bounds[i].unwrap_or((0, 0));
                    Histogram::Int(IntHistogram::new(N_BINS, min, max))
                }
                Type::Str(_) => Histogram::Str(StringHistogram::new(N_BINS)),
            });
        }

        {
            let mut scan = SeqScan::new(bp, Arc::clone(table), "t", tid);
            scan.open()?;
            while let Some(t) = scan.next()? {
                for i in 0..num_fields {
                    match (t.get_field(i).unwrap(), &mut histograms[i]) {
                        (FieldVal::Int(f), Histogram::Int(h)) => {
                            h.add_value(f.value())?;
                        }
                        (FieldVal::Str(f), Histogram::Str(h)) => {
                            h.add_value(f.value())?;
                        }
                        _ => {}
                    }
                }
            }
            scan.close();
        }

        Ok(TableStats {
            page_count: table.num_pages(),
            tuple_count,
            io_cost_per_page,
            histograms,
        })
    }

    pub fn estimate_scan_cost(&self) -> f64 {
        self.page_count as f64 * self.io_cost_per_page
    }

    pub fn estimate_table_cardinality(&self, selectivity: f64) -> i64 {
        (self.tuple_count as f64 * selectivity).floor() as i64
    }

    pub fn total_tuples(&self) -> i64 {
        self.tuple_count
    }

    pub fn estimate_selectivity(&self, field: usize, op: Op, value: &FieldVal) -> f64 {
        match (self.histograms.get(field), value) {
            (Some(Histogram::Int(h)), FieldVal::Int(f)) => h.estimate_selectivity(op, f.value()),
            (Some(Histogram::Str(h)), FieldVal::Str(f)) => h.estimate_selectivity(op, f.value()),
            _ => 1.0,
        }
    }

    pub fn avg_selectivity(&self, field: usize) -> f64 {
        match self.histograms.get(field) {
            Some(Histogram::Int(h)) => h.avg_selectivity(),
            Some(Histogram::Str(h)) => h.avg_selectivity(),
            None => 1.0,
        }
    }
}
