pub mod int_histogram;
pub mod string_histogram;
pub mod table_stats;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::error::DbError;
use crate::transaction::TransactionId;
use table_stats::{TableStats, DEFAULT_IO_COST_PER_PAGE};

/// Process-scoped (per-[`crate::engine::Engine`]) map from table name to
/// its [`TableStats`] snapshot.
#[derive(Default)]
pub struct StatsRegistry {
    by_table: RwLock<HashMap<String, TableStats>>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        StatsRegistry::default()
    }

    /// Builds one `TableStats` per table currently registered in
    /// `catalog`, replacing any stats previously computed for that table.
    pub fn compute_statistics(
        &self,
        catalog: &Catalog,
        bp: &BufferPool,
        tid: TransactionId,
    ) -> Result<(), DbError> {
        let mut fresh = HashMap::new();
        for table_id in catalog.table_ids() {
            let table = match catalog.get_table_from_id(table_id) {
                Some(t) => t,
                None => continue,
            };
            let name = catalog
                .get_table_name(table_id)
                .unwrap_or_else(|| table_id.to_string());
            let stats = TableStats::compute(&table, bp, tid, DEFAULT_IO_COST_PER_PAGE)?;
            fresh.insert(name, stats);
        }
        *self.by_table.write().unwrap() = fresh;
        Ok(())
    }

    /// Runs `f` against the stats computed for `table_name`, if any.
    pub fn with_stats<F, R>(&self, table_name: &str, f: F) -> R
    where
        F: FnOnce(Option<&TableStats>) -> R,
    {
        let by_table = self.by_table.read().unwrap();
        f(by_table.get(table_name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::heap_file::HeapFile;
    use crate::tuple::{Tuple, TupleDesc};
    use crate::types::Type;
    use std::sync::Arc;

    #[test]
    fn compute_statistics_builds_one_entry_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .unwrap();
        let td = TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap();
        let heap_file = Arc::new(HeapFile::new(file, td.clone()));
        let catalog = Arc::new(Catalog::new());
        catalog.add_table(heap_file.clone(), "t".to_string(), None);
        let bp = BufferPool::new(Arc::clone(&catalog), 50);
        let tid = TransactionId::new();
        for i in 0..10 {
            bp.insert_tuple(
                tid,
                heap_file.get_id(),
                Tuple::new(vec![FieldVal::Int(IntField::new(i))], td.clone()),
            )
            .unwrap();
        }

        let registry = StatsRegistry::new();
        registry.compute_statistics(&catalog, &bp, tid).unwrap();
        registry.with_stats("t", |stats| {
            assert_eq!(stats.unwrap().total_tuples(), 10);
        });
    }
}
