use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::error::DbError;
use crate::heap_file::DbFile;
use crate::heap_page::{HeapPageId, Permission};
use crate::operators::OpIterator;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

/// Leaf operator: scans every page of one table in page, then slot,
/// order, through the buffer pool. Field names in the emitted schema are
/// prefixed `"alias."`.
pub struct SeqScan<'a> {
    bp: &'a BufferPool,
    table: Arc<dyn DbFile>,
    tid: TransactionId,
    td: TupleDesc,
    current_page: usize,
    buffered: Vec<Tuple>,
    buffered_index: usize,
    opened: bool,
}

impl<'a> SeqScan<'a> {
    pub fn new(bp: &'a BufferPool, table: Arc<dyn DbFile>, alias: &str, tid: TransactionId) -> Self {
        let td = table.get_tuple_desc().with_alias_prefix(alias);
        SeqScan {
            bp,
            table,
            tid,
            td,
            current_page: 0,
            buffered: Vec::new(),
            buffered_index: 0,
            opened: false,
        }
    }

    fn load_next_page(&mut self) -> Result<bool, DbError> {
        if self.current_page >= self.table.num_pages() {
            return Ok(false);
        }
        let pid = HeapPageId::new(self.table.get_id(), self.current_page);
        self.current_page += 1;
        let page = self.bp.get_page(self.tid, pid, Permission::Read)?;
        let page = page.read().unwrap();
        self.buffered = page.iter().cloned().collect();
        self.buffered_index = 0;
        Ok(true)
    }
}

impl<'a> OpIterator for SeqScan<'a> {
    fn open(&mut self) -> Result<(), DbError> {
        self.opened = true;
        self.current_page = 0;
        self.buffered.clear();
        self.buffered_index = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn rewind(&mut self) -> Result<(), DbError> {
        self.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>, DbError> {
        if !self.opened {
            return Err(DbError::NotOpen);
        }
        loop {
            if self.buffered_index < self.buffered.len() {
                let src = &self.buffered[self.buffered_index];
                self.buffered_index += 1;
                let mut t = Tuple::new(src.fields().to_vec(), self.td.clone());
                if let Some(rid) = src.record_id() {
                    t.set_record_id(rid);
                }
                return Ok(Some(t));
            }
            if !self.load_next_page()? {
                return Ok(None);
            }
        }
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fields::{FieldVal, IntField};
    use crate::heap_file::HeapFile;
    use crate::tuple::TupleDesc;
    use crate::types::Type;

    fn schema() -> TupleDesc {
        TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap()
    }

    #[test]
    fn scans_all_inserted_tuples_with_aliased_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .unwrap();
        let heap_file = Arc::new(HeapFile::new(file, schema()));
        let table_id = heap_file.get_id();
        let catalog = Arc::new(Catalog::new());
        catalog.add_table(heap_file, "t".to_string(), None);
        let bp = BufferPool::new(Arc::clone(&catalog), 10);
        let tid = TransactionId::new();
        for i in 0..5 {
            bp.insert_tuple(tid, table_id, Tuple::new(vec![FieldVal::Int(IntField::new(i))], schema()))
                .unwrap();
        }

        let table = catalog.get_table_from_id(table_id).unwrap();
        let mut scan = SeqScan::new(&bp, table, "t", tid);
        assert_eq!(scan.tuple_desc().field_name(0), Some("t.a"));
        scan.open().unwrap();
        let mut count = 0;
        while scan.next().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
    }
}
