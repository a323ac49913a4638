use std::fs::File;
use std::io::{Read as IoRead, Seek, SeekFrom, Write as IoWrite};
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::buffer_pool::BufferPool;
use crate::config;
use crate::error::DbError;
use crate::heap_page::{HeapPage, HeapPageId, Permission};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

/// Storage backing for one table: a dense array of fixed-size pages kept
/// in one OS file. Implementations other than [`HeapFile`] are conceivable
/// (a sorted file, for instance) but none ship here.
pub trait DbFile: Send + Sync {
    fn get_id(&self) -> usize;
    fn get_tuple_desc(&self) -> &TupleDesc;
    fn num_pages(&self) -> usize;
    fn read_page(&self, pid: &HeapPageId) -> Result<HeapPage, DbError>;
    fn write_page(&self, page: &HeapPage) -> Result<(), DbError>;
    /// Appends one all-zero page to the end of the file, growing
    /// `num_pages()` by one.
    fn extend_with_empty_page(&self) -> Result<(), DbError>;
}

pub struct HeapFile {
    file: Mutex<File>,
    td: TupleDesc,
    id: usize,
}

impl HeapFile {
    pub fn new(file: File, td: TupleDesc) -> Self {
        HeapFile {
            file: Mutex::new(file),
            td,
            id: Uuid::new_v4().as_u128() as usize,
        }
    }

    /// Appends `tuple` to the first existing page with a free slot,
    /// requesting WRITE permission through `bp` for each candidate. If none
    /// has room, writes a fresh empty page directly to disk at index
    /// `numPages` and fetches that one instead.
    pub fn add_tuple(&self, bp: &BufferPool, tid: TransactionId, tuple: Tuple) -> Result<(), DbError> {
        let table_id = self.get_id();
        let num_pages = self.num_pages();
        for page_no in 0..num_pages {
            let pid = HeapPageId::new(table_id, page_no);
            let page = bp.get_page(tid, pid, Permission::Write)?;
            let mut guard = page.write().unwrap();
            if guard.num_empty_slots() > 0 {
                guard.insert_tuple(tuple)?;
                guard.mark_dirty(true, tid);
                return Ok(());
            }
        }

        DbFile::extend_with_empty_page(self)?;
        let pid = HeapPageId::new(table_id, num_pages);
        let page = bp.get_page(tid, pid, Permission::Write)?;
        let mut guard = page.write().unwrap();
        guard.insert_tuple(tuple)?;
        guard.mark_dirty(true, tid);
        Ok(())
    }

    /// Clears `tuple`'s slot on the page named by its [`crate::tuple::RecordId`].
    pub fn delete_tuple(&self, bp: &BufferPool, tid: TransactionId, tuple: &Tuple) -> Result<(), DbError> {
        let rid = tuple.record_id().ok_or(DbError::TupleNotPresent)?;
        let page = bp.get_page(tid, rid.page_id(), Permission::Write)?;
        let mut page = page.write().unwrap();
        page.delete_tuple(tuple)?;
        page.mark_dirty(true, tid);
        Ok(())
    }

    /// Iterates every tuple of the file, page by page, fetching each page
    /// through `bp` under `Permission::Read`.
    pub fn iter<'a>(&'a self, bp: &'a BufferPool, tid: TransactionId) -> HeapFileIterator<'a> {
        HeapFileIterator {
            heap_file: self,
            bp,
            tid,
            current_page_index: 0,
            buffered: Vec::new(),
            buffered_index: 0,
            error: None,
        }
    }
}

impl DbFile for HeapFile {
    fn get_id(&self) -> usize {
        self.id
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    fn num_pages(&self) -> usize {
        let file = self.file.lock().unwrap();
        let len = file.metadata().map(|m| m.len()).unwrap_or(0);
        let page_size = config::page_size() as u64;
        ((len + page_size - 1) / page_size) as usize
    }

    /// Reads exactly one page's worth of bytes at `pid`'s offset. Reading
    /// past the end of the file is a fatal error, not a silent extension.
    /// Only [`HeapFile::add_tuple`]'s explicit growth step is permitted to
    /// lengthen the file.
    fn read_page(&self, pid: &HeapPageId) -> Result<HeapPage, DbError> {
        let page_size = config::page_size();
        let mut data = vec![0u8; page_size];
        let mut file = self.file.lock().unwrap();
        let num_pages = {
            let len = file.metadata()?.len();
            ((len + page_size as u64 - 1) / page_size as u64) as usize
        };
        let page_no = pid.page_number();
        if page_no >= num_pages {
            return Err(DbError::PageOutOfRange { page_no, num_pages });
        }
        file.seek(SeekFrom::Start((page_no * page_size) as u64))?;
        file.read_exact(&mut data)?;
        HeapPage::new(*pid, data, self.td.clone())
    }

    fn write_page(&self, page: &HeapPage) -> Result<(), DbError> {
        let page_size = config::page_size();
        let pid = page.id();
        let data = page.get_page_data();
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((pid.page_number() * page_size) as u64))?;
        file.write_all(&data)?;
        Ok(())
    }

    /// Appends one all-zero page directly to the backing file, at index
    /// `numPages`.
    fn extend_with_empty_page(&self) -> Result<(), DbError> {
        let page_size = config::page_size();
        let mut file = self.file.lock().unwrap();
        let len = file.metadata()?.len();
        file.seek(SeekFrom::Start(len))?;
        file.write_all(&vec![0u8; page_size])?;
        Ok(())
    }
}

/// Iterates a table's tuples in page, then slot, order. Fetches one page
/// at a time through the buffer pool, buffering that page's occupied
/// tuples before advancing.
pub struct HeapFileIterator<'a> {
    heap_file: &'a HeapFile,
    bp: &'a BufferPool,
    tid: TransactionId,
    current_page_index: usize,
    buffered: Vec<Tuple>,
    buffered_index: usize,
    error: Option<DbError>,
}

impl<'a> HeapFileIterator<'a> {
    fn load_next_page(&mut self) -> bool {
        if self.current_page_index >= self.heap_file.num_pages() {
            return false;
        }
        let pid = HeapPageId::new(self.heap_file.get_id(), self.current_page_index);
        self.current_page_index += 1;
        match self.bp.get_page(self.tid, pid, Permission::Read) {
            Ok(page) => {
                let page = page.read().unwrap();
                self.buffered = page.iter().cloned().collect();
                self.buffered_index = 0;
                true
            }
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }

    pub fn take_error(&mut self) -> Option<DbError> {
        self.error.take()
    }
}

impl<'a> Iterator for HeapFileIterator<'a> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.buffered_index < self.buffered.len() {
                let t = self.buffered[self.buffered_index].clone();
                self.buffered_index += 1;
                return Some(t);
            }
            if self.error.is_some() {
                return None;
            }
            if !self.load_next_page() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer_pool::BufferPool;
    use crate::catalog::Catalog;
    use crate::fields::{FieldVal, IntField};
    use crate::types::Type;

    fn schema() -> TupleDesc {
        TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap()
    }

    #[test]
    fn add_and_iterate_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .unwrap();
        let heap_file = Arc::new(HeapFile::new(file, schema()));
        let catalog = Arc::new(Catalog::new());
        catalog.add_table(heap_file.clone(), "t".to_string(), None);
        let bp = BufferPool::new(catalog, 10);
        let tid = TransactionId::new();

        for i in 0..10 {
            heap_file
                .add_tuple(&bp, tid, Tuple::new(vec![FieldVal::Int(IntField::new(i))], schema()))
                .unwrap();
        }

        let values: Vec<i32> = heap_file
            .iter(&bp, tid)
            .map(|t| t.get_field(0).unwrap().clone().into_int().unwrap().value())
            .collect();
        assert_eq!(values, (0..10).collect::<Vec<_>>());
    }
}
