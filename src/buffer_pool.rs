use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use crate::catalog::Catalog;
use crate::error::DbError;
use crate::heap_page::{HeapPage, HeapPageId, Permission};
use crate::lock_manager::{ConcurrencyControl, LockManager};
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

pub const DEFAULT_PAGES: usize = 50;

/// Governs what an eviction may touch.
///
/// `Steal` allows evicting a dirty page (writing it back first); `NoSteal`
/// refuses to evict any dirty page, returning [`DbError::AllPagesDirty`]
/// when every resident page is dirty and the pool is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    Steal,
    NoSteal,
}

struct Inner {
    pages: HashMap<HeapPageId, Arc<RwLock<HeapPage>>>,
    /// Most-recently-used pages at the back; front is the eviction
    /// candidate. Touched on every `get_page` hit or insertion.
    order: VecDeque<HeapPageId>,
}

impl Inner {
    fn touch(&mut self, pid: HeapPageId) {
        self.order.retain(|p| *p != pid);
        self.order.push_back(pid);
    }
}

/// Bounded cache of [`HeapPage`]s shared by every table, with page-level
/// locking delegated to a [`ConcurrencyControl`] implementation and
/// eviction governed by an [`EvictionPolicy`].
///
/// All resident-page bookkeeping (the map and the LRU order) is mutated
/// under one `Mutex`, so every method that reads or mutates the pool is
/// effectively serialized.
pub struct BufferPool {
    inner: Mutex<Inner>,
    catalog: Arc<Catalog>,
    capacity: usize,
    policy: EvictionPolicy,
    cc: Box<dyn ConcurrencyControl>,
}

impl BufferPool {
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self::with_cc(
            catalog,
            capacity,
            EvictionPolicy::Steal,
            Box::new(LockManager::new()),
        )
    }

    pub fn with_cc(
        catalog: Arc<Catalog>,
        capacity: usize,
        policy: EvictionPolicy,
        cc: Box<dyn ConcurrencyControl>,
    ) -> Self {
        BufferPool {
            inner: Mutex::new(Inner {
                pages: HashMap::new(),
                order: VecDeque::new(),
            }),
            catalog,
            capacity,
            policy,
            cc,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_resident_pages(&self) -> usize {
        self.inner.lock().unwrap().pages.len()
    }

    /// Whether `pid` is currently cached, without affecting its LRU
    /// position.
    pub fn is_resident(&self, pid: HeapPageId) -> bool {
        self.inner.lock().unwrap().pages.contains_key(&pid)
    }

    /// Returns the page `pid`, acquiring the lock named by `perm` first.
    /// On a cache miss, evicts a resident page first if the pool is already
    /// full, *then* reads the page from its table's backing file: eviction
    /// precedes the read, so a request that can't evict under NO STEAL
    /// fails before ever touching disk.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: HeapPageId,
        perm: Permission,
    ) -> Result<Arc<RwLock<HeapPage>>, DbError> {
        self.cc.acquire(tid, pid, perm)?;

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.pages.contains_key(&pid) {
                inner.touch(pid);
                return Ok(Arc::clone(inner.pages.get(&pid).unwrap()));
            }
            if inner.pages.len() >= self.capacity {
                self.evict_one(&mut inner)?;
            }
        }

        let table = self
            .catalog
            .get_table_from_id(pid.table_id())
            .ok_or_else(|| DbError::TableNotFound(pid.table_id().to_string()))?;
        let mut page = table.read_page(&pid)?;
        page.set_before_image();

        let mut inner = self.inner.lock().unwrap();
        if inner.pages.contains_key(&pid) {
            inner.touch(pid);
            return Ok(Arc::clone(inner.pages.get(&pid).unwrap()));
        }
        if inner.pages.len() >= self.capacity {
            self.evict_one(&mut inner)?;
        }
        let handle = Arc::new(RwLock::new(page));
        inner.pages.insert(pid, Arc::clone(&handle));
        inner.touch(pid);
        Ok(handle)
    }

    /// Evicts the least-recently-used page, obeying `self.policy`. Under
    /// `NoSteal`, skips dirty candidates; if every resident page is dirty,
    /// fails outright rather than evicting nothing.
    fn evict_one(&self, inner: &mut Inner) -> Result<(), DbError> {
        let candidates: Vec<HeapPageId> = inner.order.iter().copied().collect();
        for pid in candidates {
            let handle = match inner.pages.get(&pid) {
                Some(h) => Arc::clone(h),
                None => continue,
            };
            let dirty = handle.read().unwrap().is_dirty().is_some();
            if dirty && self.policy == EvictionPolicy::NoSteal {
                continue;
            }
            if dirty {
                let page = handle.read().unwrap();
                self.flush_page_locked(&page)?;
            }
            inner.pages.remove(&pid);
            inner.order.retain(|p| *p != pid);
            return Ok(());
        }
        Err(DbError::AllPagesDirty)
    }

    fn flush_page_locked(&self, page: &HeapPage) -> Result<(), DbError> {
        let table = self
            .catalog
            .get_table_from_id(page.id().table_id())
            .ok_or_else(|| DbError::TableNotFound(page.id().table_id().to_string()))?;
        table.write_page(page)
    }

    /// Writes a dirty page back in place, without discarding it from the
    /// pool. Flush and eviction are distinct operations.
    pub fn flush_page(&self, pid: HeapPageId) -> Result<(), DbError> {
        let inner = self.inner.lock().unwrap();
        if let Some(handle) = inner.pages.get(&pid) {
            let mut page = handle.write().unwrap();
            if page.is_dirty().is_some() {
                self.flush_page_locked(&page)?;
                page.mark_dirty(false, TransactionId::new());
                page.set_before_image();
            }
        }
        Ok(())
    }

    pub fn flush_all_pages(&self) -> Result<(), DbError> {
        let pids: Vec<HeapPageId> = {
            let inner = self.inner.lock().unwrap();
            inner.pages.keys().copied().collect()
        };
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drops a page from the pool without flushing it, discarding any
    /// unwritten changes.
    pub fn discard_page(&self, pid: HeapPageId) {
        let mut inner = self.inner.lock().unwrap();
        inner.pages.remove(&pid);
        inner.order.retain(|p| *p != pid);
    }

    pub fn insert_tuple(&self, tid: TransactionId, table_id: usize, tuple: Tuple) -> Result<(), DbError> {
        let table = self
            .catalog
            .get_table_from_id(table_id)
            .ok_or_else(|| DbError::TableNotFound(table_id.to_string()))?;
        table.add_tuple(self, tid, tuple)
    }

    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<(), DbError> {
        let rid = tuple.record_id().ok_or(DbError::TupleNotPresent)?;
        let table = self
            .catalog
            .get_table_from_id(rid.page_id().table_id())
            .ok_or_else(|| DbError::TableNotFound(rid.page_id().table_id().to_string()))?;
        table.delete_tuple(self, tid, tuple)
    }

    /// Flushes every page the transaction touched and releases its locks.
    /// There is no write-ahead log, so commit durability is "flush then
    /// forget."
    pub fn commit_transaction(&self, tid: TransactionId) -> Result<(), DbError> {
        let locked_pages = self.cc.locked_pages(tid);
        for pid in locked_pages {
            self.flush_page(pid)?;
        }
        self.cc.release_all(tid);
        Ok(())
    }

    /// Reverts every page the transaction dirtied to its before-image and
    /// releases its locks.
    pub fn abort_transaction(&self, tid: TransactionId) -> Result<(), DbError> {
        let locked_pages = self.cc.locked_pages(tid);
        let inner = self.inner.lock().unwrap();
        for pid in locked_pages {
            if let Some(handle) = inner.pages.get(&pid) {
                let mut page = handle.write().unwrap();
                if page.is_dirty().is_some() {
                    let reverted = page.get_before_image()?;
                    *page = reverted;
                    page.mark_dirty(false, tid);
                }
            }
        }
        drop(inner);
        self.cc.release_all(tid);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::heap_file::{DbFile, HeapFile};
    use crate::tuple::{Tuple, TupleDesc};
    use crate::types::Type;

    fn schema() -> TupleDesc {
        TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap()
    }

    /// Builds a fresh table backed by a tempfile already grown to
    /// `min_pages` empty pages, and a pool over it.
    fn fresh_pool(
        capacity: usize,
        policy: EvictionPolicy,
        min_pages: usize,
    ) -> (Arc<Catalog>, BufferPool, usize) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .unwrap();
        let heap_file = Arc::new(HeapFile::new(file, schema()));
        for _ in 0..min_pages {
            heap_file.extend_with_empty_page().unwrap();
        }
        let table_id = heap_file.get_id();
        let catalog = Arc::new(Catalog::new());
        catalog.add_table(heap_file, "t".to_string(), None);
        let bp = BufferPool::with_cc(
            Arc::clone(&catalog),
            capacity,
            policy,
            Box::new(LockManager::new()),
        );
        std::mem::forget(dir);
        (catalog, bp, table_id)
    }

    #[test]
    fn eviction_respects_capacity() {
        let (_catalog, bp, table_id) = fresh_pool(2, EvictionPolicy::Steal, 3);
        let tid = TransactionId::new();
        for i in 0..2 {
            let pid = HeapPageId::new(table_id, i);
            bp.get_page(tid, pid, Permission::Read).unwrap();
        }
        assert_eq!(bp.num_resident_pages(), 2);
        bp.get_page(tid, HeapPageId::new(table_id, 2), Permission::Read)
            .unwrap();
        assert_eq!(bp.num_resident_pages(), 2);
    }

    #[test]
    fn no_steal_refuses_to_evict_all_dirty_pool() {
        let (_catalog, bp, table_id) = fresh_pool(1, EvictionPolicy::NoSteal, 0);
        let tid = TransactionId::new();
        bp.insert_tuple(
            tid,
            table_id,
            Tuple::new(vec![FieldVal::Int(IntField::new(1))], schema()),
        )
        .unwrap();
        // The pool is full of one dirty page; eviction is attempted (and
        // refused) before the new page is ever read from disk, so this
        // fails even though page 5 doesn't exist on disk.
        let err = bp
            .get_page(tid, HeapPageId::new(table_id, 5), Permission::Read)
            .unwrap_err();
        assert!(matches!(err, DbError::AllPagesDirty));
    }

    #[test]
    fn steal_flushes_a_dirty_page_before_evicting_it() {
        let (catalog, bp, table_id) = fresh_pool(1, EvictionPolicy::Steal, 2);
        let tid = TransactionId::new();
        bp.insert_tuple(
            tid,
            table_id,
            Tuple::new(vec![FieldVal::Int(IntField::new(42))], schema()),
        )
        .unwrap();

        bp.get_page(tid, HeapPageId::new(table_id, 1), Permission::Read)
            .unwrap();

        let table = catalog.get_table_from_id(table_id).unwrap();
        let on_disk = table.read_page(&HeapPageId::new(table_id, 0)).unwrap();
        assert!(on_disk
            .iter()
            .any(|t| t.get_field(0).unwrap().clone().into_int().unwrap().value() == 42));
    }

    #[test]
    fn abort_reverts_dirtying_write() {
        let (_catalog, bp, table_id) = fresh_pool(10, EvictionPolicy::Steal, 0);
        let tid = TransactionId::new();
        bp.insert_tuple(
            tid,
            table_id,
            Tuple::new(vec![FieldVal::Int(IntField::new(7))], schema()),
        )
        .unwrap();
        bp.abort_transaction(tid).unwrap();
        let pid = HeapPageId::new(table_id, 0);
        let tid2 = TransactionId::new();
        let page = bp.get_page(tid2, pid, Permission::Read).unwrap();
        assert_eq!(page.read().unwrap().num_empty_slots(), page.read().unwrap().num_slots());
    }
}
