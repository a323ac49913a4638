use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::DbError;
use crate::heap_page::{HeapPageId, Permission};
use crate::transaction::TransactionId;

/// The concurrency-control hook [`crate::buffer_pool::BufferPool::get_page`]
/// consults before returning a page.
///
/// An implementation without locking (e.g. [`NoConcurrencyControl`]) simply
/// grants every request immediately.
pub trait ConcurrencyControl: Send + Sync {
    /// Acquires the lock for `(tid, pid, perm)`, blocking or aborting per
    /// the implementation's policy.
    fn acquire(&self, tid: TransactionId, pid: HeapPageId, perm: Permission) -> Result<(), DbError>;

    /// Releases every lock held by `tid`.
    fn release_all(&self, tid: TransactionId);

    /// The permission `tid` currently holds on `pid`, if any.
    fn holds(&self, tid: TransactionId, pid: HeapPageId) -> Option<Permission>;

    /// Every page `tid` currently holds a lock on.
    fn locked_pages(&self, tid: TransactionId) -> HashSet<HeapPageId>;
}

/// Grants every lock request immediately. Used when a caller has no need
/// for transaction isolation and simply wants the page returned.
#[derive(Default)]
pub struct NoConcurrencyControl;

impl ConcurrencyControl for NoConcurrencyControl {
    fn acquire(&self, _tid: TransactionId, _pid: HeapPageId, _perm: Permission) -> Result<(), DbError> {
        Ok(())
    }

    fn release_all(&self, _tid: TransactionId) {}

    fn holds(&self, _tid: TransactionId, _pid: HeapPageId) -> Option<Permission> {
        None
    }

    fn locked_pages(&self, _tid: TransactionId) -> HashSet<HeapPageId> {
        HashSet::new()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
struct Lock {
    tid: TransactionId,
    pid: HeapPageId,
    exclusive: bool,
}

/// A page-level lock manager implementing WAIT-DIE deadlock avoidance:
/// when an older transaction holds a conflicting lock, the requester waits;
/// when a younger one does, the requester aborts rather than risk a cycle.
pub struct LockManager {
    page_to_locks: RwLock<HashMap<HeapPageId, HashSet<Lock>>>,
    transaction_to_locks: RwLock<HashMap<TransactionId, HashSet<Lock>>>,
    wait_retry: std::time::Duration,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager {
    pub fn new() -> Self {
        LockManager {
            page_to_locks: RwLock::new(HashMap::new()),
            transaction_to_locks: RwLock::new(HashMap::new()),
            wait_retry: std::time::Duration::from_millis(50),
        }
    }

    fn upgrade_lock(&self, tid: TransactionId, pid: HeapPageId) {
        let mut page_to_locks = self.page_to_locks.write().unwrap();
        let mut transaction_to_locks = self.transaction_to_locks.write().unwrap();
        let old_lock = Lock {
            tid,
            pid,
            exclusive: false,
        };
        let new_lock = Lock {
            tid,
            pid,
            exclusive: true,
        };
        page_to_locks.get_mut(&pid).unwrap().remove(&old_lock);
        page_to_locks.get_mut(&pid).unwrap().insert(new_lock);
        transaction_to_locks
            .get_mut(&tid)
            .unwrap()
            .remove(&old_lock);
        transaction_to_locks.get_mut(&tid).unwrap().insert(new_lock);
    }
}

impl ConcurrencyControl for LockManager {
    fn acquire(&self, tid: TransactionId, pid: HeapPageId, perm: Permission) -> Result<(), DbError> {
        let exclusive = perm == Permission::Write;

        {
            let transaction_locks = self.transaction_to_locks.read().unwrap();
            if let Some(locks) = transaction_locks.get(&tid) {
                if locks
                    .iter()
                    .any(|lock| lock.pid == pid && (lock.exclusive == exclusive || !exclusive))
                {
                    return Ok(());
                }
            }
        }

        loop {
            {
                let mut page_to_locks = self.page_to_locks.write().unwrap();
                let mut transaction_to_locks = self.transaction_to_locks.write().unwrap();

                if let Some(locks) = page_to_locks.get(&pid) {
                    if locks.len() == 1 && locks.iter().next().unwrap().tid == tid {
                        if exclusive {
                            drop(page_to_locks);
                            drop(transaction_to_locks);
                            self.upgrade_lock(tid, pid);
                        }
                        return Ok(());
                    }

                    let conflict = (exclusive && !locks.is_empty())
                        || locks.iter().any(|lock| lock.exclusive);

                    if conflict {
                        let abort = locks.iter().any(|lock| lock.tid < tid);
                        drop(page_to_locks);
                        drop(transaction_to_locks);
                        if abort {
                            return Err(DbError::TransactionAborted { tid });
                        }
                        std::thread::sleep(self.wait_retry);
                        continue;
                    }
                }

                let page_locks = page_to_locks.entry(pid).or_default();
                let transaction_locks = transaction_to_locks.entry(tid).or_default();
                let lock = Lock {
                    tid,
                    pid,
                    exclusive,
                };
                page_locks.insert(lock);
                transaction_locks.insert(lock);
                return Ok(());
            }
        }
    }

    fn release_all(&self, tid: TransactionId) {
        let mut page_to_locks = self.page_to_locks.write().unwrap();
        let mut transaction_to_locks = self.transaction_to_locks.write().unwrap();
        if let Some(held) = transaction_to_locks.remove(&tid) {
            for lock in held {
                if let Some(page_locks) = page_to_locks.get_mut(&lock.pid) {
                    page_locks.remove(&lock);
                    if page_locks.is_empty() {
                        page_to_locks.remove(&lock.pid);
                    }
                }
            }
        }
    }

    fn holds(&self, tid: TransactionId, pid: HeapPageId) -> Option<Permission> {
        let transaction_locks = self.transaction_to_locks.read().unwrap();
        transaction_locks.get(&tid).and_then(|locks| {
            locks.iter().find(|lock| lock.pid == pid).map(|lock| {
                if lock.exclusive {
                    Permission::Write
                } else {
                    Permission::Read
                }
            })
        })
    }

    fn locked_pages(&self, tid: TransactionId) -> HashSet<HeapPageId> {
        let transaction_locks = self.transaction_to_locks.read().unwrap();
        transaction_locks
            .get(&tid)
            .map(|locks| locks.iter().map(|lock| lock.pid).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_locks_are_shared() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.acquire(t1, pid, Permission::Read).unwrap();
        lm.acquire(t2, pid, Permission::Read).unwrap();
        assert_eq!(lm.holds(t1, pid), Some(Permission::Read));
        assert_eq!(lm.holds(t2, pid), Some(Permission::Read));
    }

    #[test]
    fn younger_writer_aborts_against_older_holder() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let older = TransactionId::new();
        let younger = TransactionId::new();
        lm.acquire(older, pid, Permission::Write).unwrap();
        let err = lm.acquire(younger, pid, Permission::Write).unwrap_err();
        assert!(matches!(err, DbError::TransactionAborted { .. }));
    }

    #[test]
    fn release_all_frees_the_page() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        lm.acquire(t1, pid, Permission::Write).unwrap();
        lm.release_all(t1);
        assert_eq!(lm.holds(t1, pid), None);
        let t2 = TransactionId::new();
        assert!(lm.acquire(t2, pid, Permission::Write).is_ok());
    }
}
