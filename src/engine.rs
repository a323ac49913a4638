use std::path::Path;
use std::sync::Arc;

use crate::buffer_pool::{BufferPool, EvictionPolicy, DEFAULT_PAGES};
use crate::catalog::Catalog;
use crate::error::DbError;
use crate::lock_manager::{ConcurrencyControl, LockManager};
use crate::stats::StatsRegistry;

/// Owns the catalog, buffer pool, and statistics registry for one storage
/// engine instance. Callers construct an `Engine` and thread a reference
/// through their operator trees instead of reaching for a global.
pub struct Engine {
    catalog: Arc<Catalog>,
    buffer_pool: BufferPool,
    stats: StatsRegistry,
}

impl Engine {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = BufferPool::with_cc(
            Arc::clone(&catalog),
            capacity,
            policy,
            Box::new(LockManager::new()),
        );
        Engine {
            catalog,
            buffer_pool,
            stats: StatsRegistry::new(),
        }
    }

    /// An engine with a no-op concurrency control, useful for single
    /// threaded embedding or tests that don't exercise locking.
    pub fn without_locking(capacity: usize, policy: EvictionPolicy) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = BufferPool::with_cc(
            Arc::clone(&catalog),
            capacity,
            policy,
            Box::new(crate::lock_manager::NoConcurrencyControl),
        );
        Engine {
            catalog,
            buffer_pool,
            stats: StatsRegistry::new(),
        }
    }

    pub fn with_cc(capacity: usize, policy: EvictionPolicy, cc: Box<dyn ConcurrencyControl>) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = BufferPool::with_cc(Arc::clone(&catalog), capacity, policy, cc);
        Engine {
            catalog,
            buffer_pool,
            stats: StatsRegistry::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    pub fn stats(&self) -> &StatsRegistry {
        &self.stats
    }

    pub fn load_schema_file(&self, schema_path: &Path, data_dir: &Path) -> Result<(), DbError> {
        self.catalog.load_schema_file(schema_path, data_dir)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(DEFAULT_PAGES, EvictionPolicy::Steal)
    }
}
