use std::path::Path;
use std::sync::Arc;

use crate::{
    bufferpool::{BufferPool, PageRef, RecordId},
    catalog::Catalog,
    config::StorageConfig,
    error::StorageResult,
    lock_table::{LockMode, LockTable},
    page_id::PageId,
    transaction::Transaction,
    transaction_id::TransactionId,
};

/// Wires a `Catalog`, `LockTable` and `BufferPool` together behind one
/// config. Constructed per-instance rather than as a process-wide
/// singleton, so tests can run several differently-sized buffer pools
/// side by side without interfering with one another.
pub struct Database {
    config: StorageConfig,
    catalog: Arc<Catalog>,
    lock_table: Arc<LockTable>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(config: StorageConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let lock_table = Arc::new(LockTable::new(config.deadlock_timeout));
        let buffer_pool = Arc::new(BufferPool::new(
            config.capacity,
            config.page_size,
            lock_table.clone(),
            catalog.clone(),
        ));
        Self {
            config,
            catalog,
            lock_table,
            buffer_pool,
        }
    }

    pub fn config(&self) -> StorageConfig {
        self.config
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn lock_table(&self) -> &Arc<LockTable> {
        &self.lock_table
    }

    /// Registers a heap file at `path` with a fixed tuple size and returns
    /// its stable table id.
    pub fn create_table(&self, path: impl AsRef<Path>, tuple_size: usize) -> StorageResult<i64> {
        self.catalog.create_table(path, self.config.page_size, tuple_size)
    }

    pub fn begin(&self) -> Transaction {
        Transaction::new(self.buffer_pool.clone())
    }

    pub fn get_page(&self, txn: TransactionId, page_id: PageId, mode: LockMode) -> StorageResult<PageRef> {
        self.buffer_pool.get_page(txn, page_id, mode)
    }

    pub fn insert_tuple(&self, txn: TransactionId, table_id: i64, tuple: &[u8]) -> StorageResult<RecordId> {
        self.buffer_pool.insert_tuple(txn, table_id, tuple)
    }

    pub fn delete_tuple(&self, txn: TransactionId, rid: RecordId) -> StorageResult<()> {
        self.buffer_pool.delete_tuple(txn, rid)
    }

    pub fn txn_complete(&self, txn: TransactionId, commit: bool) -> StorageResult<()> {
        self.buffer_pool.txn_complete(txn, commit)
    }

    pub fn flush_all_pages(&self) -> StorageResult<()> {
        self.buffer_pool.flush_all_pages()
    }

    /// Drops all cached pages and pending per-transaction bookkeeping
    /// without flushing. For test isolation between scenarios that reuse
    /// the same backing files.
    pub fn clear(&self) {
        self.buffer_pool.clear();
        self.lock_table.clear();
    }
}
