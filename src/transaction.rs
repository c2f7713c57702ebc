use std::sync::Arc;

use crate::{bufferpool::BufferPool, error::StorageResult, transaction_id::TransactionId};

/// A thin handle wrapping a `TransactionId` and the `BufferPool` it runs
/// against, so callers don't have to remember the commit-vs-abort
/// argument convention of `BufferPool::txn_complete`.
pub struct Transaction {
    id: TransactionId,
    buffer_pool: Arc<BufferPool>,
}

impl Transaction {
    pub(crate) fn new(buffer_pool: Arc<BufferPool>) -> Self {
        Self {
            id: TransactionId::new(),
            buffer_pool,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn commit(self) -> StorageResult<()> {
        self.buffer_pool.txn_complete(self.id, true)
    }

    pub fn abort(self) -> StorageResult<()> {
        self.buffer_pool.txn_complete(self.id, false)
    }
}
