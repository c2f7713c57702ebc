use std::collections::{HashMap, HashSet};

use crate::{page_id::PageId, transaction_id::TransactionId};

/// For each active transaction, the set of pages it has accessed.
/// Entries are created lazily on first `get_page` and removed only at
/// `txn_complete`.
#[derive(Default)]
pub struct TxnTracker {
    touched: HashMap<TransactionId, HashSet<PageId>>,
}

impl TxnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, txn: TransactionId, page_id: PageId) {
        self.touched.entry(txn).or_insert_with(HashSet::new).insert(page_id);
    }

    /// Remove and return the transaction's touched-page set; called once
    /// by `txn_complete`.
    pub fn take(&mut self, txn: TransactionId) -> HashSet<PageId> {
        self.touched.remove(&txn).unwrap_or_default()
    }

    pub fn touched_pages(&self, txn: TransactionId) -> HashSet<PageId> {
        self.touched.get(&txn).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.touched.clear();
    }
}
