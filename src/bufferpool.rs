use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, RwLock},
};

use log::{debug, info};

use crate::{
    catalog::Catalog,
    error::{StorageError, StorageResult},
    lock_table::{LockMode, LockTable},
    page::Page,
    page_id::PageId,
    transaction_id::TransactionId,
    txn_tracker::TxnTracker,
};

pub type PageRef = Arc<RwLock<Page>>;

/// A record's location: the page it lives on and its slot within that
/// page's slotted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

struct PoolState {
    entries: HashMap<PageId, PageRef>,
    // front = least recently used, back = most recently used.
    order: VecDeque<PageId>,
}

impl PoolState {
    fn touch(&mut self, page_id: PageId) {
        if let Some(pos) = self.order.iter().position(|p| *p == page_id) {
            self.order.remove(pos);
        }
        self.order.push_back(page_id);
    }

    fn insert(&mut self, page_id: PageId, page: PageRef) {
        self.entries.insert(page_id, page);
        self.touch(page_id);
    }

    fn remove(&mut self, page_id: PageId) {
        self.entries.remove(&page_id);
        if let Some(pos) = self.order.iter().position(|p| *p == page_id) {
            self.order.remove(pos);
        }
    }
}

/// Bounded page cache: loads pages from the backing `Catalog`'s page
/// stores, coordinates access through the `LockTable`, and evicts under
/// strict NO-STEAL — a dirty page is never chosen for eviction, and if
/// every resident page is dirty, the call fails rather than stealing one.
pub struct BufferPool {
    capacity: usize,
    page_size: usize,
    pool: Mutex<PoolState>,
    lock_table: Arc<LockTable>,
    catalog: Arc<Catalog>,
    txn_tracker: Mutex<TxnTracker>,
}

impl BufferPool {
    pub fn new(
        capacity: usize,
        page_size: usize,
        lock_table: Arc<LockTable>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            capacity,
            page_size,
            pool: Mutex::new(PoolState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            lock_table,
            catalog,
            txn_tracker: Mutex::new(TxnTracker::new()),
        }
    }

    pub fn clear(&self) {
        let mut pool = self.pool.lock().unwrap();
        pool.entries.clear();
        pool.order.clear();
        self.txn_tracker.lock().unwrap().clear();
    }

    /// Acquires the lock (may block up to the deadlock timeout, may
    /// abort), records the page under `txn`, and returns the cached page,
    /// loading from the catalog's page store (evicting if full) on a
    /// miss.
    pub fn get_page(
        &self,
        txn: TransactionId,
        page_id: PageId,
        mode: LockMode,
    ) -> StorageResult<PageRef> {
        self.lock_table.acquire(txn, page_id, mode)?;
        self.txn_tracker.lock().unwrap().record(txn, page_id);

        let mut pool = self.pool.lock().unwrap();
        if let Some(page) = pool.entries.get(&page_id) {
            let page = page.clone();
            pool.touch(page_id);
            debug!("get_page hit: {}", page_id);
            return Ok(page);
        }

        if pool.entries.len() >= self.capacity {
            self.evict_one(&mut pool)?;
        }

        let data = self
            .catalog
            .with_store(page_id.table_id, |store| store.read_page(page_id.page_number))
            .ok_or_else(|| StorageError::logic(format!("no table registered for {}", page_id)))??;
        debug!("get_page miss, loaded from store: {}", page_id);
        let page_ref: PageRef = Arc::new(RwLock::new(data));
        pool.insert(page_id, page_ref.clone());
        Ok(page_ref)
    }

    /// Scans from the LRU end toward MRU for the first non-dirty page and
    /// evicts it. Fails with `Logic` if every resident page is dirty —
    /// the strict NO-STEAL discipline never flushes an uncommitted page
    /// to make room.
    fn evict_one(&self, pool: &mut PoolState) -> StorageResult<()> {
        let candidate = pool
            .order
            .iter()
            .find(|pid| {
                let page = pool.entries.get(pid).expect("order/entries out of sync");
                page.read().unwrap().dirty_by().is_none()
            })
            .copied();

        match candidate {
            Some(pid) => {
                debug!("evicting clean page {}", pid);
                pool.remove(pid);
                Ok(())
            }
            None => Err(StorageError::logic("no clean page to evict")),
        }
    }

    pub fn unsafe_release(&self, txn: TransactionId, page_id: PageId) {
        self.lock_table.release(txn, page_id);
    }

    pub fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.lock_table.holds(txn, page_id)
    }

    /// Writes a page's bytes via the catalog's page store if resident and
    /// dirty, clears its dirty marker, and resets its before-image. A
    /// no-op for pages not in the pool, or pages that are resident but
    /// clean (repeated calls are therefore idempotent, R2).
    pub fn flush_page(&self, page_id: PageId) -> StorageResult<()> {
        let page_ref = {
            let pool = self.pool.lock().unwrap();
            match pool.entries.get(&page_id) {
                Some(p) => p.clone(),
                None => return Ok(()),
            }
        };

        let mut page = page_ref.write().unwrap();
        if page.dirty_by().is_none() {
            return Ok(());
        }
        let data = page.data().to_vec();
        self.catalog
            .with_store(page_id.table_id, |store| store.write_page(page_id.page_number, &data))
            .ok_or_else(|| StorageError::logic(format!("no table registered for {}", page_id)))??;
        page.mark_flushed();
        debug!("flushed page {}", page_id);
        Ok(())
    }

    pub fn flush_all_pages(&self) -> StorageResult<()> {
        let page_ids: Vec<PageId> = self.pool.lock().unwrap().entries.keys().copied().collect();
        for page_id in page_ids {
            self.flush_page(page_id)?;
        }
        Ok(())
    }

    /// Removes the page from cache without flushing.
    pub fn discard_page(&self, page_id: PageId) {
        self.pool.lock().unwrap().remove(page_id);
    }

    /// Finds a page with a free slot for `table_id` (scanning existing
    /// pages, then extending the file by one), writes `tuple` into it
    /// under an exclusive lock, and marks the page dirty.
    pub fn insert_tuple(
        &self,
        txn: TransactionId,
        table_id: i64,
        tuple: &[u8],
    ) -> StorageResult<RecordId> {
        let layout = self
            .catalog
            .tuple_layout(table_id)
            .ok_or_else(|| StorageError::logic(format!("unknown table {:x}", table_id)))?;
        assert_eq!(tuple.len(), layout.tuple_size, "tuple payload size mismatch");

        let existing_pages = self
            .catalog
            .with_store(table_id, |store| store.num_pages())
            .ok_or_else(|| StorageError::logic(format!("unknown table {:x}", table_id)))?;

        // 0..=existing_pages: scanning every existing page, then (if none
        // has room) the one-past-the-end page, which PageStore::read_page
        // auto-extends into a fresh empty page. Catalog::create_table
        // rejects any tuple_size that would leave zero slots per page, so
        // that fresh page is guaranteed to have room.
        for page_number in 0..=existing_pages {
            let page_id = PageId::new(table_id, page_number);
            let page_ref = self.get_page(txn, page_id, LockMode::Exclusive)?;
            let mut page = page_ref.write().unwrap();
            if let Some(slot) = page.find_free_slot(layout.tuple_size) {
                page.write_slot(layout.tuple_size, slot, tuple);
                page.mark_dirty(txn);
                info!("inserted tuple into {} slot {}", page_id, slot);
                return Ok(RecordId { page_id, slot });
            }
        }
        unreachable!("freshly extended page always has at least one free slot")
    }

    pub fn delete_tuple(&self, txn: TransactionId, rid: RecordId) -> StorageResult<()> {
        let layout = self
            .catalog
            .tuple_layout(rid.page_id.table_id)
            .ok_or_else(|| StorageError::logic(format!("unknown table {:x}", rid.page_id.table_id)))?;

        let page_ref = self.get_page(txn, rid.page_id, LockMode::Exclusive)?;
        let mut page = page_ref.write().unwrap();
        page.clear_slot(layout.tuple_size, rid.slot);
        page.mark_dirty(txn);
        info!("deleted tuple at {} slot {}", rid.page_id, rid.slot);
        Ok(())
    }

    /// `commit`: flushes every dirty page the transaction touched
    /// (FORCE), then releases all its locks. `abort`: reverts every page
    /// the transaction dirtied by reloading it from the page store (valid
    /// under NO-STEAL: the on-disk image still reflects the last
    /// committed state), then releases all its locks. Lock release
    /// always happens after the flush/revert step completes.
    pub fn txn_complete(&self, txn: TransactionId, commit: bool) -> StorageResult<()> {
        let touched = self.txn_tracker.lock().unwrap().take(txn);

        if commit {
            for &page_id in &touched {
                let dirty = self
                    .pool
                    .lock()
                    .unwrap()
                    .entries
                    .get(&page_id)
                    .map(|p| p.read().unwrap().dirty_by() == Some(txn))
                    .unwrap_or(false);
                if dirty {
                    self.flush_page(page_id)?;
                }
            }
            info!("{} committed, {} pages touched", txn, touched.len());
        } else {
            for &page_id in &touched {
                let page_ref = self.pool.lock().unwrap().entries.get(&page_id).cloned();
                if let Some(page_ref) = page_ref {
                    let is_dirty_by_txn = page_ref.read().unwrap().dirty_by() == Some(txn);
                    if is_dirty_by_txn {
                        let fresh = self
                            .catalog
                            .with_store(page_id.table_id, |store| store.read_page(page_id.page_number))
                            .ok_or_else(|| {
                                StorageError::logic(format!("no table registered for {}", page_id))
                            })??;
                        page_ref.write().unwrap().reload(fresh.data().to_vec());
                        debug!("reverted page {}", page_id);
                    }
                }
            }
            info!("{} aborted, {} pages touched", txn, touched.len());
        }

        for page_id in touched {
            self.lock_table.release(txn, page_id);
        }

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[cfg(test)]
    fn resident_count(&self) -> usize {
        self.pool.lock().unwrap().entries.len()
    }
}
