use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

use log::debug;

use crate::{error::StorageError, page_id::PageId, transaction_id::TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Default)]
struct LockState {
    exclusive_holder: Option<TransactionId>,
    shared_holders: HashSet<TransactionId>,
}

impl LockState {
    fn can_grant(&self, txn: TransactionId, mode: LockMode) -> bool {
        match mode {
            // Shared: no exclusive holder, or the exclusive holder is the
            // requester itself (self-compatible).
            LockMode::Shared => match self.exclusive_holder {
                None => true,
                Some(holder) => holder == txn,
            },
            // Exclusive: no exclusive holder but self, AND shared holders
            // are empty or exactly {txn} (self-upgrade).
            LockMode::Exclusive => {
                let exclusive_ok = match self.exclusive_holder {
                    None => true,
                    Some(holder) => holder == txn,
                };
                let shared_ok = self.shared_holders.is_empty()
                    || (self.shared_holders.len() == 1 && self.shared_holders.contains(&txn));
                exclusive_ok && shared_ok
            }
        }
    }

    fn grant(&mut self, txn: TransactionId, mode: LockMode) {
        match mode {
            LockMode::Shared => {
                self.shared_holders.insert(txn);
            }
            LockMode::Exclusive => {
                self.exclusive_holder = Some(txn);
                // self-upgrade: the lone shared hold becomes redundant
                // once the exclusive hold is recorded, but release()
                // special-cases the exclusive holder anyway, so leaving
                // it in shared_holders is harmless. Drop it here to keep
                // debug output legible.
                if self.shared_holders.len() == 1 && self.shared_holders.contains(&txn) {
                    self.shared_holders.remove(&txn);
                }
            }
        }
    }

    fn release(&mut self, txn: TransactionId) {
        if self.exclusive_holder == Some(txn) {
            self.exclusive_holder = None;
        }
        self.shared_holders.remove(&txn);
    }

    fn holds(&self, txn: TransactionId) -> bool {
        self.exclusive_holder == Some(txn) || self.shared_holders.contains(&txn)
    }
}

struct LockEntry {
    state: Mutex<LockState>,
    cond: Condvar,
}

impl LockEntry {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LockState::default()),
            cond: Condvar::new(),
        })
    }
}

/// Per-page shared/exclusive lock table with upgrade and a deadlock
/// timeout. One `LockEntry` (a mutex + condvar pair) per page ever
/// touched; entries are created lazily and never removed (bounded by the
/// set of pages the database has ever addressed).
pub struct LockTable {
    entries: Mutex<HashMap<PageId, Arc<LockEntry>>>,
    deadlock_timeout: Duration,
}

impl LockTable {
    pub fn new(deadlock_timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            deadlock_timeout,
        }
    }

    fn entry_for(&self, page_id: PageId) -> Arc<LockEntry> {
        let mut entries = self.entries.lock().unwrap();
        entries.entry(page_id).or_insert_with(LockEntry::new).clone()
    }

    /// Blocks until the lock is granted or `deadlock_timeout` elapses, in
    /// which case the caller's transaction is aborted. Timeout-based abort
    /// is sufficient to break every deadlock cycle without tracking a
    /// waits-for graph.
    pub fn acquire(
        &self,
        txn: TransactionId,
        page_id: PageId,
        mode: LockMode,
    ) -> Result<(), StorageError> {
        let entry = self.entry_for(page_id);
        let deadline = Instant::now() + self.deadlock_timeout;

        let mut state = entry.state.lock().unwrap();
        while !state.can_grant(txn, mode) {
            let now = Instant::now();
            if now >= deadline {
                debug!("{:?} timed out acquiring {:?} on {}", txn, mode, page_id);
                return Err(StorageError::Aborted);
            }
            let remaining = deadline - now;
            let (guard, timeout_result) = entry.cond.wait_timeout(state, remaining).unwrap();
            state = guard;
            if timeout_result.timed_out() && !state.can_grant(txn, mode) && Instant::now() >= deadline {
                debug!("{:?} timed out acquiring {:?} on {}", txn, mode, page_id);
                return Err(StorageError::Aborted);
            }
        }

        state.grant(txn, mode);
        debug!("{:?} acquired {:?} on {}", txn, mode, page_id);
        Ok(())
    }

    /// Releasing a lock never blocks and always broadcasts: a targeted
    /// wakeup is incorrect here because several waiters (multiple
    /// compatible shared requesters, or a lone-self upgrader) may become
    /// eligible simultaneously.
    pub fn release(&self, txn: TransactionId, page_id: PageId) {
        let entry = {
            let entries = self.entries.lock().unwrap();
            match entries.get(&page_id) {
                Some(e) => e.clone(),
                None => return,
            }
        };
        let mut state = entry.state.lock().unwrap();
        state.release(txn);
        drop(state);
        entry.cond.notify_all();
    }

    /// Returns `false` if no entry exists for `page_id` rather than
    /// faulting — a possibly-absent entry must not panic.
    pub fn holds(&self, txn: TransactionId, page_id: PageId) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(&page_id) {
            Some(entry) => entry.state.lock().unwrap().holds(txn),
            None => false,
        }
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
