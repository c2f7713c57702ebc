use std::time::Duration;

/// Storage tunables, threaded explicitly through `Database`, `BufferPool`
/// and `LockTable` rather than living as process-wide mutable statics.
/// `StorageConfig::with_page_size` is most useful in tests that need a
/// tiny page size to force evictions quickly.
#[derive(Debug, Clone, Copy)]
pub struct StorageConfig {
    pub page_size: usize,
    pub capacity: usize,
    pub deadlock_timeout: Duration,
}

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_DEADLOCK_TIMEOUT_MS: u64 = 2000;

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            capacity: DEFAULT_CAPACITY,
            deadlock_timeout: Duration::from_millis(DEFAULT_DEADLOCK_TIMEOUT_MS),
        }
    }
}

impl StorageConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_deadlock_timeout(mut self, timeout: Duration) -> Self {
        self.deadlock_timeout = timeout;
        self
    }
}
