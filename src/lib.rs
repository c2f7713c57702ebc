//! A transactional page storage core: a bounded buffer pool, a page-level
//! shared/exclusive lock manager with deadlock-by-timeout abort, and the
//! commit/abort lifecycle that ties them together under strict NO-STEAL,
//! FORCE discipline.

pub mod bufferpool;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod lock_table;
pub mod log;
pub mod page;
pub mod page_id;
pub mod page_store;
pub mod transaction;
pub mod transaction_id;
pub mod txn_tracker;

pub use bufferpool::{BufferPool, PageRef, RecordId};
pub use catalog::{Catalog, TupleLayout};
pub use config::StorageConfig;
pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use lock_table::{LockMode, LockTable};
pub use page::Page;
pub use page_id::PageId;
pub use page_store::{FileStore, PageStore};
pub use transaction::Transaction;
pub use transaction_id::TransactionId;
