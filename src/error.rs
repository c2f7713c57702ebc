use std::{error::Error, fmt, io};

use backtrace::Backtrace;
use log::error;

/// A timed-out lock acquisition (the caller's transaction is unilaterally
/// aborted), a logical/invariant violation internal to the core, or an
/// underlying file error.
#[derive(Debug)]
pub enum StorageError {
    /// Lock acquisition did not succeed within the deadlock timeout. The
    /// caller must call `Database::txn_complete(txn, false)`.
    Aborted,
    /// A logical error: no clean page to evict, wrong page addressed, etc.
    Logic(String),
    /// An underlying file I/O failure.
    Io(io::Error),
}

impl StorageError {
    pub fn logic(msg: impl Into<String>) -> Self {
        StorageError::Logic(msg.into())
    }

    /// Capture and log the current stack. Diagnostic only; never part of
    /// control flow.
    pub fn show_backtrace(&self) {
        error!("{}\n{:?}", self, Backtrace::new());
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::Aborted => write!(f, "transaction aborted (lock timeout)"),
            StorageError::Logic(msg) => write!(f, "{}", msg),
            StorageError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
