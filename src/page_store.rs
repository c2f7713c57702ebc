use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use log::debug;

use crate::{error::StorageResult, page::Page};

/// What the core requires from a file backend: read/write fixed-size
/// pages by page number, and report the logical page count. Reading the
/// page one past the current count auto-extends the logical count and
/// returns a fresh empty page without touching the file; the file only
/// grows physically once that page is actually written.
pub trait PageStore: Send + Sync {
    fn read_page(&self, page_number: usize) -> StorageResult<Page>;
    fn write_page(&self, page_number: usize, data: &[u8]) -> StorageResult<()>;
    fn num_pages(&self) -> usize;
}

/// A heap file: pages are a flat concatenation of `page_size`-byte slots,
/// page `k` at byte offset `k * page_size`.
pub struct FileStore {
    file: Mutex<File>,
    page_size: usize,
    logical_pages: AtomicUsize,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> StorageResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let physical_len = file.metadata()?.len() as usize;
        let logical_pages = physical_len / page_size;
        debug!(
            "opened page store at {:?}, page_size: {}, logical_pages: {}",
            path, page_size, logical_pages
        );
        Ok(Self {
            file: Mutex::new(file),
            page_size,
            logical_pages: AtomicUsize::new(logical_pages),
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl PageStore for FileStore {
    fn read_page(&self, page_number: usize) -> StorageResult<Page> {
        let logical_pages = self.logical_pages.load(Ordering::SeqCst);
        if page_number > logical_pages {
            return Err(crate::error::StorageError::logic(format!(
                "read past end of file: page {} requested, {} pages present",
                page_number, logical_pages
            )));
        }
        if page_number == logical_pages {
            // Auto-extend: the logical page count grows, but nothing is
            // written to disk until this page is flushed.
            self.logical_pages.store(logical_pages + 1, Ordering::SeqCst);
            return Ok(Page::empty(self.page_size));
        }

        let mut file = self.file.lock().unwrap();
        let offset = (page_number * self.page_size) as u64;
        let physical_len = file.metadata()?.len();
        if offset >= physical_len {
            // The logical count outran the physical file (a page was
            // "read" via auto-extend but never flushed). Its contents are
            // still the all-zero empty page.
            return Ok(Page::empty(self.page_size));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.page_size];
        file.read_exact(&mut buf)?;
        Ok(Page::from_bytes(buf))
    }

    fn write_page(&self, page_number: usize, data: &[u8]) -> StorageResult<()> {
        assert_eq!(data.len(), self.page_size);
        let mut file = self.file.lock().unwrap();
        let offset = (page_number * self.page_size) as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;
        drop(file);

        let mut current = self.logical_pages.load(Ordering::SeqCst);
        while current <= page_number {
            match self.logical_pages.compare_exchange(
                current,
                page_number + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Ok(())
    }

    fn num_pages(&self) -> usize {
        self.logical_pages.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "tinypage-test-{}-{}-{}.db",
            name,
            std::process::id(),
            crate::transaction_id::TransactionId::new().as_u64()
        ));
        path
    }

    #[test]
    fn write_then_read_is_byte_equal() {
        let path = temp_path("roundtrip");
        let store = FileStore::open(&path, 128).unwrap();
        let mut data = vec![0u8; 128];
        data[0] = 0xAB;
        data[127] = 0xCD;
        store.write_page(0, &data).unwrap();
        let page = store.read_page(0).unwrap();
        assert_eq!(page.data(), data.as_slice());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reading_num_pages_auto_extends() {
        let path = temp_path("autoextend");
        let store = FileStore::open(&path, 64).unwrap();
        assert_eq!(store.num_pages(), 0);
        let page = store.read_page(0).unwrap();
        assert_eq!(page.data(), vec![0u8; 64].as_slice());
        assert_eq!(store.num_pages(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reading_past_end_fails() {
        let path = temp_path("pasteend");
        let store = FileStore::open(&path, 64).unwrap();
        store.read_page(0).unwrap(); // extends to 1 page
        assert!(store.read_page(5).is_err());
        std::fs::remove_file(&path).ok();
    }
}
