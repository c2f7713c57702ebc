use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    path::Path,
    sync::RwLock,
};

use crate::{
    error::{StorageError, StorageResult},
    page::Page,
    page_store::FileStore,
};

/// Fixed-size opaque tuple layout for the minimal slotted heap file. Real
/// field/schema handling belongs to an external collaborator; this crate
/// only needs to know how many bytes a tuple occupies.
#[derive(Debug, Clone, Copy)]
pub struct TupleLayout {
    pub tuple_size: usize,
}

struct TableEntry {
    store: FileStore,
    layout: TupleLayout,
}

/// A minimal table registry: path -> (page store, tuple layout, stable
/// table id). This is not a SQL catalog (no table names/schemas for query
/// planning) — it exists so `PageId.table_id` means something.
pub struct Catalog {
    tables: RwLock<HashMap<i64, TableEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// `table_id` is the stable hash of the absolute backing file path,
    /// computed the same way whether or not the file exists yet: the
    /// parent directory (which must already exist) is canonicalized and
    /// the file name is joined onto that. Canonicalizing the full path
    /// only when it happens to exist would let a later reopen of the same
    /// path (after the file has been created) resolve through a symlinked
    /// parent directory the first call never saw, producing a different
    /// hash for what is really the same table.
    pub fn table_id_for_path(path: impl AsRef<Path>) -> StorageResult<i64> {
        let path = path.as_ref();
        let file_name = path.file_name().ok_or_else(|| {
            StorageError::logic(format!("table path has no file name: {:?}", path))
        })?;
        let parent = if path.parent().map_or(true, |p| p.as_os_str().is_empty()) {
            std::env::current_dir()?
        } else {
            std::fs::canonicalize(path.parent().unwrap())?
        };
        let absolute = parent.join(file_name);
        let mut hasher = DefaultHasher::new();
        absolute.hash(&mut hasher);
        Ok(hasher.finish() as i64)
    }

    pub fn create_table(
        &self,
        path: impl AsRef<Path>,
        page_size: usize,
        tuple_size: usize,
    ) -> StorageResult<i64> {
        if Page::slot_count_for(page_size, tuple_size) == 0 {
            return Err(StorageError::logic(format!(
                "tuple_size {} leaves no room for even one slot in a {}-byte page",
                tuple_size, page_size
            )));
        }
        let table_id = Self::table_id_for_path(path.as_ref())?;
        let store = FileStore::open(path.as_ref(), page_size)?;
        self.tables.write().unwrap().insert(
            table_id,
            TableEntry {
                store,
                layout: TupleLayout { tuple_size },
            },
        );
        Ok(table_id)
    }

    pub fn tuple_layout(&self, table_id: i64) -> Option<TupleLayout> {
        self.tables.read().unwrap().get(&table_id).map(|t| t.layout)
    }

    pub fn with_store<R>(&self, table_id: i64, f: impl FnOnce(&FileStore) -> R) -> Option<R> {
        self.tables.read().unwrap().get(&table_id).map(|t| f(&t.store))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
