use std::sync::Once;

use tinypage::{Database, StorageConfig};

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(tinypage::log::init_log);
}

/// A fresh database over a uniquely named temp file, with one table of
/// fixed-size tuples registered.
pub fn new_test_db(capacity: usize, page_size: usize, tuple_size: usize) -> (Database, i64, std::path::PathBuf) {
    setup();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "tinypage-it-{}-{}.db",
        std::process::id(),
        rand::random::<u64>()
    ));
    let db = Database::new(
        StorageConfig::default()
            .with_page_size(page_size)
            .with_capacity(capacity),
    );
    let table_id = db.create_table(&path, tuple_size).unwrap();
    (db, table_id, path)
}

pub fn cleanup(path: &std::path::Path) {
    std::fs::remove_file(path).ok();
}
