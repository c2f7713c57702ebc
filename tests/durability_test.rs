use tinypage::{LockMode, StorageError};

mod test_utils;
use test_utils::{cleanup, new_test_db};

/// With a buffer pool capacity of exactly one, flushing before commit
/// must not happen: an uncommitted dirty page sitting alone in the pool
/// should still be evictable only after it is flushed by commit, and the
/// write must be durable once committed, independent of the in-memory
/// cache that produced it.
#[test]
fn commit_with_capacity_one_is_durable_across_a_fresh_pool() {
    let (db, table_id, path) = new_test_db(1, 128, 8);

    let txn = db.begin();
    let rid = db.insert_tuple(txn.id(), table_id, &[3u8; 8]).unwrap();
    txn.commit().unwrap();

    // a brand new Database over the same file must see the committed tuple.
    let db2 = tinypage::Database::new(
        tinypage::StorageConfig::default().with_page_size(128).with_capacity(1),
    );
    let table_id2 = db2.create_table(&path, 8).unwrap();
    let txn2 = db2.begin();
    let page = db2
        .get_page(txn2.id(), tinypage::PageId::new(table_id2, rid.page_id.page_number), LockMode::Shared)
        .unwrap();
    assert_eq!(page.read().unwrap().read_slot(8, rid.slot), vec![3u8; 8]);
    txn2.commit().unwrap();

    cleanup(&path);
}

/// An aborted transaction's writes never reach disk; a pre-existing
/// committed tuple survives a delete-then-abort unchanged.
#[test]
fn abort_after_delete_restores_the_previously_committed_tuple() {
    let (db, table_id, path) = new_test_db(10, 128, 8);

    let txn0 = db.begin();
    let rid = db.insert_tuple(txn0.id(), table_id, &[9u8; 8]).unwrap();
    txn0.commit().unwrap();

    let txn1 = db.begin();
    db.delete_tuple(txn1.id(), rid).unwrap();
    txn1.abort().unwrap();

    let txn2 = db.begin();
    let page = db.get_page(txn2.id(), rid.page_id, LockMode::Shared).unwrap();
    assert!(page.read().unwrap().is_slot_used(8, rid.slot));
    assert_eq!(page.read().unwrap().read_slot(8, rid.slot), vec![9u8; 8]);
    txn2.commit().unwrap();

    cleanup(&path);
}

/// Eviction never steals a dirty page: at capacity, a third page request
/// fails with a logic error rather than silently flushing someone else's
/// uncommitted write.
#[test]
fn eviction_at_capacity_fails_closed_when_every_resident_page_is_dirty() {
    let (db, table_id, path) = new_test_db(2, 128, 8);

    let txn = db.begin();
    db.insert_tuple(txn.id(), table_id, &[1u8; 8]).unwrap();
    // force a second, distinct resident page and dirty it directly, since
    // one 128-byte page already has room for more than one 8-byte tuple.
    let page1 = db
        .get_page(txn.id(), tinypage::PageId::new(table_id, 1), LockMode::Exclusive)
        .unwrap();
    page1.write().unwrap().mark_dirty(txn.id());
    drop(page1);

    let txn2 = db.begin();
    let result = db.get_page(txn2.id(), tinypage::PageId::new(table_id, 2), LockMode::Shared);
    assert!(matches!(result, Err(StorageError::Logic(_))));

    txn.abort().unwrap();
    txn2.abort().unwrap();
    cleanup(&path);
}
