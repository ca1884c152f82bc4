// Tests for the key-value stores

use harvest_core::store::{KeyValueStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

fn exercise(store: &dyn KeyValueStore) {
    assert_eq!(store.get("missing").unwrap(), None);

    store.set("key", "one").unwrap();
    assert_eq!(store.get("key").unwrap().as_deref(), Some("one"));

    store.set("key", "two").unwrap();
    assert_eq!(store.get("key").unwrap().as_deref(), Some("two"));

    store.delete("key").unwrap();
    assert_eq!(store.get("key").unwrap(), None);

    // Deleting again is fine
    store.delete("key").unwrap();
}

#[test]
fn test_memory_store_basic_operations() {
    let store = MemoryStore::new();
    exercise(&store);
    assert!(store.is_empty());
}

#[test]
fn test_sqlite_in_memory_basic_operations() {
    let store = SqliteStore::in_memory().unwrap();
    exercise(&store);
}

#[test]
fn test_sqlite_file_basic_operations() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&dir.path().join("harvest.db")).unwrap();
    exercise(&store);
}

#[test]
fn test_sqlite_open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("config").join("harvest.db");

    SqliteStore::open(&db_path).unwrap();
    assert!(SqliteStore::exists(&db_path));
}

#[test]
fn test_sqlite_values_persist_after_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        store.set("key", "persisted").unwrap();
    }

    let store = SqliteStore::open(&db_path).unwrap();
    assert_eq!(store.get("key").unwrap().as_deref(), Some("persisted"));
}

#[test]
fn test_sqlite_updated_at_tracks_writes() {
    let store = SqliteStore::in_memory().unwrap();
    assert_eq!(store.updated_at("key").unwrap(), None);

    store.set("key", "value").unwrap();
    let timestamp = store.updated_at("key").unwrap().unwrap();
    assert!(timestamp > 0);
}

#[test]
fn test_sqlite_drop_removes_database_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    {
        SqliteStore::open(&db_path).unwrap();
    }

    SqliteStore::drop(&db_path).unwrap();
    assert!(!SqliteStore::exists(&db_path));
}

#[test]
fn test_memory_store_len() {
    let store = MemoryStore::new();
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.set("a", "3").unwrap();
    assert_eq!(store.len(), 2);
}
