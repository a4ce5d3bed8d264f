//! Source preference persistence tests
//!
//! Exercises the TOML file backend through the store, including the
//! survive-a-restart contract (a fresh store over the same file sees
//! everything written before).

use tvplay::prefs::{PreferenceBackend, SourcePreferenceStore, TomlPreferenceFile};

fn store_at(path: &std::path::Path) -> SourcePreferenceStore<TomlPreferenceFile> {
    SourcePreferenceStore::load(TomlPreferenceFile::at(path)).unwrap()
}

#[test]
fn test_missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(&dir.path().join("sources.toml"));

    assert!(store.is_empty());
    assert_eq!(store.get("anything"), 0);
}

#[test]
fn test_set_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sources.toml");

    let mut store = store_at(&path);
    store.set("CCTV-1", 3).unwrap();
    store.set("Hunan TV", 1).unwrap();
    drop(store);

    // Fresh store over the same file, as after a process restart
    let store = store_at(&path);
    assert_eq!(store.get("CCTV-1"), 3);
    assert_eq!(store.get("Hunan TV"), 1);
    assert_eq!(store.get("CCTV-5"), 0);
}

#[test]
fn test_upsert_overwrites_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sources.toml");

    let mut store = store_at(&path);
    store.set("CCTV-1", 2).unwrap();

    let mut store = store_at(&path);
    store.set("CCTV-1", 0).unwrap();

    let store = store_at(&path);
    assert_eq!(store.get("CCTV-1"), 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_file_is_written_before_set_returns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sources.toml");

    let mut store = store_at(&path);
    store.set("CCTV-1", 1).unwrap();

    // Durable already, without any explicit flush/close on the store
    let on_disk = TomlPreferenceFile::at(&path).read_all().unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].station, "CCTV-1");
    assert_eq!(on_disk[0].source_index, 1);
}

#[test]
fn test_backend_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("sources.toml");

    let mut store = store_at(&path);
    store.set("CCTV-1", 2).unwrap();
    assert!(path.exists());
}
