//! Tests for FileStore
//!
//! These tests verify:
//! - Opening/creating storage directories
//! - Store/read/delete/stat semantics
//! - Listing only regular files, in name order
//! - Filename validation
//! - Concurrent access to the same name

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use fileport::store::{validate_filename, FileStore};
use fileport::FilePortError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, FileStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open(temp_dir.path()).unwrap();
    (temp_dir, store)
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing");

    let result = FileStore::open(&path);
    assert!(matches!(result, Err(FilePortError::Config(_))));
}

#[test]
fn test_create_makes_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path: PathBuf = temp_dir.path().join("nested").join("files");

    let store = FileStore::create(&path).unwrap();

    assert!(path.is_dir());
    assert_eq!(store.root(), path.as_path());
}

#[test]
fn test_open_sees_existing_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("old.txt"), b"from before").unwrap();

    let store = FileStore::open(temp_dir.path()).unwrap();

    assert_eq!(store.read("old.txt").unwrap(), b"from before");
}

// =============================================================================
// Store/Read Tests
// =============================================================================

#[test]
fn test_store_and_read() {
    let (_temp, store) = setup_temp_store();

    let size = store.store("a.txt", b"hello").unwrap();

    assert_eq!(size, 5);
    assert_eq!(store.read("a.txt").unwrap(), b"hello");
}

#[test]
fn test_store_empty_file() {
    let (temp, store) = setup_temp_store();

    assert_eq!(store.store("empty", b"").unwrap(), 0);
    assert_eq!(store.read("empty").unwrap(), Vec::<u8>::new());
    assert!(temp.path().join("empty").is_file());
}

#[test]
fn test_store_overwrites_not_appends() {
    let (_temp, store) = setup_temp_store();

    store.store("a.txt", b"a much longer first version").unwrap();
    store.store("a.txt", b"short").unwrap();

    assert_eq!(store.read("a.txt").unwrap(), b"short");
}

#[test]
fn test_store_binary_data() {
    let (_temp, store) = setup_temp_store();
    let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();

    store.store("blob.bin", &data).unwrap();

    assert_eq!(store.read("blob.bin").unwrap(), data);
}

#[test]
fn test_read_missing_file() {
    let (_temp, store) = setup_temp_store();

    let err = store.read("nope.txt").unwrap_err();

    assert!(matches!(err, FilePortError::NotFound(ref name) if name == "nope.txt"));
    assert_eq!(err.to_string(), "File nope.txt not found");
}

#[test]
fn test_read_directory_is_not_found() {
    let (temp, store) = setup_temp_store();
    fs::create_dir(temp.path().join("subdir")).unwrap();

    assert!(matches!(store.read("subdir"), Err(FilePortError::NotFound(_))));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_existing() {
    let (temp, store) = setup_temp_store();
    store.store("a.txt", b"hello").unwrap();

    store.delete("a.txt").unwrap();

    assert!(!temp.path().join("a.txt").exists());
    assert!(matches!(store.read("a.txt"), Err(FilePortError::NotFound(_))));
}

#[test]
fn test_delete_missing() {
    let (_temp, store) = setup_temp_store();

    let err = store.delete("ghost").unwrap_err();
    assert_eq!(err.to_string(), "File ghost not found");
}

#[test]
fn test_delete_twice() {
    let (_temp, store) = setup_temp_store();
    store.store("once", b"1").unwrap();

    store.delete("once").unwrap();
    assert!(matches!(store.delete("once"), Err(FilePortError::NotFound(_))));
}

#[test]
fn test_delete_leaves_directories_alone() {
    let (temp, store) = setup_temp_store();
    fs::create_dir(temp.path().join("keep")).unwrap();

    assert!(matches!(store.delete("keep"), Err(FilePortError::NotFound(_))));
    assert!(temp.path().join("keep").is_dir());
}

// =============================================================================
// List/Stat Tests
// =============================================================================

#[test]
fn test_list_empty() {
    let (_temp, store) = setup_temp_store();

    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_list_sorted_with_sizes() {
    let (_temp, store) = setup_temp_store();
    store.store("c.txt", b"ccc").unwrap();
    store.store("a.txt", b"a").unwrap();
    store.store("b.txt", b"bb").unwrap();

    let files = store.list().unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    let sizes: Vec<u64> = files.iter().map(|f| f.size).collect();
    assert_eq!(sizes, vec![1, 2, 3]);
    assert!(files.iter().all(|f| f.exists));
}

#[test]
fn test_list_skips_directories() {
    let (temp, store) = setup_temp_store();
    fs::create_dir(temp.path().join("subdir")).unwrap();
    store.store("file", b"x").unwrap();

    let files = store.list().unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "file");
}

#[test]
fn test_list_reflects_delete() {
    let (_temp, store) = setup_temp_store();
    store.store("a.txt", b"hello").unwrap();
    store.store("b.txt", b"world").unwrap();

    store.delete("a.txt").unwrap();

    let files = store.list().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "b.txt");
}

#[test]
fn test_stat_present_and_absent() {
    let (_temp, store) = setup_temp_store();
    store.store("a.txt", b"hello").unwrap();

    let meta = store.stat("a.txt").unwrap().unwrap();
    assert_eq!(meta.name, "a.txt");
    assert_eq!(meta.size, 5);
    assert!(meta.exists);

    assert!(store.stat("b.txt").unwrap().is_none());
}

#[test]
fn test_stat_matches_list_entry() {
    let (_temp, store) = setup_temp_store();
    store.store("same", b"12345").unwrap();

    let listed = store.list().unwrap().remove(0);
    let stat = store.stat("same").unwrap().unwrap();

    assert_eq!(listed, stat);
}

// =============================================================================
// Filename Validation Tests
// =============================================================================

#[test]
fn test_valid_filenames() {
    for name in ["a.txt", "report 2024.pdf", ".hidden", "..dots", "ünïcode.md"] {
        assert!(validate_filename(name).is_ok(), "{} should be valid", name);
    }
}

#[test]
fn test_invalid_filenames() {
    for name in ["", ".", "..", "../etc/passwd", "a/b", "/abs", "a\\b", "nul\0byte"] {
        assert!(
            matches!(validate_filename(name), Err(FilePortError::InvalidFilename(_))),
            "{:?} should be rejected",
            name
        );
    }
}

#[test]
fn test_traversal_never_touches_outside() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let store = FileStore::create(&root).unwrap();

    let err = store.store("../escaped.txt", b"nope").unwrap_err();

    assert!(matches!(err, FilePortError::InvalidFilename(_)));
    assert!(!temp_dir.path().join("escaped.txt").exists());
    assert!(matches!(
        store.read("../root"),
        Err(FilePortError::InvalidFilename(_))
    ));
    assert!(matches!(
        store.delete(".."),
        Err(FilePortError::InvalidFilename(_))
    ));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_last_write_wins_whole() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let data = vec![i; 64 * 1024];
                for _ in 0..10 {
                    store.store("shared.bin", &data).unwrap();
                }
            })
        })
        .collect();

    // Readers must only ever see one writer's complete content
    for _ in 0..50 {
        if let Ok(data) = store.read("shared.bin") {
            assert_eq!(data.len(), 64 * 1024);
            assert!(data.iter().all(|&b| b == data[0]));
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let data = store.read("shared.bin").unwrap();
    assert_eq!(data.len(), 64 * 1024);
    assert!(data.iter().all(|&b| b == data[0]));
}

#[test]
fn test_concurrent_different_names() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let name = format!("file_{:02}", i);
                store.store(&name, name.as_bytes()).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let files = store.list().unwrap();
    assert_eq!(files.len(), 16);
    for file in files {
        assert_eq!(store.read(&file.name).unwrap(), file.name.as_bytes());
    }
}
