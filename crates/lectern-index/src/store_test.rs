use super::*;
use crate::metadata::ExpectedIndex;

fn metadata() -> IndexMetadata {
    IndexMetadata::stamp(
        &ExpectedIndex {
            version: 1,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: None,
        },
        Some(1536),
    )
}

#[test]
fn test_sidecar_missing_file_reads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = SidecarStore::new(&dir.path().join("index"));
    assert!(store.read().unwrap().is_none());
    assert!(!store.clear().unwrap());
}

#[test]
fn test_sidecar_write_creates_directory_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let index_dir = dir.path().join("index");
    let store = SidecarStore::new(&index_dir);

    let written = metadata();

    store.write(&written).unwrap();

    assert_eq!(store.path(), index_dir.join(METADATA_FILE_NAME));
    assert_eq!(store.read().unwrap(), Some(written));
    let names: Vec<_> = std::fs::read_dir(&index_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from(METADATA_FILE_NAME)]);
}

#[test]
fn test_sidecar_reads_record_without_optional_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = SidecarStore::new(dir.path());
    std::fs::write(
        store.path(),
        r#"{"index_version": 1, "embedding_model": "text-embedding-3-small"}"#,
    )
    .unwrap();

    let read = store.read().unwrap().unwrap();
    assert_eq!(read.embedding_dim, None);
    assert!(!read.incomplete);
    assert!(read.built_at.is_none());
}

#[test]
fn test_sidecar_corrupt_record_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SidecarStore::new(dir.path());
    std::fs::write(store.path(), "[]").unwrap();

    assert!(matches!(store.read(), Err(IndexError::Json { .. })));
}

#[test]
fn test_mark_incomplete_without_record_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = SidecarStore::new(dir.path());

    assert!(!store.mark_incomplete().unwrap());
    assert!(!store.path().exists());

    let memory = MemoryStore::new();
    assert!(!memory.mark_incomplete().unwrap());
    assert_eq!(memory.write_count(), 0);
}

#[test]
fn test_mark_incomplete_flags_existing_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = SidecarStore::new(dir.path());
    store.write(&metadata()).unwrap();

    assert!(store.mark_incomplete().unwrap());

    let read = store.read().unwrap().unwrap();
    assert!(read.incomplete);
    assert_eq!(read.embedding_dim, Some(1536));
}

#[test]
fn test_memory_store_counts_writes_and_clears() {
    let store = MemoryStore::with(metadata());
    assert_eq!(store.write_count(), 0);

    store.mark_incomplete().unwrap();
    store.mark_incomplete().unwrap();
    assert_eq!(store.write_count(), 1);

    assert!(store.clear().unwrap());
    assert!(store.read().unwrap().is_none());
}
