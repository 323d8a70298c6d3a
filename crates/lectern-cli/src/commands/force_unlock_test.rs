use super::*;
use crate::commands::common::exit_code;
use std::fs;
use tempfile::tempdir;

fn global(project_dir: &std::path::Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.to_path_buf(),
        config: None,
    }
}

#[tokio::test]
async fn test_force_unlock_requires_confirmation() {
    let temp_dir = tempdir().unwrap();
    let lock_path = temp_dir.path().join("data/.migrate.lock");
    fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
    fs::write(&lock_path, "pid=42\n").unwrap();

    let err = execute(&ForceUnlockArgs { yes: false }, &global(temp_dir.path()))
        .await
        .unwrap_err();

    assert_eq!(exit_code(&err), Some(1));
    assert!(lock_path.exists());
}

#[tokio::test]
async fn test_force_unlock_removes_stale_lock() {
    let temp_dir = tempdir().unwrap();
    let lock_path = temp_dir.path().join("data/.migrate.lock");
    fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
    fs::write(&lock_path, "pid=42\n").unwrap();

    execute(&ForceUnlockArgs { yes: true }, &global(temp_dir.path()))
        .await
        .unwrap();

    assert!(!lock_path.exists());
}

#[tokio::test]
async fn test_force_unlock_without_lock_succeeds() {
    let temp_dir = tempdir().unwrap();

    execute(&ForceUnlockArgs { yes: false }, &global(temp_dir.path()))
        .await
        .unwrap();
    execute(&ForceUnlockArgs { yes: true }, &global(temp_dir.path()))
        .await
        .unwrap();
}
