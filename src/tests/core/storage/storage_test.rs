#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::core::storage::{run_blocking, FsStorage, KvStorage, MemoryStorage, StorageError};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!(
                "durable-counter-storage-{}-{}",
                std::process::id(),
                NEXT_DIR.fetch_add(1, Ordering::SeqCst)
            ));
            TempDir(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("test").unwrap(), None);

        storage.set("test", b"1").unwrap();
        storage.set("other", b"2").unwrap();
        assert_eq!(storage.get("test").unwrap(), Some(b"1".to_vec()));
        assert_eq!(storage.list().unwrap(), vec!["other".to_owned(), "test".to_owned()]);
    }

    #[test]
    fn test_memory_storage_clones_share_entries() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        storage.set("test", b"7").unwrap();
        assert_eq!(clone.get("test").unwrap(), Some(b"7".to_vec()));
    }

    #[test]
    fn test_fs_storage_roundtrip() {
        let dir = TempDir::new();
        let storage = FsStorage::new(&dir.0).unwrap();
        assert!(dir.0.is_dir());
        assert_eq!(storage.get("test").unwrap(), None);

        storage.set("test", br#"{"counter":4}"#).unwrap();
        storage.set("test", br#"{"counter":5}"#).unwrap();
        assert_eq!(storage.get("test").unwrap(), Some(br#"{"counter":5}"#.to_vec()));
        assert_eq!(storage.list().unwrap(), vec!["test".to_owned()]);
    }

    #[test]
    fn test_fs_storage_list_skips_directories() {
        let dir = TempDir::new();
        let storage = FsStorage::new(&dir.0).unwrap();
        fs::create_dir_all(dir.0.join("nested")).unwrap();
        storage.set("b", b"2").unwrap();
        storage.set("a", b"1").unwrap();

        assert_eq!(storage.list().unwrap(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(storage.path(), dir.0.as_path());
    }

    #[test]
    fn test_fs_storage_leaves_only_complete_records() {
        let dir = TempDir::new();
        let storage = FsStorage::new(&dir.0).unwrap();
        for n in 0..5 {
            storage.set("test", format!(r#"{{"counter":{n}}}"#).as_bytes()).unwrap();
        }

        let files: Vec<String> = fs::read_dir(&dir.0)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["test".to_owned()]);
        assert_eq!(fs::read(dir.0.join("test")).unwrap(), br#"{"counter":4}"#.to_vec());
    }

    #[tokio::test]
    async fn test_run_blocking_reaches_storage() {
        let storage: Arc<dyn KvStorage> = Arc::new(MemoryStorage::new());
        run_blocking(&storage, |storage| storage.set("test", b"1")).await.unwrap();
        let stored = run_blocking(&storage, |storage| storage.get("test")).await.unwrap();
        assert_eq!(stored, Some(b"1".to_vec()));
    }

    #[test]
    fn test_fs_storage_survives_reopen() {
        let dir = TempDir::new();
        FsStorage::new(&dir.0).unwrap().set("test", b"42").unwrap();

        let reopened = FsStorage::new(&dir.0).unwrap();
        assert_eq!(reopened.get("test").unwrap(), Some(b"42".to_vec()));
    }

    #[test]
    fn test_fs_storage_rejects_bad_keys() {
        let dir = TempDir::new();
        let storage = FsStorage::new(&dir.0).unwrap();

        for key in ["", ".", "..", ".hidden", "a/b", "a\\b"] {
            match storage.set(key, b"1") {
                Err(StorageError::KeyConstraintError { key: rejected, .. }) => assert_eq!(rejected, key),
                other => panic!("expected key constraint error for {key:?}, got {other:?}"),
            }
        }
        assert!(storage.list().unwrap().is_empty());
    }
}
