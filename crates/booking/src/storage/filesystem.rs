use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::StorageError;

use super::object_name;

/// Object names are UUID-prefixed, so a clash means the UUID generator
/// repeated itself; a few retries are plenty.
const MAX_CREATE_ATTEMPTS: usize = 5;

/// Blob store rooted at a directory, with one subdirectory per bucket.
///
/// References have the form `<bucket>/<object name>`.
#[derive(Debug, Clone)]
pub struct BlobStorage {
    root: PathBuf,
}

impl BlobStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        Ok(self.bucket_dir(bucket)?.is_dir())
    }

    /// Creates the bucket directory. Returns `true` if it did not exist yet.
    pub fn ensure_bucket(&self, bucket: &str) -> Result<bool, StorageError> {
        if self.bucket_exists(bucket)? {
            return Ok(false);
        }
        let dir = self.bucket_dir(bucket)?;
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;
        Ok(true)
    }

    /// Writes `content` as a new object in an existing bucket and returns its
    /// reference. Never overwrites, and never leaves a partial object behind.
    pub fn store(&self, bucket: &str, hint: &str, content: &[u8]) -> Result<String, StorageError> {
        if !self.bucket_exists(bucket)? {
            return Err(StorageError::UnknownBucket(bucket.to_string()));
        }
        let dir = self.bucket_dir(bucket)?;

        let mut last_path = dir.join(hint);
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let name = object_name(hint);
            let path = dir.join(&name);

            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    last_path = path;
                    continue;
                }
                Err(e) => return Err(StorageError::WriteFile { path, source: e }),
            };

            fill_or_discard(file, &path, |f| f.write_all(content))
                .map_err(|e| StorageError::WriteFile {
                    path: path.clone(),
                    source: e,
                })?;
            return Ok(format!("{}/{}", bucket, name));
        }

        Err(StorageError::FileExists(last_path))
    }

    /// Deletes the object behind `reference`. Returns `false` if there was
    /// nothing to delete.
    pub fn remove(&self, reference: &str) -> Result<bool, StorageError> {
        let path = self.path_for(reference)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::RemoveFile { path, source: e }),
        }
    }

    /// Filesystem path for a reference returned by [`store`](Self::store).
    pub fn path_for(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let (bucket, name) = reference
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidBucket(reference.to_string()))?;
        let dir = self.bucket_dir(bucket)?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(StorageError::InvalidBucket(reference.to_string()));
        }
        Ok(dir.join(name))
    }

    pub fn read(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(reference)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        if bucket.trim().is_empty()
            || bucket.contains(['/', '\\'])
            || bucket.contains("..")
        {
            return Err(StorageError::InvalidBucket(bucket.to_string()));
        }
        Ok(self.root.join(bucket))
    }
}

/// Runs `fill` on a freshly created file and syncs it. If either step fails
/// the file is deleted, so readers never see a truncated object.
fn fill_or_discard<F>(mut file: File, path: &Path, fill: F) -> std::io::Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let result = fill(&mut file).and_then(|_| file.sync_all());
    if result.is_err() {
        drop(file);
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove partial object {}: {}", path.display(), e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, BlobStorage) {
        let dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn test_ensure_bucket() {
        let (_dir, storage) = storage();
        assert!(!storage.bucket_exists("uploads").unwrap());
        assert!(storage.ensure_bucket("uploads").unwrap());
        assert!(!storage.ensure_bucket("uploads").unwrap());
        assert!(storage.bucket_exists("uploads").unwrap());
    }

    #[test]
    fn test_store_and_read() {
        let (_dir, storage) = storage();
        storage.ensure_bucket("uploads").unwrap();

        let reference = storage.store("uploads", "scan.pdf", b"%PDF-1.4").unwrap();
        assert!(reference.starts_with("uploads/"));
        assert!(reference.ends_with("-scan.pdf"));
        assert_eq!(storage.read(&reference).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_same_hint_gives_distinct_references() {
        let (_dir, storage) = storage();
        storage.ensure_bucket("uploads").unwrap();

        let a = storage.store("uploads", "scan.pdf", b"a").unwrap();
        let b = storage.store("uploads", "scan.pdf", b"b").unwrap();
        assert_ne!(a, b);
        assert_eq!(storage.read(&a).unwrap(), b"a");
        assert_eq!(storage.read(&b).unwrap(), b"b");
    }

    #[test]
    fn test_remove() {
        let (_dir, storage) = storage();
        storage.ensure_bucket("uploads").unwrap();
        let reference = storage.store("uploads", "scan.pdf", b"%PDF").unwrap();

        assert!(storage.remove(&reference).unwrap());
        assert!(!storage.path_for(&reference).unwrap().exists());
        assert!(!storage.remove(&reference).unwrap());
        assert!(matches!(
            storage.remove("../etc/passwd"),
            Err(StorageError::InvalidBucket(_))
        ));
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let (dir, _storage) = storage();
        let path = dir.path().join("half-written.bin");
        let file = File::create(&path).unwrap();

        let err = fill_or_discard(file, &path, |f| {
            f.write_all(b"first half")?;
            Err(std::io::Error::other("no space left on device"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "no space left on device");
        assert!(!path.exists());
    }

    #[test]
    fn test_store_leaves_only_the_object() {
        let (dir, storage) = storage();
        storage.ensure_bucket("uploads").unwrap();
        let reference = storage.store("uploads", "notes.txt", b"hello").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(reference.ends_with(entries[0].to_str().unwrap()));
    }

    #[test]
    fn test_store_into_missing_bucket() {
        let (_dir, storage) = storage();
        let err = storage.store("nowhere", "a.txt", b"x").unwrap_err();
        assert!(matches!(err, StorageError::UnknownBucket(_)));
    }

    #[test]
    fn test_rejects_traversal() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.ensure_bucket("../escape"),
            Err(StorageError::InvalidBucket(_))
        ));
        assert!(storage.path_for("uploads/../../etc/passwd").is_err());
        assert!(storage.path_for("no-separator").is_err());
    }

    #[test]
    fn test_hint_is_sanitized_on_disk() {
        let (dir, storage) = storage();
        storage.ensure_bucket("uploads").unwrap();
        let reference = storage.store("uploads", "../../evil.sh", b"x").unwrap();
        let path = storage.path_for(&reference).unwrap();
        assert!(path.starts_with(dir.path().join("uploads")));
        assert!(reference.ends_with("-evil.sh"));
    }
}
