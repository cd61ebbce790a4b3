use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting pipeline state files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Atomically write a YAML index file, then read it back and verify it still
/// parses as `T`. A file that fails verification is deleted so a crash or
/// serialization defect never leaves a parseable-but-truncated index behind.
pub fn atomic_write_verified<T: serde::de::DeserializeOwned>(
    path: &Path,
    data: &[u8],
) -> Result<()> {
    atomic_write(path, data)?;
    let written = std::fs::read_to_string(path)?;
    if let Err(e) = serde_yaml::from_str::<T>(&written) {
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.yaml");
        atomic_write(&path, b"hello: world").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello: world");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/test.yaml");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.yaml");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn write_if_missing_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"original").unwrap();
        let written = write_if_missing(&path, b"new").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn verified_write_accepts_valid_yaml() {
        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct Index {
            version: u32,
        }
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.yaml");
        atomic_write_verified::<Index>(&path, b"version: 1\n").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn verified_write_deletes_unparseable_output() {
        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct Index {
            version: u32,
        }
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.yaml");
        let result = atomic_write_verified::<Index>(&path, b"not: an: index: [");
        assert!(result.is_err());
        assert!(!path.exists(), "bad index must not be left on disk");
    }
}
