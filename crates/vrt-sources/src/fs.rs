//! Filesystem abstraction used by the baseline store

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub trait Filesystem: Send + Sync {
    /// Like [`Path::try_exists`]: `Err` when existence cannot be determined
    fn try_exists(&self, path: &Path) -> io::Result<bool>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Replace `to` with the contents of `from`
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// All files under `dir` with the given extension, sorted. A missing
    /// directory yields an empty list.
    fn list_files(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn try_exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    /// Copies into a temp file next to `to`, then renames over it, so readers
    /// never observe a half-written image
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let dir = to.parent().unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        let bytes = std::fs::copy(from, tmp.path())?;
        tmp.persist(to).map_err(|e| e.error)?;
        Ok(bytes)
    }

    fn list_files(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(io::Error::other)?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
            {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_replaces_target() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("from.png");
        let to = dir.path().join("to.png");
        std::fs::write(&from, b"new").unwrap();
        std::fs::write(&to, b"old").unwrap();

        OsFilesystem.copy(&from, &to).unwrap();
        assert_eq!(std::fs::read(&to).unwrap(), b"new");
    }

    #[test]
    fn test_list_files_recursive_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("nested/c.png"), b"").unwrap();

        let files = OsFilesystem.list_files(dir.path(), "png").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "nested/c.png"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = OsFilesystem
            .list_files(&dir.path().join("absent"), "png")
            .unwrap();
        assert!(files.is_empty());
    }
}
