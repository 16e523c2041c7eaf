//! `FileSystem` over `std::fs`, for hosts (Raspberry Pi style setups).

use std::fs;
use std::path::Path;

use super::browser::{DirEntry, FileSystem};
use crate::error::Error;

/// The local filesystem. Symlinks are followed.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, Error> {
        let read_dir = fs::read_dir(path).map_err(|_| {
            warn!("Browser: cannot open directory {}", path);
            Error::Filesystem
        })?;

        let mut entries = Vec::new();
        // Unreadable entries (permissions, dangling links) are skipped.
        for entry in read_dir.filter_map(|e| e.ok()) {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Ok(metadata) = fs::metadata(entry.path()) else {
                trace!("Browser: skipped unreadable {}", name.as_str());
                continue;
            };
            entries.push(DirEntry {
                name,
                is_dir: metadata.is_dir(),
            });
        }
        Ok(entries)
    }

    fn is_dir(&mut self, path: &str) -> bool {
        Path::new(path).is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rotary-menu-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.py"), "").unwrap();
        fs::write(dir.join("b.txt"), "").unwrap();
        dir
    }

    #[test]
    fn lists_files_and_directories() {
        let dir = scratch_dir("list");
        let mut fs = StdFileSystem;
        let mut listing = fs.list(dir.to_str().unwrap()).unwrap();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            listing,
            [DirEntry::file("a.py"), DirEntry::file("b.txt"), DirEntry::dir("sub")]
        );
        assert!(fs.is_dir(dir.join("sub").to_str().unwrap()));
        assert!(!fs.is_dir(dir.join("a.py").to_str().unwrap()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let dir = scratch_dir("dangling");
        std::os::unix::fs::symlink(dir.join("gone.py"), dir.join("link.py")).unwrap();

        let mut fs = StdFileSystem;
        let mut listing = fs.list(dir.to_str().unwrap()).unwrap();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            listing,
            [DirEntry::file("a.py"), DirEntry::file("b.txt"), DirEntry::dir("sub")]
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut fs = StdFileSystem;
        assert_eq!(
            fs.list("/definitely/not/here/rotary-menu").err(),
            Some(Error::Filesystem)
        );
    }
}
