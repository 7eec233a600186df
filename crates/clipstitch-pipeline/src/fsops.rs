use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait MediaFs {
    // Listings are sorted by file name.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Returns `Ok(false)` when the file was already gone.
    fn remove_file(&self, path: &Path) -> io::Result<bool>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    fn list_entries<F>(dir: &Path, keep: F) -> io::Result<Vec<PathBuf>>
    where
        F: Fn(&fs::FileType) -> bool,
    {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if keep(&entry.file_type()?) {
                entries.push(entry.path());
            }
        }
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(entries)
    }
}

impl MediaFs for LocalFs {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::list_entries(dir, |kind| kind.is_file())
    }

    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::list_entries(dir, |kind| kind.is_dir())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // rename cannot cross filesystems; copy then drop the source
                if !from.is_file() {
                    return Err(rename_err);
                }
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}
