use crate::error::{StitchError, StitchResult};
use crate::fsops::MediaFs;
use crate::naming::{resolve_free_name, FilePattern, SourceName};
use pathdiff::diff_paths;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedClip {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct OrganizeReport {
    pub moved: Vec<MovedClip>,
}

impl OrganizeReport {
    pub fn count(&self) -> usize {
        self.moved.len()
    }
}

pub fn find_source_clips(
    root: &Path,
    pattern: &FilePattern,
) -> StitchResult<Vec<(PathBuf, SourceName)>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !pattern.matches(file_name) {
            continue;
        }
        match SourceName::parse(file_name) {
            Some(name) => found.push((entry.into_path(), name)),
            None => debug!("skip (not a camera file name): {}", entry.path().display()),
        }
    }
    Ok(found)
}

pub fn organize(
    root: &Path,
    pattern: &FilePattern,
    fs: &dyn MediaFs,
) -> StitchResult<OrganizeReport> {
    let mut report = OrganizeReport::default();
    for (source, name) in find_source_clips(root, pattern)? {
        let dest_dir = name.day_dir(root);
        fs.create_dir_all(&dest_dir)?;
        let dest = resolve_free_name(&dest_dir, &name.time_token, &name.extension, |path| {
            fs.exists(path)
        });
        fs.move_file(&source, &dest)
            .map_err(|source_err| StitchError::Move {
                from: source.clone(),
                to: dest.clone(),
                source: source_err,
            })?;
        let relative = diff_paths(&dest, root).unwrap_or_else(|| dest.clone());
        debug!(
            "moved {} -> {}",
            source.file_name().unwrap_or_default().to_string_lossy(),
            relative.display()
        );
        report.moved.push(MovedClip {
            from: source,
            to: dest,
        });
    }
    Ok(report)
}
