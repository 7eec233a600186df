use crate::config::StitchConfig;
use crate::error::StitchResult;
use crate::fsops::MediaFs;
use crate::naming::FilePattern;
use crate::organize::{organize, OrganizeReport};
use crate::stitch::{stitch_day, DayReport};
use crate::tools::MediaTools;
use pathdiff::diff_paths;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub pattern: FilePattern,
    pub gap_seconds: f64,
}

impl From<&StitchConfig> for RunOptions {
    fn from(config: &StitchConfig) -> Self {
        Self {
            root: config.root.clone(),
            pattern: config.pattern.clone(),
            gap_seconds: config.gap_seconds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailedDay {
    pub day_dir: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub organized: OrganizeReport,
    pub days: Vec<DayReport>,
    pub failed_days: Vec<FailedDay>,
}

impl RunSummary {
    pub fn organized_count(&self) -> usize {
        self.organized.count()
    }

    pub fn stitched(&self) -> usize {
        self.days.iter().map(DayReport::merged).sum()
    }
}

pub fn run(
    options: &RunOptions,
    fs: &dyn MediaFs,
    tools: &dyn MediaTools,
) -> StitchResult<RunSummary> {
    let organized = organize(&options.root, &options.pattern, fs)?;

    let mut days = Vec::new();
    let mut failed_days = Vec::new();
    for day_dir in day_directories(&options.root, fs)? {
        let label = diff_paths(&day_dir, &options.root).unwrap_or_else(|| day_dir.clone());
        match stitch_day(&day_dir, options.gap_seconds, fs, tools) {
            Ok(report) => {
                if report.merged() > 0 {
                    debug!("{} stitched in {}", report.merged(), label.display());
                }
                days.push(report);
            }
            Err(err) => {
                error!("stitching {} stopped: {err}", label.display());
                failed_days.push(FailedDay {
                    day_dir,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(RunSummary {
        organized,
        days,
        failed_days,
    })
}

pub fn day_directories(root: &Path, fs: &dyn MediaFs) -> StitchResult<Vec<PathBuf>> {
    let mut days = Vec::new();
    for year in numeric_dirs(root, fs)? {
        for month in numeric_dirs(&year, fs)? {
            days.extend(numeric_dirs(&month, fs)?);
        }
    }
    Ok(days)
}

fn numeric_dirs(dir: &Path, fs: &dyn MediaFs) -> StitchResult<Vec<PathBuf>> {
    Ok(fs
        .list_dirs(dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
        })
        .collect())
}
