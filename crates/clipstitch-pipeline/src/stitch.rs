use crate::error::StitchResult;
use crate::fsops::MediaFs;
use crate::naming::{
    clip_start_time, day_dir_date, is_stitch_temp, media_extension, resolve_free_name,
    STITCH_TEMP_PREFIX,
};
use crate::sequence::{check_homogeneity, group_sequences, sort_chronologically, Clip, Sequence};
use crate::tools::{ConcatRequest, MediaTools};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Single,
    Merged { output: PathBuf },
    ValidationFailed { details: String },
    MergeFailed { reason: String },
    /// Concat succeeded but removing sources or renaming the output did not;
    /// `temp` holds the merged file.
    CleanupFailed { reason: String, temp: PathBuf },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub first_start: NaiveDateTime,
    pub clips: Vec<PathBuf>,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone)]
pub struct DayReport {
    pub day_dir: PathBuf,
    pub clips_found: usize,
    pub skipped: Vec<PathBuf>,
    pub runs: Vec<RunReport>,
}

impl DayReport {
    fn empty(day_dir: &Path) -> Self {
        Self {
            day_dir: day_dir.to_path_buf(),
            clips_found: 0,
            skipped: Vec::new(),
            runs: Vec::new(),
        }
    }

    pub fn merged(&self) -> usize {
        self.runs
            .iter()
            .filter(|run| matches!(run.outcome, RunOutcome::Merged { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.runs
            .iter()
            .filter(|run| {
                matches!(
                    run.outcome,
                    RunOutcome::ValidationFailed { .. }
                        | RunOutcome::MergeFailed { .. }
                        | RunOutcome::CleanupFailed { .. }
                )
            })
            .count()
    }
}

pub fn stitch_day(
    day_dir: &Path,
    max_gap: f64,
    fs: &dyn MediaFs,
    tools: &dyn MediaTools,
) -> StitchResult<DayReport> {
    let Some(day) = day_dir_date(day_dir) else {
        debug!("not a calendar day directory: {}", day_dir.display());
        return Ok(DayReport::empty(day_dir));
    };

    let (mut clips, skipped) = discover_clips(day_dir, day, fs, tools)?;
    sort_chronologically(&mut clips);
    let clips_found = clips.len();

    let mut runs = Vec::new();
    for sequence in group_sequences(clips, max_gap) {
        let Some(first_start) = sequence.first_start() else {
            continue;
        };
        let clip_paths = sequence.paths();
        let outcome = process_run(day_dir, sequence, fs, tools);
        runs.push(RunReport {
            first_start,
            clips: clip_paths,
            outcome,
        });
    }

    Ok(DayReport {
        day_dir: day_dir.to_path_buf(),
        clips_found,
        skipped,
        runs,
    })
}

pub fn discover_clips(
    day_dir: &Path,
    day: NaiveDate,
    fs: &dyn MediaFs,
    tools: &dyn MediaTools,
) -> StitchResult<(Vec<Clip>, Vec<PathBuf>)> {
    let mut clips = Vec::new();
    let mut skipped = Vec::new();
    for path in fs.list_files(day_dir)? {
        if media_extension(&path).is_none() {
            continue;
        }
        if is_stitch_temp(&path) {
            warn!("ignoring leftover stitch output {}", path.display());
            skipped.push(path);
            continue;
        }
        let Some(start_time) = clip_start_time(day, &path) else {
            debug!("skip (no HHMMSS time in name): {}", path.display());
            skipped.push(path);
            continue;
        };
        match tools.duration(&path) {
            Ok(duration) => clips.push(Clip::new(path, start_time, duration)),
            Err(err) => {
                warn!("skipping clip: {err}");
                skipped.push(path);
            }
        }
    }
    Ok((clips, skipped))
}

fn process_run(
    day_dir: &Path,
    mut sequence: Sequence,
    fs: &dyn MediaFs,
    tools: &dyn MediaTools,
) -> RunOutcome {
    if !sequence.is_merge_candidate() {
        return RunOutcome::Single;
    }

    for clip in &mut sequence.clips {
        match tools.stream_signature(&clip.path) {
            Ok(signature) => clip.signature = Some(signature),
            Err(err) => warn!("stream format unavailable: {err}"),
        }
    }
    let start_token = start_token(&sequence);
    if let Err(mismatch) = check_homogeneity(&sequence) {
        warn!(
            "not stitching {} clips starting at {start_token}: {mismatch}",
            sequence.len()
        );
        return RunOutcome::ValidationFailed {
            details: mismatch.to_string(),
        };
    }

    info!(
        "Stitching {} clips starting at {start_token}",
        sequence.len()
    );
    merge_sequence(day_dir, &sequence, fs, tools)
}

fn start_token(sequence: &Sequence) -> String {
    sequence
        .first_start()
        .map(|start| start.format("%H%M%S").to_string())
        .unwrap_or_default()
}

/// Sources are only touched after concat succeeds.
pub fn merge_sequence(
    day_dir: &Path,
    sequence: &Sequence,
    fs: &dyn MediaFs,
    tools: &dyn MediaTools,
) -> RunOutcome {
    let token = start_token(sequence);
    let extension = sequence
        .clips
        .first()
        .and_then(|clip| media_extension(&clip.path))
        .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());
    let temp_stem = format!("{STITCH_TEMP_PREFIX}{token}");
    let temp_path = resolve_free_name(day_dir, &temp_stem, &extension, |path| fs.exists(path));

    let request = ConcatRequest {
        inputs: sequence.paths(),
        output: temp_path.clone(),
    };
    debug!("running concat -> {}", temp_path.display());
    if let Err(err) = tools.concat(&request) {
        error!("stitch at {token} failed, sources kept: {err}");
        return RunOutcome::MergeFailed {
            reason: err.to_string(),
        };
    }
    if !fs.exists(&temp_path) {
        error!("stitch at {token} produced no output, sources kept");
        return RunOutcome::MergeFailed {
            reason: format!("no output at {}", temp_path.display()),
        };
    }

    match replace_sources(day_dir, sequence, &temp_path, &token, &extension, fs) {
        Ok(output) => RunOutcome::Merged { output },
        Err(err) => {
            error!(
                "stitch at {token} left merged output in {}: {err}",
                temp_path.display()
            );
            RunOutcome::CleanupFailed {
                reason: err.to_string(),
                temp: temp_path,
            }
        }
    }
}

fn replace_sources(
    day_dir: &Path,
    sequence: &Sequence,
    temp_path: &Path,
    token: &str,
    extension: &str,
    fs: &dyn MediaFs,
) -> StitchResult<PathBuf> {
    for clip in &sequence.clips {
        if fs.remove_file(&clip.path)? {
            debug!("deleted source: {}", clip.file_name());
        } else {
            debug!("source already gone: {}", clip.file_name());
        }
    }

    let final_path = resolve_free_name(day_dir, token, extension, |path| fs.exists(path));
    fs.rename(temp_path, &final_path)?;
    debug!(
        "renamed {} -> {}",
        temp_path.display(),
        final_path.display()
    );
    Ok(final_path)
}
