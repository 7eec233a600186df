use crate::tools::StreamSignature;
use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub path: PathBuf,
    pub start_time: NaiveDateTime,
    pub duration_seconds: f64,
    pub signature: Option<StreamSignature>,
}

impl Clip {
    pub fn new(path: PathBuf, start_time: NaiveDateTime, duration_seconds: f64) -> Self {
        Self {
            path,
            start_time,
            duration_seconds,
            signature: None,
        }
    }

    /// `None` when start plus duration falls outside the representable range.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        let millis = (self.duration_seconds * 1000.0).round() as i64;
        self.start_time
            .checked_add_signed(Duration::try_milliseconds(millis)?)
    }

    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn gap_seconds(prev: &Clip, next: &Clip) -> f64 {
    let between = next.start_time.signed_duration_since(prev.start_time);
    between.num_milliseconds() as f64 / 1000.0 - prev.duration_seconds
}

pub fn sort_chronologically(clips: &mut [Clip]) {
    clips.sort_by_key(|clip| clip.start_time);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub clips: Vec<Clip>,
}

impl Sequence {
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn is_merge_candidate(&self) -> bool {
        self.clips.len() >= 2
    }

    pub fn first_start(&self) -> Option<NaiveDateTime> {
        self.clips.first().map(|clip| clip.start_time)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.clips.iter().map(|clip| clip.path.clone()).collect()
    }
}

// A gap of exactly `max_gap` joins.
pub fn group_sequences(clips: Vec<Clip>, max_gap: f64) -> Vec<Sequence> {
    let mut sequences = Vec::new();
    let mut current: Vec<Clip> = Vec::new();
    for clip in clips {
        if let Some(prev) = current.last() {
            let gap = gap_seconds(prev, &clip);
            debug!(
                "gap: {}@{} -> {}@{} = {:.1}s",
                prev.file_name(),
                prev.end_time().unwrap_or(prev.start_time).time(),
                clip.file_name(),
                clip.start_time.time(),
                gap
            );
            let joins = gap <= max_gap;
            if !joins {
                sequences.push(Sequence {
                    clips: std::mem::take(&mut current),
                });
            }
        }
        current.push(clip);
    }
    if !current.is_empty() {
        sequences.push(Sequence { clips: current });
    }
    sequences
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureMismatch {
    pub entries: Vec<(PathBuf, Option<StreamSignature>)>,
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream format mismatch")?;
        for (path, signature) in &self.entries {
            match signature {
                Some(signature) => write!(f, "\n  {}: {signature}", display_name(path))?,
                None => write!(f, "\n  {}: unprobed", display_name(path))?,
            }
        }
        Ok(())
    }
}

pub fn check_homogeneity(sequence: &Sequence) -> Result<(), SignatureMismatch> {
    let reference = sequence.clips.first().and_then(|clip| clip.signature.as_ref());
    let consistent = reference.is_some()
        && sequence
            .clips
            .iter()
            .all(|clip| clip.signature.as_ref() == reference);
    if consistent {
        return Ok(());
    }
    Err(SignatureMismatch {
        entries: sequence
            .clips
            .iter()
            .map(|clip| (clip.path.clone(), clip.signature.clone()))
            .collect(),
    })
}
