use crate::error::{StitchError, StitchResult};
use crate::tools::types::{ConcatRequest, Concatenator, MediaProbe, StreamSignature};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockClip {
    pub duration: f64,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    #[serde(default = "default_color_transfer")]
    pub color_transfer: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fail_concat: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

fn default_codec() -> String {
    "h264".to_string()
}

fn default_pix_fmt() -> String {
    "yuv420p".to_string()
}

fn default_color_transfer() -> String {
    "bt709".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl MockClip {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
            color_transfer: default_color_transfer(),
            fail_concat: false,
            sources: Vec::new(),
        }
    }

    pub fn signature(&self) -> StreamSignature {
        StreamSignature {
            codec: self.codec.clone(),
            pixel_format: self.pix_fmt.clone(),
            color_transfer: self.color_transfer.clone(),
        }
    }

    pub fn read(path: &Path) -> StitchResult<Self> {
        let payload = fs::read_to_string(path)
            .map_err(|err| StitchError::probe(path, format!("read mock clip: {err}")))?;
        serde_json::from_str(&payload)
            .map_err(|err| StitchError::probe(path, format!("parse mock clip: {err}")))
    }

    pub fn write(&self, path: &Path) -> StitchResult<()> {
        let payload = serde_json::to_string_pretty(self)
            .map_err(|err| StitchError::Io(std::io::Error::other(err)))?;
        fs::write(path, payload)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockMediaTools;

impl MockMediaTools {
    pub fn new() -> Self {
        Self
    }
}

impl MediaProbe for MockMediaTools {
    fn duration(&self, path: &Path) -> StitchResult<f64> {
        let clip = MockClip::read(path)?;
        if clip.duration.is_finite() && clip.duration >= 0.0 {
            Ok(clip.duration)
        } else {
            Err(StitchError::probe(
                path,
                format!("invalid duration: {}", clip.duration),
            ))
        }
    }

    fn stream_signature(&self, path: &Path) -> StitchResult<StreamSignature> {
        Ok(MockClip::read(path)?.signature())
    }
}

impl Concatenator for MockMediaTools {
    fn concat(&self, request: &ConcatRequest) -> StitchResult<()> {
        let mut clips = Vec::new();
        for input in &request.inputs {
            let clip = MockClip::read(input).map_err(|err| StitchError::Concat {
                reason: err.to_string(),
            })?;
            if clip.fail_concat {
                return Err(StitchError::Concat {
                    reason: format!("mock concat refused {}", input.display()),
                });
            }
            clips.push((input, clip));
        }
        let (_, first) = clips.first().ok_or_else(|| StitchError::Concat {
            reason: "no inputs".to_string(),
        })?;
        let mut merged = MockClip {
            duration: 0.0,
            sources: Vec::new(),
            ..first.clone()
        };
        for (input, clip) in &clips {
            merged.duration += clip.duration;
            merged.sources.push(
                input
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        merged.write(&request.output)
    }
}
