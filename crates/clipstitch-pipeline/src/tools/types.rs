use crate::error::{StitchError, StitchResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const TOOL_MODE_ENV: &str = "CLIPSTITCH_MEDIA_TOOLS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSignature {
    pub codec: String,
    pub pixel_format: String,
    pub color_transfer: String,
}

impl fmt::Display for StreamSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "codec={} pix_fmt={} color_transfer={}",
            self.codec, self.pixel_format, self.color_transfer
        )
    }
}

#[derive(Debug, Clone)]
pub struct ConcatRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

pub trait MediaProbe {
    fn duration(&self, path: &Path) -> StitchResult<f64>;
    fn stream_signature(&self, path: &Path) -> StitchResult<StreamSignature>;
}

pub trait Concatenator {
    /// Stream-copies `inputs` into `output`. On error no output file is left behind.
    fn concat(&self, request: &ConcatRequest) -> StitchResult<()>;
}

pub trait MediaTools: MediaProbe + Concatenator {}

impl<T: MediaProbe + Concatenator + ?Sized> MediaTools for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    #[default]
    Ffmpeg,
    Mock,
}

impl ToolMode {
    pub fn from_env() -> Option<Self> {
        env::var(TOOL_MODE_ENV).ok()?.parse().ok()
    }
}

impl FromStr for ToolMode {
    type Err = StitchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "ffmpeg" => Ok(Self::Ffmpeg),
            "mock" => Ok(Self::Mock),
            other => Err(StitchError::Config(format!(
                "unknown tool mode {other:?} (expected ffmpeg or mock)"
            ))),
        }
    }
}
