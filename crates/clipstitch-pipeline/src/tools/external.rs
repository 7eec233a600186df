use crate::error::{StitchError, StitchResult};
use crate::tools::types::{ConcatRequest, Concatenator, MediaProbe, StreamSignature};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

pub const FFMPEG_PATH_ENV: &str = "CLIPSTITCH_FFMPEG";
pub const FFPROBE_PATH_ENV: &str = "CLIPSTITCH_FFPROBE";

const PROBE_ENTRIES: &str = "stream=codec_name,pix_fmt,color_transfer:format=duration";
const UNKNOWN_FIELD: &str = "unknown";

#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    verbose: bool,
}

impl FfmpegTools {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            verbose: false,
        }
    }

    /// Resolves each binary from the explicit path, then its env override, then `PATH`.
    pub fn detect(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> StitchResult<Self> {
        let ffmpeg = locate_tool("ffmpeg", ffmpeg, FFMPEG_PATH_ENV)?;
        let ffprobe = locate_tool("ffprobe", ffprobe, FFPROBE_PATH_ENV)?;
        Ok(Self::new(ffmpeg, ffprobe))
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    pub fn preflight(&self) -> StitchResult<()> {
        for tool in [&self.ffmpeg, &self.ffprobe] {
            let status = Command::new(tool)
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|err| {
                    StitchError::Tool(format!(
                        "{} not runnable: {err}. Install FFmpeg and ensure it's in PATH.",
                        tool.display()
                    ))
                })?;
            if !status.success() {
                return Err(StitchError::Tool(format!(
                    "{} -version failed (status={status})",
                    tool.display()
                )));
            }
        }
        Ok(())
    }

    fn probe(&self, path: &Path) -> StitchResult<ProbeOutput> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0", "-show_entries"])
            .arg(PROBE_ENTRIES)
            .args(["-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| {
                StitchError::probe(path, format!("failed to run {}: {err}", self.ffprobe.display()))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StitchError::probe(
                path,
                format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        parse_probe_output(&output.stdout).map_err(|reason| StitchError::probe(path, reason))
    }
}

impl MediaProbe for FfmpegTools {
    fn duration(&self, path: &Path) -> StitchResult<f64> {
        let probe = self.probe(path)?;
        probe_duration(&probe).map_err(|reason| StitchError::probe(path, reason))
    }

    fn stream_signature(&self, path: &Path) -> StitchResult<StreamSignature> {
        let probe = self.probe(path)?;
        probe_signature(&probe).map_err(|reason| StitchError::probe(path, reason))
    }
}

impl Concatenator for FfmpegTools {
    fn concat(&self, request: &ConcatRequest) -> StitchResult<()> {
        if request.inputs.is_empty() {
            return Err(StitchError::Concat {
                reason: "no inputs".to_string(),
            });
        }
        let mut list = tempfile::Builder::new()
            .prefix("clipstitch-")
            .suffix(".txt")
            .tempfile()?;
        let mut contents = String::new();
        for input in &request.inputs {
            let absolute = fs::canonicalize(input).map_err(|err| StitchError::Concat {
                reason: format!("resolve {}: {err}", input.display()),
            })?;
            contents.push_str(&concat_list_line(&absolute));
            contents.push('\n');
        }
        list.write_all(contents.as_bytes())?;
        list.flush()?;
        debug!("concat list {}:\n{}", list.path().display(), contents.trim_end());

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-nostdin", "-f", "concat", "-safe", "0", "-i"])
            .arg(list.path())
            .args(["-c", "copy", "-y"]);
        if !self.verbose {
            cmd.args(["-loglevel", "error"]);
        }
        cmd.arg(&request.output).stdin(Stdio::null());

        let result = cmd.output();
        let failure = match result {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => format!(
                "{} exited with {}: {}",
                self.ffmpeg.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(err) => format!("failed to run {}: {err}", self.ffmpeg.display()),
        };
        if request.output.exists() {
            fs::remove_file(&request.output)?;
        }
        Err(StitchError::Concat { reason: failure })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    pix_fmt: Option<String>,
    #[serde(default)]
    color_transfer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

fn parse_probe_output(stdout: &[u8]) -> Result<ProbeOutput, String> {
    serde_json::from_slice(stdout).map_err(|err| format!("invalid ffprobe json: {err}"))
}

fn probe_duration(probe: &ProbeOutput) -> Result<f64, String> {
    if probe.streams.is_empty() {
        return Err("no video stream".to_string());
    }
    let raw = probe
        .format
        .as_ref()
        .and_then(|format| format.duration.as_deref())
        .ok_or_else(|| "duration missing".to_string())?;
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {raw}"))?;
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(format!("invalid duration: {raw}"))
    }
}

fn probe_signature(probe: &ProbeOutput) -> Result<StreamSignature, String> {
    let stream = probe
        .streams
        .first()
        .ok_or_else(|| "no video stream".to_string())?;
    let field = |value: &Option<String>| {
        value
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
    };
    Ok(StreamSignature {
        codec: field(&stream.codec_name),
        pixel_format: field(&stream.pix_fmt),
        color_transfer: field(&stream.color_transfer),
    })
}

fn concat_list_line(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{escaped}'")
}

fn locate_tool(name: &str, explicit: Option<&Path>, env_key: &str) -> StitchResult<PathBuf> {
    let override_path = explicit
        .map(PathBuf::from)
        .or_else(|| env::var_os(env_key).map(PathBuf::from));
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path);
        }
        return Err(StitchError::Tool(format!(
            "{name} path is not a file: {}",
            path.display()
        )));
    }
    find_on_path(name).ok_or_else(|| {
        StitchError::Tool(format!(
            "{name} not found. Install FFmpeg and ensure it's in PATH."
        ))
    })
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let candidate = dir.join(format!("{name}.exe"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}
