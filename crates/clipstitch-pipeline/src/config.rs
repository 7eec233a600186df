use crate::error::{StitchError, StitchResult};
use crate::naming::{FilePattern, DEFAULT_SOURCE_GLOB};
use crate::tools::ToolMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GAP_SECONDS: f64 = 30.0;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    gap: Option<f64>,
    #[serde(default)]
    tools: RawToolsConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawToolsConfig {
    #[serde(default)]
    mode: Option<ToolMode>,
    #[serde(default)]
    ffmpeg_path: Option<PathBuf>,
    #[serde(default)]
    ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub pattern: Option<String>,
    pub gap: Option<f64>,
    pub tool_mode: Option<ToolMode>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolsConfig {
    pub mode: ToolMode,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct StitchConfig {
    pub root: PathBuf,
    pub pattern: FilePattern,
    pub gap_seconds: f64,
    pub tools: ToolsConfig,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            pattern: FilePattern::default(),
            gap_seconds: DEFAULT_GAP_SECONDS,
            tools: ToolsConfig {
                mode: ToolMode::default(),
                ffmpeg_path: None,
                ffprobe_path: None,
            },
        }
    }
}

impl StitchConfig {
    pub fn parse(toml_src: &str) -> StitchResult<Self> {
        let raw = parse_raw(toml_src)?;
        Self::build(raw, None, ConfigOverrides::default())
    }

    /// Defaults, then the optional config file, then `overrides`. For the
    /// tool mode, `CLIPSTITCH_MEDIA_TOOLS` sits between the file and the
    /// command line.
    pub fn resolve(config_path: Option<&Path>, overrides: ConfigOverrides) -> StitchResult<Self> {
        let (raw, base_dir) = match config_path {
            Some(path) => {
                let src = fs::read_to_string(path).map_err(|err| {
                    StitchError::Config(format!("read config {}: {err}", path.display()))
                })?;
                (parse_raw(&src)?, path.parent().map(Path::to_path_buf))
            }
            None => (RawConfig::default(), None),
        };
        Self::build(raw, base_dir.as_deref(), overrides)
    }

    fn build(
        raw: RawConfig,
        base_dir: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> StitchResult<Self> {
        let from_file = |path: Option<PathBuf>| path.map(|path| resolve_path(base_dir, path));

        let root = overrides
            .root
            .or_else(|| from_file(raw.root))
            .unwrap_or_else(|| PathBuf::from("."));
        let glob = overrides
            .pattern
            .or(raw.pattern)
            .unwrap_or_else(|| DEFAULT_SOURCE_GLOB.to_string());
        let pattern = FilePattern::new(&glob)?;
        let gap_seconds = overrides.gap.or(raw.gap).unwrap_or(DEFAULT_GAP_SECONDS);
        if !gap_seconds.is_finite() || gap_seconds < 0.0 {
            return Err(StitchError::Config(format!(
                "gap must be a non-negative number of seconds, got {gap_seconds}"
            )));
        }
        let mode = overrides
            .tool_mode
            .or_else(ToolMode::from_env)
            .or(raw.tools.mode)
            .unwrap_or_default();

        Ok(Self {
            root,
            pattern,
            gap_seconds,
            tools: ToolsConfig {
                mode,
                ffmpeg_path: overrides
                    .ffmpeg_path
                    .or_else(|| from_file(raw.tools.ffmpeg_path)),
                ffprobe_path: overrides
                    .ffprobe_path
                    .or_else(|| from_file(raw.tools.ffprobe_path)),
            },
        })
    }
}

fn parse_raw(toml_src: &str) -> StitchResult<RawConfig> {
    toml::from_str(toml_src).map_err(|err| StitchError::Config(format!("invalid config: {err}")))
}

fn resolve_path(base_dir: Option<&Path>, path: PathBuf) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = StitchConfig::parse("").expect("parse");
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.pattern.as_str(), DEFAULT_SOURCE_GLOB);
        assert_eq!(config.gap_seconds, DEFAULT_GAP_SECONDS);
        assert!(config.tools.ffmpeg_path.is_none());
    }

    #[test]
    fn config_file_fields_are_read() {
        let config = StitchConfig::parse(
            r#"
root = "/media/dji"
pattern = "DJI_*.[mM][kK][vV]"
gap = 12.5

[tools]
ffprobe_path = "/opt/ffmpeg/ffprobe"
"#,
        )
        .expect("parse");
        assert_eq!(config.root, PathBuf::from("/media/dji"));
        assert!(config.pattern.matches("DJI_1.MKV"));
        assert_eq!(config.gap_seconds, 12.5);
        assert_eq!(
            config.tools.ffprobe_path,
            Some(PathBuf::from("/opt/ffmpeg/ffprobe"))
        );
    }

    #[test]
    fn overrides_beat_file_and_relative_paths_follow_config_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("clipstitch.toml");
        fs::write(
            &config_path,
            "root = \"footage\"\ngap = 10\n[tools]\nffmpeg_path = \"bin/ffmpeg\"\n",
        )
        .expect("write config");

        let config = StitchConfig::resolve(
            Some(&config_path),
            ConfigOverrides {
                gap: Some(45.0),
                ..ConfigOverrides::default()
            },
        )
        .expect("resolve");
        assert_eq!(config.root, temp.path().join("footage"));
        assert_eq!(config.gap_seconds, 45.0);
        assert_eq!(
            config.tools.ffmpeg_path,
            Some(temp.path().join("bin/ffmpeg"))
        );
    }

    #[test]
    fn tool_mode_override_beats_config_file() {
        let raw = parse_raw("[tools]\nmode = \"ffmpeg\"\n").expect("parse");
        let config = StitchConfig::build(
            raw,
            None,
            ConfigOverrides {
                tool_mode: Some(ToolMode::Mock),
                ..ConfigOverrides::default()
            },
        )
        .expect("build");
        assert_eq!(config.tools.mode, ToolMode::Mock);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = StitchConfig::parse("gap = -1.0").unwrap_err();
        assert!(err.to_string().contains("non-negative"));
        assert!(StitchConfig::parse("pattern = \"DJI_[\"").is_err());
        assert!(StitchConfig::parse("unknown = 1").is_err());
    }
}
