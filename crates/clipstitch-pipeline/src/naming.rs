use crate::error::{StitchError, StitchResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use glob::Pattern;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_SOURCE_GLOB: &str = "DJI_*";
pub const STITCH_TEMP_PREFIX: &str = "stitched_";

const SOURCE_NAME_PATTERN: &str =
    r"(?i)^DJI_(?P<date>\d{8})(?P<time>\d{6})_\d{4}_D\.(?P<ext>mp4|mkv)$";
const MEDIA_EXTENSIONS: [&str; 2] = ["mp4", "mkv"];

fn source_name_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(SOURCE_NAME_PATTERN).expect("source name pattern compiles"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub date: NaiveDate,
    pub time_token: String,
    pub extension: String,
}

impl SourceName {
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = source_name_regex().captures(file_name)?;
        let date = &caps["date"];
        let year = date[0..4].parse().ok()?;
        let month = date[4..6].parse().ok()?;
        let day = date[6..8].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time_token = caps["time"].to_string();
        parse_time_token(&time_token)?;
        Some(Self {
            date,
            time_token,
            extension: caps["ext"].to_ascii_lowercase(),
        })
    }

    pub fn day_dir(&self, root: &Path) -> PathBuf {
        root.join(self.date.format("%Y").to_string())
            .join(self.date.format("%m").to_string())
            .join(self.date.format("%d").to_string())
    }

    pub fn organized_name(&self) -> String {
        format!("{}.{}", self.time_token, self.extension)
    }
}

#[derive(Debug, Clone)]
pub struct FilePattern {
    pattern: Pattern,
}

impl FilePattern {
    pub fn new(glob: &str) -> StitchResult<Self> {
        let pattern = Pattern::new(glob).map_err(|err| StitchError::Pattern {
            pattern: glob.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for FilePattern {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_GLOB).expect("default glob compiles")
    }
}

pub fn parse_time_token(token: &str) -> Option<NaiveTime> {
    if token.len() != 6 || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let hour = token[0..2].parse().ok()?;
    let minute = token[2..4].parse().ok()?;
    let second = token[4..6].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

pub fn time_token(stem: &str) -> Option<&str> {
    stem.split('_')
        .find(|segment| segment.len() == 6 && segment.bytes().all(|byte| byte.is_ascii_digit()))
}

pub fn day_dir_date(day_dir: &Path) -> Option<NaiveDate> {
    let day = component_number(day_dir)?;
    let month_dir = day_dir.parent()?;
    let month = component_number(month_dir)?;
    let year = component_number(month_dir.parent()?)?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn component_number(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    if name.is_empty() || !name.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

pub fn clip_start_time(day: NaiveDate, path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    let time = parse_time_token(time_token(stem)?)?;
    Some(day.and_time(time))
}

pub fn media_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

pub fn is_stitch_temp(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(STITCH_TEMP_PREFIX))
}

pub fn resolve_free_name<F>(dir: &Path, stem: &str, ext: &str, exists: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let mut candidate = dir.join(format!("{stem}.{ext}"));
    let mut counter = 1u32;
    while exists(&candidate) {
        candidate = dir.join(format!("{stem}_{counter}.{ext}"));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn source_name_extracts_date_time_and_extension() {
        let name = SourceName::parse("DJI_20240315103000_0001_D.MP4").expect("parse");
        assert_eq!(name.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(name.time_token, "103000");
        assert_eq!(name.extension, "mp4");
        assert_eq!(name.organized_name(), "103000.mp4");
        assert_eq!(
            name.day_dir(Path::new("/media")),
            PathBuf::from("/media/2024/03/15")
        );
    }

    #[test]
    fn source_name_rejects_other_layouts() {
        assert!(SourceName::parse("DJI_20240315103000_0001_D.mov").is_none());
        assert!(SourceName::parse("DJI_20240315103000_001_D.mp4").is_none());
        assert!(SourceName::parse("103000.mp4").is_none());
        assert!(SourceName::parse("DJI_20241340103000_0001_D.mp4").is_none());
        assert!(SourceName::parse("DJI_20240315256000_0001_D.mkv").is_none());
    }

    #[test]
    fn glob_translation_handles_classes_and_wildcards() {
        let pattern = FilePattern::new("DJI_*.[mM][pP]4").expect("pattern");
        assert!(pattern.matches("DJI_20240315103000_0001_D.mp4"));
        assert!(pattern.matches("DJI_x.MP4"));
        assert!(!pattern.matches("DJI_x.mkv"));
        assert!(!pattern.matches("xDJI_.mp4"));

        let negated = FilePattern::new("clip?.[!a]").expect("pattern");
        assert!(negated.matches("clip1.b"));
        assert!(!negated.matches("clip1.a"));
        assert!(FilePattern::new("a.b+c").expect("pattern").matches("a.b+c"));
        assert!(FilePattern::new("DJI_[0-9").is_err());
    }

    #[test]
    fn glob_ranges_ending_in_dash_match_the_dash() {
        let pattern = FilePattern::new("[+--]x").expect("pattern");
        assert!(pattern.matches("-x"));
        assert!(pattern.matches(",x"));
        assert!(!pattern.matches("ax"));
        assert_eq!(pattern.as_str(), "[+--]x");
    }

    #[test]
    fn time_token_picks_first_six_digit_segment() {
        assert_eq!(time_token("103000"), Some("103000"));
        assert_eq!(time_token("103000_2"), Some("103000"));
        assert_eq!(time_token("clip_1030_103000"), Some("103000"));
        assert_eq!(time_token("1030000"), None);
        assert_eq!(time_token("notes"), None);
    }

    #[test]
    fn clip_start_time_combines_day_and_token() {
        let day = day_dir_date(Path::new("/media/2024/03/15")).expect("day");
        let start = clip_start_time(day, Path::new("/media/2024/03/15/103000_1.mp4"))
            .expect("start");
        assert_eq!(start.to_string(), "2024-03-15 10:30:00");
        assert!(clip_start_time(day, Path::new("/media/2024/03/15/996000.mp4")).is_none());
        assert!(day_dir_date(Path::new("/media/2024/02/30")).is_none());
        assert!(day_dir_date(Path::new("/media/2024/xx/01")).is_none());
    }

    #[test]
    fn free_name_appends_first_unused_counter() {
        let taken: HashSet<PathBuf> = ["/d/103000.mp4", "/d/103000_1.mp4"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let resolved = resolve_free_name(Path::new("/d"), "103000", "mp4", |path| {
            taken.contains(path)
        });
        assert_eq!(resolved, PathBuf::from("/d/103000_2.mp4"));
        let fresh = resolve_free_name(Path::new("/d"), "110000", "mkv", |path| {
            taken.contains(path)
        });
        assert_eq!(fresh, PathBuf::from("/d/110000.mkv"));
    }

    #[test]
    fn media_extension_is_case_insensitive() {
        assert_eq!(media_extension(Path::new("a.MKV")).as_deref(), Some("mkv"));
        assert_eq!(media_extension(Path::new("a.Mp4")).as_deref(), Some("mp4"));
        assert!(media_extension(Path::new("a.mov")).is_none());
        assert!(is_stitch_temp(Path::new("/d/stitched_103000.mp4")));
    }
}
