//! Building a [`JobSpec`] from probed media metadata and user choices.
//!
//! The interactive part (asking questions) lives in the shell; this module
//! holds the rules: defaults, format selection, metadata tagging and trim
//! timestamps.

use std::path::PathBuf;
use std::sync::OnceLock;

use deunicode::deunicode;
use regex::Regex;
use thiserror::Error;

use crate::backend::MediaInfo;
use crate::job::JobSpec;

/// Post-process options offered by `add`, with their help text.
pub const EXTRA_OPTIONS: &[(&str, &str)] = &[("trim", "cut parts from start or end of video")];

const AUDIO_FORMAT: &str = "bestaudio/best";
const VIDEO_FORMAT: &str = "best";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("timestamp must be of format [[HH:]MM:]SS[.fraction], got '{0}'")]
    InvalidTimestamp(String),
}

/// `[[HH:]MM:]SS[.fraction]`, as accepted by ffmpeg's `-ss`/`-to`.
pub fn is_valid_timestamp(s: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:(?:[0-9]{1,2}:)?[0-9]{1,2}:)?[0-9]{1,2}(?:\.[0-9]+)?$")
                .expect("timestamp pattern is valid")
        })
        .is_match(s)
}

/// Optional start/end cut points, applied as transcode input options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimRange {
    start: Option<String>,
    end: Option<String>,
}

impl TrimRange {
    /// Empty strings mean "not set".
    pub fn new(start: Option<&str>, end: Option<&str>) -> Result<Self, OptionsError> {
        Ok(Self {
            start: checked_timestamp(start)?,
            end: checked_timestamp(end)?,
        })
    }

    pub fn input_options(&self) -> Vec<String> {
        let mut opts = Vec::new();
        if let Some(start) = &self.start {
            opts.extend(["-ss".to_string(), start.clone()]);
        }
        if let Some(end) = &self.end {
            opts.extend(["-to".to_string(), end.clone()]);
        }
        opts
    }
}

fn checked_timestamp(value: Option<&str>) -> Result<Option<String>, OptionsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if is_valid_timestamp(v) => Ok(Some(v.to_string())),
        Some(v) => Err(OptionsError::InvalidTimestamp(v.to_string())),
    }
}

/// Whether to default to audio-only: true for sources categorized as music.
pub fn default_audio_only(info: &MediaInfo) -> bool {
    info.categories
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|c| c == "Music")
}

/// Alphanumeric words of `s`, transliterated to ASCII and joined by single
/// spaces.
pub fn plain_words(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(deunicode)
        .flat_map(|w| {
            w.split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Suggested destination: the title's plain words plus `.mp3` or `.mp4`.
pub fn default_destination(info: &MediaInfo, audio_only: bool) -> String {
    let title = plain_words(info.title.as_deref().unwrap_or_default());
    let ext = if audio_only { "mp3" } else { "mp4" };
    format!("{}.{}", title, ext)
}

/// Distinct plain words of the descriptive fields, for prompt suggestions.
pub fn suggestion_words(info: &MediaInfo) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for field in [&info.title, &info.alt_title, &info.creator, &info.track, &info.artist] {
        for word in plain_words(field.as_deref().unwrap_or_default()).split(' ') {
            if !word.is_empty() && !words.iter().any(|w| w == word) {
                words.push(word.to_string());
            }
        }
    }
    words
}

/// `-metadata key=value` output options for the tags the source provides.
pub fn metadata_options(info: &MediaInfo) -> Vec<String> {
    let year = info.release_year.map(|y| y.to_string());
    let tags = [
        ("track", info.track.as_deref()),
        ("artist", info.artist.as_deref()),
        ("title", info.title.as_deref()),
        ("album", info.album.as_deref()),
        ("year", year.as_deref()),
        ("genre", info.genre.as_deref()),
    ];
    tags.into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .flat_map(|(key, value)| ["-metadata".to_string(), format!("{}={}", key, value)])
        .collect()
}

/// Accumulates the choices made while adding a job.
#[derive(Debug, Clone)]
pub struct JobOptions {
    audio_only: bool,
    destination: PathBuf,
    input_options: Vec<String>,
    output_options: Vec<String>,
}

impl JobOptions {
    /// Start from the metadata defaults; `destination` overrides the
    /// suggested one when given.
    pub fn new(info: &MediaInfo, audio_only: bool, destination: Option<PathBuf>) -> Self {
        let destination =
            destination.unwrap_or_else(|| PathBuf::from(default_destination(info, audio_only)));
        Self {
            audio_only,
            destination,
            input_options: Vec::new(),
            output_options: metadata_options(info),
        }
    }

    pub fn audio_only(&self) -> bool {
        self.audio_only
    }

    pub fn destination(&self) -> &std::path::Path {
        &self.destination
    }

    pub fn add_trim(&mut self, trim: &TrimRange) {
        self.input_options.extend(trim.input_options());
    }

    pub fn into_spec(self, source: impl Into<String>) -> JobSpec {
        JobSpec {
            source: source.into(),
            destination: self.destination,
            format: (if self.audio_only { AUDIO_FORMAT } else { VIDEO_FORMAT }).to_string(),
            input_options: self.input_options,
            output_options: self.output_options,
        }
    }
}
