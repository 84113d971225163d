// FormatSelector - quality selector to yt-dlp format expression
//
// The UI offers "best", a handful of heights and, for social platforms, no
// selector at all. The string is parsed once into `Quality` and the format
// expression is derived from that.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::MediaError;
use super::models::MediaMode;

/// Placeholder shown by the resolution menu before a choice is made
pub const UNSELECTED: &str = "Select";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// Best video plus best audio
    Best,
    /// Single best muxed stream
    Unconstrained,
    /// Best streams with height at or below the bound
    MaxHeight(u32),
}

impl FromStr for Quality {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unconstrained);
        }
        if trimmed.eq_ignore_ascii_case("best") {
            return Ok(Self::Best);
        }

        // "720" and "720p" are both accepted
        let digits = trimmed.strip_suffix(['p', 'P']).unwrap_or(trimmed);
        match digits.parse::<u32>() {
            Ok(h) if h > 0 => Ok(Self::MaxHeight(h)),
            _ => Err(MediaError::InvalidQuality(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => write!(f, "best"),
            Self::Unconstrained => write!(f, "any"),
            Self::MaxHeight(h) => write!(f, "{}p", h),
        }
    }
}

/// Format selection policy
pub struct FormatSelector;

impl FormatSelector {
    /// Format expression for a video download
    pub fn video_format(quality: Quality) -> String {
        match quality {
            Quality::Best => "bestvideo+bestaudio/best".to_string(),
            Quality::Unconstrained => "best".to_string(),
            Quality::MaxHeight(h) => {
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
            }
        }
    }

    /// Audio downloads ignore the quality selector
    pub fn audio_format() -> String {
        "bestaudio".to_string()
    }

    pub fn format_for(mode: MediaMode, quality: Quality) -> String {
        match mode {
            MediaMode::Video => Self::video_format(quality),
            MediaMode::Audio => Self::audio_format(),
        }
    }
}
