//! Application settings
//!
//! Every field has a default, so a partial `settings.json` is valid. The file
//! is optional; without it the defaults below apply.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::downloader::progress::FinishPolicy;

pub const APP_DIR: &str = "media-downloader";
pub const SETTINGS_FILE: &str = "settings.json";

pub const ENV_YTDLP: &str = "MEDIA_DOWNLOADER_YTDLP";
pub const ENV_FFMPEG: &str = "MEDIA_DOWNLOADER_FFMPEG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Explicit yt-dlp binary; discovered when `None`
    pub yt_dlp_path: Option<PathBuf>,
    /// ffmpeg binary or the directory containing it
    pub ffmpeg_location: Option<PathBuf>,
    pub retries: u32,
    pub fragment_retries: u32,
    /// Seconds; `None` leaves the engine default
    pub socket_timeout: Option<u32>,
    /// Seconds allowed for a metadata request
    pub info_timeout_secs: u64,
    pub audio_codec: String,
    pub audio_bitrate_kbps: u32,
    pub video_container: String,
    /// Ask the engine to remux into `video_container` instead of renaming afterwards
    pub remux_video: bool,
    pub subtitle_source_format: String,
    pub subtitle_target_format: String,
    pub finish_policy: FinishPolicy,
    pub resolutions: Vec<String>,
    pub subtitle_languages: Vec<String>,
    pub default_download_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            ffmpeg_location: None,
            retries: 10,
            fragment_retries: 10,
            socket_timeout: Some(30),
            info_timeout_secs: 120,
            audio_codec: "mp3".to_string(),
            audio_bitrate_kbps: 192,
            video_container: "mp4".to_string(),
            remux_video: false,
            subtitle_source_format: "vtt".to_string(),
            subtitle_target_format: "srt".to_string(),
            finish_policy: FinishPolicy::KeepLast,
            resolutions: ["480", "720", "1080", "best"].map(String::from).to_vec(),
            subtitle_languages: ["en", "fr", "de", "rus"].map(String::from).to_vec(),
            default_download_dir: dirs::download_dir(),
        }
    }
}

impl Settings {
    /// Load from the user config dir, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;
        tracing::info!("Loaded settings from: {:?}", path);
        Ok(settings)
    }

    /// `<config_dir>/media-downloader/settings.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var(ENV_YTDLP).filter(|v| !v.trim().is_empty()) {
            self.yt_dlp_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var(ENV_FFMPEG).filter(|v| !v.trim().is_empty()) {
            self.ffmpeg_location = Some(PathBuf::from(path));
        }
    }
}
