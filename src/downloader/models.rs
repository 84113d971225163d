// Common data models for the download flow

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::format_selector::Quality;
use super::utils::sanitize_title;

/// A query resolved to one downloadable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    /// Sanitized title, used as the file stem
    pub title: String,
    /// Canonical webpage URL
    pub url: String,
}

impl ResolvedItem {
    pub fn new(title: &str, url: impl Into<String>) -> Self {
        Self {
            title: sanitize_title(title),
            url: url.into(),
        }
    }
}

/// Playlist title plus its entries in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistManifest {
    pub title: String,
    pub entries: Vec<ResolvedItem>,
}

impl PlaylistManifest {
    /// `<title>.txt`
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.title)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.title.as_str()).collect()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.url.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    Video,
    Audio,
}

impl fmt::Display for MediaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// One item to fetch. Lives for a single invocation.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub target: ResolvedItem,
    pub mode: MediaMode,
    pub quality: Quality,
    pub destination_dir: PathBuf,
    pub subtitle_language: Option<String>,
}

impl DownloadJob {
    pub fn new(
        target: ResolvedItem,
        mode: MediaMode,
        quality: Quality,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        // Titles from the resolvers are already clean; this covers hand-built items.
        let target = ResolvedItem {
            title: sanitize_title(&target.title),
            url: target.url,
        };
        Self {
            target,
            mode,
            quality,
            destination_dir: destination_dir.into(),
            subtitle_language: None,
        }
    }

    pub fn with_subtitle_language(mut self, language: Option<String>) -> Self {
        self.subtitle_language = language.filter(|l| !l.trim().is_empty());
        self
    }

    /// `destination_dir/title`, without extension
    pub fn output_stem(&self) -> PathBuf {
        self.destination_dir.join(&self.target.title)
    }

    pub fn output_path(&self, ext: &str) -> PathBuf {
        with_extension(&self.output_stem(), ext)
    }
}

/// Appends `.ext` to a stem. Titles may contain dots, so `Path::with_extension`
/// would cut them off.
pub fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut os = stem.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
}

/// One progress callback from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub status: ProgressStatus,
}

impl ProgressSample {
    /// Percentage when both counts are known and non-zero
    pub fn percent(&self) -> Option<f64> {
        match (self.downloaded_bytes, self.total_bytes) {
            (Some(done), Some(total)) if done > 0 && total > 0 => {
                Some(done as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }
}

/// What the shell receives over the progress channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgressEvent {
    ItemStarted { title: String },
    Percent { value: f64 },
}

/// Per-batch outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_sanitizes_title() {
        let item = ResolvedItem {
            title: "a/b: c".to_string(),
            url: "https://x".to_string(),
        };
        let job = DownloadJob::new(item, MediaMode::Audio, Quality::Best, "/tmp/d");
        assert_eq!(job.target.title, "a_b_ c");
        assert_eq!(job.output_path("mp3"), PathBuf::from("/tmp/d/a_b_ c.mp3"));
    }

    #[test]
    fn test_with_extension_keeps_dots() {
        let p = with_extension(Path::new("/d/Vol. 2"), "mp4");
        assert_eq!(p, PathBuf::from("/d/Vol. 2.mp4"));
    }

    #[test]
    fn test_percent_requires_known_counts() {
        let mut s = ProgressSample {
            downloaded_bytes: Some(50),
            total_bytes: Some(200),
            status: ProgressStatus::Downloading,
        };
        assert_eq!(s.percent(), Some(25.0));
        s.total_bytes = None;
        assert_eq!(s.percent(), None);
        s.total_bytes = Some(200);
        s.downloaded_bytes = Some(0);
        assert_eq!(s.percent(), None);
    }

    #[test]
    fn test_blank_subtitle_language_is_none() {
        let item = ResolvedItem::new("t", "u");
        let job = DownloadJob::new(item, MediaMode::Video, Quality::Best, "/d")
            .with_subtitle_language(Some("  ".into()));
        assert_eq!(job.subtitle_language, None);
    }
}
