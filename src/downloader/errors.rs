// Error types for resolution and download operations

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Search query returned zero entries
    NoResults(String),

    /// Query or URL could not be matched to an item
    Resolution(String),

    /// Playlist metadata unavailable
    PlaylistFetch(String),

    /// Subtitles requested without a language
    MissingLanguage,

    /// Requested language track does not exist
    SubtitleNotFound(String),

    /// Subtitle file missing after the engine reported success
    SubtitleDownloadFailed(String),

    /// Engine-level transfer failure (network, format selection, ...)
    Download(String),

    /// yt-dlp or ffmpeg not found
    ToolNotFound(String),

    /// Quality selector could not be parsed
    InvalidQuality(String),

    /// Engine option set rejected at construction time
    InvalidOptions(String),

    /// Local filesystem failure
    Io(String),

    /// Stopped through the cancellation signal
    Cancelled,

    /// Anything else
    Unexpected(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResults(query) => write!(f, "No results found for query: {}", query),
            Self::Resolution(msg) => write!(f, "Could not resolve link: {}", msg),
            Self::PlaylistFetch(_) => {
                write!(f, "There was an error while downloading the playlist.")
            }
            Self::MissingLanguage => write!(f, "Subtitles language not selected."),
            Self::SubtitleNotFound(lang) => write!(f, "No subtitles found in {}.", lang),
            Self::SubtitleDownloadFailed(lang) => {
                write!(f, "Subtitles download failed for {}.", lang)
            }
            Self::Download(msg) => write!(f, "Download error: {}", msg),
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::InvalidQuality(value) => write!(f, "Invalid video resolution: {}", value),
            Self::InvalidOptions(msg) => write!(f, "Invalid download options: {}", msg),
            Self::Io(msg) => write!(f, "File error: {}", msg),
            Self::Cancelled => write!(f, "Download cancelled"),
            Self::Unexpected(msg) => write!(f, "An error occurred: {}", msg),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// Engine stderr is classified the same way whether it came from an info
// request or a transfer. Only the first `ERROR:` line is kept when present.
impl From<String> for MediaError {
    fn from(s: String) -> Self {
        let detail = s
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("ERROR:"))
            .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
            .unwrap_or_else(|| s.trim().to_string());

        if s.contains("command not found") || s.contains("No such file or directory") {
            return Self::ToolNotFound(detail);
        }

        if s.contains("Unsupported URL") || s.contains("is not a valid URL") {
            return Self::Resolution(detail);
        }

        Self::Download(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_line_is_extracted() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Requested format is not available\n";
        let err = MediaError::from(stderr.to_string());
        assert_eq!(
            err,
            MediaError::Download("[youtube] abc: Requested format is not available".to_string())
        );
    }

    #[test]
    fn test_unsupported_url_is_resolution_error() {
        let err = MediaError::from("ERROR: Unsupported URL: https://example.com".to_string());
        assert!(matches!(err, MediaError::Resolution(_)));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            MediaError::MissingLanguage.to_string(),
            "Subtitles language not selected."
        );
        assert_eq!(
            MediaError::SubtitleNotFound("fr".into()).to_string(),
            "No subtitles found in fr."
        );
        assert_eq!(
            MediaError::NoResults("foo".into()).to_string(),
            "No results found for query: foo"
        );
    }
}
