// Subtitle downloader

use std::path::{Path, PathBuf};

use crate::config::Settings;

use super::errors::MediaError;
use super::models::with_extension;
use super::options::{EngineOptions, SubtitleRequest};
use super::traits::{Engine, InfoMode};
use super::utils::escape_output_template;

/// Fetch the `language` track of `url` next to `stem` and rename it to the
/// configured target format. Returns the final subtitle path.
pub async fn download_subtitles(
    engine: &dyn Engine,
    settings: &Settings,
    url: &str,
    stem: &Path,
    language: Option<&str>,
) -> Result<PathBuf, MediaError> {
    let language = language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(MediaError::MissingLanguage)?;

    let info = engine.extract_info(url, InfoMode::Single).await?;
    if info["subtitles"].get(language).is_none() {
        return Err(MediaError::SubtitleNotFound(language.to_string()));
    }

    let options = EngineOptions::builder(format!("{}.%(ext)s", escape_output_template(stem)))
        .subtitles(SubtitleRequest {
            languages: vec![language.to_string()],
            format: settings.subtitle_source_format.clone(),
        })
        .skip_download(true)
        .retries(settings.retries, settings.fragment_retries)
        .socket_timeout(settings.socket_timeout)
        .build()?;

    engine.download(url, &options).await?;

    let fetched = with_extension(
        stem,
        &format!("{}.{}", language, settings.subtitle_source_format),
    );
    if !fetched.exists() {
        return Err(MediaError::SubtitleDownloadFailed(language.to_string()));
    }

    let target = with_extension(
        stem,
        &format!("{}.{}", language, settings.subtitle_target_format),
    );
    std::fs::rename(&fetched, &target)?;
    tracing::info!("subtitles saved to {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::testing::{Call, FakeEngine};
    use serde_json::json;

    const URL: &str = "https://www.youtube.com/watch?v=abc";

    #[tokio::test]
    async fn test_missing_language_makes_no_engine_call() {
        let engine = FakeEngine::new();
        let dir = tempfile::tempdir().unwrap();

        for lang in [None, Some(""), Some("  ")] {
            let err = download_subtitles(
                &engine,
                &Settings::default(),
                URL,
                &dir.path().join("t"),
                lang,
            )
            .await
            .unwrap_err();
            assert_eq!(err, MediaError::MissingLanguage);
        }
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_absent_track() {
        let engine =
            FakeEngine::new().with_info(URL, json!({"subtitles": {"en": [{"ext": "vtt"}]}}));
        let dir = tempfile::tempdir().unwrap();

        let err = download_subtitles(&engine, &Settings::default(), URL, &dir.path().join("t"), Some("fr"))
            .await
            .unwrap_err();

        assert_eq!(err, MediaError::SubtitleNotFound("fr".to_string()));
        assert_eq!(engine.download_count(), 0);
    }

    #[tokio::test]
    async fn test_vtt_renamed_to_srt() {
        let mut engine =
            FakeEngine::new().with_info(URL, json!({"subtitles": {"en": [{"ext": "vtt"}]}}));
        engine.subtitle_lang = Some("en".to_string());
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("My Video");

        let path = download_subtitles(&engine, &Settings::default(), URL, &stem, Some("en"))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("My Video.en.srt"));
        assert!(path.exists());
        assert!(!dir.path().join("My Video.en.vtt").exists());
        assert_eq!(
            engine.calls(),
            vec![
                Call::Info(URL.to_string(), InfoMode::Single),
                Call::Download(URL.to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_file_after_download() {
        // Engine claims success but writes nothing
        let engine =
            FakeEngine::new().with_info(URL, json!({"subtitles": {"de": [{"ext": "vtt"}]}}));
        let dir = tempfile::tempdir().unwrap();

        let err = download_subtitles(&engine, &Settings::default(), URL, &dir.path().join("t"), Some("de"))
            .await
            .unwrap_err();

        assert_eq!(err, MediaError::SubtitleDownloadFailed("de".to_string()));
    }
}
