// Single-item downloader

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;

use super::errors::MediaError;
use super::format_selector::FormatSelector;
use super::models::{DownloadJob, MediaMode};
use super::options::{EngineOptions, PostProcessor};
use super::subtitles::download_subtitles;
use super::traits::{Engine, ProgressHook};
use super::utils::{escape_output_template, normalize_extensions};

/// Containers renamed to the configured video container after a video download
const NON_NORMALIZED_CONTAINERS: [&str; 2] = ["webm", "mkv"];

#[derive(Debug)]
pub struct DownloadedItem {
    pub path: PathBuf,
    /// Outcome of the chained subtitle request, if one was made
    pub subtitles: Option<Result<PathBuf, MediaError>>,
}

/// Engine options for one job
pub fn build_options(
    job: &DownloadJob,
    settings: &Settings,
    hook: Option<Arc<dyn ProgressHook>>,
) -> Result<EngineOptions, MediaError> {
    let template = format!("{}.%(ext)s", escape_output_template(&job.output_stem()));

    let mut builder = EngineOptions::builder(template)
        .format(FormatSelector::format_for(job.mode, job.quality))
        .playlist(false)
        .retries(settings.retries, settings.fragment_retries)
        .socket_timeout(settings.socket_timeout)
        .ffmpeg_location(settings.ffmpeg_location.clone());

    match job.mode {
        MediaMode::Audio => {
            builder = builder.post_processor(PostProcessor::ExtractAudio {
                codec: settings.audio_codec.clone(),
                bitrate_kbps: settings.audio_bitrate_kbps,
            });
        }
        MediaMode::Video if settings.remux_video => {
            builder = builder.post_processor(PostProcessor::RemuxVideo {
                container: settings.video_container.clone(),
            });
        }
        MediaMode::Video => {}
    }

    if let Some(hook) = hook {
        builder = builder.progress_hook(hook);
    }

    builder.build()
}

/// Download one resolved item into `job.destination_dir`.
pub async fn download_item(
    engine: &dyn Engine,
    settings: &Settings,
    job: &DownloadJob,
    hook: Option<Arc<dyn ProgressHook>>,
) -> Result<DownloadedItem, MediaError> {
    std::fs::create_dir_all(&job.destination_dir)?;

    if let Some(h) = &hook {
        h.on_item_started(&job.target.title);
    }

    let options = build_options(job, settings, hook)?;
    tracing::info!(
        "downloading {} ({}, {}) via {}",
        job.target.title,
        job.mode,
        job.quality,
        engine.name()
    );
    engine.download(&job.target.url, &options).await?;

    let stem = job.output_stem();
    let path = match job.mode {
        MediaMode::Audio => job.output_path(&settings.audio_codec),
        MediaMode::Video => {
            normalize_extensions(&stem, &NON_NORMALIZED_CONTAINERS, &settings.video_container)?;
            job.output_path(&settings.video_container)
        }
    };

    let subtitles = match (job.mode, job.subtitle_language.as_deref()) {
        (MediaMode::Video, Some(lang)) => Some(
            download_subtitles(engine, settings, &job.target.url, &stem, Some(lang)).await,
        ),
        _ => None,
    };

    Ok(DownloadedItem { path, subtitles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::format_selector::Quality;
    use crate::downloader::models::{ProgressEvent, ResolvedItem};
    use crate::downloader::progress::{CancellationSignal, FinishPolicy, ProgressReporter};
    use crate::downloader::testing::FakeEngine;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn job(dir: &std::path::Path, mode: MediaMode, quality: Quality) -> DownloadJob {
        DownloadJob::new(
            ResolvedItem::new("Rick Astley - Never Gonna Give You Up", URL),
            mode,
            quality,
            dir.join("out"),
        )
    }

    #[test]
    fn test_build_options_video_height() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), MediaMode::Video, Quality::MaxHeight(720));
        let opts = build_options(&job, &Settings::default(), None).unwrap();
        assert_eq!(
            opts.format(),
            Some("bestvideo[height<=720]+bestaudio/best[height<=720]")
        );
        assert!(opts.post_processors().is_empty());
        assert!(opts.output_template().ends_with("Never Gonna Give You Up.%(ext)s"));
    }

    #[test]
    fn test_build_options_audio() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), MediaMode::Audio, Quality::Best);
        let opts = build_options(&job, &Settings::default(), None).unwrap();
        assert_eq!(opts.format(), Some("bestaudio"));
        assert_eq!(
            opts.post_processors(),
            &[PostProcessor::ExtractAudio {
                codec: "mp3".into(),
                bitrate_kbps: 192
            }]
        );
    }

    #[tokio::test]
    async fn test_audio_download_produces_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();
        let job = job(dir.path(), MediaMode::Audio, Quality::Best);

        let item = download_item(&engine, &Settings::default(), &job, None)
            .await
            .unwrap();

        assert_eq!(
            item.path,
            dir.path().join("out/Rick Astley - Never Gonna Give You Up.mp3")
        );
        assert!(item.path.exists());
        assert!(item.subtitles.is_none());
    }

    #[tokio::test]
    async fn test_video_webm_renamed_to_mp4() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();
        let job = job(dir.path(), MediaMode::Video, Quality::Best);

        let item = download_item(&engine, &Settings::default(), &job, None)
            .await
            .unwrap();

        assert!(item.path.ends_with("Rick Astley - Never Gonna Give You Up.mp4"));
        assert!(item.path.exists());
        assert!(!job.output_path("webm").exists());
    }

    #[tokio::test]
    async fn test_subtitle_chain_failure_does_not_fail_item() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new().with_info(URL, json!({"subtitles": {}}));
        let job = job(dir.path(), MediaMode::Video, Quality::Best)
            .with_subtitle_language(Some("fr".into()));

        let item = download_item(&engine, &Settings::default(), &job, None)
            .await
            .unwrap();

        assert!(item.path.exists());
        assert_eq!(
            item.subtitles,
            Some(Err(MediaError::SubtitleNotFound("fr".into())))
        );
    }

    #[tokio::test]
    async fn test_audio_skips_subtitles() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();
        let job = job(dir.path(), MediaMode::Audio, Quality::Best)
            .with_subtitle_language(Some("en".into()));

        let item = download_item(&engine, &Settings::default(), &job, None)
            .await
            .unwrap();

        assert!(item.subtitles.is_none());
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_progress_and_title_reach_channel() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();
        let (tx, mut rx) = unbounded_channel();
        let reporter: Arc<dyn ProgressHook> = Arc::new(ProgressReporter::new(
            tx,
            FinishPolicy::KeepLast,
            CancellationSignal::new(),
        ));
        let job = job(dir.path(), MediaMode::Audio, Quality::Best);

        download_item(&engine, &Settings::default(), &job, Some(reporter))
            .await
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::ItemStarted {
                title: "Rick Astley - Never Gonna Give You Up".into()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Percent { value: 50.0 });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_before_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();
        let (tx, _rx) = unbounded_channel();
        let cancel = CancellationSignal::new();
        cancel.cancel();
        let reporter: Arc<dyn ProgressHook> =
            Arc::new(ProgressReporter::new(tx, FinishPolicy::KeepLast, cancel));
        let job = job(dir.path(), MediaMode::Video, Quality::Best);

        let err = download_item(&engine, &Settings::default(), &job, Some(reporter))
            .await
            .unwrap_err();

        assert_eq!(err, MediaError::Cancelled);
    }
}
