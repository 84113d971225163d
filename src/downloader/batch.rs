// Batch orchestrators: text-file queues and playlists

use std::path::{Path, PathBuf};

use super::errors::MediaError;
use super::format_selector::Quality;
use super::models::{BatchSummary, DownloadJob, MediaMode, PlaylistManifest, ResolvedItem};
use super::orchestrator::{Downloader, DOWNLOAD_COMPLETE, MISSING_DESTINATION};
use super::resolver::{resolve_playlist, resolve_query};
use super::single::download_item;
use super::utils::folder_name;

pub const MISSING_SOURCE_FILE: &str = "provide a file";

/// Non-empty trimmed lines of a batch file, in order.
pub fn read_batch_queries(source: &Path) -> Result<Vec<String>, MediaError> {
    let content = std::fs::read_to_string(source)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// `root/<file stem>`
pub fn batch_folder(root: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    root.join(stem)
}

/// Write `<folder>/<playlist title>.txt` with one title per line.
pub fn write_manifest(folder: &Path, manifest: &PlaylistManifest) -> Result<PathBuf, MediaError> {
    let path = folder.join(manifest.file_name());
    std::fs::write(&path, manifest.titles().join("\n"))?;
    Ok(path)
}

impl Downloader {
    /// Prompt for a `.txt` queue and a destination, then run it.
    pub async fn download_from_file(
        &self,
        mode: MediaMode,
        quality: Quality,
        subtitle_language: Option<String>,
    ) -> Option<BatchSummary> {
        let Some(source) = self.prompter.pick_source_file() else {
            self.notifier.error(MISSING_SOURCE_FILE);
            return None;
        };
        let Some(root) = self.prompter.pick_destination() else {
            self.notifier.error(MISSING_DESTINATION);
            return None;
        };

        match self
            .run_file_batch(&source, &root, mode, quality, subtitle_language)
            .await
        {
            Ok(summary) => {
                if !self.cancel.is_cancelled() {
                    self.notifier.success(DOWNLOAD_COMPLETE);
                }
                Some(summary)
            }
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Resolve and download each line of `source` into `root/<file stem>`.
    /// Per-item failures are reported and skipped.
    pub async fn run_file_batch(
        &self,
        source: &Path,
        root: &Path,
        mode: MediaMode,
        quality: Quality,
        subtitle_language: Option<String>,
    ) -> Result<BatchSummary, MediaError> {
        let queries = read_batch_queries(source)?;
        let folder = batch_folder(root, source);
        std::fs::create_dir_all(&folder)?;
        tracing::info!(
            "batch {}: {} item(s) -> {}",
            source.display(),
            queries.len(),
            folder.display()
        );

        let mut summary = BatchSummary::default();
        for query in &queries {
            if self.cancel.is_cancelled() {
                tracing::info!("batch cancelled after {} item(s)", summary.attempted);
                break;
            }
            let result = match resolve_query(self.engine.as_ref(), query).await {
                Ok(item) => {
                    self.run_item(&item, mode, quality, &folder, subtitle_language.clone())
                        .await
                }
                Err(e) => Err(e),
            };
            if !self.record(&mut summary, result) {
                break;
            }
        }

        tracing::info!(
            "batch done: {}/{} succeeded",
            summary.succeeded,
            summary.attempted
        );
        Ok(summary)
    }

    /// Prompt for a destination root and download a whole playlist.
    /// Returns `true` only when every entry succeeded.
    pub async fn download_playlist_url(
        &self,
        url: &str,
        mode: MediaMode,
        quality: Quality,
        subtitle_language: Option<String>,
    ) -> bool {
        let Some(root) = self.prompter.pick_destination() else {
            self.notifier.error(MISSING_DESTINATION);
            return false;
        };

        match self
            .run_playlist_batch(url, &root, mode, quality, subtitle_language)
            .await
        {
            Ok(summary) => summary.all_succeeded() && !self.cancel.is_cancelled(),
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub async fn run_playlist_batch(
        &self,
        url: &str,
        root: &Path,
        mode: MediaMode,
        quality: Quality,
        subtitle_language: Option<String>,
    ) -> Result<BatchSummary, MediaError> {
        let manifest = resolve_playlist(self.engine.as_ref(), url).await?;
        let folder = root.join(folder_name(&manifest.title));
        std::fs::create_dir_all(&folder)?;
        let manifest_path = write_manifest(&folder, &manifest)?;
        tracing::debug!("manifest written to {}", manifest_path.display());

        let mut summary = BatchSummary::default();
        for entry in &manifest.entries {
            if self.cancel.is_cancelled() {
                tracing::info!("playlist cancelled after {} item(s)", summary.attempted);
                break;
            }
            let result = self
                .run_item(entry, mode, quality, &folder, subtitle_language.clone())
                .await;
            if !self.record(&mut summary, result) {
                break;
            }
        }
        Ok(summary)
    }

    async fn run_item(
        &self,
        item: &ResolvedItem,
        mode: MediaMode,
        quality: Quality,
        folder: &Path,
        subtitle_language: Option<String>,
    ) -> Result<(), MediaError> {
        let job = DownloadJob::new(item.clone(), mode, quality, folder.to_path_buf())
            .with_subtitle_language(subtitle_language);
        let downloaded = download_item(
            self.engine.as_ref(),
            &self.settings,
            &job,
            self.progress.clone(),
        )
        .await?;
        if let Some(Err(e)) = &downloaded.subtitles {
            self.report(e);
        }
        Ok(())
    }

    /// Count one outcome. Returns `false` when the batch must stop.
    fn record(&self, summary: &mut BatchSummary, result: Result<(), MediaError>) -> bool {
        match result {
            Ok(()) => {
                summary.record(true);
                true
            }
            Err(MediaError::Cancelled) => {
                summary.record(false);
                false
            }
            Err(e) => {
                self.report(&e);
                summary.record(false);
                true
            }
        }
    }
}
