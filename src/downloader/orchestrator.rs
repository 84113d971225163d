// Orchestrator - routes user input to the resolvers and downloaders
//
// Every public method here is a reporting boundary: failures are turned into
// one error dialog each and the caller gets a plain success flag back.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;

use super::errors::MediaError;
use super::format_selector::Quality;
use super::models::{DownloadJob, MediaMode, ResolvedItem};
use super::progress::CancellationSignal;
use super::resolver::resolve_query;
use super::single::download_item;
use super::subtitles::download_subtitles;
use super::traits::{Engine, Notifier, ProgressHook, Prompter};

pub const DOWNLOAD_COMPLETE: &str = "Download complete";
pub const MISSING_INPUT: &str = "provide a url";
pub const MISSING_DESTINATION: &str = "Select a save location";

/// What kind of input the user pasted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A single YouTube video or short
    Video,
    /// Any other YouTube page (playlist, channel)
    Playlist,
    /// Instagram/Facebook; only muxed streams are reliable there
    Social,
    /// Any other URL, or a search term
    Query,
}

impl LinkKind {
    pub fn classify(input: &str) -> Self {
        let Ok(parsed) = url::Url::parse(input.trim()) else {
            return Self::Query;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return Self::Query;
        }
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let host = host.strip_prefix("m.").unwrap_or(host);
        let path = parsed.path();

        match host {
            "youtu.be" => Self::Video,
            "youtube.com" if path.starts_with("/watch") || path.starts_with("/shorts") => {
                Self::Video
            }
            "youtube.com" => Self::Playlist,
            "instagram.com" | "facebook.com" => Self::Social,
            _ => Self::Query,
        }
    }
}

pub struct Downloader {
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) settings: Settings,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) prompter: Arc<dyn Prompter>,
    pub(crate) progress: Option<Arc<dyn ProgressHook>>,
    pub(crate) cancel: CancellationSignal,
}

impl Downloader {
    pub fn new(
        engine: Arc<dyn Engine>,
        settings: Settings,
        notifier: Arc<dyn Notifier>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            engine,
            settings,
            notifier,
            prompter,
            progress: None,
            cancel: CancellationSignal::new(),
        }
    }

    pub fn with_progress(mut self, hook: Arc<dyn ProgressHook>) -> Self {
        self.progress = Some(hook);
        self
    }

    /// Signal checked between batch items. Share it with the progress reporter
    /// so a cancel also stops the running transfer.
    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn report(&self, err: &MediaError) {
        tracing::warn!("{}", err);
        self.notifier.error(&err.to_string());
    }

    /// Resolve, reporting failures. `None` means the user has been told.
    pub async fn resolve(&self, query: &str) -> Option<ResolvedItem> {
        match resolve_query(self.engine.as_ref(), query).await {
            Ok(item) => Some(item),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Entry point for the URL/search box.
    pub async fn download_from_input(
        &self,
        input: &str,
        mode: MediaMode,
        quality: Quality,
        subtitle_language: Option<String>,
    ) -> bool {
        let input = input.trim();
        if input.is_empty() {
            self.notifier.error(MISSING_INPUT);
            return false;
        }

        let kind = LinkKind::classify(input);
        tracing::info!("input classified as {:?}", kind);

        let ok = match kind {
            LinkKind::Playlist => {
                self.download_playlist_url(input, mode, quality, subtitle_language)
                    .await
            }
            LinkKind::Video | LinkKind::Query | LinkKind::Social => {
                let quality = if kind == LinkKind::Social {
                    Quality::Unconstrained
                } else {
                    quality
                };
                match self.resolve(input).await {
                    Some(item) => {
                        self.download_link(&item, mode, quality, None, subtitle_language)
                            .await
                    }
                    None => false,
                }
            }
        };

        if ok {
            self.notifier.success(DOWNLOAD_COMPLETE);
        }
        ok
    }

    /// Download one resolved item. Prompts for a folder when `destination` is `None`.
    pub async fn download_link(
        &self,
        item: &ResolvedItem,
        mode: MediaMode,
        quality: Quality,
        destination: Option<PathBuf>,
        subtitle_language: Option<String>,
    ) -> bool {
        let Some(destination) = destination.or_else(|| self.prompter.pick_destination()) else {
            self.notifier.error(MISSING_DESTINATION);
            return false;
        };

        let job = DownloadJob::new(item.clone(), mode, quality, destination)
            .with_subtitle_language(subtitle_language);

        match download_item(
            self.engine.as_ref(),
            &self.settings,
            &job,
            self.progress.clone(),
        )
        .await
        {
            Ok(downloaded) => {
                tracing::info!("saved {}", downloaded.path.display());
                if let Some(Err(e)) = &downloaded.subtitles {
                    self.report(e);
                }
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Subtitles only: resolve, prompt for a folder, fetch the track.
    pub async fn download_subtitles_only(&self, input: &str, language: Option<String>) -> bool {
        if input.trim().is_empty() {
            self.notifier.error(MISSING_INPUT);
            return false;
        }
        if language.as_deref().map_or(true, |l| l.trim().is_empty()) {
            self.report(&MediaError::MissingLanguage);
            return false;
        }

        let Some(item) = self.resolve(input).await else {
            return false;
        };
        let Some(root) = self.prompter.pick_destination() else {
            self.notifier.error(MISSING_DESTINATION);
            return false;
        };

        let stem = root.join(&item.title);
        match download_subtitles(
            self.engine.as_ref(),
            &self.settings,
            &item.url,
            &stem,
            language.as_deref(),
        )
        .await
        {
            Ok(path) => {
                tracing::info!("subtitles written to {}", path.display());
                self.notifier.success(DOWNLOAD_COMPLETE);
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }
}
