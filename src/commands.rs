// Tauri shell - commands, dialogs and the background worker
//
// Each user action runs on its own `download-worker` thread. Dialogs are
// shown from that thread; progress is forwarded to the webview as events.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tauri::{AppHandle, Emitter, Manager, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tokio::sync::mpsc::unbounded_channel;

use crate::config::Settings;
use crate::downloader::format_selector::UNSELECTED;
use crate::downloader::tools::{resolve_ytdlp_path, ToolInfo, ToolManager};
use crate::downloader::{
    CancellationSignal, Downloader, MediaMode, Notifier, ProgressReporter, Prompter, Quality,
    YtDlpEngine,
};

pub const PROGRESS_EVENT: &str = "download-progress";
pub const FINISHED_EVENT: &str = "download-finished";

const BUSY: &str = "A download is already in progress.";
const NO_RESOLUTION: &str = "Please select a video resolution.";

pub struct AppState {
    settings: Settings,
    busy: AtomicBool,
    cancel: Mutex<Option<CancellationSignal>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            busy: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    fn begin(&self) -> Result<CancellationSignal, String> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(BUSY.to_string());
        }
        let signal = CancellationSignal::new();
        if let Ok(mut slot) = self.cancel.lock() {
            *slot = Some(signal.clone());
        }
        Ok(signal)
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.cancel.lock() {
            *slot = None;
        }
        self.busy.store(false, Ordering::SeqCst);
    }
}

struct DialogNotifier {
    app: AppHandle,
}

impl Notifier for DialogNotifier {
    fn error(&self, message: &str) {
        self.app
            .dialog()
            .message(message)
            .title("Error")
            .kind(MessageDialogKind::Error)
            .show(|_| {});
    }

    fn success(&self, message: &str) {
        self.app
            .dialog()
            .message(message)
            .title("Success")
            .kind(MessageDialogKind::Info)
            .buttons(MessageDialogButtons::OkCustom("Thanks".to_string()))
            .show(|_| {});
    }
}

struct DialogPrompter {
    app: AppHandle,
    default_dir: Option<PathBuf>,
}

impl Prompter for DialogPrompter {
    fn pick_source_file(&self) -> Option<PathBuf> {
        let mut dialog = self.app.dialog().file().add_filter("Text files", &["txt"]);
        if let Some(dir) = &self.default_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.blocking_pick_file().and_then(|p| p.into_path().ok())
    }

    fn pick_destination(&self) -> Option<PathBuf> {
        let mut dialog = self.app.dialog().file();
        if let Some(dir) = &self.default_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.blocking_pick_folder().and_then(|p| p.into_path().ok())
    }
}

/// Run `job` on a named worker thread with a fresh `Downloader`.
fn spawn_worker<F, Fut>(app: AppHandle, job: F) -> Result<(), String>
where
    F: FnOnce(Downloader) -> Fut + Send + 'static,
    Fut: Future<Output = bool>,
{
    let state = app.state::<AppState>();
    let cancel = state.begin().map_err(|busy| {
        DialogNotifier { app: app.clone() }.error(&busy);
        busy
    })?;
    let settings = state.settings.clone();

    let worker_app = app.clone();
    let spawned = std::thread::Builder::new()
        .name("download-worker".to_string())
        .spawn(move || {
            let (tx, mut rx) = unbounded_channel();
            let forward_app = worker_app.clone();
            let forwarder = tauri::async_runtime::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let _ = forward_app.emit(PROGRESS_EVENT, &event);
                }
            });

            let reporter = Arc::new(ProgressReporter::new(
                tx,
                settings.finish_policy,
                cancel.clone(),
            ));
            let engine = Arc::new(YtDlpEngine::new(
                resolve_ytdlp_path(&settings),
                settings.info_timeout_secs,
            ));
            let default_dir = settings.default_download_dir.clone();
            let downloader = Downloader::new(
                engine,
                settings,
                Arc::new(DialogNotifier {
                    app: worker_app.clone(),
                }),
                Arc::new(DialogPrompter {
                    app: worker_app.clone(),
                    default_dir,
                }),
            )
            .with_progress(reporter)
            .with_cancellation(cancel);

            let ok = tauri::async_runtime::block_on(job(downloader));
            // The reporter (and its sender) is gone once the downloader is dropped
            let _ = tauri::async_runtime::block_on(forwarder);

            tracing::info!("worker finished (success: {})", ok);
            let _ = worker_app.emit(FINISHED_EVENT, ok);
            worker_app.state::<AppState>().finish();
        });

    if let Err(e) = spawned {
        state.finish();
        let msg = format!("Failed to start worker: {}", e);
        DialogNotifier { app: app.clone() }.error(&msg);
        return Err(msg);
    }
    Ok(())
}

/// Dropdown value → `Quality`. Only video actions need a resolution.
fn parse_quality(app: &AppHandle, mode: MediaMode, quality: &str) -> Result<Quality, String> {
    if mode == MediaMode::Audio {
        return Ok(Quality::Best);
    }
    let notify = |msg: &str| {
        DialogNotifier { app: app.clone() }.error(msg);
        msg.to_string()
    };
    if quality.trim() == UNSELECTED {
        return Err(notify(NO_RESOLUTION));
    }
    quality.parse().map_err(|e: crate::downloader::MediaError| notify(&e.to_string()))
}

fn optional_language(language: Option<String>) -> Option<String> {
    language.filter(|l| !l.trim().is_empty() && l.trim() != UNSELECTED)
}

/// `option` is one of `Audio`, `Video`, `AudioFromFile`, `VideoFromFile`.
#[tauri::command]
pub async fn start_download(
    app: AppHandle,
    option: String,
    input: String,
    quality: String,
    language: Option<String>,
) -> Result<(), String> {
    let (mode, from_file) = match option.as_str() {
        "Audio" => (MediaMode::Audio, false),
        "Video" => (MediaMode::Video, false),
        "AudioFromFile" => (MediaMode::Audio, true),
        "VideoFromFile" => (MediaMode::Video, true),
        other => return Err(format!("Unknown download option: {}", other)),
    };
    let quality = parse_quality(&app, mode, &quality)?;
    let language = optional_language(language);
    tracing::info!("start_download: {:?} {} from_file={}", mode, quality, from_file);

    spawn_worker(app, move |downloader| async move {
        if from_file {
            downloader
                .download_from_file(mode, quality, language)
                .await
                .is_some_and(|s| s.all_succeeded())
        } else {
            downloader
                .download_from_input(&input, mode, quality, language)
                .await
        }
    })
}

#[tauri::command]
pub async fn download_subtitles(
    app: AppHandle,
    input: String,
    language: Option<String>,
) -> Result<(), String> {
    let language = optional_language(language);
    spawn_worker(app, move |downloader| async move {
        downloader.download_subtitles_only(&input, language).await
    })
}

#[tauri::command]
pub fn cancel_download(state: State<'_, AppState>) -> bool {
    match state.cancel.lock() {
        Ok(slot) => match slot.as_ref() {
            Some(signal) => {
                tracing::info!("cancellation requested");
                signal.cancel();
                true
            }
            None => false,
        },
        Err(_) => false,
    }
}

#[tauri::command]
pub async fn get_tools_status(state: State<'_, AppState>) -> Result<Vec<ToolInfo>, String> {
    let settings = state.settings.clone();
    tauri::async_runtime::spawn_blocking(move || ToolManager::new(&settings).get_all_tools())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Settings {
    state.settings.clone()
}
