// Seams between the orchestration core and its collaborators

use async_trait::async_trait;
use std::ops::ControlFlow;
use std::path::PathBuf;

use super::errors::MediaError;
use super::models::ProgressSample;
use super::options::EngineOptions;

/// How much metadata to ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoMode {
    /// Full metadata for one item; playlist parameters in the URL are ignored
    Single,
    /// Playlist entries without resolving each one
    FlatPlaylist,
}

/// Extraction/download engine
#[async_trait]
pub trait Engine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Metadata as the engine's JSON document, nothing downloaded
    async fn extract_info(
        &self,
        target: &str,
        mode: InfoMode,
    ) -> Result<serde_json::Value, MediaError>;

    /// Fetch `url` according to `options`, feeding the progress hook if one is set
    async fn download(&self, url: &str, options: &EngineOptions) -> Result<(), MediaError>;
}

/// Receives progress callbacks from inside an engine invocation.
pub trait ProgressHook: Send + Sync {
    /// Returning `Break` asks the engine to stop the transfer.
    fn on_progress(&self, sample: &ProgressSample) -> ControlFlow<()>;

    fn on_item_started(&self, _title: &str) {}
}

/// Fire-and-forget user feedback
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
    fn success(&self, message: &str);
}

/// Path prompts issued by the batch and single flows
pub trait Prompter: Send + Sync {
    /// Text file with one query per line
    fn pick_source_file(&self) -> Option<PathBuf>;
    /// Root folder to save into
    fn pick_destination(&self) -> Option<PathBuf>;
}
