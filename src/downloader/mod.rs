// Downloader module - resolution, download and batch orchestration over yt-dlp

pub mod backends;
pub mod batch;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod options;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod single;
pub mod subtitles;
pub mod tools;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use backends::YtDlpEngine;
pub use errors::MediaError;
pub use format_selector::{FormatSelector, Quality};
pub use models::{BatchSummary, MediaMode, PlaylistManifest, ProgressEvent, ResolvedItem};
pub use orchestrator::{Downloader, LinkKind};
pub use progress::{CancellationSignal, FinishPolicy, ProgressReporter};
pub use traits::{Engine, Notifier, ProgressHook, Prompter};
