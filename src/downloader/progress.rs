// Progress reporting and cooperative cancellation

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::models::{ProgressEvent, ProgressSample, ProgressStatus};
use super::traits::ProgressHook;

/// Prefix of the lines produced by `PROGRESS_TEMPLATE`
pub const PROGRESS_PREFIX: &str = "[media-progress]";

/// `--progress-template` value understood by `parse_progress_line`
pub const PROGRESS_TEMPLATE: &str = "download:[media-progress] %(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";

/// What to publish when the engine reports a finished transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishPolicy {
    /// Leave the last published value
    #[default]
    KeepLast,
    /// Clamp every value into 0..=100 and publish 100 on finish
    ForceComplete,
}

/// Shared stop flag, checked from the progress hook
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Turns engine samples into `ProgressEvent`s on a channel owned by the shell
pub struct ProgressReporter {
    tx: UnboundedSender<ProgressEvent>,
    policy: FinishPolicy,
    cancel: CancellationSignal,
}

impl ProgressReporter {
    pub fn new(
        tx: UnboundedSender<ProgressEvent>,
        policy: FinishPolicy,
        cancel: CancellationSignal,
    ) -> Self {
        Self { tx, policy, cancel }
    }

    fn publish(&self, value: f64) {
        let value = match self.policy {
            FinishPolicy::KeepLast => value,
            FinishPolicy::ForceComplete => value.clamp(0.0, 100.0),
        };
        // The receiver going away only means nobody is watching anymore
        let _ = self.tx.send(ProgressEvent::Percent { value });
    }
}

impl ProgressHook for ProgressReporter {
    fn on_progress(&self, sample: &ProgressSample) -> ControlFlow<()> {
        if self.cancel.is_cancelled() {
            return ControlFlow::Break(());
        }

        match sample.status {
            ProgressStatus::Downloading => {
                if let Some(pct) = sample.percent() {
                    self.publish(pct);
                }
            }
            ProgressStatus::Finished => {
                if self.policy == FinishPolicy::ForceComplete {
                    self.publish(100.0);
                }
            }
            ProgressStatus::Error => {}
        }

        ControlFlow::Continue(())
    }

    fn on_item_started(&self, title: &str) {
        let _ = self.tx.send(ProgressEvent::ItemStarted {
            title: title.to_string(),
        });
    }
}

lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"^\[media-progress\]\s+(\w+)\s+(\S+)\s+(\S+)\s+(\S+)\s*$"
    )
    .unwrap();
}

/// Parse one stdout line written with `PROGRESS_TEMPLATE`.
///
/// Unknown numbers are printed by yt-dlp as `NA` (or `None`); those become `None`.
/// `total_bytes_estimate` stands in when the exact total is unknown, which is
/// the normal case for fragmented streams.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let caps = PROGRESS_RE.captures(line.trim())?;

    let status = match caps.get(1)?.as_str() {
        "downloading" => ProgressStatus::Downloading,
        "finished" => ProgressStatus::Finished,
        "error" => ProgressStatus::Error,
        _ => return None,
    };

    let number = |i: usize| -> Option<u64> {
        let raw = caps.get(i)?.as_str();
        raw.parse::<u64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|v| v as u64))
    };

    Some(ProgressSample {
        downloaded_bytes: number(2),
        total_bytes: number(3).or_else(|| number(4)),
        status,
    })
}
