// yt-dlp engine - drives the native `yt-dlp` binary
//
// Metadata requests use `-J` and parse the single JSON document. Downloads
// stream stdout line by line; lines written with the progress template are
// turned into samples for the hook, everything else is logged at debug level.

use async_trait::async_trait;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::downloader::errors::MediaError;
use crate::downloader::options::EngineOptions;
use crate::downloader::progress::{parse_progress_line, PROGRESS_TEMPLATE};
use crate::downloader::traits::{Engine, InfoMode};
use crate::downloader::utils::run_output_with_timeout;

pub struct YtDlpEngine {
    ytdlp_path: PathBuf,
    info_timeout_secs: u64,
}

impl YtDlpEngine {
    pub fn new(ytdlp_path: impl Into<PathBuf>, info_timeout_secs: u64) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            info_timeout_secs,
        }
    }

    fn info_args(target: &str, mode: InfoMode) -> Vec<String> {
        let mut args = vec!["-J".to_string(), "--no-warnings".to_string()];
        match mode {
            InfoMode::Single => args.push("--no-playlist".to_string()),
            InfoMode::FlatPlaylist => {
                args.push("--flat-playlist".to_string());
                args.push("--yes-playlist".to_string());
            }
        }
        // `--` keeps free-text queries starting with a dash from being read as flags
        args.push("--".to_string());
        args.push(target.to_string());
        args
    }

    fn download_args(url: &str, options: &EngineOptions) -> Vec<String> {
        let mut args = options.to_args();
        args.extend([
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--".to_string(),
            url.to_string(),
        ]);
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> MediaError {
        match e.kind() {
            std::io::ErrorKind::NotFound => {
                MediaError::ToolNotFound(self.ytdlp_path.display().to_string())
            }
            std::io::ErrorKind::TimedOut => MediaError::Resolution(e.to_string()),
            _ => MediaError::Unexpected(format!("Failed to start yt-dlp: {}", e)),
        }
    }
}

#[async_trait]
impl Engine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(
        &self,
        target: &str,
        mode: InfoMode,
    ) -> Result<serde_json::Value, MediaError> {
        let args = Self::info_args(target, mode);
        tracing::debug!("{} {}", self.ytdlp_path.display(), args.join(" "));

        let output = run_output_with_timeout(&self.ytdlp_path, args, self.info_timeout_secs)
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::warn!("metadata request for {} failed: {}", target, stderr.trim());
            return Err(MediaError::from(stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| MediaError::Unexpected(format!("Invalid JSON from yt-dlp: {}", e)))
    }

    async fn download(&self, url: &str, options: &EngineOptions) -> Result<(), MediaError> {
        let args = Self::download_args(url, options);
        tracing::debug!("{} {}", self.ytdlp_path.display(), args.join(" "));

        let mut child = Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::Unexpected("Failed to capture stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::Unexpected("Failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        // Raw lines: file names in yt-dlp output follow the system locale
        let mut reader = BufReader::new(stdout);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end();
            let Some(sample) = parse_progress_line(line) else {
                tracing::debug!("[yt-dlp] {}", line);
                continue;
            };
            let Some(hook) = options.progress_hook() else {
                continue;
            };
            if let ControlFlow::Break(()) = hook.on_progress(&sample) {
                tracing::info!("cancelling download of {}", url);
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(MediaError::Cancelled);
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            tracing::warn!("yt-dlp exited with {}: {}", status, stderr_output.trim());
            Err(MediaError::from(stderr_output))
        }
    }
}
