// Helper functions shared by the resolvers, downloaders and the engine adapter

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use super::models::with_extension;

/// Characters that are not allowed in a file name on at least one platform we ship to
const PROHIBITED_CHARS: [char; 6] = [':', '/', '\\', ',', '#', '|'];

/// Replace every prohibited character with `_`, one for one.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if PROHIBITED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Name used when a title cannot be a directory of its own
pub const UNTITLED: &str = "Untitled";

/// `title` as a single path component: empty, `.` and `..` become `Untitled`.
pub fn folder_name(title: &str) -> String {
    match title.trim() {
        "" | "." | ".." => UNTITLED.to_string(),
        _ => title.to_string(),
    }
}

/// yt-dlp treats `%` in `-o` as a template field.
pub fn escape_output_template(path: &Path) -> String {
    path.to_string_lossy().replace('%', "%%")
}

/// Rename `<stem>.<from>` to `<stem>.<to>` for each listed extension that exists.
/// Returns the renamed target paths.
pub fn normalize_extensions(
    stem: &Path,
    from: &[&str],
    to: &str,
) -> std::io::Result<Vec<PathBuf>> {
    let mut renamed = Vec::new();
    for ext in from {
        if ext.eq_ignore_ascii_case(to) {
            continue;
        }
        let source = with_extension(stem, ext);
        if source.exists() {
            let target = with_extension(stem, to);
            std::fs::rename(&source, &target)?;
            tracing::info!("renamed {} -> {}", source.display(), target.display());
            renamed.push(target);
        }
    }
    Ok(renamed)
}

/// Run command with timeout, collecting stdout and stderr
pub async fn run_output_with_timeout(
    program: &Path,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, std::io::Error> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stdout"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stderr"))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res?;
            let stdout = stdout_task.await.map_err(std::io::Error::other)??;
            let stderr = stderr_task.await.map_err(std::io::Error::other)??;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("timed out after {}s", timeout_secs),
            ))
        }
    }
}
