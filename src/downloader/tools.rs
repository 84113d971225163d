// External tool discovery (yt-dlp, ffmpeg)
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Settings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // single dash
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager {
    ytdlp_override: Option<PathBuf>,
    ffmpeg_override: Option<PathBuf>,
}

impl ToolManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ytdlp_override: settings.yt_dlp_path.clone(),
            ffmpeg_override: settings.ffmpeg_location.clone(),
        }
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type);
        let version = path.as_deref().and_then(|p| get_version(p, tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            is_available: path.is_some(),
            path: path.map(|p| p.to_string_lossy().into_owned()),
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp),
            self.get_tool_info(ToolType::Ffmpeg),
        ]
    }

    /// Configured path, then common install locations, then `PATH`.
    pub fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        let configured = match tool_type {
            ToolType::YtDlp => self.ytdlp_override.clone(),
            // ffmpeg_location may name the directory holding the binary
            ToolType::Ffmpeg => self.ffmpeg_override.as_ref().map(|p| {
                if p.is_dir() {
                    p.join(tool_type.as_str())
                } else {
                    p.clone()
                }
            }),
        };
        if let Some(path) = configured {
            if path.exists() {
                return Some(path);
            }
            tracing::warn!(
                "configured {} path {} does not exist",
                tool_type.as_str(),
                path.display()
            );
        }

        let binary_name = tool_type.as_str();
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];
        for path in common_paths {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        which(binary_name)
    }
}

fn which(binary_name: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(binary_name).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// First line of the tool's version output
fn get_version(path: &Path, tool_type: ToolType) -> Option<String> {
    match Command::new(path).arg(tool_type.version_arg()).output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_string()),
        _ => None,
    }
}

/// yt-dlp binary to run. Falls back to the bare name so a missing tool
/// surfaces as `MediaError::ToolNotFound` on first use.
pub fn resolve_ytdlp_path(settings: &Settings) -> PathBuf {
    ToolManager::new(settings)
        .locate(ToolType::YtDlp)
        .unwrap_or_else(|| PathBuf::from(ToolType::YtDlp.as_str()))
}
