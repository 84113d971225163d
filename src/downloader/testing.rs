// Test doubles for the engine and the shell

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Mutex;

use super::errors::MediaError;
use super::models::{with_extension, ProgressSample, ProgressStatus};
use super::options::EngineOptions;
use super::traits::{Engine, InfoMode, Notifier, Prompter};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Info(String, InfoMode),
    Download(String),
}

/// Scripted engine. Metadata comes from a map; downloads create the file the
/// real engine would write (`<template stem>.<ext>`).
#[derive(Default)]
pub struct FakeEngine {
    pub info: HashMap<String, Value>,
    pub failing_downloads: Vec<String>,
    /// Extension written by a media download
    pub media_ext: Option<String>,
    /// Language for which a `.vtt` is written on subtitle downloads
    pub subtitle_lang: Option<String>,
    pub samples: Vec<ProgressSample>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            media_ext: Some("webm".to_string()),
            samples: vec![
                ProgressSample {
                    downloaded_bytes: Some(50),
                    total_bytes: Some(100),
                    status: ProgressStatus::Downloading,
                },
                ProgressSample {
                    downloaded_bytes: Some(100),
                    total_bytes: Some(100),
                    status: ProgressStatus::Finished,
                },
            ],
            ..Default::default()
        }
    }

    pub fn with_info(mut self, target: &str, value: Value) -> Self {
        self.info.insert(target.to_string(), value);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing_downloads.push(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn download_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Download(_)))
            .count()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn extract_info(&self, target: &str, mode: InfoMode) -> Result<Value, MediaError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Info(target.to_string(), mode));
        self.info
            .get(target)
            .cloned()
            .ok_or_else(|| MediaError::Download(format!("Unable to extract {}", target)))
    }

    async fn download(&self, url: &str, options: &EngineOptions) -> Result<(), MediaError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Download(url.to_string()));
        if self.failing_downloads.iter().any(|u| u == url) {
            return Err(MediaError::Download("HTTP Error 403: Forbidden".to_string()));
        }

        if let Some(hook) = options.progress_hook() {
            for sample in &self.samples {
                if let ControlFlow::Break(()) = hook.on_progress(sample) {
                    return Err(MediaError::Cancelled);
                }
            }
        }

        let stem = PathBuf::from(options.output_template().trim_end_matches(".%(ext)s"));
        if options.skip_download() {
            if let (Some(subs), Some(lang)) = (options.subtitles(), &self.subtitle_lang) {
                if subs.languages.contains(lang) {
                    std::fs::write(with_extension(&stem, &format!("{}.vtt", lang)), "WEBVTT")?;
                }
            }
            return Ok(());
        }

        let ext = if options
            .post_processors()
            .iter()
            .any(|pp| matches!(pp, super::options::PostProcessor::ExtractAudio { .. }))
        {
            "mp3".to_string()
        } else {
            self.media_ext.clone().unwrap_or_else(|| "mp4".to_string())
        };
        std::fs::write(with_extension(&stem, &ext), b"media")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub errors: Mutex<Vec<String>>,
    pub successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }
}

pub struct FixedPrompter {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
}

impl Prompter for FixedPrompter {
    fn pick_source_file(&self) -> Option<PathBuf> {
        self.source.clone()
    }

    fn pick_destination(&self) -> Option<PathBuf> {
        self.destination.clone()
    }
}
