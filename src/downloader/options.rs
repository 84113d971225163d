// Engine option set
//
// Every option the download flow hands to yt-dlp lives here. Instances are
// only created through `EngineOptionsBuilder::build`, which rejects
// combinations the engine would misbehave on.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::errors::MediaError;
use super::traits::ProgressHook;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Extract and transcode the audio track
    ExtractAudio { codec: String, bitrate_kbps: u32 },
    /// Remux the merged output into another container
    RemuxVideo { container: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRequest {
    pub languages: Vec<String>,
    /// Preferred subtitle format as served by the site
    pub format: String,
}

#[derive(Clone)]
pub struct EngineOptions {
    output_template: String,
    format: Option<String>,
    playlist: bool,
    retries: u32,
    fragment_retries: u32,
    socket_timeout: Option<u32>,
    post_processors: Vec<PostProcessor>,
    subtitles: Option<SubtitleRequest>,
    skip_download: bool,
    ffmpeg_location: Option<PathBuf>,
    progress_hook: Option<Arc<dyn ProgressHook>>,
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("output_template", &self.output_template)
            .field("format", &self.format)
            .field("playlist", &self.playlist)
            .field("retries", &self.retries)
            .field("fragment_retries", &self.fragment_retries)
            .field("socket_timeout", &self.socket_timeout)
            .field("post_processors", &self.post_processors)
            .field("subtitles", &self.subtitles)
            .field("skip_download", &self.skip_download)
            .field("ffmpeg_location", &self.ffmpeg_location)
            .field("progress_hook", &self.progress_hook.is_some())
            .finish()
    }
}

impl EngineOptions {
    pub fn builder(output_template: impl Into<String>) -> EngineOptionsBuilder {
        EngineOptionsBuilder::new(output_template)
    }

    pub fn output_template(&self) -> &str {
        &self.output_template
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn post_processors(&self) -> &[PostProcessor] {
        &self.post_processors
    }

    pub fn subtitles(&self) -> Option<&SubtitleRequest> {
        self.subtitles.as_ref()
    }

    pub fn skip_download(&self) -> bool {
        self.skip_download
    }

    pub fn progress_hook(&self) -> Option<&Arc<dyn ProgressHook>> {
        self.progress_hook.as_ref()
    }

    /// Command-line form, without the progress template and the URL
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            self.output_template.clone(),
            if self.playlist { "--yes-playlist" } else { "--no-playlist" }.to_string(),
            "--retries".to_string(),
            self.retries.to_string(),
            "--fragment-retries".to_string(),
            self.fragment_retries.to_string(),
            "--no-warnings".to_string(),
        ];

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        if let Some(secs) = self.socket_timeout {
            args.push("--socket-timeout".to_string());
            args.push(secs.to_string());
        }

        for pp in &self.post_processors {
            match pp {
                PostProcessor::ExtractAudio {
                    codec,
                    bitrate_kbps,
                } => {
                    args.extend([
                        "-x".to_string(),
                        "--audio-format".to_string(),
                        codec.clone(),
                        "--audio-quality".to_string(),
                        format!("{}K", bitrate_kbps),
                    ]);
                }
                PostProcessor::RemuxVideo { container } => {
                    args.push("--remux-video".to_string());
                    args.push(container.clone());
                }
            }
        }

        if let Some(subs) = &self.subtitles {
            args.extend([
                "--write-subs".to_string(),
                "--sub-langs".to_string(),
                subs.languages.join(","),
                "--sub-format".to_string(),
                subs.format.clone(),
            ]);
        }

        if self.skip_download {
            args.push("--skip-download".to_string());
        }

        if let Some(path) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args
    }
}

pub struct EngineOptionsBuilder {
    options: EngineOptions,
}

impl EngineOptionsBuilder {
    pub fn new(output_template: impl Into<String>) -> Self {
        Self {
            options: EngineOptions {
                output_template: output_template.into(),
                format: None,
                playlist: false,
                retries: 10,
                fragment_retries: 10,
                socket_timeout: None,
                post_processors: Vec::new(),
                subtitles: None,
                skip_download: false,
                ffmpeg_location: None,
                progress_hook: None,
            },
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.options.format = Some(format.into());
        self
    }

    pub fn playlist(mut self, enabled: bool) -> Self {
        self.options.playlist = enabled;
        self
    }

    pub fn retries(mut self, retries: u32, fragment_retries: u32) -> Self {
        self.options.retries = retries;
        self.options.fragment_retries = fragment_retries;
        self
    }

    pub fn socket_timeout(mut self, seconds: Option<u32>) -> Self {
        self.options.socket_timeout = seconds;
        self
    }

    pub fn post_processor(mut self, pp: PostProcessor) -> Self {
        self.options.post_processors.push(pp);
        self
    }

    pub fn subtitles(mut self, request: SubtitleRequest) -> Self {
        self.options.subtitles = Some(request);
        self
    }

    pub fn skip_download(mut self, skip: bool) -> Self {
        self.options.skip_download = skip;
        self
    }

    pub fn ffmpeg_location(mut self, path: Option<PathBuf>) -> Self {
        self.options.ffmpeg_location = path;
        self
    }

    pub fn progress_hook(mut self, hook: Arc<dyn ProgressHook>) -> Self {
        self.options.progress_hook = Some(hook);
        self
    }

    pub fn build(self) -> Result<EngineOptions, MediaError> {
        let o = &self.options;

        if !o.output_template.contains("%(ext)s") {
            return Err(MediaError::InvalidOptions(
                "output template must end in %(ext)s".to_string(),
            ));
        }
        if o.format.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(MediaError::InvalidOptions("empty format expression".to_string()));
        }
        if o.skip_download && o.subtitles.is_none() {
            return Err(MediaError::InvalidOptions(
                "skip_download without a subtitle request does nothing".to_string(),
            ));
        }
        if let Some(subs) = &o.subtitles {
            if subs.languages.is_empty() || subs.languages.iter().any(|l| l.trim().is_empty()) {
                return Err(MediaError::MissingLanguage);
            }
        }
        for pp in &o.post_processors {
            match pp {
                PostProcessor::ExtractAudio {
                    codec,
                    bitrate_kbps,
                } if codec.is_empty() || *bitrate_kbps == 0 => {
                    return Err(MediaError::InvalidOptions(
                        "audio extraction needs a codec and a bitrate".to_string(),
                    ));
                }
                PostProcessor::RemuxVideo { container } if container.is_empty() => {
                    return Err(MediaError::InvalidOptions(
                        "remux needs a target container".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(self.options)
    }
}
