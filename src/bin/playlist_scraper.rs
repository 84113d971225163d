// Console playlist scraper: lists a playlist into titles.txt and links.txt

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

use media_downloader_lib::config::Settings;
use media_downloader_lib::downloader::resolver::resolve_playlist;
use media_downloader_lib::downloader::tools::resolve_ytdlp_path;
use media_downloader_lib::downloader::YtDlpEngine;
use media_downloader_lib::logging::init_tracing;

const TITLES_FILE: &str = "titles.txt";
const LINKS_FILE: &str = "links.txt";

/// One entry per line, each followed by `\n`.
fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> io::Result<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    std::fs::write(path, content)
}

fn prompt(message: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(message.as_bytes())?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = Settings::load()?;
    let url = prompt("Give the playlist URL: ")?;
    if url.is_empty() {
        bail!("no playlist URL given");
    }

    let engine = YtDlpEngine::new(resolve_ytdlp_path(&settings), settings.info_timeout_secs);
    let manifest = resolve_playlist(&engine, &url)
        .await
        .with_context(|| format!("Failed to list playlist {}", url))?;

    write_lines(Path::new(TITLES_FILE), &manifest.titles())
        .with_context(|| format!("Failed to write {}", TITLES_FILE))?;
    write_lines(Path::new(LINKS_FILE), &manifest.urls())
        .with_context(|| format!("Failed to write {}", LINKS_FILE))?;

    tracing::info!(
        "wrote {} entries of {:?} to {} and {}",
        manifest.entries.len(),
        manifest.title,
        TITLES_FILE,
        LINKS_FILE
    );
    Ok(())
}
