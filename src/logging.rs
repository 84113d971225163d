/// Install the global `tracing` subscriber. `RUST_LOG` wins over the default
/// filter. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "media_downloader_lib=info,playlist_scraper=info,tauri=info".into());

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
