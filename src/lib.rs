pub mod config;
pub mod downloader;
pub mod logging;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init_tracing();

    let settings = config::Settings::load().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default settings: {:#}", e);
        config::Settings::default()
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(commands::AppState::new(settings))
        .invoke_handler(tauri::generate_handler![
            commands::start_download,
            commands::download_subtitles,
            commands::cancel_download,
            commands::get_tools_status,
            commands::get_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
