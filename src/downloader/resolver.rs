// Link/query and playlist resolution

use serde_json::Value;

use super::errors::MediaError;
use super::models::{PlaylistManifest, ResolvedItem};
use super::traits::{Engine, InfoMode};
use super::utils::{folder_name, sanitize_title, UNTITLED};

/// Search prefix understood by the engine; returns the first match only
pub const SEARCH_PREFIX: &str = "ytsearch:";

const MISSING_TITLE: &str = "Title not found";

/// Whether the input should be treated as a link rather than a search term
pub fn is_url(input: &str) -> bool {
    url::Url::parse(input.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Resolve a URL or a free-text query to a single item.
pub async fn resolve_query(engine: &dyn Engine, query: &str) -> Result<ResolvedItem, MediaError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(MediaError::Resolution("empty query".to_string()));
    }

    let info = if is_url(query) {
        engine.extract_info(query, InfoMode::Single).await?
    } else {
        let results = engine
            .extract_info(&format!("{}{}", SEARCH_PREFIX, query), InfoMode::Single)
            .await?;
        results["entries"]
            .as_array()
            .and_then(|entries| entries.first())
            .cloned()
            .ok_or_else(|| MediaError::NoResults(query.to_string()))?
    };

    let title = info["title"].as_str().unwrap_or(MISSING_TITLE);
    let url = info["webpage_url"]
        .as_str()
        .or_else(|| info["original_url"].as_str())
        .map(str::to_string)
        .or_else(|| is_url(query).then(|| query.to_string()))
        .ok_or_else(|| MediaError::Resolution(format!("no URL for {}", query)))?;

    let item = ResolvedItem::new(title, url);
    tracing::info!("resolved {:?} -> {} ({})", query, item.title, item.url);
    Ok(item)
}

/// Flat playlist listing. Entries without both a title and a URL are dropped.
pub async fn resolve_playlist(
    engine: &dyn Engine,
    playlist_url: &str,
) -> Result<PlaylistManifest, MediaError> {
    let data = engine
        .extract_info(playlist_url.trim(), InfoMode::FlatPlaylist)
        .await
        .map_err(|e| MediaError::PlaylistFetch(e.to_string()))?;

    // The title names a folder and the manifest file
    let title = folder_name(&sanitize_title(data["title"].as_str().unwrap_or(UNTITLED)));

    let entries: Vec<ResolvedItem> = data["entries"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(playlist_entry)
        .collect();

    tracing::info!("playlist {:?}: {} entries", title, entries.len());
    Ok(PlaylistManifest { title, entries })
}

fn playlist_entry(entry: &Value) -> Option<ResolvedItem> {
    let title = entry["title"].as_str()?;
    let url = entry["url"].as_str()?;
    Some(ResolvedItem::new(title, url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::testing::{Call, FakeEngine};
    use serde_json::json;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://www.youtube.com/watch?v=x"));
        assert!(is_url("http://example.com"));
        assert!(!is_url("never gonna give you up"));
        assert!(!is_url("httpfoo bar"));
        assert!(!is_url("ftp://example.com/file"));
    }

    #[tokio::test]
    async fn test_direct_url_never_searches() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        let engine = FakeEngine::new().with_info(
            url,
            json!({"title": "Rick: Never", "webpage_url": url}),
        );

        let item = resolve_query(&engine, url).await.unwrap();

        assert_eq!(item.title, "Rick_ Never");
        assert_eq!(item.url, url);
        assert_eq!(engine.calls(), vec![Call::Info(url.to_string(), InfoMode::Single)]);
    }

    #[tokio::test]
    async fn test_query_takes_first_search_result() {
        let engine = FakeEngine::new().with_info(
            "ytsearch:never gonna give you up",
            json!({"entries": [
                {"title": "Rick Astley - Never Gonna Give You Up", "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"},
                {"title": "Other", "webpage_url": "https://www.youtube.com/watch?v=other"}
            ]}),
        );

        let item = resolve_query(&engine, "never gonna give you up").await.unwrap();

        assert_eq!(item.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(
            engine.calls(),
            vec![Call::Info(
                "ytsearch:never gonna give you up".to_string(),
                InfoMode::Single
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_search_is_no_results() {
        let engine = FakeEngine::new().with_info("ytsearch:zzz", json!({"entries": []}));
        let err = resolve_query(&engine, "zzz").await.unwrap_err();
        assert_eq!(err, MediaError::NoResults("zzz".to_string()));
    }

    #[tokio::test]
    async fn test_missing_title_placeholder() {
        let url = "https://example.com/v/1";
        let engine = FakeEngine::new().with_info(url, json!({}));
        let item = resolve_query(&engine, url).await.unwrap();
        assert_eq!(item.title, "Title not found");
        assert_eq!(item.url, url);
    }

    #[tokio::test]
    async fn test_playlist_drops_incomplete_entries_in_order() {
        let url = "https://www.youtube.com/playlist?list=PL1";
        let engine = FakeEngine::new().with_info(
            url,
            json!({
                "title": "Mix: 2024",
                "entries": [
                    {"title": "A/1", "url": "https://y/a"},
                    {"title": "no url"},
                    {"url": "https://y/nourl"},
                    {"title": "B", "url": "https://y/b"},
                    {"title": null, "url": "https://y/null"},
                    {"title": "C", "url": "https://y/c"}
                ]
            }),
        );

        let manifest = resolve_playlist(&engine, url).await.unwrap();

        assert_eq!(manifest.title, "Mix_ 2024");
        assert_eq!(manifest.file_name(), "Mix_ 2024.txt");
        assert_eq!(manifest.titles(), vec!["A_1", "B", "C"]);
        assert_eq!(manifest.urls(), vec!["https://y/a", "https://y/b", "https://y/c"]);
        assert_eq!(engine.calls(), vec![Call::Info(url.to_string(), InfoMode::FlatPlaylist)]);
    }

    #[tokio::test]
    async fn test_playlist_engine_failure() {
        let engine = FakeEngine::new();
        let err = resolve_playlist(&engine, "https://www.youtube.com/playlist?list=gone")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::PlaylistFetch(_)));
        assert_eq!(
            err.to_string(),
            "There was an error while downloading the playlist."
        );
    }
}
