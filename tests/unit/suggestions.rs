use std::sync::Arc;
use std::time::Duration;

use crate::common::fixtures::info;
use crate::common::mocks::{MockBackend, StubSearch};
use crate::{assert_eq, assert_matches};
use serde_json::json;
use tunedeck::commands::music::audio_sources::{
    ExtractError,
    suggestions::{
        SongSearch, Suggestion, SuggestionService, deezer::DeezerSearch, itunes::ItunesSearch,
    },
};
use tunedeck::commands::music::utils::music_manager::MusicError;
use tunedeck::config::SuggestionSettings;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(provider: Arc<StubSearch>, backend: MockBackend) -> SuggestionService {
    crate::test_utils::init();
    SuggestionService::new(provider, Arc::new(backend), SuggestionSettings::default())
}

fn unused_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_extract().never();
    backend
}

fn songs() -> Vec<Suggestion> {
    vec![
        Suggestion::from_song(Some("One More Time"), Some("Daft Punk")).unwrap(),
        Suggestion::from_song(Some("Digital Love"), Some("Daft Punk")).unwrap(),
    ]
}

#[test]
fn catalogue_hits_become_search_phrases() {
    let song = Suggestion::from_song(Some(" Around the World "), Some("Daft Punk")).unwrap();
    assert_eq!(song.label, "Around the World — Daft Punk");
    assert_eq!(song.value, "Around the World Daft Punk audio");

    let untitled = Suggestion::from_song(Some("  "), Some("Daft Punk"));
    assert!(untitled.is_none());
}

#[tokio::test]
async fn short_queries_return_nothing() {
    let provider = StubSearch::returning(songs());
    let service = service(provider.clone(), unused_backend());

    assert!(service.suggest("d").await.is_empty());
    assert!(service.suggest(" d ").await.is_empty());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn repeated_queries_are_served_from_cache() {
    let provider = StubSearch::returning(songs());
    let service = service(provider.clone(), unused_backend());

    let first = service.suggest("Daft Punk").await;
    let second = service.suggest("  daft punk ").await;

    assert_eq!(first, songs());
    assert_eq!(second, first);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn empty_catalogue_falls_back_to_a_flat_search() {
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(|r| r.target == "ytsearch10:bootleg remix" && r.flat)
        .times(1)
        .returning(|_| {
            Ok(info(json!({
                "entries": [
                    { "title": "Bootleg Remix", "url": "https://video.example/watch?v=1" },
                    null,
                    { "webpage_url": "https://video.example/watch?v=2" },
                    { "title": "No link at all" }
                ]
            })))
        });
    let service = service(StubSearch::returning(Vec::new()), backend);

    let suggestions = service.suggest("bootleg remix").await;

    assert_eq!(
        suggestions,
        vec![
            Suggestion::new("Bootleg Remix", "https://video.example/watch?v=1"),
            Suggestion::new(
                "https://video.example/watch?v=2",
                "https://video.example/watch?v=2"
            ),
        ]
    );
}

#[tokio::test]
async fn failures_are_cached_too() {
    let provider = StubSearch::failing();
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .times(1)
        .returning(|_| Err(ExtractError::Spawn("No such file or directory".to_string())));
    let service = service(provider.clone(), backend);

    assert!(service.suggest("nothing anywhere").await.is_empty());
    assert!(service.suggest("nothing anywhere").await.is_empty());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cached_entries_expire() {
    let provider = StubSearch::returning(songs());
    let service = service(provider.clone(), unused_backend());

    service.suggest("daft punk").await;
    tokio::time::advance(Duration::from_secs(119)).await;
    service.suggest("daft punk").await;
    assert_eq!(provider.calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    service.suggest("daft punk").await;
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_catalogue_is_abandoned_for_the_fallback() {
    let provider = StubSearch::slow(songs(), Duration::from_secs(5));
    let mut backend = MockBackend::new();
    backend.expect_extract().times(1).returning(|_| {
        Ok(info(json!({
            "entries": [{ "title": "Fallback", "url": "https://video.example/watch?v=f" }]
        })))
    });
    let service = service(provider, backend);

    let started = tokio::time::Instant::now();
    let suggestions = service.suggest("daft punk").await;

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].label, "Fallback");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn labels_are_cut_to_the_choice_limit() {
    let long = "x".repeat(150);
    let provider = StubSearch::returning(vec![Suggestion::new(&long, &long)]);
    let service = service(provider, unused_backend());

    let suggestions = service.suggest("long one").await;
    assert_eq!(suggestions[0].label.chars().count(), 100);
    assert_eq!(suggestions[0].value.chars().count(), 100);
}

#[tokio::test]
async fn itunes_results_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("term", "daft punk"))
        .and(query_param("media", "music"))
        .and(query_param("entity", "song"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultCount": 3,
            "results": [
                { "trackName": "One More Time", "artistName": "Daft Punk" },
                { "collectionName": "Discovery", "artistName": "Daft Punk" },
                { "artistName": "Daft Punk" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = ItunesSearch::with_endpoint(reqwest::Client::new(), format!("{}/search", server.uri()));
    let results = search.search("daft punk", 5).await.unwrap();

    assert_eq!(
        results,
        vec![
            Suggestion::new("One More Time — Daft Punk", "One More Time Daft Punk audio"),
            Suggestion::new("Discovery — Daft Punk", "Discovery Daft Punk audio"),
        ]
    );
}

#[tokio::test]
async fn deezer_results_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "harder better"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "title": "Harder, Better, Faster, Stronger", "artist": { "name": "Daft Punk" } },
                { "title": "Harder Better (cover)" }
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    let search = DeezerSearch::with_endpoint(reqwest::Client::new(), format!("{}/search", server.uri()));
    let results = search.search("harder better", 10).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].label, "Harder, Better, Faster, Stronger — Daft Punk");
    assert_eq!(results[1].value, "Harder Better (cover) audio");
}

#[tokio::test]
async fn catalogue_http_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let search = ItunesSearch::with_endpoint(reqwest::Client::new(), format!("{}/search", server.uri()));
    let result = search.search("anything", 10).await;

    assert_matches!(result, Err(MusicError::ExternalApiError(message)) if message.contains("503"));
}
