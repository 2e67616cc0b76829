use std::sync::Arc;
use std::time::Duration;

use crate::common::fixtures::{info, search_result};
use crate::common::mocks::{HangingBackend, MockBackend};
use crate::assert_matches;
use serde_json::json;
use test_case::test_case;
use tunedeck::commands::music::audio_sources::{
    AudioSource, ExtractError, TrackResolver, resolver::ResolutionError,
    track_descriptor::UNKNOWN_TITLE,
};
use tunedeck::config::ResolverSettings;

const USER_AGENT: &str = "tunedeck-test/1.0";

/// Default timeouts, one attempt per query form.
fn single_client() -> ResolverSettings {
    ResolverSettings {
        client_profiles: Vec::new(),
        ..ResolverSettings::default()
    }
}

fn resolver(backend: MockBackend) -> TrackResolver {
    resolver_with(backend, single_client())
}

fn resolver_with(backend: MockBackend, settings: ResolverSettings) -> TrackResolver {
    crate::test_utils::init();
    TrackResolver::new(Arc::new(backend), settings, USER_AGENT)
}

#[test_case("https://www.youtube.com/watch?v=dQw4w9WgXcQ" => true)]
#[test_case("soundcloud://track/1" => true)]
#[test_case("never gonna give you up" => false)]
#[test_case("www.example.com/song" => false)]
fn links_are_told_apart_from_search_text(input: &str) -> bool {
    AudioSource::is_url(input)
}

#[tokio::test]
async fn blank_query_never_reaches_the_extractor() {
    let mut backend = MockBackend::new();
    backend.expect_extract().never();

    let result = resolver(backend).resolve("   ").await;
    assert_eq!(result, Err(ResolutionError::EmptyQuery));
}

#[tokio::test]
async fn link_is_passed_through_verbatim() {
    let link = "https://video.example/watch?v=42";
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(move |r| r.target == link && r.default_search == Some("auto") && !r.flat)
        .times(1)
        .returning(|_| Ok(info(json!({ "url": "https://cdn.example/42.webm" }))));

    let track = resolver(backend).resolve(link).await.unwrap();

    assert_eq!(track.title, UNKNOWN_TITLE);
    assert_eq!(track.stream_uri, "https://cdn.example/42.webm");
    assert_eq!(track.origin_page_uri.as_deref(), Some(link));
    assert_eq!(track.header("user-agent"), Some(USER_AGENT));
}

#[tokio::test]
async fn search_text_takes_the_first_result() {
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(|r| r.target == "ytsearch1:lofi beats" && r.default_search.is_none())
        .times(1)
        .returning(|_| {
            Ok(search_result(
                "Lofi Beats",
                "https://cdn.example/lofi.webm",
                "https://video.example/watch?v=lofi",
            ))
        });

    let track = resolver(backend).resolve("  lofi beats ").await.unwrap();

    assert_eq!(track.title, "Lofi Beats");
    assert_eq!(track.stream_uri, "https://cdn.example/lofi.webm");
    assert_eq!(track.display_link(), "https://video.example/watch?v=lofi");
    assert_eq!(
        track.thumbnail_uri.as_deref(),
        Some("https://img.example/cover.jpg")
    );
    // Headers the extractor asked for win over the default agent
    assert_eq!(track.header("User-Agent"), Some("extractor-agent/2.0"));
    assert_eq!(track.header("accept"), Some("*/*"));
}

#[tokio::test]
async fn each_client_profile_is_tried_in_turn() {
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(|r| r.profile.as_deref() == Some("android"))
        .times(1)
        .returning(|_| Err(ExtractError::Failed("Sign in to confirm".to_string())));
    backend
        .expect_extract()
        .withf(|r| r.profile.as_deref() == Some("web"))
        .times(1)
        .returning(|_| {
            Ok(search_result(
                "Found",
                "https://cdn.example/found.webm",
                "https://video.example/watch?v=found",
            ))
        });

    let settings = ResolverSettings {
        client_profiles: vec!["android".to_string(), "web".to_string()],
        ..ResolverSettings::default()
    };
    let track = resolver_with(backend, settings).resolve("found").await.unwrap();
    assert_eq!(track.title, "Found");
}

#[tokio::test]
async fn empty_search_falls_back_to_the_plain_query() {
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(|r| r.target == "ytsearch1:obscure demo")
        .times(1)
        .returning(|_| Ok(info(json!({ "_type": "playlist", "entries": [] }))));
    backend
        .expect_extract()
        .withf(|r| r.target == "obscure demo" && r.default_search == Some("ytsearch"))
        .times(1)
        .returning(|_| {
            Ok(search_result(
                "Obscure Demo",
                "https://cdn.example/demo.webm",
                "https://video.example/watch?v=demo",
            ))
        });

    let track = resolver(backend).resolve("obscure demo").await.unwrap();
    assert_eq!(track.title, "Obscure Demo");
}

#[tokio::test]
async fn entry_without_a_stream_is_followed_up_once() {
    let page = "https://video.example/watch?v=flat";
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(|r| r.target.starts_with("ytsearch1:"))
        .times(1)
        .returning(move |_| {
            Ok(info(json!({
                "entries": [{ "title": "Short title", "webpage_url": page }]
            })))
        });
    backend
        .expect_extract()
        .withf(move |r| r.target == page && r.default_search == Some("auto"))
        .times(1)
        .returning(|_| {
            Ok(info(json!({
                "title": "Full Title",
                "url": "https://cdn.example/flat.webm",
                "http_headers": { "Referer": "https://video.example/" }
            })))
        });

    let track = resolver(backend).resolve("flat entry").await.unwrap();

    assert_eq!(track.title, "Full Title");
    assert_eq!(track.stream_uri, "https://cdn.example/flat.webm");
    assert_eq!(track.origin_page_uri.as_deref(), Some(page));
    assert_eq!(track.header("referer"), Some("https://video.example/"));
    assert_eq!(track.header("user-agent"), Some(USER_AGENT));
}

#[tokio::test]
async fn all_attempts_timing_out_is_reported_as_a_timeout() {
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .times(2)
        .returning(|_| Err(ExtractError::Timeout));

    let result = resolver(backend).resolve("slow song").await;
    assert_eq!(result, Err(ResolutionError::Timeout));
}

#[tokio::test]
async fn mixed_failures_are_reported_as_not_found() {
    let mut backend = MockBackend::new();
    backend
        .expect_extract()
        .withf(|r| r.target.starts_with("ytsearch1:"))
        .returning(|_| Err(ExtractError::Timeout));
    backend
        .expect_extract()
        .withf(|r| !r.target.starts_with("ytsearch1:"))
        .returning(|_| Err(ExtractError::Malformed("expected value".to_string())));

    let result = resolver(backend).resolve("nothing here").await;
    assert_eq!(result, Err(ResolutionError::NotFound));
}

#[tokio::test(start_paused = true)]
async fn unresponsive_extractor_is_bounded_by_the_timeouts() {
    crate::test_utils::init();
    let resolver = TrackResolver::new(
        Arc::new(HangingBackend),
        single_client(),
        USER_AGENT,
    );

    let started = tokio::time::Instant::now();
    let result = resolver.resolve("anything").await;

    assert_matches!(result, Err(ResolutionError::Timeout));
    // Search form then plain form, each at its own limit
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_secs(22) && elapsed < Duration::from_secs(23),
        "{elapsed:?}"
    );
}
