//! End-to-end tests against mocked upstream services
//!
//! A wiremock server stands in for every third-party service; the router
//! is driven with `oneshot` exactly as in api_tests.rs.
//!
//! Covers:
//! - Stream resolution: ordered fallback across mirror instances/providers
//! - Track matching through the catalog search
//! - Video search paging with the scraped API key
//! - Lyrics exact-then-search fallback
//! - Scrobble-service error passthrough
//! - Media proxy headers
//! - Channel feed merging

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use virome_api::{build_router, AppState};
use virome_common::config::TomlConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test helper: every upstream lives under a path prefix on `base`
fn mock_config(base: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.upstream.timeout_secs = 5;
    config.upstream.music_api_base = format!("{}/music", base);
    config.upstream.video_web_base = format!("{}/web", base);
    config.upstream.video_api_base = format!("{}/video", base);
    config.upstream.suggest_url = format!("{}/suggest", base);
    config.upstream.lastfm_api_base = format!("{}/lastfm/", base);
    config.upstream.lastfm_api_key = Some("test-key".to_string());
    config.upstream.lyrics_api_base = format!("{}/lyrics", base);
    config.mirrors.manifest_url = format!("{}/manifest.json", base);
    config
}

fn setup_app(server: &MockServer) -> axum::Router {
    let state = AppState::new(&mock_config(&server.uri())).expect("Should build state");
    build_router(state)
}

fn test_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app.oneshot(test_request(uri)).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Stream resolution
// =============================================================================

async fn mount_manifest(server: &MockServer) {
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "piped": [format!("{}/piped-a", base), format!("{}/piped-b/", base)],
            "invidious": [format!("{}/inv-a", base), format!("{}/inv-b", base)]
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn invidious_video() -> Value {
    json!({
        "title": "Yellow",
        "author": "Coldplay",
        "lengthSeconds": 269,
        "viewCount": 1000000,
        "videoThumbnails": [{"url": "https://img/yellow.jpg"}],
        "adaptiveFormats": [
            {"type": "video/mp4; codecs=\"avc1\"", "url": "https://media/video.mp4", "bitrate": "900000"},
            {"type": "audio/webm; codecs=\"opus\"", "url": "https://media/audio.webm", "bitrate": "160000", "audioQuality": "AUDIO_QUALITY_MEDIUM"}
        ]
    })
}

#[tokio::test]
async fn test_stream_falls_through_to_second_provider() {
    let server = MockServer::start().await;
    mount_manifest(&server).await;

    Mock::given(method("GET"))
        .and(path("/piped-a/streams/yKNxeF4KMsY"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/piped-b/streams/yKNxeF4KMsY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audioStreams": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inv-a/api/v1/videos/yKNxeF4KMsY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invidious_video()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inv-b/api/v1/videos/yKNxeF4KMsY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invidious_video()))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/stream?id=yKNxeF4KMsY").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["service"], "invidious");
    assert_eq!(body["instance"], format!("{}/inv-a", server.uri()));
    assert_eq!(body["requestedId"], "yKNxeF4KMsY");
    assert_eq!(body["metadata"]["title"], "Yellow");

    let urls = body["streamingUrls"].as_array().unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0]["url"], "https://media/audio.webm");
    assert_eq!(urls[0]["bitrate"], 160000);
}

#[tokio::test]
async fn test_stream_prefers_first_working_piped_instance() {
    let server = MockServer::start().await;
    mount_manifest(&server).await;

    Mock::given(method("GET"))
        .and(path("/piped-a/streams/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Clocks",
            "uploader": "Coldplay",
            "duration": 307,
            "audioStreams": [
                {"url": "https://pipedproxy/a.m4a", "mimeType": "audio/mp4", "bitrate": 128000, "quality": "128 kbps"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/stream?id=abc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "piped");
    assert_eq!(body["instance"], format!("{}/piped-a", server.uri()));
    assert_eq!(body["streamingUrls"][0]["qualityLabel"], "128 kbps");
    assert_eq!(body["metadata"]["durationSeconds"], 307);
}

#[tokio::test]
async fn test_stream_with_every_instance_failing_is_404() {
    let server = MockServer::start().await;
    mount_manifest(&server).await;

    // Unmatched requests get wiremock's default 404, i.e. every instance fails
    let (status, body) = get_json(setup_app(&server), "/api/stream?id=abc").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "no working upstream found");

    let attempts = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() != "/manifest.json")
        .count();
    assert_eq!(attempts, 4);
}

// =============================================================================
// Track matching
// =============================================================================

fn song_item(title: &str, video_id: &str, artist: &str) -> Value {
    json!({"musicResponsiveListItemRenderer": {
        "flexColumns": [
            {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": title}]}}},
            {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [
                {"text": artist, "navigationEndpoint": {"browseEndpoint": {
                    "browseId": "UCartist",
                    "browseEndpointContextSupportedConfigs": {
                        "browseEndpointContextMusicConfig": {"pageType": "MUSIC_PAGE_TYPE_ARTIST"}
                    }
                }}},
                {"text": " • "},
                {"text": "4:29"}
            ]}}}
        ],
        "playlistItemData": {"videoId": video_id}
    }})
}

fn search_response(items: Vec<Value>) -> Value {
    json!({"contents": {"tabbedSearchResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
        "sectionListRenderer": {"contents": [{"musicShelfRenderer": {"contents": items}}]}
    }}}]}}})
}

#[tokio::test]
async fn test_music_find_returns_first_accepted_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/music/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(vec![
            song_item("Yellow (Remastered)", "remaster1", "Coldplay"),
            song_item("Yellow Submarine", "sub1", "The Beatles"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/music/find?name=Yellow&artist=Coldplay").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "remaster1");
    assert_eq!(body["data"]["artistNames"], json!(["Coldplay"]));
    assert_eq!(body["data"]["durationSeconds"], 269);
}

#[tokio::test]
async fn test_music_find_distinguishes_empty_and_filtered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/music/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(vec![song_item(
            "Yellow Submarine",
            "sub1",
            "The Beatles",
        )])))
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/music/find?name=Yellow&artist=Coldplay").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Song not found after filtering");

    let empty = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/music/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&empty)
        .await;

    let (status, body) = get_json(setup_app(&empty), "/api/music/find?name=Yellow&artist=Coldplay").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Song not found");
}

// =============================================================================
// Video platform search
// =============================================================================

fn results_page() -> String {
    let data = json!({"contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {
        "sectionListRenderer": {"contents": [
            {"itemSectionRenderer": {"contents": [{"videoRenderer": {
                "videoId": "lofi1",
                "title": {"runs": [{"text": "Lofi beats"}]},
                "lengthText": {"simpleText": "3:00"}
            }}]}},
            {"continuationItemRenderer": {"continuationEndpoint": {"continuationCommand": {"token": "NEXT"}}}}
        ]}
    }}}});
    format!(
        r#"<html><script>ytcfg.set({{"INNERTUBE_API_KEY":"k123","clientVersion":"2.20250101.00.00"}});</script><script>var ytInitialData = {};</script></html>"#,
        data
    )
}

#[tokio::test]
async fn test_video_search_then_continuation_uses_scraped_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/web/results"))
        .and(query_param("search_query", "lofi"))
        .and(query_param("sp", "EgIQAQ%3D%3D"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/video/search"))
        .and(query_param("key", "k123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "onResponseReceivedCommands": [{"appendContinuationItemsAction": {"continuationItems": [
                {"itemSectionRenderer": {"contents": [{"videoRenderer": {"videoId": "lofi2"}}]}}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = setup_app(&server);

    let (status, body) = get_json(app.clone(), "/api/yt_search?q=lofi&filter=videos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["type"], "video");
    assert_eq!(body["results"][0]["id"], "lofi1");
    assert_eq!(body["results"][0]["durationSeconds"], 180);
    assert_eq!(body["continuationToken"], "NEXT");

    let (status, body) = get_json(app, "/api/yt_search?continuationToken=NEXT&filter=videos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["id"], "lofi2");
    assert_eq!(body["continuationToken"], Value::Null);
}

// =============================================================================
// Lyrics
// =============================================================================

#[tokio::test]
async fn test_lyrics_fall_back_to_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lyrics/get"))
        .and(query_param("track_name", "Yellow"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404, "name": "TrackNotFound", "message": "Failed to find specified track"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lyrics/search"))
        .and(query_param("q", "Yellow Coldplay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "trackName": "Yellow",
            "artistName": "Coldplay",
            "albumName": "Parachutes",
            "duration": 266.0,
            "plainLyrics": "Look at the stars",
            "syncedLyrics": "[00:33.10] Look at the stars"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/lyrics?title=Yellow&artist=Coldplay").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["albumName"], "Parachutes");
    assert_eq!(body["syncedLyrics"], "[00:33.10] Look at the stars");
}

#[tokio::test]
async fn test_lyrics_miss_everywhere_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lyrics/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/lyrics?title=Nothing&artist=Nobody&duration=200").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Lyrics not found");
}

// =============================================================================
// Scrobble service
// =============================================================================

#[tokio::test]
async fn test_lastfm_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lastfm/"))
        .and(query_param("method", "track.getInfo"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": 6, "message": "Track not found"
        })))
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/track/info?title=Nope&artist=Nobody").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Track not found");
}

#[tokio::test]
async fn test_artist_info_is_flattened_into_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lastfm/"))
        .and(query_param("method", "artist.getinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"artist": {
            "name": "Coldplay",
            "bio": {"summary": "British band. <a href=\"x\">Read more</a>"},
            "tags": {"tag": [{"name": "rock"}]},
            "stats": {"listeners": "7", "playcount": "9"}
        }})))
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/artist/info?artist=Coldplay").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["name"], "Coldplay");
    assert_eq!(body["bio"], "British band. Read more");
    assert_eq!(body["tags"], json!(["rock"]));
    assert_eq!(body["stats"]["listeners"], "7");
}

#[tokio::test]
async fn test_top_tracks_without_country_use_global_chart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lastfm/"))
        .and(query_param("method", "chart.gettoptracks"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tracks": {"track": [
            {"name": "Espresso", "artist": {"name": "Sabrina Carpenter"}, "playcount": "100"}
        ]}})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/top/tracks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["country"], "Global");
    assert_eq!(body["tracks"][0]["name"], "Espresso");
    assert_eq!(body["tracks"][0]["artist"], "Sabrina Carpenter");
}

// =============================================================================
// Media proxy
// =============================================================================

#[tokio::test]
async fn test_proxy_streams_body_with_cache_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/a.webm"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/webm")
                .set_body_bytes(vec![1u8, 2, 3, 4]),
        )
        .mount(&server)
        .await;

    let uri = format!("/api/proxy?url={}/media/a.webm", server.uri());
    let response = setup_app(&server).oneshot(test_request(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/webm");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), &[1u8, 2, 3, 4]);
}

#[tokio::test]
async fn test_proxy_upstream_error_is_bad_gateway() {
    let server = MockServer::start().await;
    let uri = format!("/api/proxy?url={}/media/missing.webm", server.uri());

    let (status, body) = get_json(setup_app(&server), &uri).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to fetch audio");
}

// =============================================================================
// Channel feed
// =============================================================================

fn channel_page() -> Value {
    let video = |id: &str, length: &str, published: &str| {
        json!({"richItemRenderer": {"content": {"videoRenderer": {
            "videoId": id,
            "title": {"runs": [{"text": format!("Video {}", id)}]},
            "lengthText": {"simpleText": length},
            "viewCountText": {"simpleText": "1,234 views"},
            "publishedTimeText": {"simpleText": published},
            "thumbnail": {"thumbnails": [{"url": "https://i/t.jpg"}]}
        }}}})
    };

    json!({
        "metadata": {"channelMetadataRenderer": {"title": "Some Channel"}},
        "contents": {"twoColumnBrowseResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
            "richGridRenderer": {"contents": [
                video("old", "10:00", "3 weeks ago"),
                video("short", "0:45", "1 hour ago"),
                video("new", "4:00", "2 days ago")
            ]}
        }}}]}}
    })
}

#[tokio::test]
async fn test_feed_drops_shorts_and_sorts_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/browse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_page()))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(setup_app(&server), "/api/feed/channels=UCsome").await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(items[0]["author"], "Some Channel");
    assert_eq!(items[0]["authorId"], "UCsome");
    assert_eq!(items[0]["views"], "1234");
    assert_eq!(items[0]["isShort"], false);
}

#[tokio::test]
async fn test_feed_skips_failing_channels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/browse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = get_json(
        setup_app(&server),
        "/api/feed/unauthenticated?channels=UCa,UCb&preview=1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
