//! Wiremock integration tests for AniListClient.

use nekokai::{AniListClient, Domain, MediaSource, NekokaiError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn media_page(media: serde_json::Value) -> serde_json::Value {
    json!({ "data": { "Page": { "media": media } } })
}

/// Test a successful anime search.
#[tokio::test]
async fn test_search_success() {
    let mock_server = MockServer::start().await;

    let response = media_page(json!([
        {
            "id": 1,
            "title": { "romaji": "Cowboy Bebop", "english": "Cowboy Bebop", "native": "カウボーイビバップ" },
            "description": "In the year 2071...",
            "isAdult": false,
            "countryOfOrigin": "JP",
            "duration": 24,
            "siteUrl": "https://anilist.co/anime/1",
            "externalLinks": [{ "url": "https://www.crunchyroll.com/cowboy-bebop", "site": "Crunchyroll" }],
            "episodes": 26
        },
        null
    ]));

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("type: ANIME"))
        .and(body_partial_json(json!({ "variables": { "search": "bebop", "perPage": 25 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AniListClient::with_base_url(mock_server.uri()).unwrap();
    let entries = client
        .fetch_search(Domain::Anime, "bebop", 25)
        .await
        .expect("search should succeed");

    // Null media entries are skipped.
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].episodes, Some(26));
    assert_eq!(entries[0].title.english.as_deref(), Some("Cowboy Bebop"));
}

/// Test that the trending listing sorts by trend and sends no search term.
#[tokio::test]
async fn test_trending_manga() {
    let mock_server = MockServer::start().await;

    let response = media_page(json!([
        {
            "id": 30013,
            "title": { "romaji": "ONE PIECE", "english": "One Piece", "native": "ONE PIECE" },
            "chapters": null,
            "volumes": null
        }
    ]));

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("TRENDING_DESC"))
        .and(body_string_contains("type: MANGA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&mock_server)
        .await;

    let client = AniListClient::with_base_url(mock_server.uri()).unwrap();
    let entries = client.fetch_trending(Domain::Manga, 25).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 30013);
    assert!(entries[0].chapters.is_none());
}

/// Test that an empty page is a valid, empty result.
#[tokio::test]
async fn test_search_no_matches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(media_page(json!([]))))
        .mount(&mock_server)
        .await;

    let client = AniListClient::with_base_url(mock_server.uri()).unwrap();
    let entries = client.fetch_search(Domain::Anime, "zzzz", 25).await.unwrap();
    assert!(entries.is_empty());
}

/// Test that a non-2xx status maps to an API error.
#[tokio::test]
async fn test_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = AniListClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .fetch_search(Domain::Anime, "naruto", 25)
        .await
        .unwrap_err();

    match err {
        NekokaiError::Api { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal Server Error"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

/// Test that GraphQL errors without data map to a payload error.
#[tokio::test]
async fn test_graphql_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Too Many Requests.", "status": 429 }]
        })))
        .mount(&mock_server)
        .await;

    let client = AniListClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .fetch_search(Domain::Anime, "naruto", 25)
        .await
        .unwrap_err();

    assert!(matches!(&err, NekokaiError::Payload(m) if m == "Too Many Requests."));
    assert!(err.is_fetch_failure());
}

/// Test that a malformed body is a fetch failure.
#[tokio::test]
async fn test_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let client = AniListClient::with_base_url(mock_server.uri()).unwrap();
    let err = client
        .fetch_search(Domain::Anime, "naruto", 25)
        .await
        .unwrap_err();
    assert!(matches!(err, NekokaiError::Payload(_)));
    assert!(err.is_fetch_failure());
}
