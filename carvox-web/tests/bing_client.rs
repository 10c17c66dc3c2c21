//! Integration tests for `BingApi` using wiremock HTTP mocks.

use carvox_common::{CarQuery, CarvoxError, ReviewSource};
use carvox_config::BingConfig;
use carvox_web::BingApi;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> BingConfig {
    BingConfig {
        api_key: "bing-test-key".into(),
        endpoint: format!("{}/v7.0/search", server.uri()),
        result_count: 5,
    }
}

#[tokio::test]
async fn returns_at_most_five_title_snippet_fragments() {
    let server = MockServer::start().await;
    let value: Vec<_> = (1..=7)
        .map(|i| json!({ "name": format!("Review {i}"), "url": format!("https://example.com/{i}"), "snippet": format!("Snippet {i}") }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .and(header("ocp-apim-subscription-key", "bing-test-key"))
        .and(query_param("q", "Honda Civic reviews opinions pros cons"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_type": "SearchResponse",
            "webPages": { "totalEstimatedMatches": 7, "value": value }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = BingApi::new(&test_config(&server), None).expect("client builds");
    let reviews = api
        .fetch_reviews(&CarQuery::new("Honda Civic"))
        .await
        .expect("search succeeds");

    assert_eq!(reviews.len(), 5);
    for (i, fragment) in reviews.iter().enumerate() {
        assert_eq!(fragment, format!("Review {}: Snippet {}", i + 1, i + 1));
    }
}

#[tokio::test]
async fn unauthorized_fails_with_status_and_body() {
    let server = MockServer::start().await;
    let body = r#"{"_type":"ErrorResponse","errors":[{"code":"InvalidAuthorization","message":"Access denied due to invalid subscription key."}]}"#;
    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let api = BingApi::new(&test_config(&server), None).unwrap();
    let err = api
        .fetch_reviews(&CarQuery::new("Honda Civic"))
        .await
        .unwrap_err();

    match err {
        CarvoxError::Http { status, body: got } => {
            assert_eq!(status, 401);
            assert_eq!(got, body);
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_web_pages_yields_no_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "_type": "SearchResponse", "rankingResponse": {} })),
        )
        .mount(&server)
        .await;

    let api = BingApi::new(&test_config(&server), None).unwrap();
    let reviews = api.fetch_reviews(&CarQuery::new("Lada Niva")).await.unwrap();
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn non_json_success_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let api = BingApi::new(&test_config(&server), None).unwrap();
    let err = api.fetch_reviews(&CarQuery::new("Civic")).await.unwrap_err();
    assert!(matches!(err, CarvoxError::Parse(_)), "got {err:?}");
}

#[test]
fn missing_key_fails_before_any_request() {
    let cfg = BingConfig {
        api_key: String::new(),
        endpoint: "http://127.0.0.1:9/v7.0/search".into(),
        result_count: 5,
    };
    let err = BingApi::new(&cfg, None).unwrap_err();
    assert!(err.is_auth());
}
