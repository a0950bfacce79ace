mod common;

use relay_engine::{user_agent, FailureKind, RedditSource, Source};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok", "token_type": "bearer"})),
        )
        .mount(server)
        .await;
}

async fn login(server: &MockServer) -> RedditSource {
    let config = common::sample_config();
    RedditSource::login(
        reqwest::Client::new(),
        &server.uri(),
        &server.uri(),
        &config.credentials,
    )
    .await
    .expect("login ok")
}

#[tokio::test]
async fn fetch_combines_route_and_params() {
    common::init_logging();
    let config = common::sample_config();
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/pics/top"))
        .and(query_param("limit", "70"))
        .and(query_param("t", "day"))
        .and(header("authorization", "Bearer tok"))
        .and(header("user-agent", user_agent(&config.credentials).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Listing",
            "data": {"children": [
                {"kind": "t3", "data": {
                    "url": "https://i.redd.it/a.jpg", "title": "A", "id": "a"
                }},
                {"kind": "t3", "data": {
                    "url": "https://www.reddit.com/gallery/g", "title": "G", "id": "g"
                }}
            ]}
        })))
        .mount(&server)
        .await;

    let source = login(&server).await;
    let posts = source.fetch(&config.query).await.expect("fetch ok");

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].url, "https://i.redd.it/a.jpg");
    assert_eq!(posts[1].title, "G");
}

#[tokio::test]
async fn empty_listing_is_empty_sequence() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/pics/top"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"children": []}})),
        )
        .mount(&server)
        .await;

    let source = login(&server).await;
    let posts = source.fetch(&common::sample_config().query).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn non_success_listing_is_transport_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/pics/top"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let source = login(&server).await;
    let err = source
        .fetch(&common::sample_config().query)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(403));
    assert!(err.is_transport());
}

#[tokio::test]
async fn rejected_credentials_fail_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let config = common::sample_config();
    let result = RedditSource::login(
        reqwest::Client::new(),
        &server.uri(),
        &server.uri(),
        &config.credentials,
    )
    .await;
    match result {
        Err(err) => {
            assert_eq!(err.kind, FailureKind::Api);
            assert!(err.message.contains("invalid_grant"));
        }
        Ok(_) => panic!("login should fail"),
    }
}

#[tokio::test]
async fn login_without_username_uses_client_credentials() {
    common::init_logging();
    let mut config = common::sample_config();
    config.credentials.username.clear();
    config.credentials.password.clear();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(header("user-agent", user_agent(&config.credentials).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "app", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/pics/top"))
        .and(header("authorization", "Bearer app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"children": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let source = RedditSource::login(
        reqwest::Client::new(),
        &server.uri(),
        &server.uri(),
        &config.credentials,
    )
    .await
    .expect("login ok");
    let posts = source.fetch(&config.query).await.expect("fetch ok");

    assert!(posts.is_empty());
    assert!(!user_agent(&config.credentials).contains("(by"));
}
