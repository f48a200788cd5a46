// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//
// Bilibili and DogeDoge clients against a local HTTP server

use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

use sm2av::search::{
    BilibiliSearchClient, DogeSearchClient, EndpointConfig, FetchError, HttpConfig, HttpSession,
    SearchConfig, SearchCoordinator, SourceId, VideoSearchApi, WebSearchEngine,
};

const VIDEO_PATH: &str = "/x/web-interface/search/type";

async fn video_search(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    assert_eq!(params.get("search_type").map(String::as_str), Some("video"));
    let keyword = params.get("keyword").cloned().unwrap_or_default();
    let body = match keyword.as_str() {
        "sm1" => json!({
            "code": 0,
            "message": "0",
            "data": {
                "result": [
                    { "aid": 10, "title": "【MAD】<em class=\"keyword\">sm1</em> &amp; more", "author": "x" },
                    { "aid": 11, "title": "reupload", "author": "y" }
                ]
            }
        }),
        "sm_rejected" => json!({ "code": -400, "message": "request error" }),
        _ => json!({ "code": 0, "message": "0", "data": { "numResults": 0 } }),
    };
    Json(body)
}

async fn results(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    let query = params.get("q").cloned().unwrap_or_default();
    assert_eq!(params.get("lang").map(String::as_str), Some("cn"));

    if query == "sm2 site:www.bilibili.com" {
        Html(
            r#"<html><body>
            <div class="result">
              <a class="result__a" href="/rd/ignored">title</a>
              <a class="result__url js-result-extras-url" href="/rd/organic">www.bilibili.com</a>
            </div>
            <div class="result">
              <a class="result__url js-result-extras-url" href="/rd/plain">www.bilibili.com</a>
            </div>
            <div class="result">
              <a class="result__url js-result-extras-url" href="/rd/ad">www.bilibili.com</a>
            </div>
            </body></html>"#
                .to_string(),
        )
    } else {
        Html("<html><body><p>No results</p></body></html>".to_string())
    }
}

async fn redirect_organic() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "https://www.bilibili.com/video/av99/")],
    )
}

async fn redirect_ad() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "https://www.bilibili.com/video/av5/?ref=ad")],
    )
}

async fn plain() -> &'static str {
    "not a redirect"
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "busy")
}

async fn garbage() -> &'static str {
    "{ not json"
}

/// Start the fake backends and return their base URL
async fn start_server() -> String {
    let app = Router::new()
        .route(VIDEO_PATH, get(video_search))
        .route("/results", get(results))
        .route("/rd/organic", get(redirect_organic))
        .route("/rd/ad", get(redirect_ad))
        .route("/rd/plain", get(plain))
        .route("/slow", get(slow))
        .route("/unavailable", get(unavailable))
        .route("/garbage", get(garbage));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn endpoints(base: &str) -> EndpointConfig {
    EndpointConfig {
        internal_search_url: format!("{}{}", base, VIDEO_PATH),
        external_search_url: format!("{}/results", base),
        external_origin: format!("{}/", base),
        ..Default::default()
    }
}

fn session() -> HttpSession {
    HttpSession::new(&HttpConfig::default()).unwrap()
}

fn sid(s: &str) -> SourceId {
    SourceId::new(s).unwrap()
}

// ============================================================================
// Bilibili client
// ============================================================================

#[tokio::test]
async fn test_video_search_decodes_results() {
    let base = start_server().await;
    let client = BilibiliSearchClient::new(&session(), format!("{}{}", base, VIDEO_PATH));

    let response = client.search_videos("sm1").await.unwrap();

    assert!(response.is_success());
    let aids: Vec<u64> = response.entries().iter().map(|e| e.aid).collect();
    assert_eq!(aids, vec![10, 11]);
}

#[tokio::test]
async fn test_video_search_without_result_list_is_empty() {
    let base = start_server().await;
    let client = BilibiliSearchClient::new(&session(), format!("{}{}", base, VIDEO_PATH));

    let response = client.search_videos("sm404").await.unwrap();
    assert!(response.is_success());
    assert!(response.entries().is_empty());

    let rejected = client.search_videos("sm_rejected").await.unwrap();
    assert!(!rejected.is_success());
}

#[tokio::test]
async fn test_video_search_http_error_status() {
    let base = start_server().await;
    let client = BilibiliSearchClient::new(&session(), format!("{}/unavailable", base));

    let err = client.search_videos("sm1").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_video_search_malformed_body() {
    let base = start_server().await;
    let client = BilibiliSearchClient::new(&session(), format!("{}/garbage", base));

    let err = client.search_videos("sm1").await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_request_timeout_is_reported() {
    let base = start_server().await;
    let config = HttpConfig {
        timeout_secs: 1,
        ..Default::default()
    };
    let session = HttpSession::new(&config).unwrap();
    let client = BilibiliSearchClient::new(&session, format!("{}/slow", base));

    let err = client.search_videos("sm1").await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
}

// ============================================================================
// DogeDoge client
// ============================================================================

#[tokio::test]
async fn test_result_links_only_organic_anchors() {
    let base = start_server().await;
    let client = DogeSearchClient::new(&session(), &endpoints(&base)).unwrap();

    let links = client.result_links(&sid("sm2")).await.unwrap();
    assert_eq!(links, vec!["/rd/organic", "/rd/plain", "/rd/ad"]);

    let none = client.result_links(&sid("sm3")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_resolve_link_reads_location_without_following() {
    let base = start_server().await;
    let client = DogeSearchClient::new(&session(), &endpoints(&base)).unwrap();

    assert_eq!(
        client.resolve_link("/rd/organic").await.unwrap().as_deref(),
        Some("https://www.bilibili.com/video/av99/")
    );
    assert_eq!(
        client.resolve_link("/rd/ad").await.unwrap().as_deref(),
        Some("https://www.bilibili.com/video/av5/?ref=ad")
    );
    assert_eq!(client.resolve_link("/rd/plain").await.unwrap(), None);
}

#[tokio::test]
async fn test_result_page_error_status() {
    let base = start_server().await;
    let endpoints = EndpointConfig {
        external_search_url: format!("{}/unavailable", base),
        ..endpoints(&base)
    };
    let client = DogeSearchClient::new(&session(), &endpoints).unwrap();

    let err = client.result_links(&sid("sm2")).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

// ============================================================================
// Full run over HTTP
// ============================================================================

#[tokio::test]
async fn test_full_search_over_http() {
    let base = start_server().await;
    let config = SearchConfig {
        internal_concurrency: 2,
        internal_delay_ms: 0,
        external_max_delay_secs: 0,
        endpoints: endpoints(&base),
        ..Default::default()
    };
    let mut coordinator = SearchCoordinator::from_session(config, &session()).unwrap();

    let report = coordinator.run(["sm1", "sm2", "sm3"]).await.unwrap();

    let internal: Vec<(String, String, String)> = report
        .internal_matches
        .iter()
        .map(|m| (m.source.to_string(), m.target.to_string(), m.title.clone()))
        .collect();
    assert_eq!(
        internal,
        vec![
            ("sm1".to_string(), "av10".to_string(), "【MAD】sm1 & more".to_string()),
            ("sm1".to_string(), "av11".to_string(), "reupload".to_string()),
        ]
    );

    assert_eq!(report.external_matches.len(), 1);
    assert_eq!(report.external_matches[0].source, sid("sm2"));
    assert_eq!(report.external_matches[0].target.as_str(), "av99");

    assert_eq!(report.unmatched, vec![sid("sm3")]);
    assert_eq!(report.total_sources, 3);
    assert_eq!(report.matched_targets, 3);
}
