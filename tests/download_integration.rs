//! Integration tests for the streaming HTTP downloader.
//!
//! These tests verify the full download flow with mock HTTP servers.

mod support;

use std::sync::Mutex;

use modelfetch_core::download::{DownloadError, Downloader, HttpDownloader};
use modelfetch_core::http::HttpTimeouts;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn downloader() -> HttpDownloader {
    HttpDownloader::new(HttpTimeouts::default()).expect("client should build")
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let content: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    Mock::given(method("GET"))
        .and(path("/ggml-base.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("ggml-base.bin.download");

    let bytes = downloader()
        .download_to_path(
            &format!("{}/ggml-base.bin", server.uri()),
            None,
            &target,
            &CancellationToken::new(),
            None,
        )
        .await
        .expect("download should succeed");

    assert_eq!(bytes, content.len() as u64);
    assert_eq!(std::fs::read(&target).expect("should read file"), content);
}

#[tokio::test]
async fn test_download_reports_monotonic_progress_ending_at_100() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/model.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 256 * 1024]))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let seen = Mutex::new(Vec::new());
    let report = |percent: u8| seen.lock().expect("lock").push(percent);

    downloader()
        .download_to_path(
            &format!("{}/model.bin", server.uri()),
            None,
            &temp_dir.path().join("model.bin"),
            &CancellationToken::new(),
            Some(&report),
        )
        .await
        .expect("download should succeed");

    let seen = seen.into_inner().expect("lock");
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "not monotonic: {seen:?}");
}

#[tokio::test]
async fn test_download_http_error_status() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("missing.bin");

    let err = downloader()
        .download_to_path(
            &format!("{}/missing.bin", server.uri()),
            None,
            &target,
            &CancellationToken::new(),
            None,
        )
        .await
        .expect_err("404 must fail");

    assert!(
        matches!(err, DownloadError::HttpStatus { status: 404, .. }),
        "unexpected error: {err:?}"
    );
    assert!(!target.exists(), "no file is created for an error status");
}

#[tokio::test]
async fn test_download_sends_extra_headers() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/gated.bin"))
        .and(header("authorization", "Bearer hf_token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gated.bin"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer hf_token"));

    let bytes = downloader()
        .download_to_path(
            &format!("{}/gated.bin", server.uri()),
            Some(headers),
            &temp_dir.path().join("gated.bin"),
            &CancellationToken::new(),
            None,
        )
        .await
        .expect("authorized download should succeed");
    assert_eq!(bytes, 2);
}

#[tokio::test]
async fn test_download_follows_redirects() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/releases/model.bin"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/blob/model.bin", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blob/model.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"blob".to_vec()))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("model.bin");

    downloader()
        .download_to_path(
            &format!("{}/releases/model.bin", server.uri()),
            None,
            &target,
            &CancellationToken::new(),
            None,
        )
        .await
        .expect("redirected download should succeed");
    assert_eq!(std::fs::read(&target).expect("should read file"), b"blob");
}

#[tokio::test]
async fn test_download_connection_refused_is_network_error() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let err = downloader()
        .download_to_path(
            "http://127.0.0.1:9/model.bin",
            None,
            &temp_dir.path().join("model.bin"),
            &CancellationToken::new(),
            None,
        )
        .await
        .expect_err("nothing listens on the discard port");
    assert!(
        matches!(err, DownloadError::Network { .. } | DownloadError::Timeout { .. }),
        "unexpected error: {err:?}"
    );
}
