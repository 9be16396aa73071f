use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use relaydoc::application::documents::{DocumentService, ExportRequest};
use relaydoc::application::error::AppError;
use relaydoc::application::records::RecordService;
use relaydoc::cache::{CacheAsideFetcher, CacheConfig, CacheTierSelector, RedisConnector};
use relaydoc::domain::types::DocumentFormat;
use relaydoc::infra::content_api::HttpContentApi;
use relaydoc::render::{
    DocumentRenderer, DocxPackager, FormatConverter, PdfCommandRenderer, RtfTranspiler,
};
use relaydoc::resilience::{ResilientClient, RetryPolicy};
use serde_json::json;
use url::Url;

fn service(server: &MockServer, pdf_command: &str) -> DocumentService {
    let selector = Arc::new(CacheTierSelector::new(
        CacheConfig::memory(),
        Arc::new(RedisConnector::new("redis://127.0.0.1:1")),
    ));
    let client = ResilientClient::new(
        reqwest::Client::new(),
        "content",
        Url::parse(&server.base_url()).expect("mock server url"),
        Duration::from_secs(5),
        RetryPolicy::new(2, Duration::from_millis(1)),
    );
    let records = RecordService::new(
        Arc::new(HttpContentApi::new(client)),
        CacheAsideFetcher::new(selector, None),
    );
    let converter = FormatConverter::new(
        Arc::new(PdfCommandRenderer::new(pdf_command)),
        Arc::new(DocxPackager),
        RtfTranspiler::default(),
    );
    DocumentService::new(records, DocumentRenderer::default(), converter)
}

fn request(format: &str, user_id: Option<i64>, post_id: Option<i64>) -> ExportRequest {
    ExportRequest {
        format: format.to_string(),
        user_id,
        post_id,
    }
}

#[tokio::test]
async fn owner_export_renders_rtf_from_upstream_records() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/posts").query_param("userId", "1");
            then.status(200).json_body(json!([
                {"id": 1, "userId": 1, "title": "Hello {world}", "body": "Back\\slash"},
                {"id": 2, "userId": 1, "title": "Second", "body": "Plain body"}
            ]));
        })
        .await;
    let service = service(&server, "/nonexistent/pdf-command");

    let first = service
        .export(&request("rtf", Some(1), None))
        .await
        .expect("export succeeds");
    let second = service
        .export(&request("RTF", Some(1), None))
        .await
        .expect("export succeeds");

    mock.assert_hits_async(1).await;
    assert_eq!(first.format, DocumentFormat::Rtf);
    assert_eq!(first.bytes, second.bytes);

    let rtf = String::from_utf8(first.bytes.to_vec()).expect("rtf is utf-8");
    assert!(rtf.starts_with("{\\rtf1\\ansi\\deff0 {\\fonttbl {\\f0 Arial;}}\n"));
    assert!(rtf.ends_with('}'));
    assert!(rtf.contains("Hello \\{world\\}"));
    assert!(rtf.contains("Back\\\\slash"));
    assert!(rtf.find("Hello").unwrap() < rtf.find("Second").unwrap());
}

#[tokio::test]
async fn single_post_export_packages_docx() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/posts/3");
            then.status(200)
                .json_body(json!({"id": 3, "userId": 2, "title": "Only", "body": "One"}));
        })
        .await;

    let document = service(&server, "/nonexistent/pdf-command")
        .export(&request("docx", Some(2), Some(3)))
        .await
        .expect("export succeeds");

    assert_eq!(document.file_name(), "posts.docx");
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(document.bytes.to_vec()))
        .expect("docx is a zip package");
    let mut chunk = String::new();
    archive
        .by_name("word/afchunk.html")
        .expect("html chunk present")
        .read_to_string(&mut chunk)
        .expect("chunk readable");
    assert!(chunk.contains("<h2>Only</h2>"));
    assert!(chunk.contains("<p>One</p>"));
}

#[tokio::test]
async fn missing_post_is_reported_without_rendering() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/posts/404");
            then.status(404).body("{}");
        })
        .await;

    let err = service(&server, "/nonexistent/pdf-command")
        .export(&request("pdf", None, Some(404)))
        .await
        .expect_err("no posts");

    assert_eq!(err.presentation_message(), "No posts found");
}

#[tokio::test]
async fn unavailable_upstream_surfaces_after_retries() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/posts");
            then.status(503).body("down");
        })
        .await;

    let err = service(&server, "/nonexistent/pdf-command")
        .export(&request("rtf", None, None))
        .await
        .expect_err("upstream down");

    mock.assert_hits_async(3).await;
    assert!(matches!(err, AppError::Upstream(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn missing_pdf_command_is_a_render_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/posts");
            then.status(200)
                .json_body(json!([{"id": 1, "userId": 1, "title": "t", "body": "b"}]));
        })
        .await;

    let err = service(&server, "/nonexistent/pdf-command")
        .export(&request("pdf", None, None))
        .await
        .expect_err("pdf command missing");

    assert!(matches!(err, AppError::Render(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn pdf_export_runs_external_command() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("fake-pdf");
    std::fs::write(&script, "#!/bin/sh\nset -eu\nprintf '%%PDF-1.4 ' > \"$2\"\ncat \"$1\" >> \"$2\"\n")
        .expect("write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/posts");
            then.status(200)
                .json_body(json!([{"id": 1, "userId": 1, "title": "Rendered", "body": "b"}]));
        })
        .await;

    let document = service(&server, script.to_str().expect("utf-8 path"))
        .export(&request("pdf", None, None))
        .await
        .expect("export succeeds");

    assert_eq!(document.media_type(), "application/pdf");
    assert!(document.bytes.starts_with(b"%PDF-1.4 "));
    let text = String::from_utf8_lossy(&document.bytes);
    assert!(text.contains("Rendered"));
}
