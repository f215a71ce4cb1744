//! End-to-end mirror job tests
//!
//! The page is a scripted [`FakePage`]; resources are served by a local
//! wiremock server so downloads, timeouts and rewriting run for real.

mod common;

use common::FakePage;
use pretty_assertions::assert_eq;
use sitemirror::assets::BACKGROUND_IMAGE_SCRIPT;
use serde_json::json;
use sitemirror::extraction::{page_model_script, STYLE_CAPTURE_SCRIPT};
use sitemirror::{AnalysisReport, JobState, MirrorConfig, MirrorJob, MirrorOutcome};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head>
<title>Fixture</title>
<meta name="description" content="Fixture page">
<link rel="stylesheet" href="/style.css">
<script src="/app.js"></script>
</head><body>
<main><h1>Hello</h1>
<img src="/logo.png" alt="Logo">
<img src="logo.png" alt="Logo again">
</main>
</body></html>"#;

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn config(page_url: &str, out: &Path) -> MirrorConfig {
    MirrorConfig::builder(page_url)
        .output_dir(out)
        .resource_timeout_ms(2000)
        .build()
}

fn read(out: &Path, relative: &str) -> String {
    std::fs::read_to_string(out.join(relative)).unwrap()
}

fn report(out: &Path) -> AnalysisReport {
    serde_json::from_str(&read(out, "analysis-report.json")).unwrap()
}

async fn run(page: FakePage, config: MirrorConfig) -> MirrorOutcome {
    MirrorJob::new(config).run_with(page).await
}

#[tokio::test]
async fn test_scenario_a_shared_resources_localized() {
    let server = MockServer::start().await;
    serve(&server, "/style.css", "body { background: url(bg.png) }").await;
    serve(&server, "/app.js", "console.log('app');").await;
    serve(&server, "/logo.png", "PNG").await;
    serve(&server, "/bg.png", "BG").await;

    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");

    let page = FakePage::from_html(&page_url, PAGE);
    let closes = page.close_counter();
    let outcome = run(page, config(&page_url, &out)).await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.state, JobState::Done);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcome.history,
        vec![
            JobState::Init,
            JobState::Loading,
            JobState::Extracting,
            JobState::Downloading,
            JobState::Rewriting,
            JobState::Reporting,
            JobState::Done,
        ]
    );

    let report = report(&out);
    assert_eq!(report.assets.total, 3);
    assert_eq!(report.assets.failed, 0);

    let index = read(&out, "index.html");
    assert!(index.contains(r#"href="assets/css/style.css""#));
    assert!(index.contains(r#"src="assets/js/app.js""#));
    assert_eq!(index.matches(r#"src="assets/images/logo.png""#).count(), 2);
    assert!(index.contains("sitemirror-banner"));

    // Every ok record exists on disk
    for record in report.resources.iter().filter(|r| r.is_ok()) {
        assert!(out.join(&record.local_relative_path).is_file(), "{}", record.local_relative_path);
    }
    assert_eq!(read(&out, "assets/images/logo.png"), "PNG");

    // bg.png is not referenced by the page model, so the stylesheet keeps an absolute URL
    let css = read(&out, "assets/css/style.css");
    assert_eq!(css, format!("body {{ background: url(\"{}/bg.png\") }}", server.uri()));

    for artifact in [
        "assets/css/consolidated.css",
        "assets/js/consolidated.js",
        "analysis-report.html",
        "README.md",
        "package.json",
        "Dockerfile",
        "ClonedWebsite.jsx",
        "ClonedWebsite.vue",
    ] {
        assert!(out.join(artifact).is_file(), "{}", artifact);
    }
    assert!(read(&out, "assets/js/consolidated.js").contains("console.log('hi');"));
}

#[tokio::test]
async fn test_scenario_b_timed_out_stylesheet_keeps_absolute_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(3000)))
        .mount(&server)
        .await;
    serve(&server, "/app.js", "console.log('app');").await;
    serve(&server, "/logo.png", "PNG").await;

    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");
    let config = MirrorConfig::builder(&page_url)
        .output_dir(&out)
        .resource_timeout_ms(300)
        .build();

    let outcome = run(FakePage::from_html(&page_url, PAGE), config).await;
    assert!(outcome.success);

    let stylesheet_url = format!("{}/style.css", server.uri());
    let report = report(&out);
    let record = report
        .resources
        .iter()
        .find(|r| r.original_url == stylesheet_url)
        .unwrap();
    assert!(!record.is_ok());
    assert!(!out.join(&record.local_relative_path).exists());

    let index = read(&out, "index.html");
    assert!(index.contains(&format!(r#"href="{}""#, stylesheet_url)));
    assert!(index.contains(r#"src="assets/js/app.js""#));

    assert!(report.warnings.iter().any(|w| w.contains(&stylesheet_url)));
    assert!(report
        .recommendations
        .contains(&"Review 1 resources that failed to download".to_string()));
}

#[tokio::test]
async fn test_scenario_c_missing_title_and_description() {
    let server = MockServer::start().await;
    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");

    let html = "<html><body><p>No head content</p></body></html>";
    let outcome = run(FakePage::from_html(&page_url, html), config(&page_url, &out)).await;
    assert!(outcome.success);

    let report = report(&out);
    assert!(report
        .recommendations
        .contains(&"Add a proper page title".to_string()));
    assert!(report
        .recommendations
        .contains(&"Add a meta description".to_string()));
    assert_eq!(report.assets.total, 0);
}

#[tokio::test]
async fn test_scenario_d_same_basename_does_not_collide() {
    let server = MockServer::start().await;
    serve(&server, "/a/logo.png", "first").await;
    serve(&server, "/b/logo.png", "second").await;

    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");
    let html = r#"<html><body><img src="/a/logo.png" alt="A"><img src="/b/logo.png" alt="B"></body></html>"#;

    let outcome = run(FakePage::from_html(&page_url, html), config(&page_url, &out)).await;
    assert!(outcome.success);

    assert_eq!(read(&out, "assets/images/logo.png"), "first");
    assert_eq!(read(&out, "assets/images/logo-1.png"), "second");

    let index = read(&out, "index.html");
    let first = index.find(r#"src="assets/images/logo.png""#).unwrap();
    let second = index.find(r#"src="assets/images/logo-1.png""#).unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn test_load_failure_fails_job_and_closes_once() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");
    let page = FakePage::new().failing_navigation();
    let closes = page.close_counter();

    let outcome = run(page, config("https://example.com/", &out)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.state, JobState::Failed);
    assert_eq!(
        outcome.history,
        vec![JobState::Init, JobState::Loading, JobState::Failed]
    );
    assert!(outcome.error.unwrap().contains("timed out"));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(!out.join("index.html").exists());
}

#[tokio::test]
async fn test_unwritable_output_fails_job() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let page = FakePage::from_html("https://example.com/", PAGE);
    let closes = page.close_counter();
    let outcome = run(page, config("https://example.com/", &blocker.join("site"))).await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("Filesystem error"));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_extraction_failure_falls_back_to_static_model() {
    let server = MockServer::start().await;
    serve(&server, "/style.css", "body {}").await;
    serve(&server, "/app.js", "").await;
    serve(&server, "/logo.png", "PNG").await;

    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");
    let page = FakePage::from_html(&page_url, PAGE)
        .without(&page_model_script())
        .without(BACKGROUND_IMAGE_SCRIPT);

    let outcome = run(page, config(&page_url, &out)).await;
    assert!(outcome.success);
    assert!(outcome.warnings.iter().any(|w| w.contains("static extraction")));
    assert_eq!(report(&out).assets.total, 3);
}

#[tokio::test]
async fn test_page_calls_are_sequential_and_close_is_last() {
    let server = MockServer::start().await;
    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();

    let page = FakePage::from_html(&page_url, "<html><body></body></html>");
    let calls = page.call_log();
    let outcome = run(page, config(&page_url, &dir.path().join("site"))).await;
    assert!(outcome.success);

    let calls = calls.lock().unwrap();
    assert!(calls[0].starts_with("navigate"));
    assert_eq!(calls.last().map(String::as_str), Some("close"));
    assert_eq!(calls.iter().filter(|c| *c == "close").count(), 1);
}

#[tokio::test]
async fn test_consolidated_css_resolves_against_sheet_url() {
    let server = MockServer::start().await;
    serve(&server, "/css/img/a.png", "A").await;

    let page_url = format!("{}/", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site");
    let html = r#"<html><body><img src="/css/img/a.png" alt="A"></body></html>"#;
    let page = FakePage::from_html(&page_url, html).respond(
        STYLE_CAPTURE_SCRIPT,
        json!({
            "sheets": [{
                "href": format!("{}/css/site.css", server.uri()),
                "rules": [".hero { background-image: url(\"img/a.png\"); }"]
            }],
            "readableSheets": 1,
            "skippedSheets": 0,
            "inlineScripts": []
        }),
    );

    let outcome = run(page, config(&page_url, &out)).await;
    assert!(outcome.success);

    let css = read(&out, "assets/css/consolidated.css");
    assert!(css.contains(r#".hero { background-image: url("../images/a.png"); }"#), "{}", css);
}
