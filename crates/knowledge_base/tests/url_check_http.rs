//! Source URL checks against a local mock server.
//!
//! The checker uses reqwest's blocking client, which must not run on an async worker thread, so
//! every probe goes through `spawn_blocking`.

use knowledge_base::validators::check_source_urls;
use knowledge_base::{
    Document, KbConfig, ProjectValidator, Severity, UrlCheckConfig, UrlCheckResult, UrlChecker,
    ValidationOptions,
};
use std::fs;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn check(urls: Vec<String>) -> Vec<UrlCheckResult> {
    tokio::task::spawn_blocking(move || {
        let checker = UrlChecker::from_config(&UrlCheckConfig::default()).expect("client");
        checker.check_all(urls.iter().map(String::as_str))
    })
    .await
    .expect("join blocking check")
}

fn research_doc(url: &str) -> Document {
    let text = format!(
        "---\nname: R\ndescription: Research\ntype: research\nsources:\n  - {url}\n---\n"
    );
    Document::from_text("research/r.md", &text).expect("parse")
}

#[tokio::test(flavor = "multi_thread")]
async fn not_found_source_fails_with_url_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let url = format!("{}/gone", server.uri());

    let doc = research_doc(&url);
    let issues = tokio::task::spawn_blocking(move || {
        let config = UrlCheckConfig::default();
        let checker = UrlChecker::from_config(&config).expect("client");
        check_source_urls(&doc, &checker, &config.warn_statuses)
    })
    .await
    .expect("join");

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Fail);
    assert!(issues[0].issue.contains(&url));
    assert!(issues[0].issue.contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn forbidden_and_rate_limited_sources_only_warn() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/walled"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    for route in ["/walled", "/busy"] {
        let doc = research_doc(&format!("{}{route}", server.uri()));
        let issues = tokio::task::spawn_blocking(move || {
            let config = UrlCheckConfig::default();
            let checker = UrlChecker::from_config(&config).expect("client");
            check_source_urls(&doc, &checker, &config.warn_statuses)
        })
        .await
        .expect("join");
        assert_eq!(issues.len(), 1, "{route}");
        assert_eq!(issues[0].severity, Severity::Warn, "{route}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn head_not_allowed_falls_back_to_get() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let results = check(vec![format!("{}/no-head", server.uri())]).await;
    assert!(results[0].reachable);
    assert_eq!(results[0].status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn redirects_are_followed_to_the_final_status() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let results = check(vec![format!("{}/old", server.uri())]).await;
    assert!(results[0].reachable);
    assert_eq!(results[0].status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_urls_are_requested_once() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/paper"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let url = format!("{}/paper", server.uri());

    let results = check(vec![url.clone(), url.clone(), url]).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].reachable);
}

#[tokio::test(flavor = "multi_thread")]
async fn project_pass_probes_each_cited_url_once() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let url = format!("{}/shared", server.uri());

    let root = tempfile::tempdir().expect("tempdir");
    let dir = root.path().join("research");
    fs::create_dir_all(&dir).expect("mkdir");
    for name in ["a.md", "b.md"] {
        let text = format!(
            "---\nname: {name}\ndescription: Study\ntype: research\nsources: [{url}]\n---\n"
        );
        fs::write(dir.join(name), text).expect("write");
    }

    let root_path = root.path().to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        ProjectValidator::new(root_path, KbConfig::default())
            .validate(&ValidationOptions { check_urls: true })
            .expect("validate")
    })
    .await
    .expect("join");

    assert_eq!(report.urls_checked, 1);
    let url_issues: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.issue.starts_with("source URL unreachable"))
        .map(|i| i.file.as_str())
        .collect();
    assert_eq!(url_issues, vec!["research/a.md", "research/b.md"]);
}
