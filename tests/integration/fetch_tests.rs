//! Fetch pipeline tests against a mock site

use crate::common::{create_test_config, ledger_lines};
use fedlex_mirror::crawler::{build_http_client, run_fetch, FetchPool};
use fedlex_mirror::{EdgeLedger, PathMapper, ProgressLedger, SiteScope};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>t</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_site(server: &MockServer) {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap-index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
                <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                  <sitemap><loc>{}/sitemap-1.xml</loc></sitemap>
                </sitemapindex>"#,
                base
            ),
            "application/xml",
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-1.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                  <url><loc>{0}/de/home</loc></url>
                  <url><loc>{0}/de/about</loc></url>
                </urlset>"#,
                base
            ),
            "application/xml",
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/de/home"))
        .respond_with(html(
            r#"<a href="/de/cc/internal-law">Internal law</a>
               <a href="https://other.example/y">Elsewhere</a>
               <a href="javascript:void(0)">Menu</a>
               <a href="/docs/act.pdf">PDF</a>
               <a href="/de/home">Self</a>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/de/about"))
        .respond_with(html(r#"<a href="/docs/act.pdf">Same PDF</a>"#))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/act.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_fetch_from_sitemaps() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base = mock_server.uri();

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);

    let summary = run_fetch(&config).await.unwrap();

    assert_eq!(summary.saved, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.followed, 1);
    assert!(!summary.interrupted);

    // URL cache holds the sitemap pages only
    assert_eq!(
        ledger_lines(&config.output.urls_cache),
        vec![format!("{}/de/home", base), format!("{}/de/about", base)]
    );

    let mut progress = ledger_lines(&config.output.fetch_progress);
    progress.sort();
    let mut expected = vec![
        format!("{}/de/about", base),
        format!("{}/de/home", base),
        format!("{}/docs/act.pdf", base),
    ];
    expected.sort();
    assert_eq!(progress, expected);

    // Raw bodies land at the mapped paths
    let mapper = PathMapper::new(&config.output.mirror_dir);
    let home = std::fs::read_to_string(mapper.map(&format!("{}/de/home", base))).unwrap();
    assert!(home.contains("Internal law"));
    assert_eq!(
        std::fs::read(mapper.map(&format!("{}/docs/act.pdf", base))).unwrap(),
        b"%PDF-1.4"
    );

    // Fetch-time edges: in-domain, non-self, one per anchor
    let mut edges = ledger_lines(&config.output.edges);
    edges.sort();
    let mut expected_edges = vec![
        format!("{0}/de/home\t{0}/de/cc/internal-law", base),
        format!("{0}/de/home\t{0}/docs/act.pdf", base),
        format!("{0}/de/about\t{0}/docs/act.pdf", base),
    ];
    expected_edges.sort();
    assert_eq!(edges, expected_edges);
}

#[tokio::test]
async fn test_second_run_does_no_work() {
    let mock_server = MockServer::start().await;
    // Every mock expects exactly one request across both runs
    mount_site(&mock_server).await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &mock_server.uri());

    run_fetch(&config).await.unwrap();
    let progress_before = ledger_lines(&config.output.fetch_progress);
    let edges_before = ledger_lines(&config.output.edges);

    let summary = run_fetch(&config).await.unwrap();

    assert_eq!(summary.saved, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(ledger_lines(&config.output.fetch_progress), progress_before);
    assert_eq!(ledger_lines(&config.output.edges), edges_before);
}

#[tokio::test]
async fn test_resume_skips_completed_urls() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("a"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("b"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    std::fs::write(&config.output.urls_cache, format!("{0}/a\n{0}/b\n", base)).unwrap();
    std::fs::write(&config.output.fetch_progress, format!("{}/a\n", base)).unwrap();

    let summary = run_fetch(&config).await.unwrap();

    assert_eq!(summary.saved, 1);
    assert_eq!(
        ledger_lines(&config.output.fetch_progress),
        vec![format!("{}/a", base), format!("{}/b", base)]
    );
}

fn pool_for(config: &fedlex_mirror::Config) -> (FetchPool, Arc<ProgressLedger>) {
    let scope = SiteScope::from_config(&config.site);
    let client = build_http_client(&config.user_agent, &scope, config.fetcher.request_timeout()).unwrap();
    let progress = Arc::new(ProgressLedger::open(&config.output.fetch_progress).unwrap());
    let edges = Arc::new(EdgeLedger::open(&config.output.edges).unwrap());
    let pool = FetchPool::new(
        client,
        scope,
        PathMapper::new(&config.output.mirror_dir),
        Arc::clone(&progress),
        edges,
        &config.fetcher,
    );
    (pool, progress)
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(html("finally"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &mock_server.uri());
    let (pool, progress) = pool_for(&config);
    let url = format!("{}/busy", mock_server.uri());

    let summary = pool.run(vec![url.clone()]).await.unwrap();

    assert_eq!(summary.saved, 1);
    assert!(progress.contains(&url));
}

#[tokio::test]
async fn test_rate_limited_twice_is_abandoned() {
    let mock_server = MockServer::start().await;

    // One request plus exactly one retry
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &mock_server.uri());
    let (pool, progress) = pool_for(&config);

    let summary = pool
        .run(vec![format!("{}/busy", mock_server.uri())])
        .await
        .unwrap();

    assert_eq!(summary.saved, 0);
    assert_eq!(summary.failed, 1);
    assert!(progress.is_empty());
    assert!(ledger_lines(&config.output.fetch_progress).is_empty());
}

#[tokio::test]
async fn test_failures_do_not_stop_the_pool() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    for page in ["/ok1", "/ok2", "/ok3"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(page))
            .mount(&mock_server)
            .await;
    }

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let (pool, progress) = pool_for(&config);

    let urls = ["/missing", "/ok1", "/broken", "/ok2", "/ok3"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    let summary = pool.run(urls).await.unwrap();

    assert_eq!(summary.saved, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(progress.len(), 3);
    assert!(!progress.contains(&format!("{}/missing", base)));

    let mapper = PathMapper::new(&config.output.mirror_dir);
    assert!(!mapper.map(&format!("{}/missing", base)).exists());
}

#[tokio::test]
async fn test_non_html_bodies_are_not_parsed() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<feed><a href="/de/never">not an anchor</a></feed>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let (pool, _progress) = pool_for(&config);

    let summary = pool.run(vec![format!("{}/feed.xml", base)]).await.unwrap();

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.edges, 0);
    assert!(ledger_lines(&config.output.edges).is_empty());
}

#[tokio::test]
async fn test_base_href_and_fragments() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/de/home"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r##"<html><head><base href="/fr/"></head><body>
               <a href="page#part">Relative to base</a>
               <a href="#top">Fragment only</a>
            </body></html>"##,
            "text/html; charset=utf-8",
        ))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let (pool, _progress) = pool_for(&config);

    pool.run(vec![format!("{}/de/home", base)]).await.unwrap();

    assert_eq!(
        ledger_lines(&config.output.edges),
        vec![format!("{0}/de/home\t{0}/fr/page", base)]
    );
}

#[tokio::test]
async fn test_redirect_off_allowed_hosts_is_not_followed() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let port = mock_server.address().port();

    // localhost is the same server under a host name the config does not allow
    Mock::given(method("GET"))
        .and(path("/de/home"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("http://localhost:{}/foreign", port).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/foreign"))
        .respond_with(html("foreign content"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let (pool, progress) = pool_for(&config);
    let url = format!("{}/de/home", base);

    let summary = pool.run(vec![url.clone()]).await.unwrap();

    assert_eq!(summary.saved, 0);
    assert_eq!(summary.failed, 1);
    assert!(!progress.contains(&url));
    let mapper = PathMapper::new(&config.output.mirror_dir);
    assert!(!mapper.map(&url).exists());
}

#[tokio::test]
async fn test_redirect_within_allowed_hosts_is_followed() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("moved here"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let (pool, progress) = pool_for(&config);
    let url = format!("{}/old", base);

    let summary = pool.run(vec![url.clone()]).await.unwrap();

    assert_eq!(summary.saved, 1);
    assert!(progress.contains(&url));

    // Stored under the requested URL
    let mapper = PathMapper::new(&config.output.mirror_dir);
    let body = std::fs::read_to_string(mapper.map(&url)).unwrap();
    assert!(body.contains("moved here"));
}

#[tokio::test]
async fn test_unrecordable_url_fails_only_that_page() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("ok"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ab"))
        .respond_with(html("never requested"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let (pool, progress) = pool_for(&config);

    // A sitemap <loc> with an embedded tab
    let summary = pool
        .run(vec![format!("{}/a\tb", base), format!("{}/ok", base)])
        .await
        .unwrap();

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(progress.len(), 1);
    assert_eq!(
        ledger_lines(&config.output.fetch_progress),
        vec![format!("{}/ok", base)]
    );
}

#[tokio::test]
async fn test_dropped_run_leaves_whole_ledger_lines() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    for page in ["/fast1", "/fast2", "/fast3"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<a href="/de/cc/internal-law">x</a>"#))
            .mount(&mock_server)
            .await;
    }
    for page in ["/slow1", "/slow2"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html("late").set_delay(Duration::from_secs(30)))
            .mount(&mock_server)
            .await;
    }

    let dir = tempdir().unwrap();
    let mut config = create_test_config(dir.path(), &base);
    config.fetcher.request_timeout = 60_000;
    let (pool, _progress) = pool_for(&config);

    let urls = ["/slow1", "/fast1", "/slow2", "/fast2", "/fast3"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();

    // Stop the run while the slow pages are still in flight
    let result = tokio::time::timeout(Duration::from_secs(2), pool.run(urls)).await;
    assert!(result.is_err());
    drop(pool);

    let progress = std::fs::read_to_string(&config.output.fetch_progress).unwrap();
    assert!(progress.ends_with('\n'));
    let mut recorded: Vec<&str> = progress.lines().collect();
    recorded.sort();
    let mut fast: Vec<String> = ["/fast1", "/fast2", "/fast3"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    fast.sort();
    assert_eq!(recorded, fast);

    let edges = std::fs::read_to_string(&config.output.edges).unwrap();
    assert!(edges.ends_with('\n'));
    for line in edges.lines() {
        let (source, target) = line.split_once('\t').unwrap();
        assert!(fast.iter().any(|f| f == source));
        assert_eq!(target, format!("{}/de/cc/internal-law", base));
    }

    // A fresh ledger sees the completed pages and nothing else
    let reopened = ProgressLedger::open(&config.output.fetch_progress).unwrap();
    assert_eq!(reopened.len(), 3);
    assert!(!reopened.contains(&format!("{}/slow1", base)));
}
