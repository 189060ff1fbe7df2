//! Sitemap resolution tests against mock sitemap trees

use fedlex_mirror::sitemap::{load_or_resolve, SitemapResolver};
use fedlex_mirror::MirrorError;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver() -> SitemapResolver {
    SitemapResolver::new(reqwest::Client::new(), Duration::from_secs(5))
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

fn index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|c| format!("<sitemap><loc>{}</loc></sitemap>", c))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

fn urlset(pages: &[&str]) -> String {
    let entries: String = pages
        .iter()
        .map(|p| format!("<url><loc>{}</loc><changefreq>weekly</changefreq></url>", p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

#[tokio::test]
async fn test_two_level_index_is_flattened_in_order() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap-index.xml"))
        .respond_with(xml(index(&[
            format!("{}/sitemap-1.xml", base),
            format!("{}/sitemap-2.xml", base),
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-1.xml"))
        .respond_with(xml(urlset(&[
            "https://www.fedlex.admin.ch/a",
            "https://www.fedlex.admin.ch/b",
            "https://www.fedlex.admin.ch/c",
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-2.xml"))
        .respond_with(xml(urlset(&[
            "https://www.fedlex.admin.ch/b",
            "https://www.fedlex.admin.ch/d",
        ])))
        .mount(&mock_server)
        .await;

    let urls = resolver()
        .resolve(&[format!("{}/sitemap-index.xml", base)])
        .await;

    assert_eq!(
        urls,
        vec![
            "https://www.fedlex.admin.ch/a",
            "https://www.fedlex.admin.ch/b",
            "https://www.fedlex.admin.ch/c",
            "https://www.fedlex.admin.ch/d",
        ]
    );
}

#[tokio::test]
async fn test_broken_subtrees_contribute_nothing() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap-index.xml"))
        .respond_with(xml(index(&[
            format!("{}/not-xml.xml", base),
            format!("{}/gone.xml", base),
            format!("{}/good.xml", base),
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/not-xml.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body>Maintenance</body></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/good.xml"))
        .respond_with(xml(urlset(&["https://www.fedlex.admin.ch/ok"])))
        .mount(&mock_server)
        .await;

    let urls = resolver()
        .resolve(&[format!("{}/sitemap-index.xml", base)])
        .await;

    assert_eq!(urls, vec!["https://www.fedlex.admin.ch/ok"]);
}

#[tokio::test]
async fn test_sitemap_listed_twice_is_fetched_once() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let child = format!("{}/sitemap-act-1.xml", base);

    Mock::given(method("GET"))
        .and(path("/sitemap-index.xml"))
        .respond_with(xml(index(&[child.clone()])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-act-1.xml"))
        .respond_with(xml(urlset(&["https://www.fedlex.admin.ch/eli/cc/1"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The root list names both the index and one of its children
    let urls = resolver()
        .resolve(&[format!("{}/sitemap-index.xml", base), child])
        .await;

    assert_eq!(urls, vec!["https://www.fedlex.admin.ch/eli/cc/1"]);
}

#[tokio::test]
async fn test_cache_is_preferred_over_sitemaps() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml(urlset(&["https://www.fedlex.admin.ch/fresh"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let cache = dir.path().join("urls.txt");
    std::fs::write(&cache, "https://www.fedlex.admin.ch/cached\n").unwrap();

    let urls = load_or_resolve(
        &resolver(),
        &[format!("{}/sitemap-index.xml", mock_server.uri())],
        &cache,
    )
    .await
    .unwrap();

    assert_eq!(urls, vec!["https://www.fedlex.admin.ch/cached"]);
}

#[tokio::test]
async fn test_fresh_resolution_is_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(urlset(&[
            "https://www.fedlex.admin.ch/a",
            "https://www.fedlex.admin.ch/b",
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let cache = dir.path().join("urls.txt");
    let roots = [format!("{}/sitemap.xml", mock_server.uri())];

    let first = load_or_resolve(&resolver(), &roots, &cache).await.unwrap();
    let second = load_or_resolve(&resolver(), &roots, &cache).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        std::fs::read_to_string(&cache).unwrap(),
        "https://www.fedlex.admin.ch/a\nhttps://www.fedlex.admin.ch/b\n"
    );
}

#[tokio::test]
async fn test_empty_resolution_is_an_error_and_not_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let cache = dir.path().join("urls.txt");

    let result = load_or_resolve(
        &resolver(),
        &[format!("{}/sitemap-index.xml", mock_server.uri())],
        &cache,
    )
    .await;

    assert!(matches!(
        result,
        Err(MirrorError::NoUrlsResolved { sitemaps: 1 })
    ));
    assert!(!cache.exists());
}
