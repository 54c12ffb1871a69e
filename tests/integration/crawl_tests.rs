//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use futures::{stream, StreamExt, TryStreamExt};
use std::cell::RefCell;
use std::rc::Rc;
use sumi_harvest::config::{parse_config, UserAgentConfig};
use sumi_harvest::crawler::{Callback, Emit, SpiderBuilder};
use sumi_harvest::http::{Request, Response};
use sumi_harvest::pipeline::{stage_fn, StageRegistry};
use sumi_harvest::{Spider, SpiderError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page that must be fetched exactly once
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

fn seed(server: &MockServer, route: &str) -> Request<String> {
    Request::parse(&format!("{}{}", server.uri(), route)).expect("Failed to parse seed URL")
}

/// Emits the page title and follows every same-host link
fn titles_and_links() -> Callback<String> {
    Callback::stream(|response: Rc<Response>| {
        let mut emitted: Vec<anyhow::Result<Emit<String>>> = Vec::new();
        if let Some(title) = response.title() {
            emitted.push(Ok(Emit::Item(title)));
        }
        let host = response.url().host_str();
        for link in response.links() {
            if link.host_str() == host {
                emitted.push(Ok(Emit::Request(Request::new(link))));
            }
        }
        stream::iter(emitted)
    })
}

async fn collect(spider: &Spider<String>, seeds: Vec<Request<String>>) -> Vec<String> {
    spider
        .crawl(seeds)
        .try_collect()
        .await
        .expect("Crawl should succeed")
}

#[tokio::test]
async fn test_recursive_crawl_visits_each_page_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/page1">Page 1</a>
        <a href="/page2">Page 2</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>
        <a href="/">Home</a>
        <a href="/page2">Page 2</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body>
        <a href="/page1">Page 1</a>
        <a href="https://elsewhere.invalid/">Off site</a>
        </body></html>"#,
    )
    .await;

    let spider = SpiderBuilder::new()
        .parse(titles_and_links())
        .build()
        .expect("Failed to build spider");

    let titles = collect(&spider, vec![seed(&server, "/")]).await;

    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);
}

#[tokio::test]
async fn test_failed_fetch_does_not_stop_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<html><title>Still here</title></html>").await;

    let spider = SpiderBuilder::new()
        .parse(titles_and_links())
        .build()
        .expect("Failed to build spider");

    let titles = collect(&spider, vec![seed(&server, "/missing"), seed(&server, "/ok")]).await;

    assert_eq!(titles, vec!["Still here"]);
}

#[tokio::test]
async fn test_css_extraction_with_relative_next_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/list/1",
        r#"<html><body>
        <h2 class="entry">first</h2>
        <h2 class="entry">second</h2>
        <a class="next" href="2">next</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/list/2",
        r#"<html><body><h2 class="entry">third</h2></body></html>"#,
    )
    .await;

    let spider = SpiderBuilder::new()
        .parse(Callback::stream(|response: Rc<Response>| {
            let mut emitted: Vec<anyhow::Result<Emit<String>>> = Vec::new();
            match response.css("h2.entry") {
                Ok(entries) => emitted.extend(
                    entries
                        .iter()
                        .map(|e| Ok(Emit::Item(e.text().collect::<String>()))),
                ),
                Err(e) => emitted.push(Err(e.into())),
            }
            if let Ok(next) = response.css("a.next") {
                emitted.extend(
                    next.iter()
                        .filter_map(|a| a.value().attr("href"))
                        .map(|href| Ok(Emit::Url(href.to_string()))),
                );
            }
            stream::iter(emitted)
        }))
        .build()
        .expect("Failed to build spider");

    let entries = collect(&spider, vec![seed(&server, "/list/1")]).await;

    assert_eq!(entries, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_callback_error_is_reported() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><title>Home</title></html>").await;

    let spider = SpiderBuilder::new()
        .parse(Callback::stream(|_response: Rc<Response>| {
            stream::iter(vec![
                Ok(Emit::Item("partial".to_string())),
                Err(anyhow::anyhow!("extraction broke")),
            ])
        }))
        .build()
        .expect("Failed to build spider");

    let items = spider.crawl(vec![seed(&server, "/")]);
    futures::pin_mut!(items);

    assert_eq!(items.next().await.unwrap().unwrap(), "partial");
    let err = items.next().await.unwrap().unwrap_err();
    assert!(matches!(err, SpiderError::Callback { .. }));
    assert!(err.to_string().contains("extraction broke"));
    assert!(items.next().await.is_none());
}

#[tokio::test]
async fn test_configured_pipeline_cleans_items() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
        <p>  Alpha </p><p> </p><p>Alpha</p><p>Beta</p>
        </body></html>"#,
    )
    .await;

    let config = parse_config(&format!(
        r#"
        [crawler]
        pipeline = ["trim-whitespace", "drop-empty", "dedup-items"]
        seeds = ["{}/"]

        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "1.0.0"
        contact-url = "https://example.com/contact"
        contact-email = "test@example.com"
        "#,
        server.uri()
    ))
    .expect("Config should parse");

    let spider = SpiderBuilder::from_config(&config)
        .registry(StageRegistry::with_builtins())
        .parse(Callback::stream(|response: Rc<Response>| {
            let paragraphs: Vec<anyhow::Result<Emit<String>>> = response
                .css("p")
                .map(|found| {
                    found
                        .iter()
                        .map(|p| Ok(Emit::Item(p.text().collect::<String>())))
                        .collect()
                })
                .unwrap_or_default();
            stream::iter(paragraphs)
        }))
        .build()
        .expect("Failed to build spider");

    let items: Vec<String> = spider
        .crawl_urls(&config.crawler.seeds)
        .expect("Seeds should parse")
        .try_collect()
        .await
        .expect("Crawl should succeed");

    assert_eq!(items, vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn test_requests_carry_configured_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<title>Identified</title>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let spider = SpiderBuilder::new()
        .user_agent(UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        })
        .parse(titles_and_links())
        .build()
        .expect("Failed to build spider");

    let titles = collect(&spider, vec![seed(&server, "/")]).await;

    assert_eq!(titles, vec!["Identified"]);
}

#[tokio::test]
async fn test_declared_charset_is_used_for_decoding() {
    let server = MockServer::start().await;

    // "Café" in windows-1252
    let body = b"<html><head><meta charset=\"windows-1252\"><title>Caf\xe9</title></head></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=windows-1252"),
        )
        .mount(&server)
        .await;

    let spider = SpiderBuilder::new()
        .parse(titles_and_links())
        .build()
        .expect("Failed to build spider");

    let titles = collect(&spider, vec![seed(&server, "/")]).await;

    assert_eq!(titles, vec!["Café"]);
}

#[tokio::test]
async fn test_exhaust_drives_stages() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "<html><title>A</title></html>").await;
    mount_page(&server, "/b", "<html><title>B</title></html>").await;

    let stored = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&stored);
    let spider = SpiderBuilder::new()
        .parse(titles_and_links())
        .stage(stage_fn("store", move |_ctx, _response, title: String| {
            sink.borrow_mut().push(title.clone());
            async move { Ok(title) }
        }))
        .build()
        .expect("Failed to build spider");

    spider
        .exhaust(vec![seed(&server, "/a"), seed(&server, "/b")])
        .await
        .expect("Crawl should succeed");

    assert_eq!(*stored.borrow(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_string_seeds_are_crawled() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><title>From a string</title></html>").await;

    let spider = SpiderBuilder::new()
        .parse(titles_and_links())
        .build()
        .expect("Failed to build spider");

    let titles: Vec<String> = spider
        .crawl_urls([format!("{}/", server.uri())])
        .expect("Seed should parse")
        .try_collect()
        .await
        .expect("Crawl should succeed");

    assert_eq!(titles, vec!["From a string"]);
}
