//! End-to-end tests for `ExtractionPipeline`.
//!
//! Every upstream (product site, item API, reader proxy) is a local
//! `wiremock` server, so no real network traffic is made.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrine_core::ExtractionMode;
use vitrine_scraper::signature::SIGNATURE_HEADER;
use vitrine_scraper::{
    v2_signature, ExtractionPipeline, HeadlessError, HeadlessRenderer, RenderedPage,
    ScraperConfig,
};

const CDN: &str = "https://cf.shopee.com.br";

/// Short timeouts, reader proxy pointed at `proxy_base`.
fn test_config(proxy_base: &str) -> ScraperConfig {
    ScraperConfig {
        request_timeout: Duration::from_secs(5),
        reader_proxy_base: proxy_base.to_string(),
        marketplace_api_base: None,
        marketplace_cdn_base: CDN.to_string(),
        ..ScraperConfig::default()
    }
}

fn pipeline(proxy_base: &str) -> ExtractionPipeline {
    ExtractionPipeline::new(test_config(proxy_base)).expect("failed to build test pipeline")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Item API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn short_link_resolves_to_marketplace_item_via_v4_api() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/Shirt-i.111.222"))
        .mount(&site)
        .await;
    mount_page(&site, "/Shirt-i.111.222", "<html><body>loading</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/api/v4/item/get"))
        .and(query_param("shopid", "111"))
        .and(query_param("itemid", "222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "item": {
                "name": "Shirt",
                "price_min": 50_000_000,
                "image": "abc123def456abc123def456"
            }
        })))
        .expect(1)
        .mount(&site)
        .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/short", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Api);
    assert_eq!(record.final_url, format!("{}/Shirt-i.111.222", site.uri()));
    assert_eq!(record.title, "Shirt");
    assert_eq!(record.price, "R$ 500,00");
    assert_eq!(
        record.image,
        "https://cf.shopee.com.br/file/abc123def456abc123def456"
    );
}

#[tokio::test]
async fn v2_endpoint_is_called_with_signature_header_when_v4_fails() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;

    mount_page(&site, "/Mochila-i.10.20", "<html></html>").await;
    Mock::given(method("GET"))
        .and(path("/api/v4/item/get"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/item/get"))
        .and(query_param("itemid", "20"))
        .and(query_param("shopid", "10"))
        .and(header(SIGNATURE_HEADER, v2_signature("20", "10").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "item": null,
            "data": {"name": "Mochila Escolar", "price": 12_990_000, "images": ["hash1"]}
        })))
        .expect(1)
        .mount(&site)
        .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/Mochila-i.10.20", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Api);
    assert_eq!(record.title, "Mochila Escolar");
    assert_eq!(record.price, "R$ 129,90");
    assert_eq!(record.image, "https://cf.shopee.com.br/file/hash1");
}

#[tokio::test]
async fn empty_v4_item_falls_through_to_signed_v2() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;

    mount_page(&site, "/Luminaria-i.30.40", "<html></html>").await;
    Mock::given(method("GET"))
        .and(path("/api/v4/item/get"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": 90_309_999, "data": {}})),
        )
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/item/get"))
        .and(header(SIGNATURE_HEADER, v2_signature("40", "30").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "item": {"name": "Luminaria de Mesa", "price_min": 7_990_000, "image": "lumhash"}
        })))
        .expect(1)
        .mount(&site)
        .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/Luminaria-i.30.40", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Api);
    assert_eq!(record.title, "Luminaria de Mesa");
    assert_eq!(record.price, "R$ 79,90");
}

#[tokio::test]
async fn item_is_recovered_from_reader_proxy_dump_when_api_blocks() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;

    mount_page(&site, "/Caneca-i.5.6", "<html></html>").await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/http://.+/api/v4/item/get$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Title: \n\nURL Source: http://shopee/api/v4/item/get\n\nMarkdown Content:\n\
             {\"error\":null,\"item\":{\"name\":\"Caneca Termica\",\"price_min\":4590000}}",
        ))
        .expect(1)
        .mount(&proxy)
        .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/Caneca-i.5.6", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Api);
    assert_eq!(record.title, "Caneca Termica");
    assert_eq!(record.price, "R$ 45,90");
}

// ---------------------------------------------------------------------------
// Direct page
// ---------------------------------------------------------------------------

const STRUCTURED_PAGE: &str = r#"<html><head>
    <meta property="og:title" content="Camiseta Azul">
    <meta property="og:image" content="/img/camiseta.jpg">
    <script type="application/ld+json">
      {"@context":"https://schema.org","@type":"Product","name":"Camiseta Azul",
       "offers":{"@type":"Offer","price":129.9,"priceCurrency":"BRL"}}
    </script>
    </head><body><h1>Camiseta</h1></body></html>"#;

#[tokio::test]
async fn structured_data_wins_on_generic_product_page() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;
    mount_page(&site, "/produto/camiseta", STRUCTURED_PAGE).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&proxy)
        .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/produto/camiseta", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Structured);
    assert_eq!(record.title, "Camiseta Azul");
    assert_eq!(record.price, "R$ 129,90");
    assert_eq!(record.image, format!("{}/img/camiseta.jpg", site.uri()));
}

#[tokio::test]
async fn blob_mining_used_when_page_has_no_structured_data() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;
    mount_page(
        &site,
        "/fone",
        r#"<html><body><script>window.__STATE__ = {"product":{"name":"Fone Bluetooth","price":"4990","image":"https:\/\/img.example\/fone.jpg"}};</script></body></html>"#,
    )
    .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/fone", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Blob);
    assert_eq!(record.title, "Fone Bluetooth");
    assert_eq!(record.price, "R$ 49,90");
    assert_eq!(record.image, "https://img.example/fone.jpg");
}

#[tokio::test]
async fn unquoted_scaled_blob_price_is_formatted() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;
    mount_page(
        &site,
        "/fone-bluetooth",
        r#"<html><body><script>var item = {"name":"Fone Bluetooth","price_min":4990000,"price_max":5990000};</script></body></html>"#,
    )
    .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/fone-bluetooth", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Blob);
    assert_eq!(record.title, "Fone Bluetooth");
    assert_eq!(record.price, "R$ 49,90");
}

// ---------------------------------------------------------------------------
// Reader proxy and exhaustion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reader_proxy_used_when_direct_page_is_blocked() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bloqueado"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/http://.+/bloqueado$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Title: Garrafa Inox 1L\n\nURL Source: http://loja/bloqueado\n\n\
             Markdown Content:\n![foto](https://img.example/garrafa.jpg)\nPor R$ 89,90 à vista",
        ))
        .expect(1)
        .mount(&proxy)
        .await;

    let record = pipeline(&proxy.uri())
        .run(&format!("{}/bloqueado", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Readable);
    assert_eq!(record.title, "Garrafa Inox 1L");
    assert_eq!(record.price, "R$ 89,90");
    assert_eq!(record.image, "https://img.example/garrafa.jpg");
}

#[tokio::test]
async fn unreachable_host_yields_empty_readable_record() {
    // Port 1 is never listening; both the page and the proxy fail to connect.
    let url = "http://127.0.0.1:1/produto";
    let record = pipeline("http://127.0.0.1:1").run(url).await;

    assert_eq!(record.mode, ExtractionMode::Readable);
    assert_eq!(record.final_url, url);
    assert!(record.title.is_empty());
    assert!(record.image.is_empty());
    assert!(record.price.is_empty());
}

#[tokio::test]
async fn malformed_input_is_not_an_error() {
    let record = pipeline("http://127.0.0.1:1").run("not a url").await;

    assert_eq!(record.mode, ExtractionMode::Readable);
    assert_eq!(record.final_url, "not a url");
    assert!(!record.has_signal());
}

#[tokio::test]
async fn repeated_runs_return_identical_records() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;
    mount_page(&site, "/produto/camiseta", STRUCTURED_PAGE).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&proxy)
        .await;

    let pipeline = pipeline(&proxy.uri());
    let url = format!("{}/produto/camiseta", site.uri());
    let first = pipeline.run(&url).await;
    let second = pipeline.run(&url).await;

    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Simple and headless modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn simple_mode_skips_api_and_proxy() {
    let site = MockServer::start().await;
    let proxy = MockServer::start().await;
    mount_page(&site, "/Item-i.1.2", "<html><head><title>Item Simples</title></head></html>").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&proxy)
        .await;

    let record = pipeline(&proxy.uri())
        .run_simple(&format!("{}/Item-i.1.2", site.uri()))
        .await;

    assert_eq!(record.mode, ExtractionMode::Simple);
    assert_eq!(record.title, "Item Simples");
    let api_calls = site
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|r| r.url.path().starts_with("/api/"))
        .count();
    assert_eq!(api_calls, 0);
}

#[tokio::test]
async fn simple_mode_reports_simple_even_when_empty() {
    let record = pipeline("http://127.0.0.1:1")
        .run_simple("http://127.0.0.1:1/x")
        .await;
    assert_eq!(record.mode, ExtractionMode::Simple);
    assert!(!record.has_signal());
}

struct StaticRenderer {
    final_url: String,
    html: String,
}

impl HeadlessRenderer for StaticRenderer {
    fn render<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<RenderedPage, HeadlessError>> {
        Box::pin(async move {
            Ok(RenderedPage {
                final_url: self.final_url.clone(),
                html: self.html.clone(),
            })
        })
    }
}

#[tokio::test]
async fn headless_mode_reads_rendered_dom() {
    let renderer = StaticRenderer {
        final_url: "https://shopee.com.br/Tenis-i.7.8".to_string(),
        html: r#"<html><head>
            <meta property="og:title" content="Tênis Corrida">
            <meta property="og:image" content="//cf.shopee.com.br/file/t">
            </head><body><div class="pdp-price">R$ 249,90</div></body></html>"#
            .to_string(),
    };
    let pipeline = pipeline("http://127.0.0.1:1").with_renderer(Arc::new(renderer));

    let record = pipeline
        .run_headless("https://s.shopee.com.br/abc")
        .await
        .expect("headless render");

    assert_eq!(record.mode, ExtractionMode::Headless);
    assert_eq!(record.final_url, "https://shopee.com.br/Tenis-i.7.8");
    assert_eq!(record.title, "Tênis Corrida");
    assert_eq!(record.price, "R$ 249,90");
    assert_eq!(record.image, "https://cf.shopee.com.br/file/t");
}

#[tokio::test]
async fn headless_without_renderer_is_unavailable() {
    let result = pipeline("http://127.0.0.1:1")
        .run_headless("https://shopee.com.br/x")
        .await;
    assert!(matches!(result, Err(HeadlessError::Unavailable)));
}
