//! Integration tests for the static-markup auction extractor
//!
//! Item pages are served by wiremock; the extractor runs its full
//! fetch → parse → record cycle against them.

use listing_harvest::config::{Config, FetchConfig, RetryConfig};
use listing_harvest::extract::AuctionExtractor;
use listing_harvest::record::ScrapeRequest;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        fetch: FetchConfig {
            bootstrap_url: format!("{}/", server.uri()),
            request_delay_ms: 0,
            follow_redirects: true,
            timeout_secs: 5,
        },
        retry: RetryConfig {
            max_attempts: 1,
            min_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 0.0,
        },
        ..Config::default()
    }
}

fn item_page(title: &str, detail: &str, extra: &str) -> String {
    format!(
        r#"<html><head>
        <script id="__NEXT_DATA__" type="application/json">{{"props":{{"initialState":{{"item":{{"detail":{detail}}}}}}}}}</script>
        </head><body>
        <h1 id="itemTitle">{title}</h1>
        {extra}
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_root(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scrape_current_layout() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    mount_page(
        &server,
        "/jp/auction/a1",
        item_page(
            "Nikon F3",
            r#"{"price": 30000, "bidorbuy": 45000}"#,
            r#"<div class="ProductImage__image"><img src="https://img/f3-1.jpg"></div>
               <div class="slick-slider"><img src="https://img/f3-1.jpg"><img src="https://img/f3-2.jpg"></div>
               <ul><li><span>送料無料</span></li></ul>
               <div id="itemInfo"><dl><dt>発送元の地域</dt><dd> 福岡県 </dd></dl></div>
               <dl><dt>商品の状態</dt><dd>やや傷や汚れあり</dd></dl>
               <div class="ProductExplanation__commentBody">シャッター動作確認済み</div>"#,
        ),
    )
    .await;

    let config = test_config(&server);
    let extractor = AuctionExtractor::new(&config).unwrap();
    let listing = extractor
        .scrape(&format!("{}/jp/auction/a1", server.uri()))
        .await
        .unwrap();

    assert_eq!(listing.price, 45000);
    assert_eq!(listing.shipping_fee, Some(0));
    assert_eq!(listing.total_price, Some(45000));
    assert_eq!(listing.shipping_region.as_deref(), Some("福岡県"));
    assert_eq!(listing.title, "Nikon F3");
    assert_eq!(listing.condition, "やや傷や汚れあり");
    assert_eq!(listing.description.as_deref(), Some("シャッター動作確認済み"));
    assert_eq!(
        listing.joined_image_urls(),
        "https://img/f3-1.jpg|https://img/f3-2.jpg"
    );
    assert_eq!(
        listing.merged_info,
        "Nikon F3\nシャッター動作確認済み\nやや傷や汚れあり"
    );
}

#[tokio::test]
async fn test_scrape_legacy_layout() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    mount_page(
        &server,
        "/jp/auction/b2",
        item_page(
            "Old lens",
            r#"{"price": "1,500"}"#,
            r#"<table><tr>
                 <th class="Section__tableHead">状態</th>
                 <td class="Section__tableData">中古
                 詳細は説明文を参照</td>
               </tr></table>
               <div id="description">Legacy description</div>"#,
        ),
    )
    .await;

    let config = test_config(&server);
    let extractor = AuctionExtractor::new(&config).unwrap();
    let listing = extractor
        .scrape(&format!("{}/jp/auction/b2", server.uri()))
        .await
        .unwrap();

    assert_eq!(listing.price, 1500);
    assert_eq!(listing.shipping_fee, Some(2000));
    assert_eq!(listing.total_price, Some(3500));
    assert_eq!(listing.shipping_region, None);
    assert_eq!(listing.condition, "中古");
    assert!(listing.image_urls.is_empty());
    assert_eq!(listing.joined_image_urls(), "");
}

#[tokio::test]
async fn test_run_degrades_failures_to_partial_records() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    mount_page(
        &server,
        "/jp/auction/ok",
        item_page("Tripod", r#"{"price": 2000}"#, ""),
    )
    .await;
    // No embedded page data: price extraction fails
    mount_page(
        &server,
        "/jp/auction/no-data",
        "<html><body><h1 id=\"itemTitle\">x</h1></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/jp/auction/ended"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let requests = vec![
        ScrapeRequest::new(format!("{}/jp/auction/ended", server.uri()), 7),
        ScrapeRequest::new(format!("{}/jp/auction/ok", server.uri()), 2),
        ScrapeRequest::new(format!("{}/jp/auction/no-data", server.uri()), 5),
    ];

    let config = test_config(&server);
    let extractor = AuctionExtractor::new(&config).unwrap();
    let records = extractor.run(&requests).await;

    assert_eq!(records.len(), 3);

    assert!(records[0].is_partial());
    assert_eq!(records[0].original_index, 7);
    assert_eq!(records[0].original_url, requests[0].url);

    let listing = records[1].listing.as_ref().unwrap();
    assert_eq!(listing.title, "Tripod");
    assert_eq!(listing.condition, "");
    assert_eq!(listing.description, None);
    assert_eq!(listing.merged_info, "Tripod\n\n");

    assert!(records[2].is_partial());
    assert_eq!(records[2].original_index, 5);
}
