//! End-to-end tests for the run orchestrator
//!
//! The auction site is served by wiremock; the WebDriver endpoint refuses
//! sessions so marketplace URLs come back as partial records.

use listing_harvest::config::{BrowserConfig, Config, FetchConfig, RetryConfig};
use listing_harvest::output::{sort_by_original_index, write_output};
use listing_harvest::record::ScrapeRequest;
use listing_harvest::routing::SiteBinding;
use listing_harvest::Harvester;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEM_PAGE: &str = r#"<html><head>
<script id="__NEXT_DATA__" type="application/json">{"props":{"initialState":{"item":{"detail":{"price":5000}}}}}</script>
</head><body><h1 id="itemTitle">Flash unit</h1><div id="description">Works</div></body></html>"#;

async fn auction_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ITEM_PAGE))
        .mount(&server)
        .await;
    server
}

async fn refusing_webdriver() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

fn test_config(auction: &MockServer, webdriver: &MockServer) -> Config {
    Config {
        fetch: FetchConfig {
            bootstrap_url: format!("{}/", auction.uri()),
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
        browser: BrowserConfig {
            webdriver_url: webdriver.uri(),
            ..BrowserConfig::default()
        },
        sites: vec![
            SiteBinding::new("127.0.0.1", "yahauc"),
            SiteBinding::new("jp.mercari.com", "mercari"),
        ],
        ..Config::default()
    }
}

#[tokio::test]
async fn test_every_url_yields_one_record_in_input_order() {
    let auction = auction_server().await;
    let webdriver = refusing_webdriver().await;
    let harvester = Harvester::new(test_config(&auction, &webdriver));

    let requests = vec![
        ScrapeRequest::new("https://jp.mercari.com/item/y", 1),
        ScrapeRequest::new("https://example.org/listing", 0),
        ScrapeRequest::new(format!("{}/item/x", auction.uri()), 3),
        ScrapeRequest::new(format!("{}/item/missing", auction.uri()), 2),
    ];

    let report = harvester.run_with_statistics(&requests).await;
    let mut records = report.records;
    assert_eq!(records.len(), requests.len());

    // Groups follow routing-table order: auction first
    assert_eq!(records[0].original_index, 3);
    assert_eq!(records[1].original_index, 2);

    sort_by_original_index(&mut records);
    let indexes: Vec<usize> = records.iter().map(|r| r.original_index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3]);

    assert!(records[0].is_partial());
    assert_eq!(records[0].original_url, "https://example.org/listing");
    assert!(records[1].is_partial());
    assert!(records[2].is_partial());

    let listing = records[3].listing.as_ref().expect("auction item scraped");
    assert_eq!(listing.title, "Flash unit");
    assert_eq!(listing.price, 5000);
    assert_eq!(listing.shipping_fee, Some(2000));
    assert_eq!(listing.total_price, Some(7000));

    let stats = report.statistics;
    assert_eq!(stats.site("yahauc").unwrap().complete, 1);
    assert_eq!(stats.site("yahauc").unwrap().partial, 1);
    assert_eq!(stats.site("mercari").unwrap().partial, 1);
    assert_eq!(stats.site("unknown").unwrap().partial, 1);
}

#[tokio::test]
async fn test_routing_scenario_tags_original_index() {
    let auction = auction_server().await;
    let webdriver = refusing_webdriver().await;
    let mut config = test_config(&auction, &webdriver);
    config.sites = vec![
        SiteBinding::new("auctions.yahoo.co.jp", "yahauc"),
        SiteBinding::new("jp.mercari.com", "mercari"),
    ];
    let harvester = Harvester::new(config);

    let requests = vec![
        ScrapeRequest::new("https://auctions.yahoo.co.jp/item/x", 3),
        ScrapeRequest::new("https://jp.mercari.com/item/y", 1),
    ];

    let plan = harvester.plan(&requests);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].site_name, "yahauc");
    assert_eq!(plan[0].requests, vec![requests[0].clone()]);
    assert_eq!(plan[1].site_name, "mercari");
    assert_eq!(plan[1].requests, vec![requests[1].clone()]);
}

#[tokio::test]
async fn test_output_file_written_sorted() {
    let auction = auction_server().await;
    let webdriver = refusing_webdriver().await;
    let harvester = Harvester::new(test_config(&auction, &webdriver));

    let requests = vec![
        ScrapeRequest::new(format!("{}/item/x", auction.uri()), 1),
        ScrapeRequest::new("https://jp.mercari.com/item/y", 0),
    ];
    let records = harvester.run(&requests).await;

    let dir = tempfile::tempdir().unwrap();
    let path = write_output(dir.path(), records).unwrap();

    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("output_"));
    assert!(file_name.ends_with(".csv"));

    let content = std::fs::read_to_string(&path).unwrap();
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "0");
    assert_eq!(&rows[0][2], "https://jp.mercari.com/item/y");
    assert_eq!(&rows[0][7], "");
    assert_eq!(&rows[1][0], "1");
    assert_eq!(&rows[1][7], "Flash unit");
}
