//! Contract tests for the market-data and filing sources, run against
//! scripted transports instead of the network.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use finrisk_core::{
    fetch_bank_filings, fetch_histories, BankProfile, ConceptRequest, FilingFact, FilingSource,
    HistoryRequest, HistoryWindow, HttpClient, HttpError, HttpRequest, HttpResponse, Interval,
    MarketDataSource, NoopHttpClient, SecAdapter, SecSettings, SourceErrorKind, Symbol,
    TrailingRange, YahooAdapter,
};
use time::macros::date;

/// Answers with the first route whose needle occurs in the URL, else 404.
struct ScriptedHttpClient {
    routes: Vec<(&'static str, HttpResponse)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn new(routes: Vec<(&'static str, HttpResponse)>) -> Arc<Self> {
        Arc::new(Self {
            routes,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .iter()
            .find(|(needle, _)| request.url.contains(needle))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| HttpResponse::with_status(404, "{}"));
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        Box::pin(async move { Ok(response) })
    }
}

fn concept(facts: &str) -> HttpResponse {
    HttpResponse::ok_json(format!(r#"{{"units":{{"USD":[{facts}]}}}}"#))
}

fn sec_settings() -> SecSettings {
    SecSettings {
        base_url: "https://sec.test".to_owned(),
        contact_email: "analyst@example.com".to_owned(),
    }
}

fn bank() -> BankProfile {
    BankProfile {
        ticker: Symbol::parse("HBAN").expect("valid"),
        cik: "CIK0000049196".to_owned(),
        profit_tags: vec!["NetIncomeLoss".to_owned()],
        other_income_tags: vec!["FirstTag".to_owned(), "SecondTag".to_owned()],
        afs_tags: vec!["AvailableForSaleSecurities".to_owned()],
    }
}

#[tokio::test]
async fn sec_request_carries_contact_headers() {
    // Given: an SEC adapter over a recording transport
    let client = ScriptedHttpClient::new(vec![(
        "NetIncomeLoss",
        concept(r#"{"start":"2024-01-01","end":"2024-03-31","val":1200}"#),
    )]);
    let adapter = SecAdapter::with_http_client(&sec_settings(), client.clone());

    // When: a concept is requested
    let request = ConceptRequest::new("CIK0000049196", "NetIncomeLoss").expect("valid");
    let facts = adapter.concept(request).await.expect("facts");

    // Then: the company-concept endpoint is called with the declared contact
    assert_eq!(
        client.urls(),
        vec!["https://sec.test/api/xbrl/companyconcept/CIK0000049196/us-gaap/NetIncomeLoss.json"]
    );
    let recorded = client.requests.lock().expect("lock")[0].clone();
    assert_eq!(
        recorded.headers.get("user-agent").map(String::as_str),
        Some("BS/1.0 (analyst@example.com)")
    );
    assert_eq!(
        recorded.headers.get("accept-encoding").map(String::as_str),
        Some("gzip, deflate")
    );
    assert_eq!(
        facts,
        vec![FilingFact::duration(date!(2024 - 01 - 01), date!(2024 - 03 - 31), 1200.0)]
    );
}

#[tokio::test]
async fn sec_missing_concept_degrades_to_no_facts() {
    // Given: a transport that knows no concepts
    let adapter = SecAdapter::with_http_client(&sec_settings(), ScriptedHttpClient::new(Vec::new()));

    // When: a tag the bank never reported is requested
    let request = ConceptRequest::new("CIK0000049196", "NeverReported").expect("valid");
    let facts = adapter.concept(request).await;

    // Then: the 404 becomes an empty list rather than an error
    assert_eq!(facts.expect("404 is not an error"), Vec::new());
}

#[tokio::test]
async fn sec_empty_document_has_no_facts() {
    let adapter = SecAdapter::with_http_client(&sec_settings(), Arc::new(NoopHttpClient));
    let request = ConceptRequest::new("CIK0000049196", "NetIncomeLoss").expect("valid");
    assert!(adapter.concept(request).await.expect("empty body parses").is_empty());
}

#[tokio::test]
async fn bank_filings_merge_tags_in_configured_order() {
    // Given: two other-income tags and an instant AFS balance
    let client = ScriptedHttpClient::new(vec![
        ("FirstTag", concept(r#"{"start":"2024-01-01","end":"2024-03-31","val":1}"#)),
        ("SecondTag", concept(r#"{"start":"2024-04-01","end":"2024-06-30","val":2}"#)),
        ("AvailableForSaleSecurities", concept(r#"{"end":"2024-03-31","val":7.5}"#)),
    ]);
    let adapter = SecAdapter::with_http_client(&sec_settings(), client.clone());

    // When: the bank's filings are fetched
    let filings = fetch_bank_filings(&adapter, &bank()).await;

    // Then: tags are merged in order, instants have no start, and the
    // unanswered profit tag contributes nothing
    let values = filings.other_income.iter().map(|fact| fact.value).collect::<Vec<_>>();
    assert_eq!(values, vec![1.0, 2.0]);
    assert!(filings.profit.is_empty());
    assert_eq!(
        filings.available_for_sale,
        vec![FilingFact::instant(date!(2024 - 03 - 31), 7.5)]
    );
    assert_eq!(client.urls().len(), 4);
}

#[tokio::test]
async fn yahoo_trailing_request_uses_range_query() {
    // Given: a chart payload with adjusted closes
    let client = ScriptedHttpClient::new(vec![(
        "%5ETYX",
        HttpResponse::ok_json(
            r#"{"chart":{"result":[{"meta":{"gmtoffset":0},
            "timestamp":[1704067200,1704672000],
            "indicators":{"quote":[{"close":[4.0,4.1]}],
            "adjclose":[{"adjclose":[4.0,4.1]}]}}],"error":null}"#,
        ),
    )]);
    let adapter = YahooAdapter::with_http_client(client.clone()).with_base_url("https://chart.test");

    // When: ten years of weekly yields are requested
    let symbol = Symbol::parse("^TYX").expect("valid");
    let request = HistoryRequest::new(
        symbol,
        HistoryWindow::Trailing(TrailingRange::Years(10)),
        Interval::Weekly,
    );
    let series = adapter.history(request).await.expect("series");

    // Then: the symbol is URL-encoded and the range is passed through
    let url = &client.urls()[0];
    assert!(url.starts_with("https://chart.test/%5ETYX?range=10y&interval=1wk"));
    assert!(url.contains("includeAdjustedClose=true"));
    assert_eq!(series.len(), 2);
    assert_eq!(series.close_on(date!(2024 - 01 - 08)), Some(4.1));
}

#[tokio::test]
async fn yahoo_error_status_is_unavailable() {
    let adapter = YahooAdapter::with_http_client(ScriptedHttpClient::new(Vec::new()));
    let request = HistoryRequest::new(
        Symbol::parse("BAC").expect("valid"),
        HistoryWindow::Trailing(TrailingRange::Years(1)),
        Interval::Weekly,
    );

    let error = adapter.history(request).await.expect_err("404 fails");
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert!(error.retryable());
}

#[tokio::test]
async fn failed_symbols_become_empty_series() {
    // Given: a transport that answers only for BAC
    let client = ScriptedHttpClient::new(vec![(
        "/BAC?",
        HttpResponse::ok_json(
            r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"timestamp":[1704067200],
            "indicators":{"quote":[{"close":[30.0]}]}}],"error":null}"#,
        ),
    )]);
    let adapter = YahooAdapter::with_http_client(client);
    let symbols = ["BAC", "JPM"].map(|raw| Symbol::parse(raw).expect("valid"));

    // When: both histories are fetched
    let histories = fetch_histories(
        &adapter,
        &symbols,
        HistoryWindow::Trailing(TrailingRange::Years(10)),
        Interval::Weekly,
    )
    .await;

    // Then: JPM is present but empty
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[&symbols[0]].len(), 1);
    assert!(histories[&symbols[1]].is_empty());
}
