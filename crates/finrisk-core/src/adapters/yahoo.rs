use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::{OffsetDateTime, Time};
use tracing::debug;

use crate::data_source::{HistoryRequest, HistoryWindow, MarketDataSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{PricePoint, PriceSeries};

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API adapter returning adjusted closes.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(CHART_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, req: &HistoryRequest) -> String {
        let window = match req.window {
            HistoryWindow::Range(range) => format!(
                "period1={}&period2={}",
                midnight_utc(range.start),
                midnight_utc(range.end)
            ),
            HistoryWindow::Trailing(range) => format!("range={}", range.as_query()),
        };

        format!(
            "{}/{}?{}&interval={}&events=div%2Csplit&includeAdjustedClose=true",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            window,
            req.interval.as_str()
        )
    }

    async fn fetch_history(&self, req: HistoryRequest) -> Result<PriceSeries, SourceError> {
        let endpoint = self.chart_url(&req);
        debug!(symbol = %req.symbol, %endpoint, "requesting yahoo chart");

        let request = HttpRequest::get(&endpoint)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(10_000);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::unavailable(format!("yahoo transport error: {}", e.message())))?;

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {} {}",
                response.status,
                response.reason()
            )));
        }

        let points = parse_chart(&response.body)?;
        Ok(PriceSeries::new(req.symbol, req.interval, points))
    }
}

impl MarketDataSource for YahooAdapter {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_history(req).await })
    }
}

fn midnight_utc(date: time::Date) -> i64 {
    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp()
}

/// Extracts `(date, adjusted close)` pairs; the raw close is used when the
/// payload carries no adjusted series. Null observations are skipped.
fn parse_chart(body: &str) -> Result<Vec<PricePoint>, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart_response.chart.error {
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {}",
            error.description.unwrap_or(error.code)
        )));
    }

    let Some(result) = chart_response.chart.result.and_then(|mut results| {
        if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        }
    }) else {
        return Err(SourceError::parse("no chart data in response"));
    };

    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);

    let closes = result
        .indicators
        .adjclose
        .and_then(|series| series.into_iter().next())
        .map(|series| series.adjclose)
        .or_else(|| {
            result
                .indicators
                .quote
                .into_iter()
                .next()
                .map(|quote| quote.close)
        })
        .ok_or_else(|| SourceError::parse("no close data in response"))?;

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts_value, close) in timestamps.iter().zip(closes) {
        let Some(close) = close else { continue };
        let date = OffsetDateTime::from_unix_timestamp(ts_value + offset)
            .map_err(|e| SourceError::parse(format!("invalid timestamp: {e}")))?
            .date();
        points.push(PricePoint::new(date, close));
    }

    Ok(points)
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::{DateRange, Interval, Symbol, TrailingRange};
    use std::sync::Mutex;
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use time::macros::date;

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn responding(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    const CHART: &str = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},
        "timestamp":[1704067200,1704672000,1705276800],
        "indicators":{"quote":[{"close":[10.0,11.0,12.0]}],
        "adjclose":[{"adjclose":[9.5,null,11.5]}]}}],"error":null}"#;

    #[test]
    fn prefers_adjusted_close_and_skips_nulls() {
        let points = parse_chart(CHART).expect("chart parses");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], PricePoint::new(date!(2024 - 01 - 01), 9.5));
        assert_eq!(points[1], PricePoint::new(date!(2024 - 01 - 15), 11.5));
    }

    #[test]
    fn falls_back_to_close_without_adjusted_series() {
        let body = r#"{"chart":{"result":[{"timestamp":[1704067200],
            "indicators":{"quote":[{"close":[10.0]}]}}]}}"#;
        let points = parse_chart(body).expect("chart parses");
        assert_eq!(points, vec![PricePoint::new(date!(2024 - 01 - 01), 10.0)]);
    }

    #[test]
    fn surfaces_chart_api_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let error = parse_chart(body).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("delisted"));
    }

    #[test]
    fn trailing_request_uses_range_query() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(CHART))));
        let adapter = YahooAdapter::with_http_client(client.clone());
        let request = HistoryRequest::new(
            Symbol::parse("^TYX").expect("valid symbol"),
            HistoryWindow::Trailing(TrailingRange::Years(10)),
            Interval::Weekly,
        );

        let series = block_on(adapter.history(request)).expect("history");
        assert_eq!(series.len(), 2);

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.contains("/%5ETYX?range=10y&interval=1wk"));
        assert!(requests[0].url.contains("includeAdjustedClose=true"));
    }

    #[test]
    fn explicit_range_uses_unix_periods() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(CHART))));
        let adapter = YahooAdapter::with_http_client(client.clone());
        let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02)).expect("range");
        let request = HistoryRequest::new(
            Symbol::parse("CL=F").expect("valid symbol"),
            HistoryWindow::Range(range),
            Interval::Daily,
        );

        block_on(adapter.history(request)).expect("history");
        let url = &client.recorded_requests()[0].url;
        assert!(url.contains("period1=1704067200&period2=1704153600"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn non_success_status_is_unavailable() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::with_status(
            503, "",
        ))));
        let adapter = YahooAdapter::with_http_client(client);
        let request = HistoryRequest::new(
            Symbol::parse("BAC").expect("valid symbol"),
            HistoryWindow::Trailing(TrailingRange::Years(1)),
            Interval::Weekly,
        );

        let error = block_on(adapter.history(request)).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("503"));
    }

    fn block_on<F>(future: F) -> F::Output
    where
        F: Future,
    {
        let waker = noop_waker();
        let mut context = Context::from_waker(&waker);
        let mut future = std::pin::pin!(future);

        loop {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(output) => return output,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    fn noop_waker() -> Waker {
        // SAFETY: The vtable functions never dereference the data pointer and are no-op operations.
        unsafe { Waker::from_raw(noop_raw_waker()) }
    }

    fn noop_raw_waker() -> RawWaker {
        RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
    }

    unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }

    unsafe fn noop_raw_waker_wake(_: *const ()) {}

    unsafe fn noop_raw_waker_wake_by_ref(_: *const ()) {}

    unsafe fn noop_raw_waker_drop(_: *const ()) {}

    static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
        noop_raw_waker_clone,
        noop_raw_waker_wake,
        noop_raw_waker_wake_by_ref,
        noop_raw_waker_drop,
    );
}
