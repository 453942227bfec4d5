//! End to end source flows over a scripted HTTP transport.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use quotefeed_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, RetryConfig, RowKey, Value,
};
use quotefeed_yahoo::history::HistoryRequest;
use quotefeed_yahoo::live::LiveQuoteRequest;
use quotefeed_yahoo::returns::{Granularity, ReturnsRequest};
use quotefeed_yahoo::session::YahooSession;
use quotefeed_yahoo::stats::StatsRequest;
use quotefeed_yahoo::{
    YahooHistorySource, YahooLiveQuoteSource, YahooReturnSource, YahooStatsSource,
};
use time::macros::date;

#[derive(Clone, Default)]
struct FixtureServer {
    responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
}

impl FixtureServer {
    fn on_url(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.lock().unwrap().insert(
            url.into(),
            HttpResponse {
                status: 200,
                body: body.into(),
            },
        );
        self
    }
}

impl HttpClient for FixtureServer {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = match self.responses.lock().unwrap().get(&request.url) {
            Some(response) => Ok(response.clone()),
            None => Err(HttpError::non_retryable(format!(
                "no fixture for {}",
                request.url
            ))),
        };
        Box::pin(async move { response })
    }
}

fn crumbed(server: FixtureServer) -> FixtureServer {
    server.on_url("https://fc.yahoo.com", "").on_url(
        "https://query1.finance.yahoo.com/v1/test/getcrumb",
        "fixture-crumb",
    )
}

fn session(server: FixtureServer) -> Arc<YahooSession> {
    Arc::new(YahooSession::new(Arc::new(server)).with_retry(RetryConfig::no_retry()))
}

const AAPL_CSV: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
    2017-06-01,100.0,102.0,99.0,100.0,100.0,1000\n\
    2017-06-02,101.0,103.0,100.0,102.0,102.0,1200\n\
    2017-06-05,102.0,104.0,101.0,104.04,104.04,900\n";

fn history_url(ticker: &str) -> String {
    // 2017-06-01 through 2017-06-05 as unix epoch seconds.
    format!(
        "https://query1.finance.yahoo.com/v7/finance/download/{ticker}?period1=1496275200&period2=1496620800&interval=1d&events=history&crumb=fixture-crumb"
    )
}

#[tokio::test]
async fn history_feeds_the_return_series() {
    let server = crumbed(FixtureServer::default()).on_url(history_url("AAPL"), AAPL_CSV);
    let session = session(server);

    let history = YahooHistorySource::new(Arc::clone(&session));
    let table = history
        .read(&HistoryRequest::new(
            "AAPL",
            date!(2017 - 06 - 01),
            date!(2017 - 06 - 05),
        ))
        .await
        .expect("history");
    assert_eq!(table.row_count(), 3);
    assert_eq!(
        table.value_by_key(&date!(2017 - 06 - 02).into(), "PX_CLOSE"),
        Some(&Value::Number(102.0))
    );

    let returns = YahooReturnSource::new(session);
    let outcome = returns
        .read(
            &ReturnsRequest::new(["AAPL"], date!(2017 - 06 - 01), date!(2017 - 06 - 05))
                .with_granularity(Granularity::Cumulative),
        )
        .await
        .expect("returns");
    assert!(outcome.is_complete());
    let cumulative = outcome
        .table()
        .value_by_key(&date!(2017 - 06 - 05).into(), "AAPL")
        .and_then(Value::as_f64)
        .expect("cell");
    assert!((cumulative - 0.0404).abs() < 1e-12);
}

#[tokio::test]
async fn live_quotes_render_as_json_records() {
    let server = FixtureServer::default().on_url(
        "http://download.finance.yahoo.com/d/quotes.csv?s=AAPL&f=sl1c1",
        "\"AAPL\",153.61,-0.24\n",
    );
    let source = YahooLiveQuoteSource::new(session(server));
    let request = LiveQuoteRequest::new(["AAPL"]).with_fields([
        &quotefeed_yahoo::fields::PX_LAST,
        &quotefeed_yahoo::fields::PX_CHANGE,
    ]);
    let outcome = source.read(&request).await.expect("read");
    assert!(outcome.is_complete());

    let records = outcome.table().to_json_records();
    assert_eq!(records[0]["key"], "AAPL");
    assert_eq!(records[0]["PX_LAST"], 153.61);
    assert_eq!(records[0]["PX_CHANGE"], -0.24);
}

#[tokio::test]
async fn statistics_batch_reports_partial_failures() {
    let page = r#"
        <table>
          <tr><td><span>Market Cap (intraday)</span></td><td><span>803.45B</span></td></tr>
          <tr><td><span>Payout Ratio</span></td><td><span>26.32%</span></td></tr>
        </table>
    "#;
    let server = FixtureServer::default().on_url(
        "https://finance.yahoo.com/quote/AAPL/key-statistics?p=AAPL",
        page,
    );
    let source = YahooStatsSource::new(session(server));
    let outcome = source
        .read(&StatsRequest::new(["AAPL", "GONE"]))
        .await
        .expect("read");

    assert_eq!(outcome.failures().len(), 1);
    assert_eq!(outcome.failures()[0].unit(), "GONE");
    let table = outcome.table();
    assert_eq!(table.keys(), &[RowKey::from("AAPL")]);
    assert_eq!(
        table.value_by_key(&"AAPL".into(), "MARKET_CAP"),
        Some(&Value::Number(803_450_000_000.0))
    );
}
