//! Historical daily quotes from the Yahoo Finance CSV download API.

use std::sync::Arc;

use time::macros::format_description;
use time::Date;

use quotefeed_core::{ColumnSpec, ParseError, ResultTable, SourceError, TableRow};

use crate::adjust::{adjust, QuoteBar, RawBar};
use crate::fields;
use crate::session::YahooSession;

const DOWNLOAD_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";

/// A request for the daily bar history of one ticker.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    ticker: String,
    start: Date,
    end: Date,
    adjusted: bool,
}

impl HistoryRequest {
    pub fn new(ticker: impl Into<String>, start: Date, end: Date) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
            adjusted: true,
        }
    }

    /// Leaves prices unadjusted; the SplitRatio column is still filled.
    pub fn unadjusted(mut self) -> Self {
        self.adjusted = false;
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.ticker.trim().is_empty() {
            return Err(SourceError::invalid_request("a ticker is required"));
        }
        if self.start >= self.end {
            return Err(SourceError::invalid_request(format!(
                "start date {} must be before end date {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Source adapter for split/dividend adjusted quote history.
#[derive(Clone)]
pub struct YahooHistorySource {
    session: Arc<YahooSession>,
}

impl YahooHistorySource {
    pub fn new(session: Arc<YahooSession>) -> Self {
        Self { session }
    }

    /// Reads the bar history into a date-keyed table with the
    /// [`fields::history_fields`] columns, rows sorted ascending.
    pub async fn read(&self, request: &HistoryRequest) -> Result<ResultTable, SourceError> {
        let bars = self.fetch_bars(request).await?;
        let mut table = ResultTable::with_row_capacity(
            fields::history_fields().iter().map(|&f| ColumnSpec::from(f)),
            bars.len(),
        );
        for bar in &bars {
            table.upsert(history_row(bar))?;
        }
        table.sort_rows_by_key();
        Ok(table)
    }

    /// Downloads and adjusts the bars without table assembly. The
    /// returns source consumes this form directly.
    pub(crate) async fn fetch_bars(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<QuoteBar>, SourceError> {
        request.validate()?;
        let ticker = request.ticker.clone();
        let period1 = epoch_seconds(request.start);
        let period2 = epoch_seconds(request.end);
        let response = self
            .session
            .get_with_crumb(|crumb| {
                format!(
                    "{DOWNLOAD_URL}/{}?period1={period1}&period2={period2}&interval=1d&events=history&crumb={}",
                    urlencoding::encode(&ticker),
                    urlencoding::encode(crumb)
                )
            })
            .await?;
        let raw = parse_csv(&response.body)?;
        Ok(adjust(raw, request.adjusted))
    }
}

fn epoch_seconds(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

/// Parses the download CSV: a header line, then
/// `Date,Open,High,Low,Close,Adj Close,Volume` rows.
fn parse_csv(body: &str) -> Result<Vec<RawBar>, SourceError> {
    let date_format = format_description!("[year]-[month]-[day]");
    let mut bars = Vec::new();
    for line in body.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != 7 {
            return Err(SourceError::internal(format!(
                "malformed history row '{line}'"
            )));
        }
        let date = Date::parse(cells[0].trim(), &date_format).map_err(|_| {
            SourceError::parse(
                fields::PX_CLOSE.name(),
                ParseError::InvalidCalendar {
                    text: cells[0].to_owned(),
                },
            )
        })?;
        bars.push(RawBar {
            date,
            open: csv_number(cells[1], &fields::PX_OPEN)?,
            high: csv_number(cells[2], &fields::PX_HIGH)?,
            low: csv_number(cells[3], &fields::PX_LOW)?,
            close: csv_number(cells[4], &fields::PX_CLOSE)?,
            adj_close: csv_number(cells[5], &fields::PX_CLOSE)?,
            volume: csv_number(cells[6], &fields::PX_VOLUME)?,
        });
    }
    Ok(bars)
}

fn csv_number(cell: &str, field: &quotefeed_core::Field) -> Result<f64, SourceError> {
    cell.trim().parse::<f64>().map_err(|_| {
        SourceError::parse(
            field.name(),
            ParseError::MalformedNumber {
                text: cell.to_owned(),
            },
        )
    })
}

fn history_row(bar: &QuoteBar) -> TableRow {
    TableRow::new(bar.date)
        .with(&fields::PX_OPEN, bar.open)
        .with(&fields::PX_HIGH, bar.high)
        .with(&fields::PX_LOW, bar.low)
        .with(&fields::PX_CLOSE, bar.close)
        .with(&fields::PX_VOLUME, bar.volume)
        .with(&fields::PX_SPLIT_RATIO, bar.split_ratio)
        .with(&fields::PX_CHANGE, bar.change)
        .with(&fields::PX_CHANGE_PERCENT, bar.change_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedHttpClient;
    use quotefeed_core::{RetryConfig, RowKey, Value};
    use std::sync::Arc;
    use time::macros::date;

    const CSV: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
        2017-06-02,101.0,103.0,100.0,102.0,102.0,1200\n\
        2017-06-01,100.0,102.0,99.0,100.0,50.0,1000\n";

    fn source(client: ScriptedHttpClient) -> YahooHistorySource {
        let session =
            YahooSession::new(Arc::new(client)).with_retry(RetryConfig::no_retry());
        YahooHistorySource::new(Arc::new(session))
    }

    fn scripted(csv: &str, ticker: &str) -> ScriptedHttpClient {
        let url = format!(
            "{DOWNLOAD_URL}/{ticker}?period1=1496275200&period2=1498694400&interval=1d&events=history&crumb=crumb-1"
        );
        ScriptedHttpClient::new()
            .on_url("https://fc.yahoo.com", 200, "")
            .on_url(
                "https://query1.finance.yahoo.com/v1/test/getcrumb",
                200,
                "crumb-1",
            )
            .on_url(&url, 200, csv)
    }

    fn request() -> HistoryRequest {
        HistoryRequest::new("AAPL", date!(2017 - 06 - 01), date!(2017 - 06 - 29))
    }

    #[tokio::test]
    async fn rows_come_back_date_sorted_with_derived_columns() {
        let source = source(scripted(CSV, "AAPL"));
        let table = source.read(&request()).await.expect("history");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.keys()[0], RowKey::Date(date!(2017 - 06 - 01)));
        // 2017-06-01 has adj close 50 vs close 100, so prices halve.
        assert_eq!(
            table.value(0, "PX_CLOSE"),
            Some(&Value::Number(50.0))
        );
        assert_eq!(table.value(0, "PX_SPLIT_RATIO"), Some(&Value::Number(0.5)));
        assert_eq!(table.value(0, "PX_VOLUME"), Some(&Value::Number(1000.0)));
        assert!(table
            .value(0, "PX_CHANGE")
            .and_then(Value::as_f64)
            .expect("cell")
            .is_nan());
        assert_eq!(table.value(1, "PX_CHANGE"), Some(&Value::Number(52.0)));
    }

    #[tokio::test]
    async fn unadjusted_request_keeps_raw_prices() {
        let source = source(scripted(CSV, "AAPL"));
        let table = source
            .read(&request().unadjusted())
            .await
            .expect("history");
        assert_eq!(table.value(0, "PX_CLOSE"), Some(&Value::Number(100.0)));
        assert_eq!(table.value(0, "PX_SPLIT_RATIO"), Some(&Value::Number(0.5)));
    }

    #[tokio::test]
    async fn invalid_date_range_fails_before_any_request() {
        let client = ScriptedHttpClient::new();
        let source = source(client.clone());
        let request =
            HistoryRequest::new("AAPL", date!(2017 - 06 - 29), date!(2017 - 06 - 01));
        let error = source.read(&request).await.expect_err("should reject");
        assert_eq!(error.code(), "source.invalid_request");
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn malformed_close_is_a_parse_error() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n\
            2017-06-01,100.0,102.0,99.0,null,100.0,1000\n";
        let source = source(scripted(csv, "AAPL"));
        let error = source.read(&request()).await.expect_err("should fail");
        assert_eq!(error.code(), "source.parse");
    }
}
