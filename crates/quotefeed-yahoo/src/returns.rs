//! Realized return series computed from adjusted close history.
//!
//! One pipeline unit per ticker: load the adjusted bar history, turn
//! the closes into a return series and emit it as a column named after
//! the ticker. Merging the units into one date-keyed table lines the
//! tickers up on their common dates; dates a ticker never traded stay
//! NaN in its column.

use std::sync::Arc;

use quotefeed_core::{
    ColumnSpec, DataType, FetchOutcome, FetchPipeline, ResultTable, SourceError, TableRow,
};
use time::{Date, Duration};
use tracing::debug;

use crate::adjust::QuoteBar;
use crate::history::{HistoryRequest, YahooHistorySource};
use crate::session::YahooSession;

/// Sampling of the return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    /// Close over the close five trading days earlier.
    Weekly,
    /// Close over the close twenty trading days earlier.
    Monthly,
    /// Close over the first close of the window.
    Cumulative,
}

impl Granularity {
    /// Lookback in trading days for the period variants.
    fn period_days(self) -> Option<usize> {
        match self {
            Self::Weekly => Some(5),
            Self::Monthly => Some(20),
            Self::Daily | Self::Cumulative => None,
        }
    }
}

/// Which tickers, window and sampling to compute returns for.
#[derive(Debug, Clone)]
pub struct ReturnsRequest {
    tickers: Vec<String>,
    start: Date,
    end: Date,
    granularity: Granularity,
}

impl ReturnsRequest {
    pub fn new<I, S>(tickers: I, start: Date, end: Date) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::new();
        for ticker in tickers {
            let ticker = ticker.into();
            if !seen.contains(&ticker) {
                seen.push(ticker);
            }
        }
        Self {
            tickers: seen,
            start,
            end,
            granularity: Granularity::Daily,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.tickers.is_empty() {
            return Err(SourceError::invalid_request(
                "at least one ticker must be specified",
            ));
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

/// Return series source, one table column per ticker.
pub struct YahooReturnSource {
    history: YahooHistorySource,
    pipeline: FetchPipeline,
}

impl YahooReturnSource {
    pub fn new(session: Arc<YahooSession>) -> Self {
        Self {
            history: YahooHistorySource::new(session),
            pipeline: FetchPipeline::default(),
        }
    }

    pub fn with_worker_budget(mut self, worker_budget: usize) -> Self {
        self.pipeline = FetchPipeline::new(worker_budget);
        self
    }

    pub async fn read(&self, request: &ReturnsRequest) -> Result<FetchOutcome, SourceError> {
        request.validate()?;
        // Period returns need closes from before the window; twice the
        // lookback in calendar days is enough to cover weekends and
        // holidays.
        let seed_days = request.granularity.period_days().unwrap_or(0) * 2;
        let history_start = request.start - Duration::days(seed_days as i64);
        debug!(
            tickers = request.tickers.len(),
            granularity = ?request.granularity,
            "computing return series"
        );

        let table = ResultTable::new(
            request
                .tickers
                .iter()
                .map(|ticker| ColumnSpec::new(ticker.clone(), DataType::Number)),
        );
        let outcome = self
            .pipeline
            .fetch_all(table, request.tickers.clone(), |ticker| {
                let history = self.history.clone();
                let (start, end) = (request.start, request.end);
                let granularity = request.granularity;
                async move {
                    let bars = history
                        .fetch_bars(&HistoryRequest::new(ticker.clone(), history_start, end))
                        .await?;
                    Ok(return_rows(&ticker, &bars, start, end, granularity))
                }
            })
            .await;
        let (mut table, failures) = outcome.into_parts();
        table.sort_rows_by_key();
        Ok(FetchOutcome::new(table, failures))
    }
}

/// The return series of one ticker over its trading dates in
/// `[start, end]`. The first date of the window is always 0.0; a period
/// return whose lookback reaches past the seeded history is NaN.
fn return_rows(
    ticker: &str,
    bars: &[QuoteBar],
    start: Date,
    end: Date,
    granularity: Granularity,
) -> Vec<TableRow> {
    let column = ticker.to_owned();
    let in_window: Vec<usize> = (0..bars.len())
        .filter(|&i| bars[i].date >= start && bars[i].date <= end)
        .collect();
    let mut rows = Vec::with_capacity(in_window.len());
    for (position, &ordinal) in in_window.iter().enumerate() {
        let bar = &bars[ordinal];
        let value = if position == 0 && granularity != Granularity::Cumulative {
            0.0
        } else {
            match granularity {
                Granularity::Daily => single_period(bars, ordinal, 1),
                Granularity::Weekly => single_period(bars, ordinal, 5),
                Granularity::Monthly => single_period(bars, ordinal, 20),
                Granularity::Cumulative => bar.close / bars[in_window[0]].close - 1.0,
            }
        };
        rows.push(TableRow::new(bar.date).with_named(column.clone(), value));
    }
    rows
}

fn single_period(bars: &[QuoteBar], ordinal: usize, days: usize) -> f64 {
    if ordinal < days {
        return f64::NAN;
    }
    bars[ordinal].close / bars[ordinal - days].close - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::YahooSession;
    use crate::testutil::ScriptedHttpClient;
    use quotefeed_core::{RetryConfig, RowKey, Value};
    use time::macros::date;

    fn quote_bars(closes: &[(Date, f64)]) -> Vec<QuoteBar> {
        closes
            .iter()
            .map(|&(date, close)| QuoteBar {
                date,
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
                split_ratio: 1.0,
                change: 0.0,
                change_percent: 0.0,
            })
            .collect()
    }

    fn series() -> Vec<QuoteBar> {
        quote_bars(&[
            (date!(2017 - 05 - 30), 95.0),
            (date!(2017 - 05 - 31), 98.0),
            (date!(2017 - 06 - 01), 100.0),
            (date!(2017 - 06 - 02), 102.0),
            (date!(2017 - 06 - 05), 101.0),
        ])
    }

    fn value_of(rows: &[TableRow], index: usize) -> f64 {
        match &rows[index].cells()[0].1 {
            Value::Number(number) => *number,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn daily_returns_start_at_zero_then_chain_closes() {
        let rows = return_rows(
            "AAPL",
            &series(),
            date!(2017 - 06 - 01),
            date!(2017 - 06 - 05),
            Granularity::Daily,
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].key(), &RowKey::Date(date!(2017 - 06 - 01)));
        assert_eq!(value_of(&rows, 0), 0.0);
        assert!((value_of(&rows, 1) - 0.02).abs() < 1e-12);
        assert!((value_of(&rows, 2) - (101.0 / 102.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn cumulative_returns_are_relative_to_the_first_window_close() {
        let rows = return_rows(
            "AAPL",
            &series(),
            date!(2017 - 06 - 01),
            date!(2017 - 06 - 05),
            Granularity::Cumulative,
        );
        assert_eq!(value_of(&rows, 0), 0.0);
        assert!((value_of(&rows, 2) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn period_returns_use_the_seeded_lookback_or_go_missing() {
        let bars = quote_bars(&[
            (date!(2017 - 05 - 24), 90.0),
            (date!(2017 - 05 - 25), 91.0),
            (date!(2017 - 05 - 26), 92.0),
            (date!(2017 - 05 - 30), 93.0),
            (date!(2017 - 05 - 31), 94.0),
            (date!(2017 - 06 - 01), 100.0),
            (date!(2017 - 06 - 02), 102.0),
        ]);
        let rows = return_rows(
            "AAPL",
            &bars,
            date!(2017 - 06 - 01),
            date!(2017 - 06 - 02),
            Granularity::Weekly,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(value_of(&rows, 0), 0.0);
        // 2017-06-02 is five trading days after 2017-05-25.
        assert!((value_of(&rows, 1) - (102.0 / 91.0 - 1.0)).abs() < 1e-12);

        let short = return_rows(
            "AAPL",
            &bars[4..],
            date!(2017 - 06 - 01),
            date!(2017 - 06 - 02),
            Granularity::Weekly,
        );
        assert!(value_of(&short, 1).is_nan());
    }

    #[tokio::test]
    async fn tickers_merge_into_one_date_sorted_table() {
        let csv_a = "Date,Open,High,Low,Close,Adj Close,Volume\n\
            2017-06-01,100.0,100.0,100.0,100.0,100.0,1000\n\
            2017-06-02,102.0,102.0,102.0,102.0,102.0,1000\n";
        let csv_b = "Date,Open,High,Low,Close,Adj Close,Volume\n\
            2017-06-02,50.0,50.0,50.0,50.0,50.0,1000\n\
            2017-06-05,51.0,51.0,51.0,51.0,51.0,1000\n";
        let base =
            "interval=1d&events=history&crumb=crumb-1";
        let client = ScriptedHttpClient::new()
            .on_url("https://fc.yahoo.com", 200, "")
            .on_url(
                "https://query1.finance.yahoo.com/v1/test/getcrumb",
                200,
                "crumb-1",
            )
            .on_url(
                &format!(
                    "https://query1.finance.yahoo.com/v7/finance/download/AAA?period1=1496275200&period2=1496620800&{base}"
                ),
                200,
                csv_a,
            )
            .on_url(
                &format!(
                    "https://query1.finance.yahoo.com/v7/finance/download/BBB?period1=1496275200&period2=1496620800&{base}"
                ),
                200,
                csv_b,
            );
        let session = YahooSession::new(Arc::new(client)).with_retry(RetryConfig::no_retry());
        let source = YahooReturnSource::new(Arc::new(session));
        let request = ReturnsRequest::new(
            ["AAA", "BBB"],
            date!(2017 - 06 - 01),
            date!(2017 - 06 - 05),
        );
        let outcome = source.read(&request).await.expect("read");
        assert!(outcome.is_complete());

        let table = outcome.table();
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.keys(),
            &[
                RowKey::Date(date!(2017 - 06 - 01)),
                RowKey::Date(date!(2017 - 06 - 02)),
                RowKey::Date(date!(2017 - 06 - 05)),
            ]
        );
        let aaa = table
            .value_by_key(&date!(2017 - 06 - 02).into(), "AAA")
            .and_then(Value::as_f64)
            .expect("cell");
        assert!((aaa - 0.02).abs() < 1e-12);
        // BBB never traded on 2017-06-01, so its cell stays missing.
        assert!(table
            .value_by_key(&date!(2017 - 06 - 01).into(), "BBB")
            .expect("cell")
            .is_missing());
        let bbb = table
            .value_by_key(&date!(2017 - 06 - 05).into(), "BBB")
            .and_then(Value::as_f64)
            .expect("cell");
        assert!((bbb - 0.02).abs() < 1e-12);
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let session = YahooSession::new(Arc::new(ScriptedHttpClient::new()));
        let source = YahooReturnSource::new(Arc::new(session));
        let request = ReturnsRequest::new(["AAA"], date!(2017 - 06 - 05), date!(2017 - 06 - 01));
        let error = source.read(&request).await.expect_err("must fail");
        assert_eq!(error.kind(), quotefeed_core::SourceErrorKind::InvalidRequest);
    }
}
