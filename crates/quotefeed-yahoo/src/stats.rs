//! Key statistics scraped from the per-ticker statistics page.
//!
//! Each ticker is one pipeline unit: fetch the page, walk every table
//! row with exactly two cells, map the label cell onto a registry field
//! and parse the value cell. Labels the mapper does not know are
//! skipped; a known label whose value will not parse fails the whole
//! ticker.

use std::sync::{Arc, LazyLock};

use quotefeed_core::{
    parser, ColumnSpec, FetchOutcome, FetchPipeline, ResultTable, SourceError, TableRow,
};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::fields;
use crate::mapper::stats_mapper;
use crate::session::YahooSession;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static selector"));
static SPAN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("static selector"));

fn stats_url(ticker: &str) -> String {
    let encoded = urlencoding::encode(ticker);
    format!(
        "https://finance.yahoo.com/quote/{}/key-statistics?p={}",
        encoded, encoded
    )
}

/// Which tickers to fetch statistics for.
#[derive(Debug, Clone)]
pub struct StatsRequest {
    tickers: Vec<String>,
}

impl StatsRequest {
    pub fn new<I, S>(tickers: I) -> Self
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
        Self { tickers: seen }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.tickers.is_empty() {
            return Err(SourceError::invalid_request(
                "at least one ticker must be specified",
            ));
        }
        Ok(())
    }
}

/// Statistics source keyed by ticker, one page fetch per ticker.
pub struct YahooStatsSource {
    session: Arc<YahooSession>,
    pipeline: FetchPipeline,
}

impl YahooStatsSource {
    pub fn new(session: Arc<YahooSession>) -> Self {
        Self {
            session,
            pipeline: FetchPipeline::default(),
        }
    }

    pub fn with_worker_budget(mut self, worker_budget: usize) -> Self {
        self.pipeline = FetchPipeline::new(worker_budget);
        self
    }

    pub async fn read(&self, request: &StatsRequest) -> Result<FetchOutcome, SourceError> {
        request.validate()?;
        let table = ResultTable::with_row_capacity(
            fields::stats_fields().iter().map(|&f| ColumnSpec::from(f)),
            request.tickers.len(),
        );
        let outcome = self
            .pipeline
            .fetch_all(table, request.tickers.clone(), |ticker| {
                let session = Arc::clone(&self.session);
                async move {
                    let url = stats_url(&ticker);
                    debug!(ticker = %ticker, url = %url, "fetching key statistics");
                    let response = session.get_page(&url).await?;
                    stats_row(&ticker, &response.body).map(|row| vec![row])
                }
            })
            .await;
        Ok(outcome)
    }
}

/// Extracts every mapped statistic from one page into a single row.
fn stats_row(ticker: &str, html: &str) -> Result<TableRow, SourceError> {
    let mut row = TableRow::new(ticker);
    for (label, text) in labelled_cells(html) {
        let Some(field) = stats_mapper().map(&label) else {
            continue;
        };
        let value = parser::parse(Some(&text))
            .map_err(|error| SourceError::parse(field.name(), error))?;
        row.set(field, value);
    }
    Ok(row)
}

/// Label/value text of every table row with exactly two cells.
fn labelled_cells(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let mut pairs = Vec::new();
    for table_row in document.select(&ROW_SELECTOR) {
        let cells: Vec<ElementRef> = table_row.select(&CELL_SELECTOR).collect();
        if let [label, value] = cells[..] {
            pairs.push((cell_text(label), cell_text(value)));
        }
    }
    pairs
}

/// A cell wrapping its value in a single span yields the span text,
/// anything else yields the cell's full text.
fn cell_text(cell: ElementRef) -> String {
    let spans: Vec<ElementRef> = cell.select(&SPAN_SELECTOR).collect();
    let text: String = match spans[..] {
        [span] => span.text().collect(),
        _ => cell.text().collect(),
    };
    text.trim().to_owned()
}
