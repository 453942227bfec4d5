//! Option chains scraped from the per-expiry options page.
//!
//! Without an explicit expiry the source first discovers every listed
//! expiry from the contract selector, then fetches one page per expiry
//! through the pipeline. Each page carries a calls table and a puts
//! table; rows are keyed by contract symbol and the final table is
//! sorted by option type, expiry and strike.

use std::sync::{Arc, LazyLock};

use quotefeed_core::{
    parser, ColumnSpec, FetchOutcome, FetchPipeline, ResultTable, SourceError, TableRow, Value,
};
use scraper::{ElementRef, Html, Selector};
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::fields;
use crate::session::YahooSession;

static CALLS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.calls").expect("static selector"));
static PUTS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.puts").expect("static selector"));
static CHAIN_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("static selector"));
static EXPIRY_OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.option-contract-control select option").expect("static selector")
});
// data-col0 is the contract symbol, data-col2 through data-col10 the
// numeric columns. data-col1 (last trade date) is not captured.
static COLUMN_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    (0..=10)
        .map(|i| Selector::parse(&format!("td.data-col{i}")).expect("static selector"))
        .collect()
});

fn options_url(underlying: &str, expiry_epoch: Option<i64>) -> String {
    let encoded = urlencoding::encode(underlying);
    match expiry_epoch {
        Some(epoch) => format!(
            "https://finance.yahoo.com/quote/{}/options?p={}&date={}",
            encoded, encoded, epoch
        ),
        None => format!(
            "https://finance.yahoo.com/quote/{}/options?p={}",
            encoded, encoded
        ),
    }
}

fn expiry_epoch(expiry: Date) -> i64 {
    expiry.midnight().assume_utc().unix_timestamp()
}

/// Which underlying to load a chain for. Without an expiry, every
/// listed expiry is fetched.
#[derive(Debug, Clone)]
pub struct OptionsRequest {
    underlying: String,
    expiry: Option<Date>,
}

impl OptionsRequest {
    pub fn new(underlying: impl Into<String>) -> Self {
        Self {
            underlying: underlying.into(),
            expiry: None,
        }
    }

    pub fn with_expiry(mut self, expiry: Date) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.underlying.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "an underlying ticker must be specified",
            ));
        }
        Ok(())
    }
}

/// Option chain source keyed by contract symbol, one page per expiry.
pub struct YahooOptionSource {
    session: Arc<YahooSession>,
    pipeline: FetchPipeline,
}

impl YahooOptionSource {
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

    /// Every expiry the options page lists for the underlying.
    pub async fn expiry_dates(&self, underlying: &str) -> Result<Vec<Date>, SourceError> {
        let url = options_url(underlying, None);
        let response = self.session.get_page(&url).await?;
        let dates = expiry_dates_from_page(&response.body);
        if dates.is_empty() {
            return Err(SourceError::internal(format!(
                "no option expiry dates found for {underlying}"
            )));
        }
        Ok(dates)
    }

    pub async fn read(&self, request: &OptionsRequest) -> Result<FetchOutcome, SourceError> {
        request.validate()?;
        let expiries = match request.expiry {
            Some(expiry) => vec![expiry],
            None => self.expiry_dates(&request.underlying).await?,
        };
        debug!(
            underlying = %request.underlying,
            expiries = expiries.len(),
            "fetching option chains"
        );
        let table =
            ResultTable::new(fields::option_fields().iter().map(|&f| ColumnSpec::from(f)));
        let outcome = self
            .pipeline
            .fetch_all(table, expiries, |expiry| {
                let session = Arc::clone(&self.session);
                let underlying = request.underlying.clone();
                async move {
                    let url = options_url(&underlying, Some(expiry_epoch(expiry)));
                    let response = session.get_page(&url).await?;
                    chain_rows(&underlying, expiry, &response.body)
                }
            })
            .await;
        let (mut table, failures) = outcome.into_parts();
        table.sort_rows_by_columns(&["OPTION_TYPE", "EXPIRY_DATE", "PX_STRIKE"])?;
        Ok(FetchOutcome::new(table, failures))
    }
}

fn expiry_dates_from_page(html: &str) -> Vec<Date> {
    let document = Html::parse_document(html);
    let mut dates: Vec<Date> = document
        .select(&EXPIRY_OPTION_SELECTOR)
        .filter_map(|option| option.value().attr("value"))
        .filter_map(|value| value.trim().parse::<i64>().ok())
        .filter_map(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .map(|moment| moment.date())
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

/// Chain rows of one page, calls then puts.
fn chain_rows(underlying: &str, expiry: Date, html: &str) -> Result<Vec<TableRow>, SourceError> {
    let document = Html::parse_document(html);
    let calls = document
        .select(&CALLS_SELECTOR)
        .next()
        .ok_or_else(|| SourceError::internal(format!("no calls table for {expiry}")))?;
    let puts = document
        .select(&PUTS_SELECTOR)
        .next()
        .ok_or_else(|| SourceError::internal(format!("no puts table for {expiry}")))?;
    let mut rows = Vec::new();
    collect_chain(underlying, expiry, calls, "CALL", &mut rows)?;
    collect_chain(underlying, expiry, puts, "PUT", &mut rows)?;
    Ok(rows)
}

fn collect_chain(
    underlying: &str,
    expiry: Date,
    table: ElementRef,
    option_type: &str,
    rows: &mut Vec<TableRow>,
) -> Result<(), SourceError> {
    for chain_row in table.select(&CHAIN_ROW_SELECTOR) {
        let symbol = column_text(chain_row, 0)
            .ok_or_else(|| SourceError::internal("option row without contract symbol"))?;
        let mut row = TableRow::new(symbol);
        row.set(&fields::TICKER, underlying);
        row.set(&fields::OPTION_TYPE, option_type);
        row.set(&fields::EXPIRY_DATE, Value::Date(expiry));
        for (field, column) in [
            (&fields::PX_STRIKE, 2),
            (&fields::PX_LAST, 3),
            (&fields::PX_BID, 4),
            (&fields::PX_ASK, 5),
            (&fields::PX_CHANGE, 6),
            (&fields::PX_CHANGE_PERCENT, 7),
            (&fields::PX_VOLUME, 8),
            (&fields::OPEN_INTEREST, 9),
            (&fields::IMPLIED_VOLATILITY, 10),
        ] {
            let text = column_text(chain_row, column);
            let number = parser::parse_double(text.as_deref())
                .map_err(|error| SourceError::parse(field.name(), error))?;
            row.set(field, number);
        }
        rows.push(row);
    }
    Ok(())
}

fn column_text(chain_row: ElementRef, column: usize) -> Option<String> {
    let cell = chain_row.select(&COLUMN_SELECTORS[column]).next()?;
    let text: String = cell.text().collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}
