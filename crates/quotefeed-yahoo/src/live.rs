//! Delayed live quotes over the CSV download endpoint.
//!
//! The endpoint takes the tickers and a string of short field codes and
//! answers one CSV line per ticker. Only fields with a wire code can be
//! queried live; asking for anything else fails before a single request
//! goes out. FX rates are quoted under a `=X` suffix on the wire, so a
//! six-letter ticker made of two ISO currency codes is rewritten on the
//! way out and keyed by the caller's spelling on the way back.

use std::collections::HashMap;
use std::sync::Arc;

use quotefeed_core::{
    parser, ColumnSpec, FetchOutcome, Field, ResultTable, SourceError, TableRow, UnitFailure,
};
use tracing::{debug, warn};

use crate::fields;
use crate::session::YahooSession;

const LIVE_URL: &str = "http://download.finance.yahoo.com/d/quotes.csv";

/// Field to wire-code pairs, in the order the endpoint documents them.
static CODE_MAP: &[(&Field, &str)] = &[
    (&fields::TICKER, "s"),
    (&fields::NAME, "n"),
    (&fields::PX_BID, "b"),
    (&fields::PX_BID_SIZE, "b6"),
    (&fields::PX_ASK, "a"),
    (&fields::PX_ASK_SIZE, "a5"),
    (&fields::PX_VOLUME, "v"),
    (&fields::PX_CHANGE, "c1"),
    (&fields::PX_CHANGE_PERCENT, "p2"),
    (&fields::PX_LAST_DATE, "d1"),
    (&fields::PX_LAST_TIME, "t1"),
    (&fields::PX_LAST, "l1"),
    (&fields::PX_LAST_SIZE, "k3"),
    (&fields::PX_LOW, "g"),
    (&fields::PX_HIGH, "h"),
    (&fields::PX_PREVIOUS_CLOSE, "p"),
    (&fields::PX_OPEN, "o"),
    (&fields::EXCHANGE, "x"),
    (&fields::AVG_DAILY_VOLUME, "a2"),
    (&fields::TRADE_DATE, "d2"),
    (&fields::DIVIDEND_PER_SHARE, "d"),
    (&fields::EPS, "e"),
    (&fields::EPS_ESTIMATE, "e7"),
    (&fields::EPS_NEXT_YEAR, "e8"),
    (&fields::EPS_NEXT_QUARTER, "e9"),
    (&fields::FLOAT_SHARES, "f6"),
    (&fields::FIFTY_TWO_WEEK_LOW, "j"),
    (&fields::ANNUALISED_GAIN, "g3"),
    (&fields::MARKET_CAP, "j1"),
    (&fields::EBITDA, "j4"),
    (&fields::PRICE_SALES_RATIO, "p5"),
    (&fields::PRICE_BOOK_RATIO, "p6"),
    (&fields::EX_DIVIDEND_DATE, "q"),
    (&fields::PRICE_EARNINGS_RATIO, "r"),
    (&fields::DIVIDEND_PAY_DATE, "r1"),
    (&fields::PEG_RATIO, "r5"),
    (&fields::PRICE_EPS_RATIO_CURRENT_YEAR, "r6"),
    (&fields::PRICE_EPS_RATIO_NEXT_YEAR, "r7"),
    (&fields::SHORT_RATIO, "s7"),
];

/// ISO 4217 codes accepted in FX ticker detection.
static ISO_CURRENCIES: &[&str] = &[
    "AED", "ARS", "AUD", "BDT", "BGN", "BHD", "BRL", "CAD", "CHF", "CLP", "CNY", "COP", "CZK",
    "DKK", "EGP", "EUR", "GBP", "GHS", "HKD", "HUF", "IDR", "ILS", "INR", "ISK", "JPY", "KES",
    "KRW", "KWD", "KZT", "LKR", "MAD", "MXN", "MYR", "NGN", "NOK", "NZD", "OMR", "PEN", "PHP",
    "PKR", "PLN", "QAR", "RON", "RUB", "SAR", "SEK", "SGD", "THB", "TND", "TRY", "TWD", "UAH",
    "USD", "VND", "ZAR",
];

fn code_for(field: &Field) -> Option<&'static str> {
    CODE_MAP
        .iter()
        .find(|(candidate, _)| candidate.name() == field.name())
        .map(|&(_, code)| code)
}

/// True for six-letter tickers built from two ISO currency codes.
fn is_fx_ticker(ticker: &str) -> bool {
    if ticker.len() != 6 || !ticker.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let upper = ticker.to_ascii_uppercase();
    ISO_CURRENCIES.binary_search(&&upper[0..3]).is_ok()
        && ISO_CURRENCIES.binary_search(&&upper[3..6]).is_ok()
}

/// Which tickers and fields to quote. An empty field list means every
/// live-capable field.
#[derive(Debug, Clone)]
pub struct LiveQuoteRequest {
    tickers: Vec<String>,
    fields: Vec<&'static Field>,
}

impl LiveQuoteRequest {
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
        Self {
            tickers: seen,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = &'static Field>) -> Self {
        self.fields = fields.into_iter().collect();
        self
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

/// Live quote source keyed by ticker.
pub struct YahooLiveQuoteSource {
    session: Arc<YahooSession>,
}

impl YahooLiveQuoteSource {
    pub fn new(session: Arc<YahooSession>) -> Self {
        Self { session }
    }

    /// Every field that can be queried live, in wire order.
    pub fn supported_fields() -> Vec<&'static Field> {
        CODE_MAP.iter().map(|&(field, _)| field).collect()
    }

    /// Fetches the requested quotes in one round trip. Tickers whose
    /// CSV line cannot be parsed are reported as unit failures; the
    /// rest of the batch still lands.
    pub async fn read(&self, request: &LiveQuoteRequest) -> Result<FetchOutcome, SourceError> {
        request.validate()?;
        let field_list = resolve_fields(request)?;
        let (url, wire_to_ticker) = build_url(request, &field_list);
        debug!(url = %url, tickers = request.tickers.len(), "fetching live quotes");
        let response = self.session.get_page(&url).await?;

        let mut table = ResultTable::with_row_capacity(
            field_list.iter().map(|&f| ColumnSpec::from(f)),
            request.tickers.len(),
        );
        for ticker in &request.tickers {
            table
                .upsert(TableRow::new(ticker.as_str()))
                .map_err(SourceError::from)?;
        }

        let mut failures = Vec::new();
        for line in response.body.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let cells = split_csv_line(line);
            let Some(ticker) = cells.first().and_then(|wire| wire_to_ticker.get(wire.as_str()))
            else {
                warn!(line = %line, "quote line for unrequested ticker, skipping");
                continue;
            };
            match quote_row(ticker, &field_list, &cells[1..]) {
                Ok(row) => {
                    if let Err(error) = table.upsert(row) {
                        failures.push(UnitFailure::new(ticker.clone(), error.into()));
                    }
                }
                Err(error) => failures.push(UnitFailure::new(ticker.clone(), error)),
            }
        }
        Ok(FetchOutcome::new(table, failures))
    }
}

/// The fields this request queries, each checked for a wire code.
fn resolve_fields(request: &LiveQuoteRequest) -> Result<Vec<&'static Field>, SourceError> {
    if request.fields.is_empty() {
        return Ok(YahooLiveQuoteSource::supported_fields());
    }
    for field in &request.fields {
        if code_for(field).is_none() {
            return Err(SourceError::unsupported_field(field.name()));
        }
    }
    Ok(request.fields.clone())
}

fn build_url(
    request: &LiveQuoteRequest,
    field_list: &[&'static Field],
) -> (String, HashMap<String, String>) {
    let mut wire_to_ticker = HashMap::with_capacity(request.tickers.len());
    let mut wire_tickers = Vec::with_capacity(request.tickers.len());
    for ticker in &request.tickers {
        let wire = if is_fx_ticker(ticker) {
            format!("{}=X", ticker)
        } else {
            ticker.clone()
        };
        wire_tickers.push(urlencoding::encode(&wire).into_owned());
        wire_to_ticker.insert(wire, ticker.clone());
    }
    // The leading "s" makes the first CSV column the ticker itself.
    let codes: String = field_list
        .iter()
        .filter_map(|field| code_for(field))
        .collect();
    let url = format!("{}?s={}&f=s{}", LIVE_URL, wire_tickers.join("+"), codes);
    (url, wire_to_ticker)
}

fn quote_row(
    ticker: &str,
    field_list: &[&'static Field],
    cells: &[String],
) -> Result<TableRow, SourceError> {
    if cells.len() != field_list.len() {
        return Err(SourceError::internal(format!(
            "expected {} quote cells for {}, got {}",
            field_list.len(),
            ticker,
            cells.len()
        )));
    }
    let mut row = TableRow::new(ticker);
    for (field, cell) in field_list.iter().zip(cells) {
        let value = parser::parse(Some(cell))
            .map_err(|error| SourceError::parse(field.name(), error))?;
        row.set(field, value);
    }
    Ok(row)
}

/// Splits one CSV line, honouring double-quoted cells with embedded
/// commas and doubled quotes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}
