//! # Quotefeed Yahoo
//!
//! Yahoo Finance source adapters for the Quotefeed market data toolkit.
//!
//! ## Overview
//!
//! Five sources over the public Yahoo Finance surfaces, all producing
//! [`quotefeed_core::ResultTable`] results:
//!
//! - **History**: split/dividend adjusted daily bars from the CSV
//!   download API, with change and split-ratio columns derived per bar
//! - **Live quotes**: delayed quotes for many tickers in one CSV round
//!   trip, with FX tickers rewritten to their `=X` wire form
//! - **Key statistics**: valuation and ownership figures scraped from
//!   the per-ticker statistics page
//! - **Option chains**: calls and puts per expiry, with expiry
//!   discovery from the contract selector
//! - **Returns**: daily, weekly, monthly or cumulative return series
//!   computed from adjusted closes, one column per ticker
//!
//! Multi-unit sources fan out through the core fetch pipeline, so one
//! ticker or expiry failing never loses the rest of the batch.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adjust`] | Split/dividend adjustment of raw bars |
//! | [`fields`] | The Yahoo field registry and per-source field sets |
//! | [`history`] | Daily bar history source |
//! | [`live`] | Delayed live quote source |
//! | [`mapper`] | Statistics label to field mapping |
//! | [`options`] | Option chain source |
//! | [`returns`] | Return series source |
//! | [`session`] | Cookie and crumb session management |
//! | [`stats`] | Key statistics source |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quotefeed_core::ReqwestHttpClient;
//! use quotefeed_yahoo::live::{LiveQuoteRequest, YahooLiveQuoteSource};
//! use quotefeed_yahoo::session::YahooSession;
//! use quotefeed_yahoo::fields;
//!
//! # async fn run() -> Result<(), quotefeed_core::SourceError> {
//! let session = Arc::new(YahooSession::new(Arc::new(ReqwestHttpClient::new())));
//! let source = YahooLiveQuoteSource::new(session);
//! let request = LiveQuoteRequest::new(["AAPL", "MSFT", "GBPUSD"])
//!     .with_fields([&fields::PX_LAST, &fields::PX_CHANGE_PERCENT]);
//! let outcome = source.read(&request).await?;
//! println!("{}", outcome.table().to_json_records());
//! # Ok(())
//! # }
//! ```
//!
//! Any use of the extracted data should adhere to the Yahoo Finance
//! terms and conditions.

pub mod adjust;
pub mod fields;
pub mod history;
pub mod live;
pub mod mapper;
pub mod options;
pub mod returns;
pub mod session;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;

pub use adjust::{QuoteBar, RawBar};
pub use history::{HistoryRequest, YahooHistorySource};
pub use live::{LiveQuoteRequest, YahooLiveQuoteSource};
pub use options::{OptionsRequest, YahooOptionSource};
pub use returns::{Granularity, ReturnsRequest, YahooReturnSource};
pub use session::YahooSession;
pub use stats::{StatsRequest, YahooStatsSource};
