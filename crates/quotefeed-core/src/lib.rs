//! # Quotefeed Core
//!
//! Core building blocks for the Quotefeed market data toolkit.
//!
//! ## Overview
//!
//! This crate provides the provider-independent pieces that source
//! adapters build on:
//!
//! - **Heuristic text parsing** for the loosely formatted numbers,
//!   dates and times that finance pages render as plain text
//! - **Typed fields and catalogs** naming the values a source produces
//! - **Columnar result tables** with keyed rows and sparse upserts
//! - **A bounded fetch pipeline** that fans out over work units with
//!   per-unit failure isolation
//! - **HTTP transport abstraction** with retry and backoff
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Parse, table and source error types |
//! | [`field`] | Typed fields and the field catalog |
//! | [`http_client`] | HTTP client abstraction |
//! | [`parser`] | Heuristic finance text parser |
//! | [`pipeline`] | Bounded concurrent fetch pipeline |
//! | [`retry`] | Retry configuration and backoff |
//! | [`table`] | Columnar result table |
//! | [`value`] | Typed cell values |
//!
//! ## Quick Start
//!
//! ```rust
//! use quotefeed_core::{parser, Value};
//!
//! let market_cap = parser::parse(Some("1.2B")).unwrap();
//! assert_eq!(market_cap, Value::Number(1_200_000_000.0));
//!
//! let yield_pct = parser::parse(Some("12.5%")).unwrap();
//! assert_eq!(yield_pct, Value::Number(0.125));
//! ```
//!
//! ## Error Handling
//!
//! Source-facing operations return [`SourceError`] with a structured
//! kind, so callers can distinguish a rate limit from a malformed page:
//!
//! ```rust
//! use quotefeed_core::{SourceError, SourceErrorKind};
//!
//! fn handle_error(error: SourceError) {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => {
//!             // Wait and retry
//!         }
//!         SourceErrorKind::Unavailable => {
//!             // Try again later
//!         }
//!         SourceErrorKind::InvalidRequest => {
//!             // Report to user
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod error;
pub mod field;
pub mod http_client;
pub mod parser;
pub mod pipeline;
pub mod retry;
pub mod table;
pub mod value;

// Re-export commonly used types at crate root for convenience

pub use error::{CatalogError, ParseError, SourceError, SourceErrorKind, TableError};

pub use field::{Field, FieldCatalog};

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

pub use pipeline::{FetchOutcome, FetchPipeline, UnitFailure, DEFAULT_WORKER_BUDGET};

pub use retry::{send_with_retry, Backoff, RetryConfig};

pub use table::{ColumnSpec, ResultTable, RowKey, TableRow};

pub use value::{DataType, Value};
