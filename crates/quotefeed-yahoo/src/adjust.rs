//! Split/dividend adjustment and change calculation for quote history.
//!
//! Works on plain bar structs so the arithmetic is testable without any
//! table or transport in the way.

use time::Date;

/// Closes closer together than this are treated as unadjusted.
pub const SPLIT_EPSILON: f64 = 1e-5;

/// One raw row of the Yahoo history CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

/// One output bar with the derived columns filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteBar {
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub split_ratio: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Ratio between the adjusted and unadjusted close. A difference within
/// [`SPLIT_EPSILON`] means no adjustment applies and the ratio is
/// exactly 1.0 rather than a noisy near-1 quotient.
pub fn split_ratio(close: f64, adj_close: f64) -> f64 {
    if (adj_close - close).abs() > SPLIT_EPSILON {
        adj_close / close
    } else {
        1.0
    }
}

/// Orders bars by date, optionally applies the split ratio to the OHLC
/// prices (never the volume), and computes close-to-close changes.
///
/// The first row has no predecessor, so its change columns stay NaN.
/// Adjacent equal closes give a change of exactly 0.0. Applying this to
/// bars whose adjusted close already equals the close changes nothing.
pub fn adjust(mut bars: Vec<RawBar>, adjusted: bool) -> Vec<QuoteBar> {
    bars.sort_by_key(|bar| bar.date);
    let mut out = Vec::with_capacity(bars.len());
    for bar in &bars {
        let ratio = split_ratio(bar.close, bar.adj_close);
        let scale = if adjusted { ratio } else { 1.0 };
        out.push(QuoteBar {
            date: bar.date,
            open: bar.open * scale,
            high: bar.high * scale,
            low: bar.low * scale,
            close: bar.close * scale,
            volume: bar.volume,
            split_ratio: ratio,
            change: f64::NAN,
            change_percent: f64::NAN,
        });
    }
    for index in 1..out.len() {
        let previous = out[index - 1].close;
        let current = out[index].close;
        out[index].change = current - previous;
        out[index].change_percent = (current / previous) - 1.0;
    }
    out
}
