//! Maps scraped statistic labels onto registry fields.
//!
//! Yahoo renders key statistics as label/value table rows whose labels
//! drift over time ("Qtrly Revenue Growth" vs "Quarterly Revenue
//! Growth", footnote suffixes and so on). The mapper is an ordered rule
//! list over label prefixes and substrings; the first matching rule
//! wins, so specific labels must be listed before the generic prefix
//! that would also match them ("Revenue (ttm)" before "Revenue").
//! Labels no rule matches are dropped silently.

use std::sync::OnceLock;

use quotefeed_core::Field;

use crate::fields;

/// How a rule matches a label.
#[derive(Debug, Clone, Copy)]
pub enum LabelRule {
    Prefix(&'static str),
    Contains(&'static str),
}

impl LabelRule {
    fn matches(&self, label: &str) -> bool {
        match self {
            Self::Prefix(prefix) => label.starts_with(prefix),
            Self::Contains(needle) => label.contains(needle),
        }
    }
}

/// Ordered first-match-wins label to field mapping.
pub struct LabelMapper {
    rules: Vec<(LabelRule, &'static Field)>,
}

impl LabelMapper {
    pub fn new(rules: Vec<(LabelRule, &'static Field)>) -> Self {
        Self { rules }
    }

    pub fn map(&self, label: &str) -> Option<&'static Field> {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(label))
            .map(|&(_, field)| field)
    }
}

/// The mapper for the key-statistics page.
pub fn stats_mapper() -> &'static LabelMapper {
    static MAPPER: OnceLock<LabelMapper> = OnceLock::new();
    MAPPER.get_or_init(|| {
        use LabelRule::{Contains, Prefix};
        LabelMapper::new(vec![
            (Contains("Market Cap"), &fields::MARKET_CAP),
            (Prefix("Trailing P/E"), &fields::PE_TRAILING),
            (Prefix("Forward P/E"), &fields::PE_FORWARD),
            (Prefix("PEG Ratio"), &fields::PEG_RATIO),
            (Prefix("Price/Sales"), &fields::PRICE_SALES_RATIO),
            (Prefix("Price/Book"), &fields::PRICE_BOOK_RATIO),
            (Prefix("Fiscal Year Ends"), &fields::FISCAL_YEAR_END),
            (Contains("Most Recent Quarter"), &fields::MOST_RECENT_QUARTER),
            (Prefix("Profit Margin"), &fields::PROFIT_MARGIN),
            (Prefix("Operating Margin"), &fields::OPERATING_MARGIN),
            (Prefix("Return on Assets"), &fields::RETURN_ON_ASSETS),
            (Prefix("Return on Equity"), &fields::RETURN_ON_EQUITY),
            (Prefix("Revenue (ttm)"), &fields::REVENUE_TTM),
            (Prefix("Revenue Per Share"), &fields::REVENUE_PER_SHARE),
            (Prefix("Revenue"), &fields::REVENUE_TTM),
            (Prefix("Qtrly Revenue Growth"), &fields::REVENUE_GROWTH_QTLY),
            (
                Prefix("Quarterly Revenue Growth"),
                &fields::REVENUE_GROWTH_QTLY,
            ),
            (Prefix("Gross Profit"), &fields::GROSS_PROFIT),
            (Prefix("EBITDA (ttm)"), &fields::EBITDA_TTM),
            (Prefix("EBITDA"), &fields::EBITDA_TTM),
            (Prefix("Diluted EPS"), &fields::EPS_DILUTED),
            (
                Prefix("Qtrly Earnings Growth"),
                &fields::EARNINGS_GROWTH_QTLY,
            ),
            (
                Prefix("Quarterly Earnings Growth"),
                &fields::EARNINGS_GROWTH_QTLY,
            ),
            (Prefix("Total Cash (mrq)"), &fields::CASH_MRQ),
            (Prefix("Total Cash Per Share"), &fields::CASH_PER_SHARE),
            (Prefix("Total Cash"), &fields::CASH_MRQ),
            (Prefix("Total Debt (mrq)"), &fields::DEBT_MRQ),
            (
                Prefix("Total Debt/Equity (mrq)"),
                &fields::DEBT_OVER_EQUITY_MRQ,
            ),
            (Prefix("Total Debt/Equity"), &fields::DEBT_OVER_EQUITY_MRQ),
            (Prefix("Total Debt"), &fields::DEBT_MRQ),
            (Prefix("Beta"), &fields::BETA),
            (Prefix("Current Ratio (mrq)"), &fields::CURRENT_RATIO),
            (Prefix("Current Ratio"), &fields::CURRENT_RATIO),
            (Prefix("Book Value Per Share"), &fields::BOOK_VALUE_PER_SHARE),
            (Prefix("Operating Cash Flow"), &fields::OPERATING_CASH_FLOW),
            (
                Prefix("Levered Free Cash Flow"),
                &fields::LEVERED_FREE_CASH_FLOW,
            ),
            (Prefix("Avg Vol (3 month)"), &fields::ADV_3MONTH),
            (Prefix("Avg Vol (10 day)"), &fields::ADV_10DAY),
            (Prefix("Shares Outstanding"), &fields::SHARES_OUTSTANDING),
            (Prefix("Float"), &fields::SHARES_FLOAT),
            (Prefix("% Held by Insiders"), &fields::OWNER_PERCENT_INSIDER),
            (
                Prefix("% Held by Institutions"),
                &fields::OWNER_PERCENT_INSTITUTION,
            ),
            (Prefix("Short Ratio"), &fields::SHARES_SHORT_RATIO),
            (
                Prefix("Shares Short (prior month)"),
                &fields::SHARES_SHORT_PRIOR,
            ),
            (Prefix("Shares Short"), &fields::SHARES_SHORT),
            (
                Prefix("Forward Annual Dividend Rate"),
                &fields::DIVIDEND_FWD,
            ),
            (
                Prefix("Forward Annual Dividend Yield"),
                &fields::DIVIDEND_FWD_YIELD,
            ),
            (
                Prefix("Trailing Annual Dividend Rate"),
                &fields::DIVIDEND_TRAILING,
            ),
            (
                Prefix("Trailing Annual Dividend Yield"),
                &fields::DIVIDEND_TRAILING_YIELD,
            ),
            (Prefix("Payout Ratio"), &fields::DIVIDEND_PAYOUT_RATIO),
            (Prefix("Dividend Date"), &fields::DIVIDEND_PAY_DATE),
            (Prefix("Ex-Dividend Date"), &fields::DIVIDEND_EX_DATE),
            (Prefix("Last Split Date"), &fields::LAST_SPLIT_DATE),
        ])
    })
}
