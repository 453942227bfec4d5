//! The registry of fields Yahoo Finance sources can produce.
//!
//! Every field is a static with a stable name and declared type; the
//! [`catalog`] indexes them all and rejects duplicate names when it is
//! first built. Sources consume the hand-ordered per-category lists
//! below, whose declaration order fixes the column order of their
//! result tables.

use std::sync::OnceLock;

use quotefeed_core::{DataType, Field, FieldCatalog};

pub static TICKER: Field = Field::new("TICKER", DataType::Text);
pub static NAME: Field = Field::new("NAME", DataType::Text);
pub static EXCHANGE: Field = Field::new("EXCHANGE", DataType::Text);

pub static PX_OPEN: Field = Field::new("PX_OPEN", DataType::Number);
pub static PX_HIGH: Field = Field::new("PX_HIGH", DataType::Number);
pub static PX_LOW: Field = Field::new("PX_LOW", DataType::Number);
pub static PX_CLOSE: Field = Field::new("PX_CLOSE", DataType::Number);
pub static PX_VOLUME: Field = Field::new("PX_VOLUME", DataType::Number);
pub static PX_SPLIT_RATIO: Field = Field::new("PX_SPLIT_RATIO", DataType::Number);
pub static PX_CHANGE: Field = Field::new("PX_CHANGE", DataType::Number);
pub static PX_CHANGE_PERCENT: Field = Field::new("PX_CHANGE_PERCENT", DataType::Number);

pub static PX_BID: Field = Field::new("PX_BID", DataType::Number);
pub static PX_BID_SIZE: Field = Field::new("PX_BID_SIZE", DataType::Number);
pub static PX_ASK: Field = Field::new("PX_ASK", DataType::Number);
pub static PX_ASK_SIZE: Field = Field::new("PX_ASK_SIZE", DataType::Number);
pub static PX_LAST: Field = Field::new("PX_LAST", DataType::Number);
pub static PX_LAST_SIZE: Field = Field::new("PX_LAST_SIZE", DataType::Number);
pub static PX_LAST_DATE: Field = Field::new("PX_LAST_DATE", DataType::Date);
pub static PX_LAST_TIME: Field = Field::new("PX_LAST_TIME", DataType::Time);
pub static PX_PREVIOUS_CLOSE: Field = Field::new("PX_PREVIOUS_CLOSE", DataType::Number);
pub static PX_STRIKE: Field = Field::new("PX_STRIKE", DataType::Number);

pub static OPTION_TYPE: Field = Field::new("OPTION_TYPE", DataType::Text);
pub static EXPIRY_DATE: Field = Field::new("EXPIRY_DATE", DataType::Date);
pub static OPEN_INTEREST: Field = Field::new("OPEN_INTEREST", DataType::Number);
pub static IMPLIED_VOLATILITY: Field = Field::new("IMPLIED_VOLATILITY", DataType::Number);

pub static TRADE_DATE: Field = Field::new("TRADE_DATE", DataType::Date);
pub static AVG_DAILY_VOLUME: Field = Field::new("AVG_DAILY_VOLUME", DataType::Number);
pub static DIVIDEND_PER_SHARE: Field = Field::new("DIVIDEND_PER_SHARE", DataType::Number);
pub static EPS: Field = Field::new("EPS", DataType::Number);
pub static EPS_ESTIMATE: Field = Field::new("EPS_ESTIMATE", DataType::Number);
pub static EPS_NEXT_YEAR: Field = Field::new("EPS_NEXT_YEAR", DataType::Number);
pub static EPS_NEXT_QUARTER: Field = Field::new("EPS_NEXT_QUARTER", DataType::Number);
pub static FLOAT_SHARES: Field = Field::new("FLOAT_SHARES", DataType::Number);
pub static FIFTY_TWO_WEEK_LOW: Field = Field::new("FIFTY_TWO_WEEK_LOW", DataType::Number);
pub static ANNUALISED_GAIN: Field = Field::new("ANNUALISED_GAIN", DataType::Number);
pub static MARKET_CAP: Field = Field::new("MARKET_CAP", DataType::Number);
pub static EBITDA: Field = Field::new("EBITDA", DataType::Number);
pub static PRICE_SALES_RATIO: Field = Field::new("PRICE_SALES_RATIO", DataType::Number);
pub static PRICE_BOOK_RATIO: Field = Field::new("PRICE_BOOK_RATIO", DataType::Number);
pub static EX_DIVIDEND_DATE: Field = Field::new("EX_DIVIDEND_DATE", DataType::Date);
pub static PRICE_EARNINGS_RATIO: Field = Field::new("PRICE_EARNINGS_RATIO", DataType::Number);
pub static DIVIDEND_PAY_DATE: Field = Field::new("DIVIDEND_PAY_DATE", DataType::Date);
pub static PEG_RATIO: Field = Field::new("PEG_RATIO", DataType::Number);
pub static PRICE_EPS_RATIO_CURRENT_YEAR: Field =
    Field::new("PRICE_EPS_RATIO_CURRENT_YEAR", DataType::Number);
pub static PRICE_EPS_RATIO_NEXT_YEAR: Field =
    Field::new("PRICE_EPS_RATIO_NEXT_YEAR", DataType::Number);
pub static SHORT_RATIO: Field = Field::new("SHORT_RATIO", DataType::Number);

pub static PE_TRAILING: Field = Field::new("PE_TRAILING", DataType::Number);
pub static PE_FORWARD: Field = Field::new("PE_FORWARD", DataType::Number);
pub static FISCAL_YEAR_END: Field = Field::new("FISCAL_YEAR_END", DataType::Date);
pub static MOST_RECENT_QUARTER: Field = Field::new("MOST_RECENT_QUARTER", DataType::Date);
pub static PROFIT_MARGIN: Field = Field::new("PROFIT_MARGIN", DataType::Number);
pub static OPERATING_MARGIN: Field = Field::new("OPERATING_MARGIN", DataType::Number);
pub static RETURN_ON_ASSETS: Field = Field::new("RETURN_ON_ASSETS", DataType::Number);
pub static RETURN_ON_EQUITY: Field = Field::new("RETURN_ON_EQUITY", DataType::Number);
pub static REVENUE_TTM: Field = Field::new("REVENUE_TTM", DataType::Number);
pub static REVENUE_PER_SHARE: Field = Field::new("REVENUE_PER_SHARE", DataType::Number);
pub static REVENUE_GROWTH_QTLY: Field = Field::new("REVENUE_GROWTH_QTLY", DataType::Number);
pub static GROSS_PROFIT: Field = Field::new("GROSS_PROFIT", DataType::Number);
pub static EBITDA_TTM: Field = Field::new("EBITDA_TTM", DataType::Number);
pub static EPS_DILUTED: Field = Field::new("EPS_DILUTED", DataType::Number);
pub static EARNINGS_GROWTH_QTLY: Field = Field::new("EARNINGS_GROWTH_QTLY", DataType::Number);
pub static BETA: Field = Field::new("BETA", DataType::Number);
pub static CASH_MRQ: Field = Field::new("CASH_MRQ", DataType::Number);
pub static CASH_PER_SHARE: Field = Field::new("CASH_PER_SHARE", DataType::Number);
pub static DEBT_MRQ: Field = Field::new("DEBT_MRQ", DataType::Number);
pub static DEBT_OVER_EQUITY_MRQ: Field = Field::new("DEBT_OVER_EQUITY_MRQ", DataType::Number);
pub static CURRENT_RATIO: Field = Field::new("CURRENT_RATIO", DataType::Number);
pub static BOOK_VALUE_PER_SHARE: Field = Field::new("BOOK_VALUE_PER_SHARE", DataType::Number);
pub static OPERATING_CASH_FLOW: Field = Field::new("OPERATING_CASH_FLOW", DataType::Number);
pub static LEVERED_FREE_CASH_FLOW: Field = Field::new("LEVERED_FREE_CASH_FLOW", DataType::Number);
pub static ADV_3MONTH: Field = Field::new("ADV_3MONTH", DataType::Number);
pub static ADV_10DAY: Field = Field::new("ADV_10DAY", DataType::Number);
pub static SHARES_OUTSTANDING: Field = Field::new("SHARES_OUTSTANDING", DataType::Number);
pub static SHARES_FLOAT: Field = Field::new("SHARES_FLOAT", DataType::Number);
pub static OWNER_PERCENT_INSIDER: Field = Field::new("OWNER_PERCENT_INSIDER", DataType::Number);
pub static OWNER_PERCENT_INSTITUTION: Field =
    Field::new("OWNER_PERCENT_INSTITUTION", DataType::Number);
pub static SHARES_SHORT: Field = Field::new("SHARES_SHORT", DataType::Number);
pub static SHARES_SHORT_RATIO: Field = Field::new("SHARES_SHORT_RATIO", DataType::Number);
pub static SHARES_SHORT_PRIOR: Field = Field::new("SHARES_SHORT_PRIOR", DataType::Number);
pub static DIVIDEND_FWD: Field = Field::new("DIVIDEND_FWD", DataType::Number);
pub static DIVIDEND_FWD_YIELD: Field = Field::new("DIVIDEND_FWD_YIELD", DataType::Number);
pub static DIVIDEND_TRAILING: Field = Field::new("DIVIDEND_TRAILING", DataType::Number);
pub static DIVIDEND_TRAILING_YIELD: Field =
    Field::new("DIVIDEND_TRAILING_YIELD", DataType::Number);
pub static DIVIDEND_PAYOUT_RATIO: Field = Field::new("DIVIDEND_PAYOUT_RATIO", DataType::Number);
pub static DIVIDEND_EX_DATE: Field = Field::new("DIVIDEND_EX_DATE", DataType::Date);
pub static LAST_SPLIT_DATE: Field = Field::new("LAST_SPLIT_DATE", DataType::Date);

static ALL_FIELDS: &[&Field] = &[
    &TICKER,
    &NAME,
    &EXCHANGE,
    &PX_OPEN,
    &PX_HIGH,
    &PX_LOW,
    &PX_CLOSE,
    &PX_VOLUME,
    &PX_SPLIT_RATIO,
    &PX_CHANGE,
    &PX_CHANGE_PERCENT,
    &PX_BID,
    &PX_BID_SIZE,
    &PX_ASK,
    &PX_ASK_SIZE,
    &PX_LAST,
    &PX_LAST_SIZE,
    &PX_LAST_DATE,
    &PX_LAST_TIME,
    &PX_PREVIOUS_CLOSE,
    &PX_STRIKE,
    &OPTION_TYPE,
    &EXPIRY_DATE,
    &OPEN_INTEREST,
    &IMPLIED_VOLATILITY,
    &TRADE_DATE,
    &AVG_DAILY_VOLUME,
    &DIVIDEND_PER_SHARE,
    &EPS,
    &EPS_ESTIMATE,
    &EPS_NEXT_YEAR,
    &EPS_NEXT_QUARTER,
    &FLOAT_SHARES,
    &FIFTY_TWO_WEEK_LOW,
    &ANNUALISED_GAIN,
    &MARKET_CAP,
    &EBITDA,
    &PRICE_SALES_RATIO,
    &PRICE_BOOK_RATIO,
    &EX_DIVIDEND_DATE,
    &PRICE_EARNINGS_RATIO,
    &DIVIDEND_PAY_DATE,
    &PEG_RATIO,
    &PRICE_EPS_RATIO_CURRENT_YEAR,
    &PRICE_EPS_RATIO_NEXT_YEAR,
    &SHORT_RATIO,
    &PE_TRAILING,
    &PE_FORWARD,
    &FISCAL_YEAR_END,
    &MOST_RECENT_QUARTER,
    &PROFIT_MARGIN,
    &OPERATING_MARGIN,
    &RETURN_ON_ASSETS,
    &RETURN_ON_EQUITY,
    &REVENUE_TTM,
    &REVENUE_PER_SHARE,
    &REVENUE_GROWTH_QTLY,
    &GROSS_PROFIT,
    &EBITDA_TTM,
    &EPS_DILUTED,
    &EARNINGS_GROWTH_QTLY,
    &BETA,
    &CASH_MRQ,
    &CASH_PER_SHARE,
    &DEBT_MRQ,
    &DEBT_OVER_EQUITY_MRQ,
    &CURRENT_RATIO,
    &BOOK_VALUE_PER_SHARE,
    &OPERATING_CASH_FLOW,
    &LEVERED_FREE_CASH_FLOW,
    &ADV_3MONTH,
    &ADV_10DAY,
    &SHARES_OUTSTANDING,
    &SHARES_FLOAT,
    &OWNER_PERCENT_INSIDER,
    &OWNER_PERCENT_INSTITUTION,
    &SHARES_SHORT,
    &SHARES_SHORT_RATIO,
    &SHARES_SHORT_PRIOR,
    &DIVIDEND_FWD,
    &DIVIDEND_FWD_YIELD,
    &DIVIDEND_TRAILING,
    &DIVIDEND_TRAILING_YIELD,
    &DIVIDEND_PAYOUT_RATIO,
    &DIVIDEND_EX_DATE,
    &LAST_SPLIT_DATE,
];

/// The catalog over every registered field, built once.
pub fn catalog() -> &'static FieldCatalog {
    static CATALOG: OnceLock<FieldCatalog> = OnceLock::new();
    CATALOG.get_or_init(|| FieldCatalog::build(ALL_FIELDS).expect("registry names are unique"))
}

/// Columns of a quote history table, in column order.
pub fn history_fields() -> &'static [&'static Field] {
    const FIELDS: &[&Field] = &[
        &PX_OPEN,
        &PX_HIGH,
        &PX_LOW,
        &PX_CLOSE,
        &PX_VOLUME,
        &PX_SPLIT_RATIO,
        &PX_CHANGE,
        &PX_CHANGE_PERCENT,
    ];
    FIELDS
}

/// Columns of an option chain table, in column order.
pub fn option_fields() -> &'static [&'static Field] {
    const FIELDS: &[&Field] = &[
        &TICKER,
        &OPTION_TYPE,
        &EXPIRY_DATE,
        &PX_STRIKE,
        &PX_LAST,
        &PX_CHANGE,
        &PX_CHANGE_PERCENT,
        &PX_BID,
        &PX_ASK,
        &PX_VOLUME,
        &OPEN_INTEREST,
        &IMPLIED_VOLATILITY,
    ];
    FIELDS
}

/// Columns of a key-statistics table, in column order.
pub fn stats_fields() -> &'static [&'static Field] {
    const FIELDS: &[&Field] = &[
        &MARKET_CAP,
        &PE_TRAILING,
        &PE_FORWARD,
        &PRICE_SALES_RATIO,
        &PRICE_BOOK_RATIO,
        &FISCAL_YEAR_END,
        &MOST_RECENT_QUARTER,
        &PROFIT_MARGIN,
        &OPERATING_MARGIN,
        &RETURN_ON_ASSETS,
        &RETURN_ON_EQUITY,
        &REVENUE_TTM,
        &REVENUE_PER_SHARE,
        &REVENUE_GROWTH_QTLY,
        &GROSS_PROFIT,
        &EBITDA_TTM,
        &EPS_DILUTED,
        &EARNINGS_GROWTH_QTLY,
        &BETA,
        &CASH_MRQ,
        &CASH_PER_SHARE,
        &DEBT_MRQ,
        &DEBT_OVER_EQUITY_MRQ,
        &CURRENT_RATIO,
        &BOOK_VALUE_PER_SHARE,
        &OPERATING_CASH_FLOW,
        &LEVERED_FREE_CASH_FLOW,
        &ADV_3MONTH,
        &ADV_10DAY,
        &SHARES_OUTSTANDING,
        &SHARES_FLOAT,
        &OWNER_PERCENT_INSIDER,
        &OWNER_PERCENT_INSTITUTION,
        &SHARES_SHORT,
        &SHARES_SHORT_RATIO,
        &SHARES_SHORT_PRIOR,
        &DIVIDEND_FWD,
        &DIVIDEND_FWD_YIELD,
        &DIVIDEND_TRAILING,
        &DIVIDEND_TRAILING_YIELD,
        &DIVIDEND_PAYOUT_RATIO,
        &DIVIDEND_PAY_DATE,
        &DIVIDEND_EX_DATE,
        &LAST_SPLIT_DATE,
    ];
    FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_builds_and_looks_up_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.len(), ALL_FIELDS.len());
        let field = catalog.lookup("PX_CLOSE").expect("registered");
        assert_eq!(field.data_type(), DataType::Number);
        assert!(catalog.lookup("NOT_A_FIELD").is_none());
    }

    #[test]
    fn category_lists_only_name_registered_fields() {
        let catalog = catalog();
        for field in history_fields()
            .iter()
            .chain(option_fields())
            .chain(stats_fields())
        {
            assert!(
                catalog.lookup(field.name()).is_some(),
                "unregistered field {}",
                field.name()
            );
        }
    }

    #[test]
    fn history_columns_are_in_declaration_order() {
        let names: Vec<&str> = history_fields().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "PX_OPEN",
                "PX_HIGH",
                "PX_LOW",
                "PX_CLOSE",
                "PX_VOLUME",
                "PX_SPLIT_RATIO",
                "PX_CHANGE",
                "PX_CHANGE_PERCENT",
            ]
        );
    }
}
