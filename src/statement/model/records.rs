use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::util::{
    date::{parse_statement_date, serialize_date},
    decimal::{is_positive, GreaterEqualZeroDecimal},
};

use super::currency::Currency;

/// A date from a column where the date is optional. Text that could not be
/// parsed is kept verbatim so it can be reported, rather than discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtDate {
    Parsed(Date),
    Raw(String),
}

impl StmtDate {
    /// None for an empty cell.
    pub fn from_cell(cell: &str) -> Option<StmtDate> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match parse_statement_date(trimmed) {
            Some(d) => StmtDate::Parsed(d),
            None => StmtDate::Raw(trimmed.to_string()),
        })
    }

    pub fn date(&self) -> Option<Date> {
        match self {
            StmtDate::Parsed(d) => Some(*d),
            StmtDate::Raw(_) => None,
        }
    }
}

impl Display for StmtDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StmtDate::Parsed(d) => write!(f, "{}", d),
            StmtDate::Raw(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for StmtDate {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

/// A buy or sell. Quantity is signed (negative for sells), and is never zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Trade {
    pub line: usize,
    pub asset_category: String,
    pub currency: Currency,
    pub symbol: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub proceeds: Decimal,
    pub commission: GreaterEqualZeroDecimal,
    pub basis: Option<Decimal>,
    pub realized_pl: Option<Decimal>,
    pub code: String,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        is_positive(&self.quantity)
    }

    pub fn is_forex(&self) -> bool {
        self.asset_category.eq_ignore_ascii_case("forex")
    }
}

/// Dividend payments keep their sign. Reversals appear as negative amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dividend {
    pub line: usize,
    pub currency: Currency,
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub symbol: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WithholdingTax {
    pub line: usize,
    pub currency: Currency,
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub symbol: String,
    pub description: String,
    pub amount: GreaterEqualZeroDecimal,
    pub country: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fee {
    pub line: usize,
    pub currency: Currency,
    pub date: Option<StmtDate>,
    pub description: String,
    pub amount: GreaterEqualZeroDecimal,
}

/// Interest keeps its sign. Debit interest is negative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Interest {
    pub line: usize,
    pub currency: Currency,
    pub date: Option<StmtDate>,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenPosition {
    pub line: usize,
    pub asset_category: String,
    pub currency: Currency,
    pub symbol: String,
    pub quantity: Decimal,
    pub multiplier: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub cost_basis: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub value: Decimal,
    pub unrealized_pl: Option<Decimal>,
}

/// One line item (Starting Cash, Ending Cash, Commissions, ...) of the
/// cash report, for one currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CashBalance {
    pub line: usize,
    pub line_item: String,
    pub currency: Currency,
    pub total: Decimal,
}

impl CashBalance {
    pub const ENDING_CASH: &'static str = "Ending Cash";

    pub fn is_ending_cash(&self) -> bool {
        self.line_item.eq_ignore_ascii_case(CashBalance::ENDING_CASH)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecuritiesLending {
    pub line: usize,
    pub currency: Currency,
    pub symbol: String,
    pub date: Option<StmtDate>,
    pub quantity: Option<Decimal>,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::StmtDate;

    #[test]
    fn test_stmt_date_from_cell() {
        assert_eq!(StmtDate::from_cell(""), None);
        assert_eq!(StmtDate::from_cell("  "), None);
        assert_eq!(
            StmtDate::from_cell("15.03.2025"),
            Some(StmtDate::Parsed(date!(2025 - 03 - 15)))
        );
        assert_eq!(
            StmtDate::from_cell("Q1 2025"),
            Some(StmtDate::Raw("Q1 2025".to_string()))
        );
    }

    #[test]
    fn test_stmt_date_serialize() {
        let d = StmtDate::Parsed(date!(2025 - 03 - 15));
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2025-03-15\"");
        let d = StmtDate::Raw("Q1 2025".to_string());
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"Q1 2025\"");
        assert_eq!(d.date(), None);
    }
}
