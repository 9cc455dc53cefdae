use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::util::date::{parse_long_date, parse_statement_date, serialize_opt_date};

use super::currency::Currency;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub account_id: Option<String>,
    pub account_type: Option<String>,
    pub name: Option<String>,
    pub broker_name: Option<String>,
    pub base_currency: Option<Currency>,
    pub period: Option<String>,
    #[serde(serialize_with = "serialize_opt_date")]
    pub period_start: Option<Date>,
    #[serde(serialize_with = "serialize_opt_date")]
    pub period_end: Option<Date>,
}

impl AccountInfo {
    /// Applies one Field Name / Field Value pair. Returns false when the
    /// field is not one we track.
    pub fn apply_field(&mut self, field_name: &str, value: &str) -> bool {
        let value = value.trim();
        let opt_value = if value.is_empty() { None } else { Some(value.to_string()) };
        match field_name.trim().to_lowercase().as_str() {
            "account" | "account id" => self.account_id = opt_value,
            "account type" => self.account_type = opt_value,
            "name" | "account holder" => self.name = opt_value,
            "brokername" | "broker name" | "broker" => self.broker_name = opt_value,
            "base currency" => self.base_currency = opt_value.map(|c| Currency::new(&c)),
            "period" => {
                let (start, end) = parse_period(value);
                self.period = opt_value;
                self.period_start = start;
                self.period_end = end;
            }
            _ => return false,
        }
        true
    }

    /// Year of the end of the reporting period, if known.
    pub fn tax_year(&self) -> Option<i32> {
        self.period_end.map(|d| d.year())
    }
}

fn parse_period_date(s: &str) -> Option<Date> {
    parse_statement_date(s).or_else(|| parse_long_date(s))
}

/// Splits "January 1, 2025 - December 3, 2025" (or ISO/dotted
/// equivalents) into its two dates. A single date gives a one-day period.
pub fn parse_period(period: &str) -> (Option<Date>, Option<Date>) {
    let period = period.trim();
    if period.is_empty() {
        return (None, None);
    }
    match period.split_once(" - ") {
        Some((start, end)) => (parse_period_date(start), parse_period_date(end)),
        None => {
            let d = parse_period_date(period);
            (d, d)
        }
    }
}

/// One asset class line of the Net Asset Value section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavLine {
    pub line: usize,
    pub asset_class: String,
    pub prior_total: Option<Decimal>,
    pub current_long: Option<Decimal>,
    pub current_short: Option<Decimal>,
    pub current_total: Decimal,
    pub change: Option<Decimal>,
}

impl NavLine {
    pub fn is_total(&self) -> bool {
        self.asset_class.eq_ignore_ascii_case("total")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NetAssetValue {
    pub currency: Option<Currency>,
    pub lines: Vec<NavLine>,
    pub beginning: Option<Decimal>,
    pub ending: Option<Decimal>,
}

impl NetAssetValue {
    pub(crate) fn push_line(&mut self, line: NavLine) {
        if line.is_total() {
            self.beginning = line.prior_total;
            self.ending = Some(line.current_total);
        }
        self.lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::statement::model::currency::Currency;

    use super::{parse_period, AccountInfo, NavLine, NetAssetValue};

    #[test]
    fn test_parse_period() {
        assert_eq!(
            parse_period("January 1, 2025 - December 3, 2025"),
            (Some(date!(2025 - 01 - 01)), Some(date!(2025 - 12 - 03)))
        );
        assert_eq!(
            parse_period("2025-01-01 - 2025-12-31"),
            (Some(date!(2025 - 01 - 01)), Some(date!(2025 - 12 - 31)))
        );
        assert_eq!(
            parse_period("01.01.2025 - 31.12.2025"),
            (Some(date!(2025 - 01 - 01)), Some(date!(2025 - 12 - 31)))
        );
        assert_eq!(
            parse_period("December 3, 2025"),
            (Some(date!(2025 - 12 - 03)), Some(date!(2025 - 12 - 03)))
        );
        assert_eq!(parse_period("last year"), (None, None));
        assert_eq!(parse_period(""), (None, None));
    }

    #[test]
    fn test_apply_field() {
        let mut info = AccountInfo::default();
        assert!(info.apply_field("Account", "U1234567"));
        assert!(info.apply_field("Base Currency", "chf"));
        assert!(info.apply_field("Period", "January 1, 2025 - December 31, 2025"));
        assert!(info.apply_field("BrokerName", "Interactive Brokers"));
        assert!(!info.apply_field("WhenGenerated", "2026-01-02, 10:00:00 EST"));

        assert_eq!(info.account_id.as_deref(), Some("U1234567"));
        assert_eq!(info.base_currency, Some(Currency::chf()));
        assert_eq!(info.broker_name.as_deref(), Some("Interactive Brokers"));
        assert_eq!(info.tax_year(), Some(2025));

        assert!(info.apply_field("Account Type", ""));
        assert_eq!(info.account_type, None);
    }

    #[test]
    fn test_nav_total_line() {
        let mut nav = NetAssetValue::default();
        nav.push_line(NavLine {
            line: 10, asset_class: "Cash".to_string(),
            prior_total: Some(dec!(100)), current_long: Some(dec!(150)),
            current_short: None, current_total: dec!(150), change: Some(dec!(50)),
        });
        assert_eq!(nav.ending, None);
        nav.push_line(NavLine {
            line: 11, asset_class: "Total".to_string(),
            prior_total: Some(dec!(1000)), current_long: None,
            current_short: None, current_total: dec!(1200), change: Some(dec!(200)),
        });
        assert_eq!(nav.beginning, Some(dec!(1000)));
        assert_eq!(nav.ending, Some(dec!(1200)));
        assert_eq!(nav.lines.len(), 2);
    }
}
