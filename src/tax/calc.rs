use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::{
    fx::RateTable,
    statement::{
        model::{Currency, Trade},
        StatementDocument,
    },
    util::decimal::is_positive,
};

use super::config::TaxConfig;

/// Base-currency totals for one statement. Amounts are not rounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TaxSummary {
    pub canton: String,
    pub tax_year: i32,
    pub currency: String,

    pub swiss_dividends: Decimal,
    pub foreign_dividends: Decimal,
    pub interest: Decimal,
    pub securities_lending: Decimal,
    pub total_income: Decimal,

    pub commissions: Decimal,
    pub fees: Decimal,
    pub total_costs: Decimal,

    pub taxable_income: Decimal,
    pub income_tax: Decimal,

    pub securities_value: Decimal,
    pub cash_value: Decimal,
    pub total_wealth: Decimal,
    pub taxable_wealth: Decimal,
    pub wealth_tax: Decimal,

    pub withholding_by_country: BTreeMap<String, Decimal>,
    pub withholding_total: Decimal,
    pub foreign_tax_credit: Decimal,

    pub realized_gains: Decimal,
    pub realized_losses: Decimal,
    pub net_capital_gain: Decimal,
    pub forex_result: Decimal,

    pub gross_tax: Decimal,
    pub net_tax_liability: Decimal,

    pub notes: Vec<String>,
}

/// Converts into the base currency, remembering which currencies had no
/// rate. Unconvertible amounts are left out of the totals.
///
/// Sums go through `add`, which saturates instead of panicking on values
/// past the Decimal range, and flags the summary as overflowed.
struct Converter<'a> {
    rates: &'a RateTable,
    missing: BTreeSet<Currency>,
    overflowed: bool,
}

impl<'a> Converter<'a> {
    fn conv(&mut self, amount: Decimal, currency: &Currency) -> Decimal {
        if self.rates.rate(currency).is_none() {
            if self.missing.insert(currency.clone()) {
                debug!("No rate for {}", currency);
            }
            return Decimal::ZERO;
        }
        match self.rates.to_base(amount, currency) {
            Some(v) => v,
            None => {
                debug!("{} {} overflows in conversion", amount, currency);
                self.overflowed = true;
                Decimal::ZERO
            }
        }
    }

    fn add(&mut self, a: Decimal, b: Decimal) -> Decimal {
        a.checked_add(b).unwrap_or_else(|| {
            self.overflowed = true;
            a.saturating_add(b)
        })
    }

    fn sum<I: IntoIterator<Item = Decimal>>(&mut self, values: I) -> Decimal {
        values.into_iter().fold(Decimal::ZERO, |acc, v| self.add(acc, v))
    }
}

// Realized P/L when reported. Otherwise a sale's proceeds stand in for the
// gain, as there is no cost basis to subtract. Purchases realize nothing.
fn trade_result(t: &Trade) -> Decimal {
    match t.realized_pl {
        Some(pl) => pl,
        None if !t.is_buy() => t.proceeds,
        None => Decimal::ZERO,
    }
}

fn apply_threshold(amount: Decimal, threshold: Decimal) -> Decimal {
    if amount < threshold {
        Decimal::ZERO
    } else {
        amount
    }
}

pub fn calc_tax_summary(doc: &StatementDocument, config: &TaxConfig) -> TaxSummary {
    let rates = config.rate_table();
    let mut cv = Converter { rates: &rates, missing: BTreeSet::new(), overflowed: false };
    let rates_cfg = &config.tax_rates;
    let threshold = rates_cfg.minimum_taxable_threshold;

    let mut s = TaxSummary {
        canton: config.canton.clone(),
        tax_year: config.tax_year,
        currency: rates.base().to_string(),
        ..Default::default()
    };

    // Income
    for d in doc.dividends() {
        let v = cv.conv(d.amount, &d.currency);
        if config.is_domestic_symbol(&d.symbol) {
            s.swiss_dividends = cv.add(s.swiss_dividends, v);
        } else {
            s.foreign_dividends = cv.add(s.foreign_dividends, v);
        }
    }
    for i in doc.interest() {
        let v = cv.conv(i.amount, &i.currency);
        s.interest = cv.add(s.interest, v);
    }
    for l in doc.securities_lending() {
        let v = cv.conv(l.amount, &l.currency);
        s.securities_lending = cv.add(s.securities_lending, v);
    }
    s.total_income = cv.sum([
        s.swiss_dividends, s.foreign_dividends, s.interest, s.securities_lending]);

    // Costs
    for t in doc.trades() {
        let v = cv.conv(*t.commission, &t.currency);
        s.commissions = cv.add(s.commissions, v);
    }
    for f in doc.fees() {
        let v = cv.conv(*f.amount, &f.currency);
        s.fees = cv.add(s.fees, v);
    }
    s.total_costs = cv.add(s.commissions, s.fees);

    s.taxable_income = apply_threshold(
        cv.add(s.total_income, -s.total_costs).max(Decimal::ZERO), threshold);
    s.income_tax = s.taxable_income.saturating_mul(rates_cfg.income_tax_rate);

    // Wealth
    for p in doc.open_positions() {
        let v = cv.conv(p.value, &p.currency);
        s.securities_value = cv.add(s.securities_value, v);
    }
    for b in doc.ending_balances() {
        let v = cv.conv(b.total, &b.currency);
        s.cash_value = cv.add(s.cash_value, v);
    }
    s.total_wealth = cv.add(s.securities_value, s.cash_value);
    s.taxable_wealth = apply_threshold(s.total_wealth, threshold);
    s.wealth_tax = s.taxable_wealth.saturating_mul(rates_cfg.wealth_tax_rate);

    // Foreign tax credit
    for w in doc.withholding_taxes() {
        let country = w
            .country
            .clone()
            .unwrap_or_else(|| config.foreign_tax_credit.default_country.clone());
        let v = cv.conv(*w.amount, &w.currency);
        let entry = s.withholding_by_country.entry(country).or_insert(Decimal::ZERO);
        *entry = cv.add(*entry, v);
    }
    s.withholding_total = cv.sum(s.withholding_by_country.values().copied());
    let credits: Vec<Decimal> = s
        .withholding_by_country
        .iter()
        .map(|(country, v)| v.saturating_mul(config.credit_ratio(country)))
        .collect();
    s.foreign_tax_credit = cv.sum(credits);

    // Capital gains
    for t in doc.trades() {
        let v = cv.conv(trade_result(t), &t.currency);
        if t.is_forex() {
            s.forex_result = cv.add(s.forex_result, v);
        } else if is_positive(&v) {
            s.realized_gains = cv.add(s.realized_gains, v);
        } else {
            s.realized_losses = cv.add(s.realized_losses, v);
        }
    }
    s.net_capital_gain = cv.add(s.realized_gains, s.realized_losses);

    s.gross_tax = cv.add(s.income_tax, s.wealth_tax);
    s.net_tax_liability = cv.add(s.gross_tax, -s.foreign_tax_credit).max(Decimal::ZERO);

    for curr in &cv.missing {
        s.notes.push(format!(
            "No {} rate for {}; its amounts are excluded from the totals",
            rates.base(), curr
        ));
    }
    if cv.overflowed {
        s.notes.push("Some amounts exceed the representable range; totals are capped".to_string());
    }
    if s.total_income > Decimal::ZERO && s.taxable_income.is_zero() {
        s.notes.push(format!(
            "Taxable income is below the {} {} threshold", threshold, rates.base()));
    }
    s
}
