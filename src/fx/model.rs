use std::{collections::BTreeMap, fmt::Display};

use rust_decimal::Decimal;

use crate::statement::model::Currency;

/// Fixed conversion rates into a base currency, for one tax year.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RateTable {
    base: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

impl RateTable {
    pub fn new(base: Currency) -> RateTable {
        RateTable { base, rates: BTreeMap::new() }
    }

    pub fn from_rates<'a, I>(base: Currency, rates: I) -> RateTable
    where
        I: IntoIterator<Item = (&'a String, &'a Decimal)>,
    {
        let mut table = RateTable::new(base);
        for (curr, rate) in rates {
            table.set_rate(Currency::new(curr), *rate);
        }
        table
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn set_rate(&mut self, currency: Currency, to_base: Decimal) {
        self.rates.insert(currency, to_base);
    }

    /// Multiplier taking an amount in `currency` to the base currency.
    /// The base currency itself is always 1.
    pub fn rate(&self, currency: &Currency) -> Option<Decimal> {
        if *currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }

    /// None when no rate is known for `currency`, or the result is out of
    /// the Decimal range.
    pub fn to_base(&self, amount: Decimal, currency: &Currency) -> Option<Decimal> {
        self.rate(currency).and_then(|r| amount.checked_mul(r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &Decimal)> {
        self.rates.iter()
    }
}

// Auto-implements to_string()
impl Display for RateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1 {}", self.base)?;
        for (curr, rate) in &self.rates {
            if *curr != self.base {
                write!(f, ", {} : {}", curr, rate)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::statement::model::Currency;

    use super::RateTable;

    #[test]
    fn test_to_base() {
        let mut rates = HashMap::new();
        rates.insert("usd".to_string(), dec!(0.79959));
        rates.insert("EUR".to_string(), dec!(0.93324));
        let table = RateTable::from_rates(Currency::chf(), &rates);

        assert_eq!(table.to_base(dec!(100), &Currency::usd()), Some(dec!(79.95900)));
        assert_eq!(table.to_base(dec!(-10), &Currency::eur()), Some(dec!(-9.33240)));
        assert_eq!(table.to_base(dec!(42), &Currency::chf()), Some(dec!(42)));
        assert_eq!(table.to_base(dec!(1), &Currency::new("GBP")), None);
    }

    #[test]
    fn test_to_base_overflow() {
        let mut table = RateTable::new(Currency::chf());
        table.set_rate(Currency::new("XAU"), dec!(2500));
        assert_eq!(table.to_base(Decimal::MAX, &Currency::new("XAU")), None);
        assert_eq!(table.to_base(dec!(2), &Currency::new("XAU")), Some(dec!(5000)));
    }

    #[test]
    fn test_rate_string() {
        let mut table = RateTable::new(Currency::chf());
        table.set_rate(Currency::usd(), dec!(0.8));
        table.set_rate(Currency::eur(), dec!(0.9));
        assert_eq!(table.to_string(), "1 CHF, EUR : 0.9, USD : 0.8");
    }
}
