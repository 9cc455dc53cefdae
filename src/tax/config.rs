use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    fx::RateTable,
    statement::model::Currency,
    util::{basic::SError, os::home_dir_file_path, rw::DescribedReader},
};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    pub income_tax_rate: Decimal,
    pub wealth_tax_rate: Decimal,
    /// Income or wealth below this (in the base currency) is not taxed.
    pub minimum_taxable_threshold: Decimal,
}

impl Default for TaxRates {
    fn default() -> Self {
        TaxRates {
            income_tax_rate: dec!(0.1055),
            wealth_tax_rate: dec!(0.0008),
            minimum_taxable_threshold: dec!(50),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyRates {
    pub base: String,
    /// Currency code to multiplier into `base`.
    pub rates: BTreeMap<String, Decimal>,
}

impl Default for CurrencyRates {
    fn default() -> Self {
        let rates = [
            ("CHF", dec!(1.0)),
            ("EUR", dec!(0.93324)),
            ("USD", dec!(0.79959)),
            ("JPY", dec!(0.0051507)),
            ("NOK", dec!(0.07952)),
            ("PLN", dec!(0.22084)),
            ("SEK", dec!(0.085358)),
        ]
        .into_iter()
        .map(|(c, r)| (c.to_string(), r))
        .collect();
        CurrencyRates { base: "CHF".to_string(), rates }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignTaxCredit {
    /// Share of US withholding that may be credited.
    pub us_ratio: Decimal,
    /// Share of any other country's withholding that may be credited.
    pub other_ratio: Decimal,
    /// Assumed for withholding whose country cannot be determined.
    pub default_country: String,
}

impl Default for ForeignTaxCredit {
    fn default() -> Self {
        ForeignTaxCredit {
            us_ratio: dec!(1.0),
            other_ratio: dec!(0.8),
            default_country: "US".to_string(),
        }
    }
}

/// Cantonal tax parameters. Every field may be omitted from the JSON file,
/// falling back to the Basel-Landschaft defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    pub canton: String,
    pub tax_year: i32,
    /// Country whose dividends count as domestic.
    pub home_country: String,
    pub tax_rates: TaxRates,
    pub currency_rates: CurrencyRates,
    pub foreign_tax_credit: ForeignTaxCredit,
    /// Symbol to ISO country of the issuer. Symbols not listed are
    /// treated as foreign.
    pub symbol_countries: BTreeMap<String, String>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig {
            canton: "Basel-Landschaft".to_string(),
            tax_year: 2025,
            home_country: "CH".to_string(),
            tax_rates: TaxRates::default(),
            currency_rates: CurrencyRates::default(),
            foreign_tax_credit: ForeignTaxCredit::default(),
            symbol_countries: BTreeMap::new(),
        }
    }
}

impl TaxConfig {
    pub fn base_currency(&self) -> Currency {
        Currency::new(&self.currency_rates.base)
    }

    pub fn rate_table(&self) -> RateTable {
        RateTable::from_rates(self.base_currency(), &self.currency_rates.rates)
    }

    pub fn country_for_symbol(&self, symbol: &str) -> Option<&str> {
        self.symbol_countries
            .get(symbol)
            .or_else(|| self.symbol_countries.get(&symbol.to_uppercase()))
            .map(|c| c.as_str())
    }

    pub fn is_domestic_symbol(&self, symbol: &str) -> bool {
        self.country_for_symbol(symbol)
            .map(|c| c.eq_ignore_ascii_case(&self.home_country))
            .unwrap_or(false)
    }

    /// Creditable share of withholding paid to `country`.
    pub fn credit_ratio(&self, country: &str) -> Decimal {
        if country.eq_ignore_ascii_case("US") {
            self.foreign_tax_credit.us_ratio
        } else {
            self.foreign_tax_credit.other_ratio
        }
    }
}

pub fn parse_tax_config(desc_reader: &DescribedReader) -> Result<TaxConfig, SError> {
    let text = desc_reader.read_to_string()?;
    serde_json::from_str(&text)
        .map_err(|e| format!("Invalid tax configuration in {}: {}", desc_reader.desc(), e))
}

fn default_config_path() -> Option<PathBuf> {
    home_dir_file_path(Path::new(DEFAULT_CONFIG_FILE_NAME)).ok()
}

/// Loads the configuration from `path` when given (it must exist), else
/// from ~/.ibtax/config.json when that exists, else the defaults.
pub fn load_tax_config(path: Option<&Path>) -> Result<TaxConfig, SError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("No tax configuration file, using defaults");
                return Ok(TaxConfig::default());
            }
        },
    };
    info!("Loading tax configuration from {:?}", path);
    parse_tax_config(&DescribedReader::from_file_path(path))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{statement::model::Currency, testlib::assert_re, util::rw::DescribedReader};

    use super::{load_tax_config, parse_tax_config, TaxConfig};

    #[test]
    fn test_defaults() {
        let c = TaxConfig::default();
        assert_eq!(c.tax_rates.income_tax_rate, dec!(0.1055));
        assert_eq!(c.tax_rates.wealth_tax_rate, dec!(0.0008));
        assert_eq!(c.tax_rates.minimum_taxable_threshold, dec!(50));
        let rates = c.rate_table();
        assert_eq!(rates.rate(&Currency::new("SEK")), Some(dec!(0.085358)));
        assert_eq!(rates.rate(&Currency::chf()), Some(dec!(1)));
        assert_eq!(c.credit_ratio("US"), dec!(1));
        assert_eq!(c.credit_ratio("DE"), dec!(0.8));
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "canton": "Basel-Landschaft",
            "tax_year": 2024,
            "tax_rates": {"income_tax_rate": 0.1, "minimum_taxable_threshold": "100"},
            "currency_rates": {"rates": {"CHF": 1.0, "USD": "0.9"}},
            "symbol_countries": {"NESN": "CH", "AAPL": "US"}
        }"#;
        let r = DescribedReader::from_string("cfg.json".to_string(), json.to_string());
        let c = parse_tax_config(&r).unwrap();
        assert_eq!(c.tax_year, 2024);
        assert_eq!(c.tax_rates.income_tax_rate, dec!(0.1));
        // Omitted keys keep their defaults
        assert_eq!(c.tax_rates.wealth_tax_rate, dec!(0.0008));
        assert_eq!(c.tax_rates.minimum_taxable_threshold, dec!(100));
        assert_eq!(c.currency_rates.base, "CHF");
        assert_eq!(c.rate_table().rate(&Currency::eur()), None);
        assert_eq!(c.rate_table().rate(&Currency::usd()), Some(dec!(0.9)));
        assert!(c.is_domestic_symbol("NESN"));
        assert!(c.is_domestic_symbol("nesn"));
        assert!(!c.is_domestic_symbol("AAPL"));
        assert!(!c.is_domestic_symbol("UNKNOWN"));
    }

    #[test]
    fn test_bad_config() {
        let r = DescribedReader::from_string("cfg.json".to_string(), "{not json".to_string());
        assert_re("^Invalid tax configuration in cfg.json: ", &parse_tax_config(&r).unwrap_err());

        let err = load_tax_config(Some(std::path::Path::new("/nonexistent/ibtax.json")))
            .unwrap_err();
        assert_re("^Unable to open /nonexistent/ibtax.json", &err);
    }
}
