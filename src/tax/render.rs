use rust_decimal::Decimal;

use crate::statement::render::{fmt_amount, RenderTable};

use super::calc::TaxSummary;

pub fn render_tax_summary(s: &TaxSummary, render_full_values: bool) -> RenderTable {
    let amount_col = format!("Amount ({})", s.currency);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut push = |label: &str, v: &Decimal| {
        rows.push(vec![label.to_string(), fmt_amount(v, render_full_values)]);
    };

    push("Swiss dividends", &s.swiss_dividends);
    push("Foreign dividends", &s.foreign_dividends);
    push("Interest", &s.interest);
    push("Securities lending", &s.securities_lending);
    push("Total income", &s.total_income);
    push("Commissions", &s.commissions);
    push("Fees", &s.fees);
    push("Total costs", &s.total_costs);
    push("Taxable income", &s.taxable_income);
    push("Income tax", &s.income_tax);
    push("Securities value", &s.securities_value);
    push("Cash", &s.cash_value);
    push("Total wealth", &s.total_wealth);
    push("Wealth tax", &s.wealth_tax);
    for (country, v) in &s.withholding_by_country {
        push(&format!("Withholding tax ({})", country), v);
    }
    push("Foreign tax credit", &s.foreign_tax_credit);
    push("Realized gains", &s.realized_gains);
    push("Realized losses", &s.realized_losses);
    push("Forex result", &s.forex_result);
    push("Gross tax", &s.gross_tax);

    let mut notes = vec![format!("{} {}", s.canton, s.tax_year)];
    notes.extend(s.notes.iter().cloned());

    RenderTable {
        header: vec!["Item".to_string(), amount_col],
        rows,
        footer: vec![
            "Net tax liability".to_string(),
            fmt_amount(&s.net_tax_liability, render_full_values),
        ],
        notes,
        errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::tax::calc::TaxSummary;

    use super::render_tax_summary;

    #[test]
    fn test_render_tax_summary() {
        let mut s = TaxSummary {
            canton: "Basel-Landschaft".to_string(),
            tax_year: 2025,
            currency: "CHF".to_string(),
            income_tax: dec!(107.6123),
            net_tax_liability: dec!(7.6123),
            ..Default::default()
        };
        s.withholding_by_country.insert("US".to_string(), dec!(120));

        let t = render_tax_summary(&s, false);
        assert_eq!(t.header, vec!["Item", "Amount (CHF)"]);
        let row = t.rows.iter().find(|r| r[0] == "Income tax").unwrap();
        assert_eq!(row[1], "107.61");
        assert!(t.rows.iter().any(|r| r[0] == "Withholding tax (US)" && r[1] == "120.00"));
        assert_eq!(t.footer, vec!["Net tax liability", "7.61"]);
        assert_eq!(t.notes, vec!["Basel-Landschaft 2025"]);

        let t = render_tax_summary(&s, true);
        assert_eq!(t.footer[1], "7.6123");
    }
}
