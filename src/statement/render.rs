use rust_decimal::Decimal;

use crate::util::decimal::dollar_precision_str;

use super::{
    diagnostics::{Diagnostics, Severity},
    document::{ParsedStatement, StatementDocument},
    io::header::HeaderSource,
    model::{SectionKind, StmtDate},
};

pub struct RenderTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Vec<String>,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

impl RenderTable {
    fn with_header(header: &[&str]) -> RenderTable {
        RenderTable {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            footer: Vec::new(),
            notes: Vec::new(),
            errors: Vec::new(),
        }
    }
}

pub fn fmt_amount(d: &Decimal, render_full_values: bool) -> String {
    if render_full_values {
        d.normalize().to_string()
    } else {
        dollar_precision_str(d)
    }
}

fn fmt_opt_amount(d: &Option<Decimal>, render_full_values: bool) -> String {
    d.as_ref().map(|d| fmt_amount(d, render_full_values)).unwrap_or_default()
}

// Quantities and prices are never rounded.
fn fmt_plain(d: &Decimal) -> String {
    d.normalize().to_string()
}

fn fmt_opt_plain(d: &Option<Decimal>) -> String {
    d.as_ref().map(fmt_plain).unwrap_or_default()
}

fn fmt_opt_date(d: &Option<StmtDate>) -> String {
    d.as_ref().map(|d| d.to_string()).unwrap_or_default()
}

/// Per-section counts, plus the diagnostic totals. Rendered even when
/// nothing could be extracted.
pub fn render_parse_summary(parsed: &ParsedStatement) -> RenderTable {
    let mut table = RenderTable::with_header(
        &["Section", "Present", "Columns", "Records", "Dropped"]);

    for s in &parsed.report.sections {
        let columns = match s.header_source {
            Some(HeaderSource::Header) => "header",
            Some(HeaderSource::Positional) => "positional",
            None if s.present => "unreadable",
            None => "",
        };
        table.rows.push(vec![
            s.kind.to_string(),
            (if s.present { "yes" } else { "no" }).to_string(),
            columns.to_string(),
            s.extracted.to_string(),
            s.dropped.to_string(),
        ]);
    }
    table.footer = vec![
        "Total".to_string(),
        String::new(),
        String::new(),
        parsed.report.total_extracted().to_string(),
        parsed.report.total_dropped().to_string(),
    ];

    let info = parsed.document.account_info();
    if let Some(id) = &info.account_id {
        table.notes.push(format!("Account: {}", id));
    }
    if let Some(period) = &info.period {
        table.notes.push(format!("Period: {}", period));
    }
    if let Some(curr) = &info.base_currency {
        table.notes.push(format!("Base currency: {}", curr));
    }
    if parsed.report.noise_rows > 0 {
        table.notes.push(format!(
            "{} row(s) before the first known section were ignored",
            parsed.report.noise_rows
        ));
    }
    table.notes.push(render_severity_counts(&parsed.diagnostics));
    table
}

pub fn render_severity_counts(diags: &Diagnostics) -> String {
    format!(
        "Diagnostics: {} error(s), {} warning(s), {} info",
        diags.count(Severity::Error),
        diags.count(Severity::Warning),
        diags.count(Severity::Info)
    )
}

pub fn render_diagnostics(diags: &Diagnostics) -> RenderTable {
    let mut table = RenderTable::with_header(&["Severity", "Section", "Message", "Detail"]);
    for d in diags {
        table.rows.push(vec![
            d.severity.to_string(),
            d.section.map(|k| k.to_string()).unwrap_or_default(),
            d.message.clone(),
            d.detail.clone().unwrap_or_default(),
        ]);
    }
    table.notes.push(render_severity_counts(diags));
    table
}

pub fn render_account_info(doc: &StatementDocument) -> RenderTable {
    let mut table = RenderTable::with_header(&["Field", "Value"]);
    let info = doc.account_info();
    let fields = [
        ("Account", info.account_id.clone()),
        ("Account Type", info.account_type.clone()),
        ("Name", info.name.clone()),
        ("Broker", info.broker_name.clone()),
        ("Base Currency", info.base_currency.as_ref().map(|c| c.to_string())),
        ("Period", info.period.clone()),
    ];
    for (name, value) in fields {
        if let Some(v) = value {
            table.rows.push(vec![name.to_string(), v]);
        }
    }
    table
}

pub fn render_net_asset_value(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(&[
        "Asset Class", "Prior Total", "Current Long", "Current Short", "Current Total", "Change"]);
    let nav = doc.net_asset_value();
    for l in &nav.lines {
        table.rows.push(vec![
            l.asset_class.clone(),
            fmt_opt_amount(&l.prior_total, full),
            fmt_opt_amount(&l.current_long, full),
            fmt_opt_amount(&l.current_short, full),
            fmt_amount(&l.current_total, full),
            fmt_opt_amount(&l.change, full),
        ]);
    }
    if let Some(curr) = &nav.currency {
        table.notes.push(format!("Amounts in {}", curr));
    }
    table
}

pub fn render_cash_balances(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(&["Line Item", "Currency", "Total"]);
    for b in doc.cash_balances() {
        table.rows.push(vec![
            b.line_item.clone(),
            b.currency.to_string(),
            fmt_amount(&b.total, full),
        ]);
    }
    table
}

pub fn render_open_positions(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(&[
        "Symbol", "Category", "Currency", "Quantity", "Cost Basis", "Close Price",
        "Value", "Unrealized P/L"]);
    for p in doc.open_positions() {
        table.rows.push(vec![
            p.symbol.clone(),
            p.asset_category.clone(),
            p.currency.to_string(),
            fmt_plain(&p.quantity),
            fmt_opt_amount(&p.cost_basis, full),
            fmt_opt_plain(&p.close_price),
            fmt_amount(&p.value, full),
            fmt_opt_amount(&p.unrealized_pl, full),
        ]);
    }
    table
}

pub fn render_trades(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(&[
        "Date", "Symbol", "Category", "Currency", "Quantity", "Price", "Proceeds",
        "Commission", "Realized P/L", "Code"]);
    for t in doc.trades() {
        table.rows.push(vec![
            t.date.to_string(),
            t.symbol.clone(),
            t.asset_category.clone(),
            t.currency.to_string(),
            fmt_plain(&t.quantity),
            fmt_opt_plain(&t.price),
            fmt_amount(&t.proceeds, full),
            fmt_amount(&t.commission, full),
            fmt_opt_amount(&t.realized_pl, full),
            t.code.clone(),
        ]);
    }
    table
}

pub fn render_dividends(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(
        &["Date", "Symbol", "Currency", "Amount", "Description"]);
    for d in doc.dividends() {
        table.rows.push(vec![
            d.date.to_string(),
            d.symbol.clone(),
            d.currency.to_string(),
            fmt_amount(&d.amount, full),
            d.description.clone(),
        ]);
    }
    table
}

pub fn render_withholding_taxes(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(
        &["Date", "Symbol", "Currency", "Amount", "Country", "Description"]);
    for w in doc.withholding_taxes() {
        table.rows.push(vec![
            w.date.to_string(),
            w.symbol.clone(),
            w.currency.to_string(),
            fmt_amount(&w.amount, full),
            w.country.clone().unwrap_or_default(),
            w.description.clone(),
        ]);
    }
    table
}

pub fn render_interest(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(&["Date", "Currency", "Amount", "Description"]);
    for i in doc.interest() {
        table.rows.push(vec![
            fmt_opt_date(&i.date),
            i.currency.to_string(),
            fmt_amount(&i.amount, full),
            i.description.clone(),
        ]);
    }
    table
}

pub fn render_fees(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(&["Date", "Currency", "Amount", "Description"]);
    for f in doc.fees() {
        table.rows.push(vec![
            fmt_opt_date(&f.date),
            f.currency.to_string(),
            fmt_amount(&f.amount, full),
            f.description.clone(),
        ]);
    }
    table
}

pub fn render_securities_lending(doc: &StatementDocument, full: bool) -> RenderTable {
    let mut table = RenderTable::with_header(
        &["Date", "Symbol", "Currency", "Quantity", "Amount"]);
    for s in doc.securities_lending() {
        table.rows.push(vec![
            fmt_opt_date(&s.date),
            s.symbol.clone(),
            s.currency.to_string(),
            fmt_opt_plain(&s.quantity),
            fmt_amount(&s.amount, full),
        ]);
    }
    table
}

/// One table per section kind that has records, in section order.
pub fn render_section_tables(
    doc: &StatementDocument,
    render_full_values: bool,
) -> Vec<(SectionKind, RenderTable)> {
    let full = render_full_values;
    let mut tables = Vec::new();
    for kind in SectionKind::all() {
        let table = match kind {
            SectionKind::Statement => continue,
            SectionKind::AccountInformation => render_account_info(doc),
            SectionKind::NetAssetValue => render_net_asset_value(doc, full),
            SectionKind::CashReport => render_cash_balances(doc, full),
            SectionKind::OpenPositions => render_open_positions(doc, full),
            SectionKind::Trades => render_trades(doc, full),
            SectionKind::Dividends => render_dividends(doc, full),
            SectionKind::WithholdingTax => render_withholding_taxes(doc, full),
            SectionKind::Interest => render_interest(doc, full),
            SectionKind::Fees => render_fees(doc, full),
            SectionKind::SecuritiesLending => render_securities_lending(doc, full),
        };
        if !table.rows.is_empty() {
            tables.push((kind, table));
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::statement::{
        io::stmt_csv::parse_statement_text, model::SectionKind,
    };

    use super::{fmt_amount, render_diagnostics, render_parse_summary, render_section_tables};

    const TEXT: &str = "\
Account Information,Header,Field Name,Field Value
Account Information,Data,Account,U7654321
Trades,Header,Asset Category,Currency,Symbol,Date/Time,Quantity,T. Price,Proceeds,Comm/Fee
Trades,Data,Stocks,USD,AAPL,2025-01-15,10,150.125,-1501.25,-1.005
Fees,Header,Currency,Date,Description,Amount
Fees,Data,USD,2025-04-01,Market data,-10
";

    #[test]
    fn test_fmt_amount() {
        assert_eq!(fmt_amount(&dec!(1.005), false), "1.00");
        assert_eq!(fmt_amount(&dec!(1.005), true), "1.005");
        assert_eq!(fmt_amount(&dec!(10.50), true), "10.5");
        assert_eq!(fmt_amount(&dec!(-3), false), "-3.00");
    }

    #[test]
    fn test_summary_table() {
        let parsed = parse_statement_text("t.csv", TEXT);
        let table = render_parse_summary(&parsed);
        assert_eq!(table.rows.len(), SectionKind::all().len());
        let trades_row = table.rows.iter().find(|r| r[0] == "Trades").unwrap();
        assert_eq!(trades_row, &vec!["Trades", "yes", "header", "1", "0"]);
        let div_row = table.rows.iter().find(|r| r[0] == "Dividends").unwrap();
        assert_eq!(div_row[1], "no");
        let acct_row = table.rows.iter().find(|r| r[0] == "Account Information").unwrap();
        assert_eq!(acct_row, &vec!["Account Information", "yes", "header", "0", "0"]);
        assert_eq!(table.footer[3], "2");
        let total: usize = SectionKind::all()
            .into_iter()
            .map(|k| parsed.document.record_count(k))
            .sum();
        assert_eq!(table.footer[3], total.to_string());
        assert_eq!(table.notes[0], "Account: U7654321");
        assert_eq!(table.notes.last().unwrap(), "Diagnostics: 0 error(s), 0 warning(s), 0 info");

        let diag_table = render_diagnostics(&parsed.diagnostics);
        assert!(diag_table.rows.is_empty());
    }

    #[test]
    fn test_section_tables() {
        let parsed = parse_statement_text("t.csv", TEXT);
        let tables = render_section_tables(&parsed.document, false);
        let kinds: Vec<SectionKind> = tables.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![
            SectionKind::AccountInformation, SectionKind::Trades, SectionKind::Fees]);

        let trades = &tables[1].1;
        assert_eq!(trades.rows[0], vec![
            "2025-01-15", "AAPL", "Stocks", "USD", "10", "150.125", "-1501.25", "1.00", "", ""]);
        let fees = &tables[2].1;
        assert_eq!(fees.rows[0][2], "10.00");

        let tables = render_section_tables(&parsed.document, true);
        assert_eq!(tables[1].1.rows[0][7], "1.005");
    }
}
