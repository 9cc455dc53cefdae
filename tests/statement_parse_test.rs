mod common;

use ibtax::{
    app::outfmt::json::JsonExport,
    statement::{
        io::{header::HeaderSource, stmt_csv::pub_testlib::StatementCsvBuilder},
        model::{Currency, SectionKind, StmtDate},
        parse_statement, parse_statement_text,
        validate::validate,
        Severity,
    },
    testlib::{assert_big_struct_eq, assert_re, assert_vec_eq},
    util::{date::parse_standard_date, rw::DescribedReader},
};
use rust_decimal_macros::dec;

use common::SAMPLE_STATEMENT;

type K = SectionKind;

const TRADE_COLS: &[&str] = &[
    "DataDiscriminator", "Asset Category", "Currency", "Symbol", "Date/Time", "Quantity",
    "T. Price", "Proceeds", "Comm/Fee",
];

#[test]
fn test_sample_statement() {
    let parsed = parse_statement(&DescribedReader::from_file_path(SAMPLE_STATEMENT.into()))
        .unwrap();
    let doc = &parsed.document;

    let info = doc.account_info();
    assert_eq!(info.account_id.as_deref(), Some("U1234567"));
    assert_eq!(info.name.as_deref(), Some("Jane Doe"));
    assert_eq!(info.account_type.as_deref(), Some("Individual"));
    assert_eq!(info.base_currency, Some(Currency::chf()));
    assert_eq!(info.period_start, Some(parse_standard_date("2025-01-01").unwrap()));
    assert_eq!(info.period_end, Some(parse_standard_date("2025-12-31").unwrap()));

    let nav = doc.net_asset_value();
    assert_eq!(nav.lines.len(), 3);
    assert_eq!(nav.beginning, Some(dec!(6000)));
    assert_eq!(nav.ending, Some(dec!(6700)));

    assert_eq!(doc.trades().len(), 2);
    assert_eq!(doc.dividends().len(), 2);
    assert_eq!(doc.withholding_taxes().len(), 2);
    assert_eq!(doc.fees().len(), 1);
    assert_eq!(doc.interest().len(), 1);
    // Lot rows repeat the summary row.
    assert_eq!(doc.open_positions().len(), 1);
    assert_eq!(doc.cash_balances().len(), 4);
    assert_eq!(doc.ending_balances().count(), 2);
    assert_eq!(doc.securities_lending().len(), 1);
    assert_eq!(doc.securities_lending()[0].amount, dec!(0.50));

    let wht_countries: Vec<Option<&str>> =
        doc.withholding_taxes().iter().map(|w| w.country.as_deref()).collect();
    assert_vec_eq(wht_countries, vec![Some("US"), Some("CH")]);

    for s in &parsed.report.sections {
        assert!(s.present, "{} not present", s.kind);
        assert_eq!(s.dropped, 0, "{} dropped rows", s.kind);
        assert_eq!(s.header_source, Some(HeaderSource::Header), "{}", s.kind);
    }
    assert_eq!(parsed.report.noise_rows, 0);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    assert!(validate(doc, &parsed.report).is_empty());
}

#[test]
fn test_trades_multi_currency() {
    let text = StatementCsvBuilder::new()
        .header(K::Trades, TRADE_COLS)
        .data(K::Trades, &[
            "Order", "Stocks", "USD", "AAPL", "2025-01-15, 10:30:00", "10", "150", "-1500", "-1.00",
        ])
        .data(K::Trades, &[
            "Order", "Stocks", "EUR", "SAP", "2025-06-02, 14:00:00", "-5", "90", "450", "-1.50",
        ])
        .total(K::Trades, &["", "Stocks", "", "", "", "", "", "", ""])
        .build();
    let parsed = parse_statement_text("trades.csv", &text);
    let trades = parsed.document.trades();
    assert_eq!(trades.len(), 2);

    let buy = &trades[0];
    assert_eq!(buy.currency, Currency::usd());
    assert_eq!(buy.symbol, "AAPL");
    assert_eq!(buy.date, parse_standard_date("2025-01-15").unwrap());
    assert_eq!(buy.quantity, dec!(10));
    assert_eq!(buy.price, Some(dec!(150)));
    assert_eq!(buy.proceeds, dec!(-1500));
    assert_eq!(*buy.commission, dec!(1.00));
    assert!(buy.is_buy());

    let sell = &trades[1];
    assert_eq!(sell.currency, Currency::new("EUR"));
    assert_eq!(sell.quantity, dec!(-5));
    assert_eq!(sell.proceeds, dec!(450));
    assert_eq!(*sell.commission, dec!(1.50));
    assert!(!sell.is_buy());
}

#[test]
fn test_headerless_dividends_read_by_position() {
    let text = StatementCsvBuilder::new()
        .data(K::Dividends, &["USD", "2025-03-15", "AAPL(US0378331005) Cash Dividend", "12.50"])
        .data(K::Dividends, &["CHF", "2025-04-20", "NESN(CH0038863350) Cash Dividend", "30"])
        .build();
    let parsed = parse_statement_text("divs.csv", &text);

    let divs = parsed.document.dividends();
    assert_eq!(divs.len(), 2);
    assert_eq!(divs[0].symbol, "AAPL");
    assert_eq!(divs[0].amount, dec!(12.50));
    assert_eq!(divs[1].currency, Currency::chf());

    let report = parsed.report.section(K::Dividends).unwrap();
    assert_eq!(report.header_source, Some(HeaderSource::Positional));
    let warnings: Vec<String> = parsed
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(|d| d.to_string())
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_re(r"^WARNING \[Dividends\]: No header row", &warnings[0]);
}

#[test]
fn test_malformed_rows_are_isolated() {
    let text = StatementCsvBuilder::new()
        .header(K::Dividends, &["Currency", "Date", "Description", "Amount"])
        .data(K::Dividends, &["USD", "2025-03-15", "AAPL Cash Dividend", "12.50"])
        .data(K::Dividends, &["USD", "not a date", "MSFT Cash Dividend", "8.00"])
        .data(K::Dividends, &["USD", "2025-03-17", "KO Cash Dividend", "lots"])
        .raw("Dividends,Data,USD")
        .data(K::Dividends, &["USD", "2025-03-18", "PEP Cash Dividend", "4.00"])
        .header(K::Interest, &["Currency", "Date", "Description", "Amount"])
        .data(K::Interest, &["CHF", "2025-12-31", "Credit Interest", "1.25"])
        .build();
    let parsed = parse_statement_text("bad.csv", &text);
    let doc = &parsed.document;

    let symbols: Vec<&str> = doc.dividends().iter().map(|d| d.symbol.as_str()).collect();
    assert_vec_eq(symbols, vec!["AAPL", "PEP"]);
    assert_eq!(doc.interest().len(), 1);

    let report = parsed.report.section(K::Dividends).unwrap();
    assert_eq!((report.extracted, report.dropped), (2, 3));
    assert_eq!(parsed.report.total_dropped(), 3);

    let info: Vec<String> = parsed
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Info)
        .map(|d| d.to_string())
        .collect();
    assert_eq!(info.len(), 1);
    assert_re(r"3 malformed row\(s\) dropped", &info[0]);
    assert_re(r"line 3: invalid date", &info[0]);
    assert!(!parsed.diagnostics.has_errors());
}

#[test]
fn test_out_of_range_value_is_isolated() {
    let text = StatementCsvBuilder::new()
        .header(K::OpenPositions, &[
            "DataDiscriminator", "Asset Category", "Currency", "Symbol", "Quantity", "Mult",
            "Close Price", "Value"])
        .data(K::OpenPositions, &[
            "Summary", "Stocks", "USD", "BIG", "79228162514264337593543950335", "1", "10", ""])
        .header(K::Trades, TRADE_COLS)
        .data(K::Trades, &[
            "Order", "Stocks", "USD", "AAPL", "2025-01-15", "10", "150", "-1500", "-1"])
        .build();
    let parsed = parse_statement_text("big.csv", &text);

    assert!(parsed.document.open_positions().is_empty());
    assert_eq!(parsed.document.trades().len(), 1);
    assert_eq!(parsed.report.section(K::OpenPositions).unwrap().dropped, 1);
    let msgs: Vec<String> = parsed.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_re(r"Open Positions\]: 1 malformed row\(s\) dropped \(line 2: invalid value", &msgs[0]);
}

#[test]
fn test_sign_conventions() {
    let parsed = parse_statement(&DescribedReader::from_file_path(SAMPLE_STATEMENT.into()))
        .unwrap();
    let doc = &parsed.document;
    for t in doc.trades() {
        assert!(*t.commission >= dec!(0));
        assert!(!t.quantity.is_zero());
    }
    for w in doc.withholding_taxes() {
        assert!(*w.amount >= dec!(0));
    }
    for f in doc.fees() {
        assert!(*f.amount >= dec!(0));
    }
    assert_eq!(*doc.fees()[0].amount, dec!(10));
    assert_eq!(
        doc.fees()[0].date,
        Some(StmtDate::Parsed(parse_standard_date("2025-02-03").unwrap()))
    );
}

#[test]
fn test_json_export_is_stable() {
    let reader = DescribedReader::from_file_path(SAMPLE_STATEMENT.into());
    let export_json = || {
        let parsed = parse_statement(&reader).unwrap();
        JsonExport::new(&parsed.report, &parsed.document, &parsed.diagnostics, None)
            .to_json_string()
            .unwrap()
    };
    let first = export_json();
    assert_eq!(first, export_json());
    assert_big_struct_eq(
        parse_statement(&reader).unwrap().document,
        parse_statement(&reader).unwrap().document,
    );

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["document"]["trades"][1]["commission"], "1.50");
    assert_eq!(value["document"]["dividends"][0]["date"], "2025-03-15");
    assert_eq!(value["tax_summary"], serde_json::Value::Null);
}

#[test]
fn test_amount_formats() {
    let amounts = [
        ("12.50", dec!(12.50)),
        ("-1,875.00", dec!(-1875.00)),
        ("1.234.567", dec!(1234567)),
        ("(25.00)", dec!(-25.00)),
    ];
    let mut builder = StatementCsvBuilder::new()
        .header(K::Interest, &["Currency", "Date", "Description", "Amount"]);
    for (cell, _) in &amounts {
        builder = builder.data(K::Interest, &["CHF", "2025-12-31", "Interest", cell]);
    }
    let parsed = parse_statement_text("amounts.csv", &builder.build());
    let got: Vec<_> = parsed.document.interest().iter().map(|i| i.amount).collect();
    assert_vec_eq(got, amounts.iter().map(|(_, d)| *d).collect());
}

#[test]
fn test_date_formats() {
    let dates = ["2025-03-15", "15.03.2025", "15/03/2025", "20250315", "2025-03-15, 09:30:00"];
    let mut builder = StatementCsvBuilder::new()
        .header(K::Dividends, &["Currency", "Date", "Description", "Amount"]);
    for d in &dates {
        builder = builder.data(K::Dividends, &["USD", d, "AAPL Cash Dividend", "1"]);
    }
    let parsed = parse_statement_text("dates.csv", &builder.build());
    let expected = parse_standard_date("2025-03-15").unwrap();
    let got: Vec<_> = parsed.document.dividends().iter().map(|d| d.date).collect();
    assert_vec_eq(got, vec![expected; dates.len()]);
}
