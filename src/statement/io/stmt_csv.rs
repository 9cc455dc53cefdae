use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    statement::{
        diagnostics::{Diagnostic, Diagnostics},
        document::{ParseReport, ParsedStatement, SectionReport, StatementDocument},
        model::SectionKind,
    },
    util::{basic::SError, rw::DescribedReader},
};

use super::{
    extract::{
        extract_cash_balances, extract_dividends, extract_fees, extract_interest,
        extract_key_values, extract_nav_lines, extract_open_positions,
        extract_securities_lending, extract_trades, extract_withholding_taxes, Extracted,
    },
    header::{resolve_header, HeaderSource, ResolvedHeader},
    raw::read_raw_rows,
    sections::{locate, Sections, Segment},
};

// Dropped rows listed individually in a diagnostic's detail, at most.
const MAX_LISTED_DROPS: usize = 5;

struct SectionRun<'a> {
    sections: &'a Sections,
    report: ParseReport,
    diagnostics: Diagnostics,
}

impl<'a> SectionRun<'a> {
    /// Resolves and extracts one section kind, recording the outcome.
    /// Returns no records when the section is absent or unreadable.
    fn run<T>(
        &mut self,
        kind: SectionKind,
        extractor: fn(&Segment, &ResolvedHeader) -> Extracted<T>,
    ) -> Vec<T> {
        let segment = match self.sections.get(kind) {
            Some(s) => s,
            None => {
                debug!("{}: not present", kind);
                self.report.sections.push(SectionReport::absent(kind));
                return Vec::new();
            }
        };

        let resolved = match resolve_header(segment) {
            Some(r) => r,
            None => {
                warn!("{}: no header row and no positional layout, skipping", kind);
                self.diagnostics.push(Diagnostic::warning(
                    Some(kind),
                    "Header row not found and no positional layout exists; \
                     section skipped"
                        .to_string(),
                ));
                self.report.sections.push(SectionReport {
                    present: true,
                    ..SectionReport::absent(kind)
                });
                return Vec::new();
            }
        };

        let source = resolved.map.source();
        if source == HeaderSource::Positional {
            self.diagnostics.push(Diagnostic::warning(
                Some(kind),
                "No header row; columns read by position (degraded confidence)".to_string(),
            ));
        }

        let extracted = extractor(segment, &resolved);
        info!("{}: {} records, {} dropped", kind, extracted.records.len(), extracted.dropped());

        if extracted.dropped() > 0 {
            let mut detail = extracted
                .drops
                .iter()
                .take(MAX_LISTED_DROPS)
                .map(|(line, skip)| format!("line {}: {}", line, skip))
                .join("; ");
            if extracted.dropped() > MAX_LISTED_DROPS {
                detail += &format!("; and {} more", extracted.dropped() - MAX_LISTED_DROPS);
            }
            self.diagnostics.push(
                Diagnostic::info(
                    Some(kind),
                    format!("{} malformed row(s) dropped", extracted.dropped()),
                )
                .with_detail(detail),
            );
        }

        for table in &extracted.unreadable_sub_tables {
            let message = format!(
                "Sub-table header on line {} lacks {}; {} row(s) not read",
                table.header_line,
                table.missing.iter().join(", "),
                table.rows
            );
            // Net Asset Value carries a rate of return table that is not read.
            let diag = if kind == SectionKind::NetAssetValue {
                Diagnostic::info(Some(kind), message)
            } else {
                warn!("{}: {}", kind, message);
                Diagnostic::warning(Some(kind), message)
            };
            self.diagnostics.push(diag);
        }

        self.report.sections.push(SectionReport {
            kind,
            present: true,
            header_source: Some(source),
            extracted: if kind.is_key_value() { 0 } else { extracted.records.len() },
            dropped: extracted.dropped(),
        });
        extracted.records
    }
}

/// Parses statement text. Never fails: problems with rows and sections
/// are reflected in the report and the diagnostics.
pub fn parse_statement_text(source_desc: &str, text: &str) -> ParsedStatement {
    let rows = read_raw_rows(text);
    debug!("{}: {} rows", source_desc, rows.len());
    let sections = locate(rows);

    let mut run = SectionRun {
        sections: &sections,
        report: ParseReport {
            source: source_desc.to_string(),
            sections: Vec::new(),
            noise_rows: sections.noise_rows,
        },
        diagnostics: Diagnostics::new(),
    };

    let mut doc = StatementDocument::default();
    for kind in SectionKind::all() {
        match kind {
            SectionKind::Statement | SectionKind::AccountInformation => {
                for (name, value) in run.run(kind, extract_key_values) {
                    if !doc.account_info.apply_field(&name, &value) {
                        debug!("{}: ignoring field \"{}\"", kind, name);
                    }
                }
            }
            SectionKind::NetAssetValue => {
                for line in run.run(kind, extract_nav_lines) {
                    doc.net_asset_value.push_line(line);
                }
            }
            SectionKind::CashReport => doc.cash_balances = run.run(kind, extract_cash_balances),
            SectionKind::OpenPositions => {
                doc.open_positions = run.run(kind, extract_open_positions)
            }
            SectionKind::Trades => doc.trades = run.run(kind, extract_trades),
            SectionKind::Dividends => doc.dividends = run.run(kind, extract_dividends),
            SectionKind::WithholdingTax => {
                doc.withholding_taxes = run.run(kind, extract_withholding_taxes)
            }
            SectionKind::Interest => doc.interest = run.run(kind, extract_interest),
            SectionKind::Fees => doc.fees = run.run(kind, extract_fees),
            SectionKind::SecuritiesLending => {
                doc.securities_lending = run.run(kind, extract_securities_lending)
            }
        }
    }
    doc.net_asset_value.currency = doc.account_info.base_currency.clone();

    ParsedStatement { document: doc, report: run.report, diagnostics: run.diagnostics }
}

/// Reads and parses a statement. Only an unreadable source is an error.
pub fn parse_statement(desc_reader: &DescribedReader) -> Result<ParsedStatement, SError> {
    let text = desc_reader.read_to_string()?;
    Ok(parse_statement_text(desc_reader.desc(), &text))
}

// Used by both unit and integration tests
pub mod pub_testlib {
    use crate::statement::model::SectionKind;

    fn quote(cell: &str) -> String {
        if cell.contains(',') || cell.contains('"') {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    }

    /// Assembles statement CSV text one section at a time.
    #[derive(Default)]
    pub struct StatementCsvBuilder {
        lines: Vec<String>,
    }

    impl StatementCsvBuilder {
        pub fn new() -> StatementCsvBuilder {
            StatementCsvBuilder::default()
        }

        fn push(mut self, kind: SectionKind, marker: &str, cells: &[&str]) -> Self {
            let mut line = vec![quote(kind.sentinel()), marker.to_string()];
            line.extend(cells.iter().map(|c| quote(c)));
            self.lines.push(line.join(","));
            self
        }

        pub fn header(self, kind: SectionKind, cols: &[&str]) -> Self {
            self.push(kind, "Header", cols)
        }

        pub fn data(self, kind: SectionKind, cells: &[&str]) -> Self {
            self.push(kind, "Data", cells)
        }

        pub fn total(self, kind: SectionKind, cells: &[&str]) -> Self {
            self.push(kind, "Total", cells)
        }

        /// A line written verbatim, for malformed input.
        pub fn raw(mut self, line: &str) -> Self {
            self.lines.push(line.to_string());
            self
        }

        pub fn field(self, kind: SectionKind, name: &str, value: &str) -> Self {
            self.data(kind, &[name, value])
        }

        pub fn build(&self) -> String {
            let mut text = self.lines.join("\n");
            text.push('\n');
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        statement::{
            diagnostics::Severity, io::header::HeaderSource, model::{Currency, SectionKind},
        },
        testlib::assert_re,
        util::rw::DescribedReader,
    };

    use super::{parse_statement, parse_statement_text, pub_testlib::StatementCsvBuilder};

    const STATEMENT: &str = "\
Statement,Header,Field Name,Field Value
Statement,Data,BrokerName,Interactive Brokers
Statement,Data,Period,\"January 1, 2025 - December 31, 2025\"
Account Information,Header,Field Name,Field Value
Account Information,Data,Account,U1234567
Account Information,Data,Base Currency,CHF
Net Asset Value,Header,Asset Class,Prior Total,Current Long,Current Short,Current Total,Change
Net Asset Value,Data,Total,1000,1100,0,1100,100
Trades,Header,DataDiscriminator,Asset Category,Currency,Symbol,Date/Time,Quantity,T. Price,Proceeds,Comm/Fee
Trades,Data,Order,Stocks,USD,AAPL,2025-01-15,10,150,-1500,-1
Trades,Data,Order,Stocks,USD,BAD,someday,10,150,-1500,-1
Dividends,Data,USD,2025-03-15,AAPL(US0378331005) Cash Dividend,12.50
Securities Lending,Data,USD,AAPL,100,0.5
";

    #[test]
    fn test_parse_statement_text() {
        let parsed = parse_statement_text("test.csv", STATEMENT);
        let doc = &parsed.document;

        assert_eq!(doc.account_info().account_id.as_deref(), Some("U1234567"));
        assert_eq!(doc.account_info().broker_name.as_deref(), Some("Interactive Brokers"));
        assert_eq!(doc.account_info().tax_year(), Some(2025));
        assert_eq!(doc.net_asset_value().currency, Some(Currency::chf()));
        assert_eq!(doc.net_asset_value().ending, Some(dec!(1100)));
        assert_eq!(doc.trades().len(), 1);
        assert_eq!(doc.dividends().len(), 1);
        assert!(doc.securities_lending().is_empty());

        let trades = parsed.report.section(SectionKind::Trades).unwrap();
        assert_eq!((trades.extracted, trades.dropped), (1, 1));
        assert_eq!(trades.header_source, Some(HeaderSource::Header));

        let divs = parsed.report.section(SectionKind::Dividends).unwrap();
        assert_eq!(divs.header_source, Some(HeaderSource::Positional));

        let lending = parsed.report.section(SectionKind::SecuritiesLending).unwrap();
        assert!(lending.present);
        assert_eq!(lending.header_source, None);

        assert!(!parsed.report.section(SectionKind::Fees).unwrap().present);
        assert_eq!(parsed.report.sections.len(), SectionKind::all().len());

        let msgs: Vec<String> = parsed.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(msgs.len(), 3, "{:?}", msgs);
        assert_re(r"^INFO \[Trades\]: 1 malformed row\(s\) dropped \(line 11: invalid date", &msgs[0]);
        assert_re(r"^WARNING \[Dividends\]: No header row", &msgs[1]);
        assert_re(r"^WARNING \[Securities Lending\]: Header row not found", &msgs[2]);
        assert_eq!(parsed.diagnostics.count(Severity::Warning), 2);
    }

    #[test]
    fn test_builder_statement() {
        let text = StatementCsvBuilder::new()
            .header(SectionKind::WithholdingTax, &["Currency", "Date", "Description", "Amount"])
            .data(
                SectionKind::WithholdingTax,
                &["USD", "2025-03-15", "AAPL(US0378331005) Cash Dividend, US Tax", "-1,875.00"],
            )
            .total(SectionKind::WithholdingTax, &["Total", "", "", "-1,875.00"])
            .build();
        assert!(text.contains("\"-1,875.00\""));

        let parsed = parse_statement_text("wht.csv", &text);
        let wht = parsed.document.withholding_taxes();
        assert_eq!(wht.len(), 1);
        assert_eq!(*wht[0].amount, dec!(1875.00));
        assert_eq!(wht[0].symbol, "AAPL");
    }

    #[test]
    fn test_unreadable_sub_table_warned() {
        let text = StatementCsvBuilder::new()
            .header(SectionKind::Trades, &[
                "Asset Category", "Currency", "Symbol", "Date/Time", "Quantity", "T. Price"])
            .data(SectionKind::Trades, &["Stocks", "USD", "AAPL", "2025-01-15", "10", "150"])
            .header(SectionKind::Trades, &[
                "Asset Category", "Curr.", "Symbol", "Date/Time", "Quantity", "T. Price"])
            .data(SectionKind::Trades, &["Forex", "USD", "EUR.USD", "2025-02-01", "1000", "1.08"])
            .data(SectionKind::Trades, &["Forex", "USD", "EUR.USD", "2025-03-01", "-1000", "1.09"])
            .build();
        let parsed = parse_statement_text("subtable.csv", &text);
        assert_eq!(parsed.document.trades().len(), 1);

        let trades: Vec<String> = parsed
            .diagnostics
            .iter()
            .filter(|d| d.section == Some(SectionKind::Trades))
            .map(|d| d.to_string())
            .collect();
        assert_eq!(trades.len(), 1, "{:?}", trades);
        assert_re(
            r"^WARNING \[Trades\]: Sub-table header on line 3 lacks currency; 2 row\(s\) not read",
            &trades[0],
        );
    }

    #[test]
    fn test_noise_and_empty() {
        let parsed = parse_statement_text("empty.csv", "");
        assert_eq!(parsed.report.total_extracted(), 0);
        assert!(parsed.diagnostics.is_empty());

        let parsed = parse_statement_text("noise.csv", "hello,world\n\nfoo\n");
        assert_eq!(parsed.report.noise_rows, 2);
    }

    #[test]
    fn test_parse_statement_missing_file() {
        let r = DescribedReader::from_file_path("/nonexistent/ibtax/x.csv".into());
        let err = parse_statement(&r).unwrap_err();
        assert_re("^Unable to open /nonexistent/ibtax/x.csv", &err);
    }
}
