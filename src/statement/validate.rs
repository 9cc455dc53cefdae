//! Post-parse consistency checks. These only ever produce diagnostics; the
//! document is left as parsed.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    diagnostics::{Diagnostic, Diagnostics},
    document::{ParseReport, StatementDocument},
    model::{SectionKind, StmtDate},
};

pub const NAV_TOLERANCE: Decimal = dec!(0.01);

lazy_static! {
    static ref ISO_DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

fn check_date(
    kind: SectionKind,
    line: usize,
    rendered: String,
    diags: &mut Diagnostics,
) {
    if !ISO_DATE_RE.is_match(&rendered) {
        diags.push(
            Diagnostic::warning(
                Some(kind),
                format!("Line {}: date \"{}\" is not YYYY-MM-DD", line, rendered),
            )
            .with_detail("kept as text".to_string()),
        );
    }
}

fn check_opt_stmt_date(
    kind: SectionKind,
    line: usize,
    d: &Option<StmtDate>,
    diags: &mut Diagnostics,
) {
    if let Some(d) = d {
        check_date(kind, line, d.to_string(), diags);
    }
}

/// Every date carried by a record must render as YYYY-MM-DD. Optional
/// dates kept as raw text are reported.
pub fn validate_dates(doc: &StatementDocument) -> Diagnostics {
    let mut diags = Diagnostics::new();
    for t in doc.trades() {
        check_date(SectionKind::Trades, t.line, t.date.to_string(), &mut diags);
    }
    for d in doc.dividends() {
        check_date(SectionKind::Dividends, d.line, d.date.to_string(), &mut diags);
    }
    for w in doc.withholding_taxes() {
        check_date(SectionKind::WithholdingTax, w.line, w.date.to_string(), &mut diags);
    }
    for f in doc.fees() {
        check_opt_stmt_date(SectionKind::Fees, f.line, &f.date, &mut diags);
    }
    for i in doc.interest() {
        check_opt_stmt_date(SectionKind::Interest, i.line, &i.date, &mut diags);
    }
    for s in doc.securities_lending() {
        check_opt_stmt_date(SectionKind::SecuritiesLending, s.line, &s.date, &mut diags);
    }
    diags
}

/// prior + change must equal current, within NAV_TOLERANCE. Lines lacking
/// a prior total or change cannot be checked and are passed over.
pub fn validate_nav_consistency(doc: &StatementDocument) -> Diagnostics {
    let mut diags = Diagnostics::new();
    for line in &doc.net_asset_value().lines {
        let (prior, change) = match (line.prior_total, line.change) {
            (Some(p), Some(c)) => (p, c),
            _ => continue,
        };
        let diff = prior + change - line.current_total;
        if diff.abs() > NAV_TOLERANCE {
            diags.push(
                Diagnostic::error(
                    Some(SectionKind::NetAssetValue),
                    format!(
                        "Line {}: {} does not add up: {} + {} != {}",
                        line.line, line.asset_class, prior, change, line.current_total
                    ),
                )
                .with_detail(format!("off by {}", diff)),
            );
        }
    }
    diags
}

pub fn validate_missing_sections(report: &ParseReport, expected: &[SectionKind]) -> Diagnostics {
    let mut diags = Diagnostics::new();
    for kind in expected {
        let present = report.section(*kind).map(|s| s.present).unwrap_or(false);
        if !present {
            diags.push(Diagnostic::warning(
                Some(*kind),
                "Section not found in statement".to_string(),
            ));
        }
    }
    diags
}

/// Runs every check against a parsed statement.
pub fn validate(doc: &StatementDocument, report: &ParseReport) -> Diagnostics {
    let mut diags = validate_missing_sections(report, &SectionKind::expected());
    diags.extend(validate_dates(doc));
    diags.extend(validate_nav_consistency(doc));
    diags
}
