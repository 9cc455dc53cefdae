use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use time::Date;
use tracing::debug;

use crate::{
    statement::{
        csv_common::StmtCol,
        model::{
            CashBalance, Currency, Dividend, Fee, Interest, NavLine, OpenPosition,
            SecuritiesLending, SectionKind, StmtDate, Trade, WithholdingTax,
        },
    },
    util::{
        date::parse_statement_date,
        decimal::{parse_amount, try_parse_amount, GreaterEqualZeroDecimal},
    },
};

use super::{
    header::{is_header_row, ColumnMap, HeaderSource, ResolvedHeader},
    raw::{RawRow, DATA_MARKER},
    sections::Segment,
};

lazy_static! {
    // "... per Share - US Tax"
    static ref WHT_COUNTRY_RE: Regex = Regex::new(r"-\s*([A-Z]{2})\s+Tax\s*$").unwrap();
}

/// Why a data row was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSkip {
    MissingField(&'static str),
    InvalidDate { field: &'static str, value: String },
    InvalidNumber { field: &'static str, value: String },
    UnexpectedValue { field: &'static str, value: String },
    ZeroQuantity,
}

impl Display for RowSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSkip::MissingField(field) => write!(f, "missing {}", field),
            RowSkip::InvalidDate { field, value } => {
                write!(f, "invalid {} \"{}\"", field, value)
            }
            RowSkip::InvalidNumber { field, value } => {
                write!(f, "invalid {} \"{}\"", field, value)
            }
            RowSkip::UnexpectedValue { field, value } => {
                write!(f, "unexpected {} \"{}\"", field, value)
            }
            RowSkip::ZeroQuantity => write!(f, "zero quantity"),
        }
    }
}

/// A later Header row of a section whose columns lack required fields.
/// Its data rows cannot be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnreadableSubTable {
    pub header_line: usize,
    pub missing: Vec<&'static str>,
    pub rows: usize,
}

/// Records read from one segment, plus the rows that had to be dropped
/// (by line number).
#[derive(Debug)]
pub struct Extracted<T> {
    pub records: Vec<T>,
    pub drops: Vec<(usize, RowSkip)>,
    pub unreadable_sub_tables: Vec<UnreadableSubTable>,
}

impl<T> Extracted<T> {
    pub fn dropped(&self) -> usize {
        self.drops.len()
    }

    /// Data rows passed over under unreadable sub-table headers.
    pub fn unreadable_rows(&self) -> usize {
        self.unreadable_sub_tables.iter().map(|t| t.rows).sum()
    }
}

fn required_str<'a>(
    row: &'a RawRow,
    cols: &ColumnMap,
    field: &'static str,
) -> Result<&'a str, RowSkip> {
    let v = row.cell_at(cols.get(field));
    if v.is_empty() {
        Err(RowSkip::MissingField(field))
    } else {
        Ok(v)
    }
}

fn optional_string(row: &RawRow, cols: &ColumnMap, field: &'static str) -> Option<String> {
    let v = row.cell_at(cols.get(field));
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

fn required_date(row: &RawRow, cols: &ColumnMap, field: &'static str) -> Result<Date, RowSkip> {
    let v = required_str(row, cols, field)?;
    parse_statement_date(v).ok_or_else(|| RowSkip::InvalidDate {
        field,
        value: v.to_string(),
    })
}

fn optional_date(row: &RawRow, cols: &ColumnMap, field: &'static str) -> Option<StmtDate> {
    StmtDate::from_cell(row.cell_at(cols.get(field)))
}

fn required_amount(
    row: &RawRow,
    cols: &ColumnMap,
    field: &'static str,
) -> Result<Decimal, RowSkip> {
    let v = required_str(row, cols, field)?;
    try_parse_amount(v).ok_or_else(|| RowSkip::InvalidNumber {
        field,
        value: v.to_string(),
    })
}

fn optional_amount(row: &RawRow, cols: &ColumnMap, field: &'static str) -> Option<Decimal> {
    try_parse_amount(row.cell_at(cols.get(field)))
}

/// "AAPL(US0378331005) Cash Dividend USD 0.24 per Share" gives "AAPL".
pub fn symbol_from_description(description: &str) -> String {
    description
        .trim()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_string()
}

fn country_from_wht_description(description: &str) -> Option<String> {
    WHT_COUNTRY_RE
        .captures(description)
        .map(|caps| caps[1].to_string())
}

/// Walks the data rows of a segment, handing each to `row_fn`.
///
/// Rows of other sections, non-Data rows, separators and (outside of Net
/// Asset Value) Total rows are passed over without counting as drops. A
/// further Header row of the section switches to its column map. If that
/// sub-table lacks the section's required fields, its rows are passed over
/// until the next header, and counted in `unreadable_sub_tables`.
///
/// `row_fn` returns Ok(None) for rows that are valid but not wanted.
pub fn extract_rows<T, F>(segment: &Segment, resolved: &ResolvedHeader, mut row_fn: F) -> Extracted<T>
where
    F: FnMut(&RawRow, &ColumnMap) -> Result<Option<T>, RowSkip>,
{
    let kind = segment.kind;
    let skip_totals = kind != SectionKind::NetAssetValue;
    let mut cols = resolved.map.clone();
    let mut active = true;
    let mut out = Extracted {
        records: Vec::new(),
        drops: Vec::new(),
        unreadable_sub_tables: Vec::new(),
    };

    for row in segment.rows.iter().skip(resolved.data_start()) {
        if row.section_token() != kind.sentinel() {
            continue;
        }
        if is_header_row(kind, row) {
            cols = ColumnMap::from_header_row(kind, row);
            active = cols.has_required_fields();
            if !active {
                debug!("{}: sub-table header on line {} lacks {:?}, passing over its rows",
                       kind, row.line, cols.missing_required_fields());
                out.unreadable_sub_tables.push(UnreadableSubTable {
                    header_line: row.line,
                    missing: cols.missing_required_fields(),
                    rows: 0,
                });
            }
            continue;
        }
        if row.marker() != DATA_MARKER || row.is_separator() {
            continue;
        }
        if skip_totals && row.cell(2).starts_with("Total") {
            continue;
        }
        if !active {
            if let Some(table) = out.unreadable_sub_tables.last_mut() {
                table.rows += 1;
            }
            continue;
        }

        match row_fn(row, &cols) {
            Ok(Some(record)) => out.records.push(record),
            Ok(None) => (),
            Err(skip) => {
                debug!("{}: dropping line {}: {}", kind, row.line, skip);
                out.drops.push((row.line, skip));
            }
        }
    }
    out
}

pub fn extract_trades(segment: &Segment, resolved: &ResolvedHeader) -> Extracted<Trade> {
    extract_rows(segment, resolved, |row, cols| {
        // Closed lot rows repeat the quantities of their closing order.
        let disc = row.cell_at(cols.get(StmtCol::DATA_DISCRIMINATOR));
        if disc.eq_ignore_ascii_case("ClosedLot") || disc.eq_ignore_ascii_case("Lot") {
            return Ok(None);
        }

        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let symbol = required_str(row, cols, StmtCol::SYMBOL)?.to_string();
        let date = required_date(row, cols, StmtCol::DATE)?;
        let quantity = required_amount(row, cols, StmtCol::QUANTITY)?;
        if quantity.is_zero() {
            return Err(RowSkip::ZeroQuantity);
        }

        Ok(Some(Trade {
            line: row.line,
            asset_category: optional_string(row, cols, StmtCol::ASSET_CATEGORY)
                .unwrap_or_default(),
            currency,
            symbol,
            date,
            quantity,
            price: optional_amount(row, cols, StmtCol::PRICE),
            proceeds: optional_amount(row, cols, StmtCol::PROCEEDS).unwrap_or(Decimal::ZERO),
            commission: GreaterEqualZeroDecimal::from_abs(parse_amount(
                row.cell_at(cols.get(StmtCol::COMMISSION)),
            )),
            basis: optional_amount(row, cols, StmtCol::BASIS),
            realized_pl: optional_amount(row, cols, StmtCol::REALIZED_PL),
            code: optional_string(row, cols, StmtCol::CODE).unwrap_or_default(),
        }))
    })
}

pub fn extract_dividends(segment: &Segment, resolved: &ResolvedHeader) -> Extracted<Dividend> {
    extract_rows(segment, resolved, |row, cols| {
        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let date = required_date(row, cols, StmtCol::DATE)?;
        let description = required_str(row, cols, StmtCol::DESCRIPTION)?.to_string();
        let amount = required_amount(row, cols, StmtCol::AMOUNT)?;
        let symbol = optional_string(row, cols, StmtCol::SYMBOL)
            .unwrap_or_else(|| symbol_from_description(&description));

        Ok(Some(Dividend { line: row.line, currency, date, symbol, description, amount }))
    })
}

pub fn extract_withholding_taxes(
    segment: &Segment,
    resolved: &ResolvedHeader,
) -> Extracted<WithholdingTax> {
    extract_rows(segment, resolved, |row, cols| {
        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let date = required_date(row, cols, StmtCol::DATE)?;
        let amount = required_amount(row, cols, StmtCol::AMOUNT)?;
        let description = optional_string(row, cols, StmtCol::DESCRIPTION).unwrap_or_default();
        let symbol = optional_string(row, cols, StmtCol::SYMBOL)
            .unwrap_or_else(|| symbol_from_description(&description));
        let country = optional_string(row, cols, StmtCol::COUNTRY)
            .map(|c| c.to_uppercase())
            .or_else(|| country_from_wht_description(&description));

        Ok(Some(WithholdingTax {
            line: row.line,
            currency,
            date,
            symbol,
            description,
            amount: GreaterEqualZeroDecimal::from_abs(amount),
            country,
        }))
    })
}

pub fn extract_fees(segment: &Segment, resolved: &ResolvedHeader) -> Extracted<Fee> {
    extract_rows(segment, resolved, |row, cols| {
        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let amount = required_amount(row, cols, StmtCol::AMOUNT)?;
        Ok(Some(Fee {
            line: row.line,
            currency,
            date: optional_date(row, cols, StmtCol::DATE),
            description: optional_string(row, cols, StmtCol::DESCRIPTION).unwrap_or_default(),
            amount: GreaterEqualZeroDecimal::from_abs(amount),
        }))
    })
}

pub fn extract_interest(segment: &Segment, resolved: &ResolvedHeader) -> Extracted<Interest> {
    extract_rows(segment, resolved, |row, cols| {
        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let amount = required_amount(row, cols, StmtCol::AMOUNT)?;
        Ok(Some(Interest {
            line: row.line,
            currency,
            date: optional_date(row, cols, StmtCol::DATE),
            description: optional_string(row, cols, StmtCol::DESCRIPTION).unwrap_or_default(),
            amount,
        }))
    })
}

pub fn extract_open_positions(
    segment: &Segment,
    resolved: &ResolvedHeader,
) -> Extracted<OpenPosition> {
    extract_rows(segment, resolved, |row, cols| {
        // Lot rows break a Summary row down, and would double count it.
        if cols.has(StmtCol::DATA_DISCRIMINATOR) {
            let disc = row.cell_at(cols.get(StmtCol::DATA_DISCRIMINATOR));
            if !disc.is_empty() && !disc.eq_ignore_ascii_case("Summary") {
                // Read by position, anything else means the columns are
                // not where the layout assumes.
                if cols.source() == HeaderSource::Positional && !disc.eq_ignore_ascii_case("Lot") {
                    return Err(RowSkip::UnexpectedValue {
                        field: StmtCol::DATA_DISCRIMINATOR,
                        value: disc.to_string(),
                    });
                }
                return Ok(None);
            }
        }

        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let symbol = required_str(row, cols, StmtCol::SYMBOL)?.to_string();
        let quantity = required_amount(row, cols, StmtCol::QUANTITY)?;
        let multiplier = optional_amount(row, cols, StmtCol::MULTIPLIER);
        let close_price = optional_amount(row, cols, StmtCol::CLOSE_PRICE);
        let value = match optional_amount(row, cols, StmtCol::VALUE) {
            Some(v) => v,
            None => match close_price {
                Some(p) => quantity
                    .checked_mul(p)
                    .and_then(|v| v.checked_mul(multiplier.unwrap_or(Decimal::ONE)))
                    .ok_or_else(|| RowSkip::InvalidNumber {
                        field: StmtCol::VALUE,
                        value: format!("{} x {}", quantity, p),
                    })?,
                None => Decimal::ZERO,
            },
        };

        Ok(Some(OpenPosition {
            line: row.line,
            asset_category: optional_string(row, cols, StmtCol::ASSET_CATEGORY)
                .unwrap_or_default(),
            currency,
            symbol,
            quantity,
            multiplier,
            cost_price: optional_amount(row, cols, StmtCol::COST_PRICE),
            cost_basis: optional_amount(row, cols, StmtCol::COST_BASIS),
            close_price,
            value,
            unrealized_pl: optional_amount(row, cols, StmtCol::UNREALIZED_PL),
        }))
    })
}

pub fn extract_cash_balances(
    segment: &Segment,
    resolved: &ResolvedHeader,
) -> Extracted<CashBalance> {
    extract_rows(segment, resolved, |row, cols| {
        let line_item = required_str(row, cols, StmtCol::LINE_ITEM)?.to_string();
        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let total = required_amount(row, cols, StmtCol::TOTAL)?;
        Ok(Some(CashBalance { line: row.line, line_item, currency, total }))
    })
}

pub fn extract_securities_lending(
    segment: &Segment,
    resolved: &ResolvedHeader,
) -> Extracted<SecuritiesLending> {
    extract_rows(segment, resolved, |row, cols| {
        let currency = Currency::new(required_str(row, cols, StmtCol::CURRENCY)?);
        let symbol = required_str(row, cols, StmtCol::SYMBOL)?.to_string();
        Ok(Some(SecuritiesLending {
            line: row.line,
            currency,
            symbol,
            date: optional_date(row, cols, StmtCol::DATE),
            quantity: optional_amount(row, cols, StmtCol::QUANTITY),
            amount: optional_amount(row, cols, StmtCol::AMOUNT).unwrap_or(Decimal::ZERO),
        }))
    })
}

/// Field Name / Field Value pairs of Account Information or Statement.
pub fn extract_key_values(
    segment: &Segment,
    resolved: &ResolvedHeader,
) -> Extracted<(String, String)> {
    extract_rows(segment, resolved, |row, cols| {
        let name = required_str(row, cols, StmtCol::FIELD_NAME)?.to_string();
        let value = optional_string(row, cols, StmtCol::FIELD_VALUE).unwrap_or_default();
        Ok(Some((name, value)))
    })
}

pub fn extract_nav_lines(segment: &Segment, resolved: &ResolvedHeader) -> Extracted<NavLine> {
    extract_rows(segment, resolved, |row, cols| {
        let asset_class = required_str(row, cols, StmtCol::ASSET_CLASS)?.to_string();
        let current_total = required_amount(row, cols, StmtCol::CURRENT_TOTAL)?;
        Ok(Some(NavLine {
            line: row.line,
            asset_class,
            prior_total: optional_amount(row, cols, StmtCol::PRIOR_TOTAL),
            current_long: optional_amount(row, cols, StmtCol::CURRENT_LONG),
            current_short: optional_amount(row, cols, StmtCol::CURRENT_SHORT),
            current_total,
            change: optional_amount(row, cols, StmtCol::CHANGE),
        }))
    })
}
