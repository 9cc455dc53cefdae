use super::{
    io::header::ColumnIndex::{self, Absent, At, FromEnd},
    model::SectionKind,
};

/// Logical fields the extractors read. Each resolves to a column through
/// the header names listed in the section's layout.
pub struct StmtCol();
impl StmtCol {
    pub const DATA_DISCRIMINATOR: &'static str = "data discriminator";
    pub const ASSET_CATEGORY: &'static str = "asset category";
    pub const CURRENCY: &'static str = "currency";
    pub const SYMBOL: &'static str = "symbol";
    pub const DATE: &'static str = "date";
    pub const DESCRIPTION: &'static str = "description";
    pub const QUANTITY: &'static str = "quantity";
    pub const PRICE: &'static str = "price";
    pub const PROCEEDS: &'static str = "proceeds";
    pub const COMMISSION: &'static str = "commission";
    pub const BASIS: &'static str = "basis";
    pub const REALIZED_PL: &'static str = "realized p/l";
    pub const CODE: &'static str = "code";
    pub const AMOUNT: &'static str = "amount";
    pub const COUNTRY: &'static str = "country";
    pub const MULTIPLIER: &'static str = "multiplier";
    pub const COST_PRICE: &'static str = "cost price";
    pub const COST_BASIS: &'static str = "cost basis";
    pub const CLOSE_PRICE: &'static str = "close price";
    pub const VALUE: &'static str = "value";
    pub const UNREALIZED_PL: &'static str = "unrealized p/l";
    pub const LINE_ITEM: &'static str = "line item";
    pub const TOTAL: &'static str = "total";
    pub const FIELD_NAME: &'static str = "field name";
    pub const FIELD_VALUE: &'static str = "field value";
    pub const ASSET_CLASS: &'static str = "asset class";
    pub const PRIOR_TOTAL: &'static str = "prior total";
    pub const CURRENT_LONG: &'static str = "current long";
    pub const CURRENT_SHORT: &'static str = "current short";
    pub const CURRENT_TOTAL: &'static str = "current total";
    pub const CHANGE: &'static str = "change";
}

/// Where a logical field lives in one section.
pub struct FieldSpec {
    pub field: &'static str,
    /// Header names to look for, most specific first.
    pub candidates: &'static [&'static str],
    /// Column to assume when the section has no header row.
    pub fallback: ColumnIndex,
    pub required: bool,
}

const fn f(
    field: &'static str,
    candidates: &'static [&'static str],
    fallback: ColumnIndex,
    required: bool,
) -> FieldSpec {
    FieldSpec { field, candidates, fallback, required }
}

const CURRENCY_NAMES: &[&str] = &["Currency"];
const SYMBOL_NAMES: &[&str] = &["Symbol", "Ticker"];
const DESCRIPTION_NAMES: &[&str] = &["Description"];
const AMOUNT_NAMES: &[&str] = &["Amount", "Net Amount"];
const DATE_NAMES: &[&str] = &["Date", "Date/Time", "Settle Date", "Report Date"];

const TRADES_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::DATA_DISCRIMINATOR, &["DataDiscriminator"], Absent, false),
    f(StmtCol::ASSET_CATEGORY, &["Asset Category", "Asset Class"], At(2), false),
    f(StmtCol::CURRENCY, CURRENCY_NAMES, At(3), true),
    f(StmtCol::SYMBOL, SYMBOL_NAMES, At(4), true),
    f(StmtCol::DATE, &["Date/Time", "Trade Date", "Date"], At(5), true),
    f(StmtCol::QUANTITY, &["Quantity", "Qty"], At(6), true),
    f(StmtCol::PRICE, &["T. Price", "Trade Price", "Price"], At(7), false),
    f(StmtCol::PROCEEDS, &["Proceeds"], At(8), false),
    f(StmtCol::COMMISSION, &["Comm/Fee", "Commission", "Comm"], At(9), false),
    f(StmtCol::BASIS, &["Basis"], Absent, false),
    f(StmtCol::REALIZED_PL, &["Realized P/L"], Absent, false),
    f(StmtCol::CODE, &["Code"], Absent, false),
];

const DIVIDENDS_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::CURRENCY, CURRENCY_NAMES, At(2), true),
    f(StmtCol::DATE, DATE_NAMES, At(3), true),
    f(StmtCol::DESCRIPTION, DESCRIPTION_NAMES, At(4), true),
    f(StmtCol::SYMBOL, SYMBOL_NAMES, Absent, false),
    f(StmtCol::AMOUNT, AMOUNT_NAMES, FromEnd(1), true),
];

const WITHHOLDING_TAX_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::CURRENCY, CURRENCY_NAMES, At(2), true),
    f(StmtCol::DATE, DATE_NAMES, At(3), true),
    f(StmtCol::DESCRIPTION, DESCRIPTION_NAMES, At(4), false),
    f(StmtCol::SYMBOL, SYMBOL_NAMES, Absent, false),
    f(StmtCol::AMOUNT, AMOUNT_NAMES, FromEnd(1), true),
    f(StmtCol::COUNTRY, &["Country", "Country Code"], Absent, false),
];

// Fees and Interest share the cash-transaction shape.
const CASH_TX_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::CURRENCY, CURRENCY_NAMES, At(2), true),
    f(StmtCol::DATE, DATE_NAMES, At(3), false),
    f(StmtCol::DESCRIPTION, DESCRIPTION_NAMES, At(4), false),
    f(StmtCol::AMOUNT, AMOUNT_NAMES, FromEnd(1), true),
];

const OPEN_POSITIONS_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::DATA_DISCRIMINATOR, &["DataDiscriminator"], At(2), false),
    f(StmtCol::ASSET_CATEGORY, &["Asset Category", "Asset Class"], At(3), false),
    f(StmtCol::CURRENCY, CURRENCY_NAMES, At(4), true),
    f(StmtCol::SYMBOL, SYMBOL_NAMES, At(5), true),
    f(StmtCol::QUANTITY, &["Quantity", "Qty"], At(6), true),
    f(StmtCol::MULTIPLIER, &["Mult", "Multiplier"], At(7), false),
    f(StmtCol::COST_PRICE, &["Cost Price"], At(8), false),
    f(StmtCol::COST_BASIS, &["Cost Basis"], At(9), false),
    f(StmtCol::CLOSE_PRICE, &["Close Price"], At(10), false),
    f(StmtCol::VALUE, &["Value", "Market Value"], At(11), false),
    f(StmtCol::UNREALIZED_PL, &["Unrealized P/L"], At(12), false),
];

const CASH_REPORT_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::LINE_ITEM, &["Currency Summary", "Summary"], At(2), true),
    f(StmtCol::CURRENCY, CURRENCY_NAMES, At(3), true),
    f(StmtCol::TOTAL, &["Total"], At(4), true),
];

const SECURITIES_LENDING_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::CURRENCY, CURRENCY_NAMES, Absent, true),
    f(StmtCol::SYMBOL, SYMBOL_NAMES, Absent, true),
    f(StmtCol::DATE, &["Date", "Start Date", "Report Date"], Absent, false),
    f(StmtCol::QUANTITY, &["Quantity", "Qty"], Absent, false),
    f(StmtCol::AMOUNT, &["Income", "Interest Paid to Customer", "Amount"], Absent, false),
];

const KEY_VALUE_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::FIELD_NAME, &["Field Name"], At(2), true),
    f(StmtCol::FIELD_VALUE, &["Field Value"], At(3), false),
];

const NAV_LAYOUT: &[FieldSpec] = &[
    f(StmtCol::ASSET_CLASS, &["Asset Class"], At(2), true),
    f(StmtCol::PRIOR_TOTAL, &["Prior Total"], At(3), false),
    f(StmtCol::CURRENT_LONG, &["Current Long"], At(4), false),
    f(StmtCol::CURRENT_SHORT, &["Current Short"], At(5), false),
    f(StmtCol::CURRENT_TOTAL, &["Current Total"], At(6), true),
    f(StmtCol::CHANGE, &["Change"], At(7), false),
];

pub fn section_layout(kind: SectionKind) -> &'static [FieldSpec] {
    match kind {
        SectionKind::Trades => TRADES_LAYOUT,
        SectionKind::Dividends => DIVIDENDS_LAYOUT,
        SectionKind::WithholdingTax => WITHHOLDING_TAX_LAYOUT,
        SectionKind::Fees | SectionKind::Interest => CASH_TX_LAYOUT,
        SectionKind::OpenPositions => OPEN_POSITIONS_LAYOUT,
        SectionKind::CashReport => CASH_REPORT_LAYOUT,
        SectionKind::SecuritiesLending => SECURITIES_LENDING_LAYOUT,
        SectionKind::AccountInformation | SectionKind::Statement => KEY_VALUE_LAYOUT,
        SectionKind::NetAssetValue => NAV_LAYOUT,
    }
}

/// Whether rows of this section can be read without a header row.
pub fn has_positional_fallback(kind: SectionKind) -> bool {
    section_layout(kind).iter().any(|spec| spec.fallback != Absent)
}
