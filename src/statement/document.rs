use serde::Serialize;

use super::{
    diagnostics::Diagnostics,
    io::header::HeaderSource,
    model::{
        AccountInfo, CashBalance, Dividend, Fee, Interest, NetAssetValue, OpenPosition,
        SecuritiesLending, SectionKind, Trade, WithholdingTax,
    },
};

/// Everything read from one statement. Record collections keep source row
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatementDocument {
    pub(crate) account_info: AccountInfo,
    pub(crate) net_asset_value: NetAssetValue,
    pub(crate) trades: Vec<Trade>,
    pub(crate) dividends: Vec<Dividend>,
    pub(crate) withholding_taxes: Vec<WithholdingTax>,
    pub(crate) interest: Vec<Interest>,
    pub(crate) fees: Vec<Fee>,
    pub(crate) open_positions: Vec<OpenPosition>,
    pub(crate) cash_balances: Vec<CashBalance>,
    pub(crate) securities_lending: Vec<SecuritiesLending>,
}

impl StatementDocument {
    pub fn account_info(&self) -> &AccountInfo {
        &self.account_info
    }

    pub fn net_asset_value(&self) -> &NetAssetValue {
        &self.net_asset_value
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn dividends(&self) -> &[Dividend] {
        &self.dividends
    }

    pub fn withholding_taxes(&self) -> &[WithholdingTax] {
        &self.withholding_taxes
    }

    pub fn interest(&self) -> &[Interest] {
        &self.interest
    }

    pub fn fees(&self) -> &[Fee] {
        &self.fees
    }

    pub fn open_positions(&self) -> &[OpenPosition] {
        &self.open_positions
    }

    pub fn cash_balances(&self) -> &[CashBalance] {
        &self.cash_balances
    }

    pub fn securities_lending(&self) -> &[SecuritiesLending] {
        &self.securities_lending
    }

    /// "Ending Cash" lines of the Cash Report, excluding the base currency
    /// summary line.
    pub fn ending_balances(&self) -> impl Iterator<Item = &CashBalance> {
        self.cash_balances
            .iter()
            .filter(|b| b.is_ending_cash() && !b.currency.is_summary_pseudo_currency())
    }

    /// Records held for a section kind.
    pub fn record_count(&self, kind: SectionKind) -> usize {
        match kind {
            SectionKind::Trades => self.trades.len(),
            SectionKind::Dividends => self.dividends.len(),
            SectionKind::WithholdingTax => self.withholding_taxes.len(),
            SectionKind::Interest => self.interest.len(),
            SectionKind::Fees => self.fees.len(),
            SectionKind::OpenPositions => self.open_positions.len(),
            SectionKind::CashReport => self.cash_balances.len(),
            SectionKind::SecuritiesLending => self.securities_lending.len(),
            SectionKind::NetAssetValue => self.net_asset_value.lines.len(),
            SectionKind::AccountInformation | SectionKind::Statement => 0,
        }
    }
}

/// What happened to one section kind during a parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub kind: SectionKind,
    /// Whether any row carried the section's sentinel.
    pub present: bool,
    /// None when the section was absent, or skipped for lack of a header.
    pub header_source: Option<HeaderSource>,
    /// Matches StatementDocument::record_count. Always 0 for key/value
    /// sections.
    pub extracted: usize,
    pub dropped: usize,
}

impl SectionReport {
    pub fn absent(kind: SectionKind) -> SectionReport {
        SectionReport { kind, present: false, header_source: None, extracted: 0, dropped: 0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub source: String,
    pub sections: Vec<SectionReport>,
    /// Rows before the first recognized section.
    pub noise_rows: usize,
}

impl ParseReport {
    pub fn section(&self, kind: SectionKind) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn total_extracted(&self) -> usize {
        self.sections.iter().map(|s| s.extracted).sum()
    }

    pub fn total_dropped(&self) -> usize {
        self.sections.iter().map(|s| s.dropped).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedStatement {
    pub document: StatementDocument,
    pub report: ParseReport,
    pub diagnostics: Diagnostics,
}
