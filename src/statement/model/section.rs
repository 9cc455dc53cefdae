use std::fmt::Display;

/// The statement sections this crate knows how to read. Each is
/// introduced in the CSV by its sentinel token in the first cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Statement,
    AccountInformation,
    NetAssetValue,
    CashReport,
    OpenPositions,
    Trades,
    Dividends,
    WithholdingTax,
    Interest,
    Fees,
    SecuritiesLending,
}

impl SectionKind {
    pub fn all() -> [SectionKind; 11] {
        [
            SectionKind::Statement,
            SectionKind::AccountInformation,
            SectionKind::NetAssetValue,
            SectionKind::CashReport,
            SectionKind::OpenPositions,
            SectionKind::Trades,
            SectionKind::Dividends,
            SectionKind::WithholdingTax,
            SectionKind::Interest,
            SectionKind::Fees,
            SectionKind::SecuritiesLending,
        ]
    }

    pub fn sentinel(&self) -> &'static str {
        match self {
            SectionKind::Statement => "Statement",
            SectionKind::AccountInformation => "Account Information",
            SectionKind::NetAssetValue => "Net Asset Value",
            SectionKind::CashReport => "Cash Report",
            SectionKind::OpenPositions => "Open Positions",
            SectionKind::Trades => "Trades",
            SectionKind::Dividends => "Dividends",
            SectionKind::WithholdingTax => "Withholding Tax",
            SectionKind::Interest => "Interest",
            SectionKind::Fees => "Fees",
            SectionKind::SecuritiesLending => "Securities Lending",
        }
    }

    /// Exact match on the (already trimmed) first cell of a row.
    pub fn from_sentinel(token: &str) -> Option<SectionKind> {
        SectionKind::all().into_iter().find(|k| k.sentinel() == token)
    }

    /// Sections of Field Name / Field Value rows. These fill in the
    /// account details and hold no records of their own.
    pub fn is_key_value(&self) -> bool {
        matches!(self, SectionKind::Statement | SectionKind::AccountInformation)
    }

    /// Sections every complete activity statement should contain.
    /// Securities lending only appears for enrolled accounts, and the
    /// Statement preamble carries nothing Account Information lacks.
    pub fn expected() -> Vec<SectionKind> {
        SectionKind::all()
            .into_iter()
            .filter(|k| {
                !matches!(k, SectionKind::SecuritiesLending | SectionKind::Statement)
            })
            .collect()
    }
}

impl Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sentinel())
    }
}

impl serde::Serialize for SectionKind {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.sentinel())
    }
}
