pub mod account;
pub mod currency;
pub mod records;
pub mod section;

pub use account::{AccountInfo, NavLine, NetAssetValue};
pub use currency::Currency;
pub use records::{
    CashBalance, Dividend, Fee, Interest, OpenPosition, SecuritiesLending,
    StmtDate, Trade, WithholdingTax,
};
pub use section::SectionKind;
