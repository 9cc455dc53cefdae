pub mod calc;
pub mod config;
pub mod render;

pub use self::calc::{calc_tax_summary, TaxSummary};
pub use self::config::{load_tax_config, TaxConfig};
