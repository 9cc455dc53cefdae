pub mod csv_common;
pub mod diagnostics;
pub mod document;
pub mod io;
pub mod model;
pub mod render;
pub mod validate;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use document::{ParseReport, ParsedStatement, SectionReport, StatementDocument};
pub use io::stmt_csv::{parse_statement, parse_statement_text};
pub use model::*;
