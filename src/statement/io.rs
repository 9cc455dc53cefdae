pub mod extract;
pub mod header;
pub mod raw;
pub mod sections;
pub mod stmt_csv;
