pub mod csv;
pub mod json;
pub mod model;
#[cfg(feature = "pdf_write")]
pub mod pdf;
pub mod text;
#[cfg(feature = "xlsx_write")]
pub mod xlsx;
