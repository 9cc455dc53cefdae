use std::{fs::File, io::BufWriter, path::Path};

use serde::Serialize;

use crate::{
    app::APP_VERSION,
    statement::{Diagnostics, ParseReport, StatementDocument},
    tax::TaxSummary,
};

use super::model::Error;

/// Everything a run produced, for archiving. Decimals are written as
/// strings and dates as YYYY-MM-DD, so the export is lossless and stable.
#[derive(Serialize)]
pub struct JsonExport<'a> {
    pub version: &'static str,
    pub report: &'a ParseReport,
    pub document: &'a StatementDocument,
    pub diagnostics: &'a Diagnostics,
    pub tax_summary: Option<&'a TaxSummary>,
}

impl<'a> JsonExport<'a> {
    pub fn new(
        report: &'a ParseReport,
        document: &'a StatementDocument,
        diagnostics: &'a Diagnostics,
        tax_summary: Option<&'a TaxSummary>,
    ) -> JsonExport<'a> {
        JsonExport { version: APP_VERSION, report, document, diagnostics, tax_summary }
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| e.to_string())
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), Error> {
        let fp = File::create(path).map_err(|e| format!("Failed to create {:?}: {}", path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(fp), self)
            .map_err(|e| format!("Failed to write {:?}: {}", path, e))
    }
}
