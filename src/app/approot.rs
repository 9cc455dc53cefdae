use std::path::PathBuf;

use crate::{
    app::outfmt::{csv::CsvWriter, json::JsonExport},
    statement::{
        model::SectionKind,
        parse_statement,
        render::{render_diagnostics, render_parse_summary, render_section_tables, RenderTable},
        validate::validate,
        Diagnostic, ParsedStatement, Severity,
    },
    tax::{calc_tax_summary, load_tax_config, render::render_tax_summary, TaxConfig, TaxSummary},
    util::rw::{DescribedReader, WriteHandle},
    verboseln, write_errln,
};

use super::outfmt::{
    model::{OutputType, ReportWriter},
    text::TextWriter,
};

pub type Error = String;

#[derive(Default)]
pub struct Options {
    pub render_full_values: bool,
    pub csv_output_dir: Option<PathBuf>,
    pub xlsx_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    /// Overrides the year taken from the statement period.
    pub tax_year: Option<i32>,
    pub no_tax: bool,
}

pub struct AppResult {
    /// Diagnostics include both parse and validation findings.
    pub parsed: ParsedStatement,
    pub tax_summary: Option<TaxSummary>,
}

/// Parses and validates a statement, then computes the tax summary when a
/// configuration is given. Only an unreadable statement is an error.
pub fn run_app_to_model(
    reader: &DescribedReader,
    tax_config: Option<TaxConfig>,
    tax_year: Option<i32>,
) -> Result<AppResult, Error> {
    let mut parsed = parse_statement(reader)?;
    let validation = validate(&parsed.document, &parsed.report);
    parsed.diagnostics.extend(validation);

    let tax_summary = tax_config.map(|mut config| {
        let year = tax_year
            .or_else(|| parsed.document.account_info().tax_year())
            .unwrap_or(config.tax_year);
        if year != config.tax_year {
            parsed.diagnostics.push(
                Diagnostic::warning(
                    None,
                    format!("Tax parameters are for {}, applied to {}", config.tax_year, year),
                )
                .with_detail("check the configured currency rates".to_string()),
            );
            config.tax_year = year;
        }
        calc_tax_summary(&parsed.document, &config)
    });

    Ok(AppResult { parsed, tax_summary })
}

pub struct AppRenderResult {
    pub name: String,
    pub summary_table: RenderTable,
    pub diagnostics_table: RenderTable,
    pub section_tables: Vec<(SectionKind, RenderTable)>,
    pub tax_table: Option<RenderTable>,
}

pub fn render_app_result(res: &AppResult, render_full_values: bool) -> AppRenderResult {
    AppRenderResult {
        name: res.parsed.report.source.clone(),
        summary_table: render_parse_summary(&res.parsed),
        diagnostics_table: render_diagnostics(&res.parsed.diagnostics),
        section_tables: render_section_tables(&res.parsed.document, render_full_values),
        tax_table: res
            .tax_summary
            .as_ref()
            .map(|s| render_tax_summary(s, render_full_values)),
    }
}

fn write_render_result(
    render_res: &AppRenderResult,
    writer: &mut dyn ReportWriter,
) -> Result<(), Error> {
    let name = &render_res.name;
    writer
        .print_render_table(OutputType::Summary, name, &render_res.summary_table)
        .map_err(|e| format!("Rendering summary: {e}"))?;

    for (kind, table) in &render_res.section_tables {
        writer
            .print_render_table(OutputType::Records(*kind), name, table)
            .map_err(|e| format!("Rendering {kind}: {e}"))?;
    }

    if let Some(tax_table) = &render_res.tax_table {
        writer
            .print_render_table(OutputType::TaxSummary, name, tax_table)
            .map_err(|e| format!("Rendering tax summary: {e}"))?;
    }

    writer
        .print_render_table(OutputType::Diagnostics, name, &render_res.diagnostics_table)
        .map_err(|e| format!("Rendering diagnostics: {e}"))?;
    Ok(())
}

fn make_writers(
    options: &Options,
    out_w: WriteHandle,
) -> Result<Vec<Box<dyn ReportWriter>>, Error> {
    let mut writers: Vec<Box<dyn ReportWriter>> = Vec::new();
    match &options.csv_output_dir {
        Some(dir) => writers.push(Box::new(
            CsvWriter::new(dir).map_err(|e| format!("Cannot use {:?}: {}", dir, e))?,
        )),
        None => writers.push(Box::new(TextWriter::new(out_w))),
    }

    if let Some(path) = &options.xlsx_path {
        #[cfg(feature = "xlsx_write")]
        writers.push(Box::new(super::outfmt::xlsx::XlsxWriter::new(path.clone())));
        #[cfg(not(feature = "xlsx_write"))]
        return Err(format!("Cannot write {:?}: built without xlsx support", path));
    }
    if let Some(path) = &options.pdf_path {
        #[cfg(feature = "pdf_write")]
        writers.push(Box::new(super::outfmt::pdf::PdfWriter::new(
            path.clone(),
            "Activity Statement Report",
        )?));
        #[cfg(not(feature = "pdf_write"))]
        return Err(format!("Cannot write {:?}: built without pdf support", path));
    }
    Ok(writers)
}

/// Returned Err is for exit code determination only.
/// All errors are written to err_printer.
pub fn run_app(
    reader: DescribedReader,
    options: Options,
    out_w: WriteHandle,
    mut err_printer: WriteHandle,
) -> Result<AppResult, ()> {
    let tax_config = if options.no_tax {
        None
    } else {
        match load_tax_config(options.config_path.as_deref()) {
            Ok(c) => Some(c),
            Err(e) => {
                write_errln!(err_printer, "{}", e);
                return Err(());
            }
        }
    };

    let res = match run_app_to_model(&reader, tax_config, options.tax_year) {
        Ok(r) => r,
        Err(e) => {
            write_errln!(err_printer, "{}", e);
            return Err(());
        }
    };
    verboseln!("Parsed {}: {} records", reader.desc(), res.parsed.report.total_extracted());

    let render_res = render_app_result(&res, options.render_full_values);
    let writers = match make_writers(&options, out_w) {
        Ok(w) => w,
        Err(e) => {
            write_errln!(err_printer, "{}", e);
            return Err(());
        }
    };

    let mut failed = false;
    for mut writer in writers {
        let written = write_render_result(&render_res, writer.as_mut())
            .and_then(|_| writer.finish());
        if let Err(e) = written {
            write_errln!(err_printer, "{}", e);
            failed = true;
        }
    }

    if let Some(json_path) = &options.json_path {
        let export = JsonExport::new(
            &res.parsed.report,
            &res.parsed.document,
            &res.parsed.diagnostics,
            res.tax_summary.as_ref(),
        );
        if let Err(e) = export.write_to_path(json_path) {
            write_errln!(err_printer, "{}", e);
            failed = true;
        }
    }

    let n_errors = res.parsed.diagnostics.count(Severity::Error);
    if n_errors > 0 {
        write_errln!(
            err_printer,
            "Warning: {} validation error(s) found. See the diagnostics table.",
            n_errors
        );
    }

    if failed {
        Err(())
    } else {
        Ok(res)
    }
}

// MARK: Tests
#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        statement::{model::SectionKind, Severity},
        tax::TaxConfig,
        testlib::assert_re,
        util::rw::{DescribedReader, WriteHandle},
    };

    use super::{render_app_result, run_app, run_app_to_model, Options};

    const STATEMENT: &str = "\
Statement,Header,Field Name,Field Value
Statement,Data,Period,\"January 1, 2024 - December 31, 2024\"
Account Information,Header,Field Name,Field Value
Account Information,Data,Base Currency,CHF
Dividends,Header,Currency,Date,Description,Amount
Dividends,Data,CHF,2024-05-01,NESN(CH0038863350) Cash Dividend,1000
Net Asset Value,Header,Asset Class,Prior Total,Current Long,Current Short,Current Total,Change
Net Asset Value,Data,Total,100,150,0,150,40
";

    fn reader() -> DescribedReader {
        DescribedReader::from_string("stmt.csv".to_string(), STATEMENT.to_string())
    }

    #[test]
    fn test_run_app_to_model() {
        let res = run_app_to_model(&reader(), Some(TaxConfig::default()), None).unwrap();
        let diags = &res.parsed.diagnostics;

        // NAV total does not add up
        assert_eq!(diags.count(Severity::Error), 1);
        // Missing sections, plus the tax year mismatch
        assert!(diags.iter().any(|d| d.section == Some(SectionKind::Trades)));
        assert!(diags.iter().any(|d| d.message == "Tax parameters are for 2025, applied to 2024"));

        let tax = res.tax_summary.as_ref().unwrap();
        assert_eq!(tax.tax_year, 2024);
        assert_eq!(tax.foreign_dividends, dec!(1000));
        assert_eq!(tax.income_tax, dec!(105.5));

        let rendered = render_app_result(&res, false);
        assert_eq!(rendered.name, "stmt.csv");
        assert!(rendered.tax_table.is_some());
        assert_eq!(rendered.diagnostics_table.rows.len(), diags.len());
    }

    #[test]
    fn test_run_app_no_tax() {
        let res = run_app_to_model(&reader(), None, Some(2024)).unwrap();
        assert!(res.tax_summary.is_none());
        assert!(!res.parsed.diagnostics.iter().any(|d| d.message.starts_with("Tax parameters")));
    }

    #[test]
    fn test_run_app_console() {
        let (out_w, out_buff) = WriteHandle::string_buff_write_handle();
        let (err_w, err_buff) = WriteHandle::string_buff_write_handle();
        let options = Options { no_tax: true, ..Options::default() };
        let res = run_app(reader(), options, out_w, err_w);
        assert!(res.is_ok());

        let out = out_buff.borrow().as_str().to_string();
        assert_re(r"^Statement Summary for stmt.csv\n", &out);
        assert_re(r"\nDividends\n", &out);
        assert_re(r"\nDiagnostics\n", &out);
        assert!(!out.contains("Tax Summary"));
        assert_re(
            r"^Warning: 1 validation error\(s\) found",
            err_buff.borrow().as_str(),
        );
    }

    #[test]
    fn test_run_app_missing_file() {
        let (err_w, err_buff) = WriteHandle::string_buff_write_handle();
        let reader = DescribedReader::from_file_path("/nonexistent/ibtax/s.csv".into());
        let options = Options { no_tax: true, ..Options::default() };
        let res = run_app(reader, options, WriteHandle::empty_write_handle(), err_w);
        assert!(res.is_err());
        assert_re("^Unable to open /nonexistent/ibtax/s.csv", err_buff.borrow().as_str());
    }
}
