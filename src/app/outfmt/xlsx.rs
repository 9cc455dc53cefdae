use std::{collections::HashMap, path::PathBuf, str::FromStr};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};

use crate::{statement::render::RenderTable, util::date::parse_standard_date};

use super::model::{Error, OutputType, ReportWriter};

// Excel's limit on sheet name length.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Collects every table as a sheet of one workbook, saved on finish.
pub struct XlsxWriter {
    path: PathBuf,
    workbook: Workbook,
    header_format: Format,
    date_format: Format,
}

impl XlsxWriter {
    pub fn new(path: PathBuf) -> XlsxWriter {
        XlsxWriter {
            path,
            workbook: Workbook::new(),
            header_format: Format::new().set_bold(),
            date_format: Format::new().set_num_format("yyyy-mm-dd"),
        }
    }
}

fn xlsx_err(e: XlsxError) -> Error {
    e.to_string()
}

/// Writes a cell as a date or number when it parses as one, so the sheet
/// can be summed and sorted.
fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &str,
    date_format: &Format,
) -> Result<(), XlsxError> {
    if let Ok(date) = parse_standard_date(cell) {
        if let Ok(year) = u16::try_from(date.year()) {
            let dt = ExcelDateTime::from_ymd(year, date.month().into(), date.day())?;
            sheet.write_with_format(row, col, &dt, date_format)?;
            return Ok(());
        }
    }
    if let Some(num) = Decimal::from_str(cell).ok().and_then(|d| d.to_f64()) {
        sheet.write_number(row, col, num)?;
    } else {
        sheet.write_string(row, col, cell)?;
    }
    Ok(())
}

fn write_table(
    sheet: &mut Worksheet,
    table_model: &RenderTable,
    header_format: &Format,
    date_format: &Format,
) -> Result<(), XlsxError> {
    let mut col_widths = HashMap::<u16, f64>::new();
    let mut note_width = |col: u16, s: &str| {
        let w = col_widths.entry(col).or_insert(0.0);
        *w = w.max(s.chars().count() as f64 + 1.0);
    };

    let mut r: u32 = 0;
    for (c, h) in table_model.header.iter().enumerate() {
        let c = c as u16;
        sheet.write_string_with_format(r, c, h, header_format)?;
        note_width(c, h);
    }
    r += 1;

    for row in &table_model.rows {
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            write_cell(sheet, r, c, cell, date_format)?;
            note_width(c, cell);
        }
        r += 1;
    }

    if !table_model.footer.is_empty() {
        r += 1;
        for (c, cell) in table_model.footer.iter().enumerate() {
            let c = c as u16;
            if c == 0 {
                sheet.write_string_with_format(r, c, cell, header_format)?;
            } else {
                write_cell(sheet, r, c, cell, date_format)?;
            }
            note_width(c, cell);
        }
        r += 1;
    }

    if !table_model.notes.is_empty() || !table_model.errors.is_empty() {
        r += 1;
        for note in table_model.errors.iter().chain(table_model.notes.iter()) {
            sheet.write_string(r, 0, note)?;
            r += 1;
        }
    }

    for (col, width) in col_widths {
        sheet.set_column_width(col, width)?;
    }
    Ok(())
}

impl ReportWriter for XlsxWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        _name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        let sheet_name: String = out_type.file_stem().chars().take(MAX_SHEET_NAME_LEN).collect();
        let sheet = self.workbook.add_worksheet();
        sheet.set_name(&sheet_name).map_err(xlsx_err)?;
        write_table(sheet, table_model, &self.header_format, &self.date_format)
            .map_err(|e| format!("Writing sheet {}: {}", sheet_name, e))
    }

    fn finish(mut self: Box<Self>) -> Result<(), Error> {
        self.workbook
            .save(&self.path)
            .map_err(|e| format!("Failed to save {:?}: {}", self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        app::outfmt::model::{OutputType, ReportWriter},
        statement::{model::SectionKind, render::RenderTable},
    };

    use super::XlsxWriter;

    #[test]
    fn test_write_xlsx() {
        let path = std::env::temp_dir()
            .join(format!("ibtax-xlsx-test-{}.xlsx", std::process::id()));
        let mut w = Box::new(XlsxWriter::new(path.clone()));
        let table = RenderTable {
            header: vec!["Date".to_string(), "Symbol".to_string(), "Amount".to_string()],
            rows: vec![vec!["2025-03-15".to_string(), "AAPL".to_string(), "12.50".to_string()]],
            footer: vec!["Total".to_string(), String::new(), "12.50".to_string()],
            notes: vec!["A note".to_string()],
            errors: vec![],
        };
        w.print_render_table(OutputType::Records(SectionKind::Dividends), "", &table).unwrap();
        w.print_render_table(OutputType::Summary, "x", &table).unwrap();
        w.finish().unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
        let _ = std::fs::remove_file(&path);
    }
}
