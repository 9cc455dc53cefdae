use std::io::Write;

use tabled::{
    settings::{
        object::{Cell, Columns, Rows},
        style::On,
        Alignment, Border, Style,
    },
    Table,
};

use crate::{statement::render::RenderTable, util::rw::WriteHandle};

use super::model::{Error, OutputType, ReportWriter};

pub struct TextWriter {
    w: WriteHandle,
}

impl TextWriter {
    pub fn new(w: WriteHandle) -> TextWriter {
        TextWriter { w }
    }
}

struct CellBorder {
    top: char,
    bottom: char,
    left: char,
    right: char,
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
}

impl CellBorder {
    fn to_border(&self) -> Border<On, On, On, On> {
        Border::full(
            self.top,
            self.bottom,
            self.left,
            self.right,
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        )
    }

    fn blank() -> CellBorder {
        CellBorder {
            top: ' ',
            bottom: ' ',
            left: ' ',
            right: ' ',
            top_left: ' ',
            top_right: ' ',
            bottom_left: ' ',
            bottom_right: ' ',
        }
    }
}

impl Default for CellBorder {
    fn default() -> Self {
        Self {
            top: '-',
            bottom: '-',
            left: '|',
            right: '|',
            top_left: '+',
            top_right: '+',
            bottom_left: '+',
            bottom_right: '+',
        }
    }
}

// Opens up the outer edge of the table, keeping inner rules.
fn open_outer_borders(table: &mut Table, n_cols: usize) {
    table.modify(
        Rows::first(),
        CellBorder { top: ' ', top_left: ' ', top_right: ' ', ..Default::default() }
            .to_border(),
    );
    table.modify(
        Columns::first(),
        CellBorder { left: ' ', top_left: '-', bottom_left: '-', ..Default::default() }
            .to_border(),
    );
    table.modify(
        Columns::last(),
        CellBorder { right: ' ', top_right: '-', bottom_right: '-', ..Default::default() }
            .to_border(),
    );
    table.modify(
        Cell::new(0, 0),
        CellBorder {
            left: ' ',
            top: ' ',
            top_right: ' ',
            top_left: ' ',
            bottom_left: '-',
            ..Default::default()
        }
        .to_border(),
    );
    table.modify(
        Cell::new(0, n_cols - 1),
        CellBorder {
            right: ' ',
            top: ' ',
            top_right: ' ',
            top_left: ' ',
            bottom_right: '-',
            ..Default::default()
        }
        .to_border(),
    );
}

// The footer sits under the table after a spacer row. Only its non-empty
// cells are boxed, so totals line up under their columns.
fn box_footer_cells(table: &mut Table, sep_row: usize, footer: &[String]) {
    let footer_row = sep_row + 1;
    table.modify(Rows::single(sep_row), Border::new().set_left(' ').set_right(' '));
    table.modify(Rows::single(footer_row), CellBorder::blank().to_border());

    for (col, footer_cell) in footer.iter().enumerate() {
        if !footer_cell.is_empty() {
            table.modify(Cell::new(sep_row, col), CellBorder::default().to_border());
            table.modify(Cell::new(footer_row, col), CellBorder::default().to_border());
        }
    }
}

fn build_table(table_model: &RenderTable) -> Table {
    let n_cols = table_model.header.len();
    let mut table_bldr = tabled::builder::Builder::default();
    table_bldr.push_record(
        table_model.header.iter().map(|h| h.to_uppercase()).collect::<Vec<String>>(),
    );
    for row in &table_model.rows {
        table_bldr.push_record(row);
    }

    let footer_sep_row: Option<usize> = if !table_model.footer.is_empty() {
        table_bldr.push_record(vec![String::new(); table_model.footer.len()]);
        table_bldr.push_record(table_model.footer.clone());
        Some(1 + table_model.rows.len())
    } else {
        None
    };

    let mut table = table_bldr.build();
    table.with(Style::ascii());
    table.modify(Rows::first(), Alignment::center());
    if n_cols > 0 {
        open_outer_borders(&mut table, n_cols);
    }
    if let Some(sep_row) = footer_sep_row {
        box_footer_cells(&mut table, sep_row, &table_model.footer);
    }
    table
}

impl ReportWriter for TextWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        let map_write_err = |e| format!("{e}");

        for err in &table_model.errors {
            writeln!(self.w, "[!] {}", err).map_err(map_write_err)?;
        }

        writeln!(self.w, "{}", out_type.title(name)).map_err(map_write_err)?;
        if table_model.rows.is_empty() && table_model.footer.is_empty() {
            writeln!(self.w, "(none)").map_err(map_write_err)?;
        } else {
            let table = build_table(table_model);
            writeln!(self.w, "{table}").map_err(map_write_err)?;
        }

        for note in &table_model.notes {
            writeln!(self.w, "{note}").map_err(map_write_err)?;
        }

        writeln!(self.w).map_err(map_write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        app::outfmt::model::{OutputType, ReportWriter},
        statement::render::RenderTable,
        testlib::assert_re,
        util::rw::WriteHandle,
    };

    use super::TextWriter;

    fn table(rows: Vec<Vec<&str>>, footer: Vec<&str>) -> RenderTable {
        let strs = |v: Vec<&str>| v.into_iter().map(String::from).collect::<Vec<String>>();
        RenderTable {
            header: strs(vec!["Symbol", "Amount"]),
            rows: rows.into_iter().map(strs).collect(),
            footer: strs(footer),
            notes: vec!["A note".to_string()],
            errors: vec!["an error".to_string()],
        }
    }

    #[test]
    fn test_render() {
        let (wh, buff) = WriteHandle::string_buff_write_handle();
        let mut w = TextWriter::new(wh);
        w.print_render_table(
            OutputType::TaxSummary,
            "2025",
            &table(vec![vec!["AAPL", "12.50"], vec!["NESN", "3.00"]], vec!["Total", "15.50"]),
        )
        .unwrap();

        let out = buff.borrow().as_str().to_string();
        assert_re(r"^\[!\] an error\nTax Summary 2025\n", &out);
        assert_re(r"SYMBOL", &out);
        assert_re(r"AAPL +\| 12\.50", &out);
        assert_re(r"Total +\| 15\.50", &out);
        assert_re(r"A note\n\n$", &out);
    }

    #[test]
    fn test_render_empty() {
        let (wh, buff) = WriteHandle::string_buff_write_handle();
        let mut w = TextWriter::new(wh);
        let mut t = table(vec![], vec![]);
        t.errors.clear();
        w.print_render_table(OutputType::Diagnostics, "", &t).unwrap();
        assert_eq!(buff.borrow().as_str(), "Diagnostics\n(none)\nA note\n\n");
    }
}
