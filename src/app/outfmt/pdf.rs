use std::{fs::File, io::BufWriter, path::PathBuf};

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use crate::statement::render::RenderTable;

use super::model::{Error, OutputType, ReportWriter};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TITLE_SIZE: f32 = 12.0;
const TEXT_SIZE: f32 = 7.0;
const ROW_HEIGHT: f32 = 4.5;
// Rough Helvetica advance at TEXT_SIZE, for clipping cell text.
const CHAR_WIDTH_MM: f32 = 1.35;

/// Lays tables out on A4 pages, each under its title, breaking onto new
/// pages as needed. Saved on finish.
pub struct PdfWriter {
    path: PathBuf,
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    n_tables: usize,
}

impl PdfWriter {
    pub fn new(path: PathBuf, title: &str) -> Result<PdfWriter, Error> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| format!("Failed to load font: {}", e))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| format!("Failed to load font: {}", e))?;
        let layer = doc.get_page(page1).get_layer(layer1);
        Ok(PdfWriter {
            path,
            doc,
            font,
            font_bold,
            layer,
            y: PAGE_HEIGHT - MARGIN,
            n_tables: 0,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Moves down by `height`, starting a new page when it would run past
    /// the bottom margin.
    fn advance(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
        self.y -= height;
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn rule(&self, y: f32) {
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
            ],
            is_closed: false,
        };
        self.layer.add_line(line);
    }

    fn row(&mut self, cells: &[String], col_width: f32, bold: bool) {
        self.advance(ROW_HEIGHT);
        let max_chars = ((col_width / CHAR_WIDTH_MM) as usize).max(4);
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN + col_width * i as f32;
            self.text(&clip(cell, max_chars), TEXT_SIZE, x, bold);
        }
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut clipped: String = s.chars().take(max_chars - 3).collect();
        clipped.push_str("...");
        clipped
    }
}

impl ReportWriter for PdfWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        // Each table after the first starts on a fresh page.
        if self.n_tables > 0 {
            self.new_page();
        }
        self.n_tables += 1;

        self.advance(TITLE_SIZE * 0.5);
        self.text(&out_type.title(name), TITLE_SIZE, MARGIN, true);
        self.advance(ROW_HEIGHT);

        for err in &table_model.errors {
            self.advance(ROW_HEIGHT);
            self.text(&format!("[!] {}", err), TEXT_SIZE, MARGIN, false);
        }

        let n_cols = table_model.header.len().max(1);
        let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / n_cols as f32;

        self.row(&table_model.header, col_width, true);
        self.rule(self.y - 1.5);
        for row in &table_model.rows {
            self.row(row, col_width, false);
        }
        if !table_model.footer.is_empty() {
            self.rule(self.y - 1.5);
            self.row(&table_model.footer, col_width, true);
        }

        if !table_model.notes.is_empty() {
            self.advance(ROW_HEIGHT);
            for note in &table_model.notes {
                self.advance(ROW_HEIGHT);
                self.text(note, TEXT_SIZE, MARGIN, false);
            }
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), Error> {
        let file = File::create(&self.path)
            .map_err(|e| format!("Failed to create {:?}: {}", self.path, e))?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| format!("Failed to save PDF: {}", e))
    }
}
