use tracing::warn;

use super::header::ColumnIndex;

pub const HEADER_MARKER: &str = "Header";
pub const DATA_MARKER: &str = "Data";

/// One CSV line of the statement, cells trimmed. Reads past the end of the
/// row yield "", so short rows behave as if padded with empty cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source.
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(line: usize, cells: Vec<String>) -> RawRow {
        RawRow {
            line,
            cells: cells.into_iter().map(|c| safe_string(&c)).collect(),
        }
    }

    pub fn cell(&self, i: usize) -> &str {
        self.cells.get(i).map(|c| c.as_str()).unwrap_or("")
    }

    pub fn cell_at(&self, index: ColumnIndex) -> &str {
        match index {
            ColumnIndex::At(i) => self.cell(i),
            ColumnIndex::FromEnd(n) if n > 0 && n <= self.cells.len() => {
                self.cell(self.cells.len() - n)
            }
            _ => "",
        }
    }

    /// First cell. Names the section in well-formed rows.
    pub fn section_token(&self) -> &str {
        self.cell(0)
    }

    /// Second cell. Header, Data, Total, SubTotal, Notes...
    pub fn marker(&self) -> &str {
        self.cell(1)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    /// Rows of dashes some exports use to underline a table.
    pub fn is_separator(&self) -> bool {
        self.cells.iter().any(|c| c.contains("---"))
    }
}

pub fn safe_string(s: &str) -> String {
    s.trim().to_string()
}

/// Splits statement text into rows. Rows vary in length, and there is no
/// single header line, so the reader is flexible and header-less.
/// Unreadable lines are logged and skipped.
pub fn read_raw_rows(text: &str) -> Vec<RawRow> {
    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    // The reader's own line count skips blank lines, and a record's offset
    // can sit before the blank lines leading up to it. Count newlines up to
    // the first byte of the record instead.
    let bytes = text.as_bytes();
    let mut counted_to = 0;
    let mut line = 1;
    let mut rows = Vec::new();
    for (i, record_res) in csv_r.records().enumerate() {
        match record_res {
            Ok(record) => {
                match record.position() {
                    Some(pos) => {
                        let mut start = (pos.byte() as usize).min(bytes.len());
                        while start < bytes.len() && matches!(bytes[start], b'\r' | b'\n') {
                            start += 1;
                        }
                        if start >= counted_to {
                            line += bytes[counted_to..start].iter().filter(|b| **b == b'\n').count();
                            counted_to = start;
                        }
                    }
                    None => line = i + 1,
                }
                rows.push(RawRow::new(line, record.iter().map(String::from).collect()));
            }
            Err(e) => {
                warn!("Skipping unreadable statement record {}: {}", i + 1, e);
            }
        }
    }
    rows
}
