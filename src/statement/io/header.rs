use std::collections::HashMap;

use tracing::debug;

use crate::statement::{
    csv_common::{has_positional_fallback, section_layout},
    model::SectionKind,
};

use super::{
    raw::{RawRow, HEADER_MARKER},
    sections::Segment,
};

/// How many rows into a segment the header row may appear.
pub const HEADER_SCAN_LIMIT: usize = 10;

// Header names start after the section token and the marker cell.
const HEADER_CELL_OFFSET: usize = 2;

/// Where a field lives in a row. Absent is distinct from a column that
/// exists but is empty for some row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnIndex {
    At(usize),
    /// 1 is the last cell.
    FromEnd(usize),
    Absent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum HeaderSource {
    Header,
    Positional,
}

/// Finds `name` among `headers`. An exact case-insensitive match anywhere
/// wins over a substring match. Returns the position within `headers`.
pub fn get_column_index(headers: &[String], name: &str) -> Option<usize> {
    let name_lower = name.trim().to_lowercase();
    if name_lower.is_empty() {
        return None;
    }
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    lowered
        .iter()
        .position(|h| *h == name_lower)
        .or_else(|| lowered.iter().position(|h| h.contains(&name_lower)))
}

/// Logical field to column, for one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    kind: SectionKind,
    source: HeaderSource,
    fields: HashMap<&'static str, ColumnIndex>,
}

impl ColumnMap {
    /// Builds a map from a Header row. Indices refer to whole-row cells.
    pub fn from_header_row(kind: SectionKind, header_row: &RawRow) -> ColumnMap {
        let headers: &[String] = header_row
            .cells
            .get(HEADER_CELL_OFFSET..)
            .unwrap_or(&[]);

        let mut fields = HashMap::new();
        for spec in section_layout(kind) {
            let found = spec
                .candidates
                .iter()
                .find_map(|cand| get_column_index(headers, cand));
            let index = match found {
                Some(i) => ColumnIndex::At(i + HEADER_CELL_OFFSET),
                None => ColumnIndex::Absent,
            };
            fields.insert(spec.field, index);
        }
        ColumnMap { kind, source: HeaderSource::Header, fields }
    }

    /// The static layout assumed for headerless sections. None for sections
    /// that cannot be read positionally.
    pub fn positional(kind: SectionKind) -> Option<ColumnMap> {
        if !has_positional_fallback(kind) {
            return None;
        }
        let fields = section_layout(kind)
            .iter()
            .map(|spec| (spec.field, spec.fallback))
            .collect();
        Some(ColumnMap { kind, source: HeaderSource::Positional, fields })
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn source(&self) -> HeaderSource {
        self.source
    }

    pub fn get(&self, field: &str) -> ColumnIndex {
        self.fields.get(field).copied().unwrap_or(ColumnIndex::Absent)
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field) != ColumnIndex::Absent
    }

    /// Whether every required field of the section resolved.
    pub fn has_required_fields(&self) -> bool {
        section_layout(self.kind)
            .iter()
            .filter(|spec| spec.required)
            .all(|spec| self.has(spec.field))
    }

    /// Required fields that did not resolve, for diagnostics.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        section_layout(self.kind)
            .iter()
            .filter(|spec| spec.required && !self.has(spec.field))
            .map(|spec| spec.field)
            .collect()
    }
}

pub fn is_header_row(kind: SectionKind, row: &RawRow) -> bool {
    row.section_token() == kind.sentinel() && row.marker() == HEADER_MARKER
}

pub struct ResolvedHeader {
    pub map: ColumnMap,
    /// Position of the header row within the segment. None when positional.
    pub header_row: Option<usize>,
}

impl ResolvedHeader {
    /// Index into the segment's rows where data rows begin.
    pub fn data_start(&self) -> usize {
        self.header_row.map(|i| i + 1).unwrap_or(0)
    }
}

/// Finds the header for a segment, or falls back to the positional layout.
/// None if the segment has neither.
pub fn resolve_header(segment: &Segment) -> Option<ResolvedHeader> {
    let kind = segment.kind;
    let header_pos = segment
        .rows
        .iter()
        .take(HEADER_SCAN_LIMIT)
        .position(|row| is_header_row(kind, row));

    match header_pos {
        Some(pos) => {
            let map = ColumnMap::from_header_row(kind, &segment.rows[pos]);
            debug!("{}: header on line {}", kind, segment.rows[pos].line);
            Some(ResolvedHeader { map, header_row: Some(pos) })
        }
        None => {
            debug!("{}: no header row, trying positional layout", kind);
            ColumnMap::positional(kind)
                .map(|map| ResolvedHeader { map, header_row: None })
        }
    }
}
