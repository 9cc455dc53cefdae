use tracing::debug;

use crate::statement::model::SectionKind;

use super::raw::RawRow;

/// The rows belonging to one section, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub kind: SectionKind,
    pub rows: Vec<RawRow>,
}

/// The statement partitioned into segments. Each raw row lands in at most
/// one segment.
#[derive(Debug, Default)]
pub struct Sections {
    segments: Vec<Segment>,
    /// Rows seen before any known section started.
    pub noise_rows: usize,
}

impl Sections {
    /// Segments in the order their sections were first seen.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, kind: SectionKind) -> Option<&Segment> {
        self.segments.iter().find(|s| s.kind == kind)
    }

    fn segment_mut(&mut self, kind: SectionKind) -> &mut Segment {
        let pos = match self.segments.iter().position(|s| s.kind == kind) {
            Some(pos) => pos,
            None => {
                self.segments.push(Segment { kind, rows: Vec::new() });
                self.segments.len() - 1
            }
        };
        &mut self.segments[pos]
    }
}

/// Partitions rows by section sentinel.
///
/// A row whose first cell is a known sentinel opens (or re-opens) that
/// section. Any other row, blank or not, stays with whichever section is
/// open. Unregistered sections in the export therefore trail along inside
/// the preceding segment, and the extractors filter them out by sentinel.
pub fn locate(rows: Vec<RawRow>) -> Sections {
    let mut sections = Sections::default();
    let mut current: Option<SectionKind> = None;

    for row in rows {
        if let Some(kind) = SectionKind::from_sentinel(row.section_token()) {
            if current != Some(kind) {
                debug!("Line {}: entering section {}", row.line, kind);
            }
            current = Some(kind);
        }

        match current {
            Some(kind) => sections.segment_mut(kind).rows.push(row),
            None => sections.noise_rows += 1,
        }
    }

    sections
}
