use std::fmt::Display;

use serde::Serialize;

use super::model::SectionKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub section: Option<SectionKind>,
    pub message: String,
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, section: Option<SectionKind>, message: String) -> Diagnostic {
        Diagnostic { severity, section, message, detail: None }
    }

    pub fn error(section: Option<SectionKind>, message: String) -> Diagnostic {
        Diagnostic::new(Severity::Error, section, message)
    }

    pub fn warning(section: Option<SectionKind>, message: String) -> Diagnostic {
        Diagnostic::new(Severity::Warning, section, message)
    }

    pub fn info(section: Option<SectionKind>, message: String) -> Diagnostic {
        Diagnostic::new(Severity::Info, section, message)
    }

    pub fn with_detail(mut self, detail: String) -> Diagnostic {
        self.detail = Some(detail);
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(section) = self.section {
            write!(f, " [{}]", section)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Diagnostics in the order they were raised.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics(Vec::new())
    }

    pub fn push(&mut self, d: Diagnostic) {
        self.0.push(d);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.0.iter().filter(|d| d.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn for_section(&self, kind: SectionKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.section == Some(kind))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(v: Vec<Diagnostic>) -> Self {
        Diagnostics(v)
    }
}

#[cfg(test)]
mod tests {
    use crate::statement::model::SectionKind;

    use super::{Diagnostic, Diagnostics, Severity};

    #[test]
    fn test_display() {
        let d = Diagnostic::warning(
            Some(SectionKind::Dividends),
            "no header row, using positional layout".to_string(),
        );
        assert_eq!(
            d.to_string(),
            "WARNING [Dividends]: no header row, using positional layout"
        );
        let d = Diagnostic::error(None, "NAV mismatch".to_string())
            .with_detail("off by 3.00".to_string());
        assert_eq!(d.to_string(), "ERROR: NAV mismatch (off by 3.00)");
    }

    #[test]
    fn test_counts() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::info(Some(SectionKind::Trades), "a".to_string()));
        diags.push(Diagnostic::warning(Some(SectionKind::Fees), "b".to_string()));
        let mut more = Diagnostics::new();
        more.push(Diagnostic::error(None, "c".to_string()));
        diags.extend(more);

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(Severity::Info), 1);
        assert_eq!(diags.count(Severity::Error), 1);
        assert!(diags.has_errors());
        assert_eq!(diags.for_section(SectionKind::Fees).count(), 1);
    }

    #[test]
    fn test_serialize() {
        let d = Diagnostic::info(Some(SectionKind::WithholdingTax), "x".to_string());
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(
            json,
            r#"{"severity":"INFO","section":"Withholding Tax","message":"x","detail":null}"#
        );
    }
}
