use crate::statement::{model::SectionKind, render::RenderTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputType {
    Summary,
    Diagnostics,
    Records(SectionKind),
    TaxSummary,
}

impl OutputType {
    pub fn title(&self, name: &str) -> String {
        match self {
            OutputType::Summary => format!("Statement Summary for {}", name),
            OutputType::Diagnostics => "Diagnostics".to_string(),
            OutputType::Records(kind) => kind.to_string(),
            OutputType::TaxSummary => format!("Tax Summary {}", name),
        }
    }

    /// File name (or sheet name) without an extension.
    pub fn file_stem(&self) -> String {
        match self {
            OutputType::Summary => "summary".to_string(),
            OutputType::Diagnostics => "diagnostics".to_string(),
            OutputType::Records(kind) => kind.sentinel().to_lowercase().replace(' ', "-"),
            OutputType::TaxSummary => "tax-summary".to_string(),
        }
    }
}

pub type Error = String;

pub trait ReportWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error>;

    fn finish(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
