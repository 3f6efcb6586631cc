mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::{TrackedGraph, VacuumReport};
use miette::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for tracker and vacuum results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    /// Report a ranked dependency graph
    pub fn report_tracked(&self, tracked: &TrackedGraph) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new().report_tracked(tracked),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report_tracked(tracked),
        }
    }

    /// Report archive usage
    pub fn report_vacuum(&self, report: &VacuumReport, removable_only: bool) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new()
                .removable_only(removable_only)
                .report_vacuum(report),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report_vacuum(report, removable_only),
        }
    }
}
