//! Export of case logs to CSV, PDF and JSON.

mod csv;
mod pdf;

pub use self::csv::*;
pub use self::pdf::*;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EXPORT_FILE_PREFIX;
use crate::models::CaseRecord;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PDF generation error: {0}")]
    Pdf(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Json,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }
}

/// File name for an export made on `date`, e.g. `ot-case-log-export-2024-06-01.csv`.
pub fn export_file_name(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{}-{}.{}",
        EXPORT_FILE_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// A snapshot of case records prepared for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseLogExport {
    /// Day the export was made; appears in titles and file names
    pub export_date: NaiveDate,
    pub cases: Vec<CaseRecord>,
}

impl CaseLogExport {
    /// Snapshot records, dated today in local time.
    pub fn new(records: &[CaseRecord]) -> Self {
        Self::with_date(records, Local::now().date_naive())
    }

    /// Snapshot records with an explicit export date.
    pub fn with_date(records: &[CaseRecord], export_date: NaiveDate) -> Self {
        Self {
            export_date,
            cases: records.to_vec(),
        }
    }

    /// Suggested file name for this export.
    pub fn file_name(&self, format: ExportFormat) -> String {
        export_file_name(self.export_date, format)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        cases_to_csv(&self.cases)
    }

    /// Render the case table as an A4 PDF.
    pub fn to_pdf(&self) -> ExportResult<Vec<u8>> {
        let bytes = render_case_table_pdf(&self.cases, self.export_date)?;
        tracing::info!(
            cases = self.cases.len(),
            bytes = bytes.len(),
            "PDF export rendered"
        );
        Ok(bytes)
    }

    /// Render in the requested format.
    pub fn render(&self, format: ExportFormat) -> ExportResult<Vec<u8>> {
        match format {
            ExportFormat::Csv => Ok(self.to_csv().into_bytes()),
            ExportFormat::Pdf => self.to_pdf(),
            ExportFormat::Json => Ok(self.to_json()?.into_bytes()),
        }
    }
}
