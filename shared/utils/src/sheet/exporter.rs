//! Result Exporter
//!
//! Writes enriched rows back to an xlsx workbook.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use partscout_models::EnrichedRecord;
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::PartScoutResult;

/// Column headers of the exported sheet, in order.
pub const EXPORT_HEADERS: [&str; 5] = ["Part", "Website", "Link", "Lifecycle", "Datasheet"];

pub const EXPORT_SHEET_NAME: &str = "Results";

const EXPORT_FILE_PREFIX: &str = "Part_Analysis";

/// `Part_Analysis_<YYYY-MM-DD>.xlsx`
pub fn export_filename(date: NaiveDate) -> String {
    format!("{}_{}.xlsx", EXPORT_FILE_PREFIX, date.format("%Y-%m-%d"))
}

pub fn default_export_filename() -> String {
    export_filename(Utc::now().date_naive())
}

#[derive(Debug, Default)]
pub struct SheetExporter;

impl SheetExporter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize records to an in-memory xlsx workbook.
    pub fn export_bytes(&self, records: &[EnrichedRecord]) -> PartScoutResult<Vec<u8>> {
        let mut workbook = self.build_workbook(records)?;
        let bytes = workbook.save_to_buffer()?;
        info!(rows = records.len(), bytes = bytes.len(), "Exported results workbook");
        Ok(bytes)
    }

    /// Write records to `dir` under the dated export filename.
    pub fn export_to_path(&self, records: &[EnrichedRecord], dir: &Path) -> PartScoutResult<PathBuf> {
        let path = dir.join(default_export_filename());
        let mut workbook = self.build_workbook(records)?;
        workbook.save(&path)?;
        info!(rows = records.len(), path = %path.display(), "Saved results workbook");
        Ok(path)
    }

    fn build_workbook(&self, records: &[EnrichedRecord]) -> PartScoutResult<Workbook> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(EXPORT_SHEET_NAME)?;

        for (col, header) in EXPORT_HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (idx, record) in records.iter().enumerate() {
            let row = (idx + 1) as u32;
            let values = [
                &record.part,
                &record.website,
                &record.link,
                &record.lifecycle,
                &record.datasheet,
            ];
            for (col, value) in values.iter().enumerate() {
                worksheet.write_string(row, col as u16, value.as_str())?;
            }
        }

        Ok(workbook)
    }
}
