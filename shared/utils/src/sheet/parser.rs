//! Part List Parser
//!
//! Reads the first sheet of an Excel workbook and resolves the part and
//! website columns through alias lists.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_from_rs, DataType, Range, Reader, Xls, Xlsx};
use partscout_models::PartRecord;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PartScoutError, PartScoutResult};

const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Supported workbook formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx, // OOXML
    Xls,  // OLE2
}

impl SheetFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Detect format from the container signature
    pub fn from_magic(data: &[u8]) -> Option<Self> {
        if data.starts_with(XLSX_MAGIC) {
            Some(Self::Xlsx)
        } else if data.starts_with(XLS_MAGIC) {
            Some(Self::Xls)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        }
    }
}

/// Result of importing one workbook
#[derive(Debug, Clone)]
pub struct SheetImport {
    pub id: Uuid,
    pub filename: String,
    pub format: SheetFormat,
    pub records: Vec<PartRecord>,
    /// Non-blank data rows seen below the header
    pub total_rows: usize,
    /// Rows dropped because the part or website was empty
    pub skipped_rows: usize,
}

/// Main part list parser
pub struct SheetParser {
    part_columns: Vec<String>,
    website_columns: Vec<String>,
}

impl Default for SheetParser {
    fn default() -> Self {
        Self {
            part_columns: vec![
                "part".to_string(),
                "part number".to_string(),
                "part_number".to_string(),
                "part no".to_string(),
            ],
            website_columns: vec![
                "website".to_string(),
                "websit".to_string(),
                "web site".to_string(),
            ],
        }
    }
}

impl SheetParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a workbook from bytes
    pub fn parse_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<SheetFormat>,
    ) -> PartScoutResult<SheetImport> {
        let format = format
            .or_else(|| SheetFormat::from_extension(Path::new(filename)))
            .or_else(|| SheetFormat::from_magic(data))
            .ok_or_else(|| PartScoutError::read(format!("Could not determine file format of '{}'", filename)))?;

        let range = match format {
            SheetFormat::Xlsx => {
                let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
                    .map_err(calamine::Error::from)?;
                first_sheet(&mut workbook)?
            }
            SheetFormat::Xls => {
                let mut workbook: Xls<_> = open_workbook_from_rs(Cursor::new(data))
                    .map_err(calamine::Error::from)?;
                first_sheet(&mut workbook)?
            }
        };

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
        let (records, total_rows, skipped_rows) = self.map_rows(rows)?;

        info!(
            filename,
            format = format.as_str(),
            loaded = records.len(),
            skipped = skipped_rows,
            "Imported part list"
        );

        Ok(SheetImport {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            format,
            records,
            total_rows,
            skipped_rows,
        })
    }

    /// Map header + data rows to part records. Returns (records, total, skipped).
    fn map_rows<I>(&self, rows: I) -> PartScoutResult<(Vec<PartRecord>, usize, usize)>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut rows = rows.into_iter();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(PartScoutError::no_valid_rows)?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let part_indices = alias_indices(&headers, &self.part_columns);
        let website_indices = alias_indices(&headers, &self.website_columns);
        debug!(?headers, ?part_indices, ?website_indices, "Resolved header columns");

        let mut records = Vec::new();
        let mut total = 0;
        let mut skipped = 0;

        for row in rows {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            total += 1;

            let part = first_populated(&row, &part_indices);
            let website = first_populated(&row, &website_indices);
            match (part, website) {
                (Some(part), Some(website)) => records.push(PartRecord::new(part, website)),
                _ => skipped += 1,
            }
        }

        if records.is_empty() {
            return Err(PartScoutError::no_valid_rows());
        }

        Ok((records, total, skipped))
    }
}

fn first_sheet<RS, R>(workbook: &mut R) -> PartScoutResult<Range<DataType>>
where
    RS: Read + Seek,
    R: Reader<RS>,
{
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PartScoutError::read("No sheets found in workbook"))?
        .map_err(|e| PartScoutError::read(format!("Failed to read worksheet: {:?}", e)))
}

fn cell_text(cell: &DataType) -> String {
    cell.to_string().trim().to_string()
}

/// Column indices for the given aliases, in alias priority order.
fn alias_indices(headers: &[String], aliases: &[String]) -> Vec<usize> {
    aliases
        .iter()
        .flat_map(|alias| {
            headers
                .iter()
                .enumerate()
                .filter(move |(_, header)| *header == alias)
                .map(|(idx, _)| idx)
        })
        .collect()
}

fn first_populated(row: &[String], indices: &[usize]) -> Option<String> {
    indices
        .iter()
        .filter_map(|&idx| row.get(idx))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
