//! Spreadsheet Import/Export Module
//!
//! Reads part lists from Excel workbooks (XLSX/XLS) and writes enriched
//! results back to XLSX.

pub mod parser;
pub mod exporter;

pub use parser::{SheetParser, SheetFormat, SheetImport};
pub use exporter::{SheetExporter, EXPORT_HEADERS, EXPORT_SHEET_NAME, export_filename, default_export_filename};
