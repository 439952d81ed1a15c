//! Upload, enrich and export a small workbook through the public APIs.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};
use partscout_enrichment::{EnrichmentClient, EnrichmentError};
use partscout_models::{EnrichmentResult, RowStatus};
use partscout_processor::{RowProcessor, RunOutcome};
use partscout_utils::{SheetExporter, SheetParser, EXPORT_HEADERS};
use rust_xlsxwriter::Workbook;

struct StubClient;

#[async_trait]
impl EnrichmentClient for StubClient {
    async fn enrich(&self, part: &str, website: &str) -> Result<EnrichmentResult, EnrichmentError> {
        Ok(EnrichmentResult {
            link: format!("https://{}/{}", website, part.to_lowercase()),
            lifecycle: "Active".to_string(),
            datasheet: format!("https://{}/{}.pdf", website, part.to_lowercase()),
        })
    }
}

fn upload_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Part").unwrap();
    sheet.write_string(0, 1, "Website").unwrap();
    sheet.write_string(1, 0, "ABC123").unwrap();
    sheet.write_string(1, 1, "vendor.com").unwrap();
    // Blank part: dropped at import
    sheet.write_string(2, 1, "vendor2.com").unwrap();
    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn test_upload_enrich_export() {
    let import = SheetParser::new()
        .parse_bytes("parts.xlsx", &upload_workbook(), None)
        .unwrap();
    assert_eq!(import.records.len(), 1);
    assert_eq!(import.skipped_rows, 1);

    let processor = RowProcessor::new(Arc::new(StubClient));
    assert_eq!(processor.load(import.records).await.unwrap(), 1);

    let handle = processor.start().await.unwrap();
    let summary = handle.await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert!(processor.is_done().await);

    let records = processor.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.status, RowStatus::Completed);
    assert_eq!(record.part, "ABC123");
    assert_eq!(record.website, "vendor.com");
    assert_eq!(record.link, "https://vendor.com/abc123");
    assert_eq!(record.lifecycle, "Active");
    assert_eq!(record.datasheet, "https://vendor.com/abc123.pdf");

    let bytes = SheetExporter::new().export_bytes(&records).unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range_at(0).unwrap().unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(DataType::to_string).collect())
        .collect();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], EXPORT_HEADERS.map(String::from).to_vec());
    assert_eq!(
        rows[1],
        vec![
            "ABC123",
            "vendor.com",
            "https://vendor.com/abc123",
            "Active",
            "https://vendor.com/abc123.pdf",
        ]
    );
}
