//! Part List Handlers
//!
//! Upload, run control, status polling and export of the loaded part list.

use std::path::Path;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use partscout_models::{EnrichedRecord, LifecycleClass, RowStatus, RunState};
use partscout_processor::ProcessorSnapshot;
use partscout_utils::{default_export_filename, PartScoutError, SheetExporter, SheetFormat, SheetParser};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub filename: String,
    pub format: String,
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub index: usize,
    pub part: String,
    pub website: String,
    pub link: String,
    pub lifecycle: String,
    pub lifecycle_class: LifecycleClass,
    pub datasheet: String,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RowView {
    fn new(index: usize, record: EnrichedRecord) -> Self {
        let lifecycle_class = record.lifecycle_class();
        Self {
            index,
            part: record.part,
            website: record.website,
            link: record.link,
            lifecycle: record.lifecycle,
            lifecycle_class,
            datasheet: record.datasheet,
            status: record.status,
            error_detail: record.error_detail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub current: usize,
    pub total: usize,
    pub percent: u8,
}

/// Snapshot of the processor as seen by clients
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub run_state: RunState,
    pub progress: ProgressView,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub done: bool,
    pub exportable: bool,
    pub rows: Vec<RowView>,
}

impl From<ProcessorSnapshot> for StatusResponse {
    fn from(snapshot: ProcessorSnapshot) -> Self {
        let total = snapshot.total();
        let exportable = snapshot.done && snapshot.run_state == RunState::Idle;
        Self {
            run_state: snapshot.run_state,
            progress: ProgressView {
                current: snapshot.progress.current,
                total: snapshot.progress.total,
                percent: snapshot.progress.percent(),
            },
            total,
            completed: snapshot.completed,
            failed: snapshot.failed,
            done: snapshot.done,
            exportable,
            rows: snapshot
                .records
                .into_iter()
                .enumerate()
                .map(|(index, record)| RowView::new(index, record))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub started: bool,
    #[serde(flatten)]
    pub status: StatusResponse,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub was_running: bool,
    #[serde(flatten)]
    pub status: StatusResponse,
}

#[derive(Debug, Serialize)]
pub struct SavedExportResponse {
    pub path: String,
    pub rows: usize,
}

/// Upload a part list workbook and load it into the processor
///
/// POST /api/v1/parts/upload
pub async fn upload_parts(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| PartScoutError::read(format!("Failed to read upload: {}", e)))?
        .ok_or_else(|| PartScoutError::read("No file provided"))?;

    let filename = field
        .file_name()
        .map(|s| s.to_string())
        .ok_or_else(|| PartScoutError::read("Upload has no file name"))?;

    let format = SheetFormat::from_extension(Path::new(&filename)).ok_or_else(|| {
        PartScoutError::read(format!(
            "Unsupported file type '{}': expected .xlsx or .xls",
            filename
        ))
    })?;

    let data = field
        .bytes()
        .await
        .map_err(|e| PartScoutError::read(format!("Failed to read file data: {}", e)))?;

    let import = SheetParser::new().parse_bytes(&filename, &data, Some(format))?;
    let loaded_rows = state.processor.load_if_idle(import.records).await?;
    state.metrics.record_upload();

    info!(upload_id = %import.id, %filename, loaded_rows, "Part list uploaded");

    Ok(Json(UploadResponse {
        upload_id: import.id,
        filename: import.filename,
        format: import.format.as_str().to_string(),
        total_rows: import.total_rows,
        loaded_rows,
        skipped_rows: import.skipped_rows,
    }))
}

/// Start or resume processing
///
/// POST /api/v1/parts/start
pub async fn start_run(State(state): State<AppState>) -> (StatusCode, Json<StartResponse>) {
    // The run task is detached; progress is observed through polling and events
    let started = state.processor.start().await.is_some();
    let status = state.processor.snapshot().await.into();
    (StatusCode::ACCEPTED, Json(StartResponse { started, status }))
}

/// Request the run to stop after the in-flight row
///
/// POST /api/v1/parts/stop
pub async fn stop_run(State(state): State<AppState>) -> Json<StopResponse> {
    let was_running = state.processor.stop().await;
    let status = state.processor.snapshot().await.into();
    Json(StopResponse { was_running, status })
}

/// Clear the loaded list
///
/// DELETE /api/v1/parts
pub async fn clear_parts(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    state.processor.reset_if_idle().await?;
    Ok(Json(state.processor.snapshot().await.into()))
}

/// GET /api/v1/parts
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.processor.snapshot().await.into())
}

/// Download the results workbook
///
/// GET /api/v1/parts/export
pub async fn export_results(State(state): State<AppState>) -> ApiResult<Response> {
    let records = exportable_records(&state).await?;
    let bytes = SheetExporter::new().export_bytes(&records)?;
    let filename = default_export_filename();

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Write the results workbook into the configured output directory
///
/// POST /api/v1/parts/export
pub async fn save_results(State(state): State<AppState>) -> ApiResult<Json<SavedExportResponse>> {
    let records = exportable_records(&state).await?;
    let dir = Path::new(&state.config.export.output_dir);
    let path = SheetExporter::new().export_to_path(&records, dir)?;

    info!(path = %path.display(), rows = records.len(), "Results saved");

    Ok(Json(SavedExportResponse {
        path: path.display().to_string(),
        rows: records.len(),
    }))
}

async fn exportable_records(state: &AppState) -> ApiResult<Vec<EnrichedRecord>> {
    let snapshot = state.processor.snapshot().await;
    if snapshot.run_state == RunState::Running || !snapshot.done {
        return Err(PartScoutError::conflict("Results are available once every row has been processed").into());
    }
    Ok(snapshot.records)
}
