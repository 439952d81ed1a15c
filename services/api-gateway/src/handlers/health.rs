use axum::{extract::State, response::Json};
use partscout_models::RowStatus;
use serde_json::{json, Value};

use crate::AppState;

pub async fn detailed_health_check(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.processor.snapshot().await;

    let enrichment_status = if state.config.enrichment.has_api_key() {
        json!({"status": "healthy", "message": "API key configured", "model": state.config.enrichment.model})
    } else {
        json!({"status": "unhealthy", "message": "No API key configured", "model": state.config.enrichment.model})
    };

    let mut health_status = json!({
        "status": "healthy",
        "service": "partscout-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "enrichment": enrichment_status,
        },
        "processor": {
            "run_state": snapshot.run_state,
            "rows": snapshot.total(),
            "done": snapshot.done,
            "rows_completed_total": state.metrics.rows_total(RowStatus::Completed),
            "rows_failed_total": state.metrics.rows_total(RowStatus::Failed),
        }
    });

    // Without a key every row would fail
    if health_status["checks"]["enrichment"]["status"] != "healthy" {
        health_status["status"] = json!("degraded");
    }

    Json(health_status)
}
