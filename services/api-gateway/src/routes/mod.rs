use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/detailed", get(detailed_health_check))
        .nest("/parts", part_routes())
}

fn part_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_status).delete(clear_parts))
        .route("/upload", post(upload_parts))
        .route("/start", post(start_run))
        .route("/stop", post(stop_run))
        .route("/export", get(export_results).post(save_results))
}
