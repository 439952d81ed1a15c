use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use partscout_utils::{ErrorResponse, PartScoutError};
use tracing::error;

/// Handler error rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub PartScoutError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<PartScoutError> for ApiError {
    fn from(error: PartScoutError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}
