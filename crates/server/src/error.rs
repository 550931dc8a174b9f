use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use db::collection::{CollectionError, ErrorKind, QueryResult};
use thiserror::Error;
use tracing::warn;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Collection(#[from] CollectionError),
    /// A fetch that came back tagged with an error.
    #[error("{message}")]
    Fetch { kind: ErrorKind, message: String },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Collection(e) => e.kind(),
            Self::Fetch { kind, .. } => *kind,
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RemoteUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            warn!(kind = %kind, error = %self, "Request failed");
        }
        (status, ResponseJson(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

/// Rows of a finished fetch, or its tagged error.
pub fn rows_or_error<T>(result: QueryResult<T>) -> Result<Vec<T>, ApiError> {
    match result.error {
        Some(kind) => Err(ApiError::Fetch {
            kind,
            message: result.error_message.unwrap_or_else(|| kind.to_string()),
        }),
        None => Ok(result.rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::RemoteUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_tagged_result_becomes_error() {
        let result: QueryResult<()> =
            QueryResult::failed(&CollectionError::Unavailable("pool closed".into()));
        let err = rows_or_error(result).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
        assert!(err.to_string().contains("pool closed"));
    }
}
