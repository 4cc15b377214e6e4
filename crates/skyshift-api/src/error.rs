use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use snafu::Snafu;

use skyshift_store::StoreError;
use skyshift_types::ValidationError;

/// The HTTP-facing error taxonomy, one variant per class in the error
/// handling design: validation is always 400, conflicts are always 409,
/// and so on. Every handler returns this type so the mapping to a status
/// code lives in exactly one place.
#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(display("{source}"))]
    Validation { source: ValidationError },

    #[snafu(display("unsupported Content-Type: {content_type}"))]
    UnsupportedContentType { content_type: String },

    #[snafu(display("invalid request body: {message}"))]
    Malformed { message: String },

    #[snafu(display("object '{key}' already exists"))]
    AlreadyExists { key: String },

    #[snafu(display("object '{key}' not found"))]
    NotFound { key: String },

    #[snafu(display("namespace '{namespace}' does not exist"))]
    NoSuchNamespace { namespace: String },

    #[snafu(display("resource_version conflict: expected {expected}, store has {actual}"))]
    Conflict { expected: i64, actual: i64 },

    #[snafu(display("update requires metadata.resource_version while the server runs in strict_updates mode"))]
    MissingRevision,

    #[snafu(display("missing or invalid bearer token"))]
    Unauthenticated,

    #[snafu(display("token expired"))]
    TokenExpired,

    #[snafu(display("no role grants this action"))]
    Forbidden,

    #[snafu(display("unknown kind '{kind}'"))]
    UnknownKind { kind: String },
}

impl From<ValidationError> for ApiError {
    fn from(source: ValidationError) -> Self {
        ApiError::Validation { source }
    }
}

impl From<StoreError> for ApiError {
    fn from(source: StoreError) -> Self {
        match source {
            StoreError::NotFound { key } => ApiError::NotFound { key },
            StoreError::Conflict { expected, actual, .. } => ApiError::Conflict { expected, actual },
            StoreError::Codec { key, .. } => ApiError::Malformed { message: format!("stored value for '{key}' is corrupt") },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::UnsupportedContentType { .. }
            | ApiError::Malformed { .. }
            | ApiError::AlreadyExists { .. }
            | ApiError::NoSuchNamespace { .. }
            | ApiError::MissingRevision
            | ApiError::UnknownKind { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthenticated | ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(%status, error = %self, "request failed");
        (status, axum::Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}
