use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Yaml,
}

/// Content negotiation for create/update bodies: only `application/json`
/// and `application/yaml` are accepted, anything else is a 400 (§4.3, §6).
pub fn negotiate(headers: &HeaderMap) -> Result<BodyFormat, ApiError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");
    // Strip a trailing `; charset=...` parameter before matching.
    let mime = content_type.split(';').next().unwrap_or(content_type).trim();
    match mime {
        "application/json" => Ok(BodyFormat::Json),
        "application/yaml" | "application/x-yaml" | "text/yaml" => Ok(BodyFormat::Yaml),
        other => Err(ApiError::UnsupportedContentType { content_type: other.to_string() }),
    }
}

pub fn decode<T: DeserializeOwned>(format: BodyFormat, body: &Bytes) -> Result<T, ApiError> {
    match format {
        BodyFormat::Json => serde_json::from_slice(body).map_err(|e| ApiError::Malformed { message: e.to_string() }),
        BodyFormat::Yaml => serde_yaml::from_slice(body).map_err(|e| ApiError::Malformed { message: e.to_string() }),
    }
}

/// Encodes a response body in the same format the request used, so a YAML
/// `POST` gets a YAML object back. Falls back to JSON when no
/// `Content-Type` was given, matching `negotiate`'s default.
pub fn encode<T: Serialize>(format: BodyFormat, value: &T) -> (&'static str, Vec<u8>) {
    match format {
        BodyFormat::Json => ("application/json", serde_json::to_vec(value).expect("value always serializes")),
        BodyFormat::Yaml => (
            "application/yaml",
            serde_yaml::to_string(value).expect("value always serializes").into_bytes(),
        ),
    }
}
