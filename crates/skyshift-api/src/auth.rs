use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::ApiError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// The claims a bearer token carries: subject (username) and a Unix
/// timestamp expiry, per §4.3's "token decodes to a username; `exp` is
/// checked".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn b64_decode(s: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s).ok()
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    b64(&mac.finalize().into_bytes())
}

/// Issues a compact `<payload>.<signature>` token, both base64url-encoded,
/// for `sub` valid until `exp` (Unix seconds).
pub fn issue_token(secret: &str, sub: &str, exp: i64) -> String {
    let claims = Claims { sub: sub.to_string(), exp };
    let payload = b64(&serde_json::to_vec(&claims).expect("Claims always serializes"));
    let signature = sign(secret, &payload);
    format!("{payload}.{signature}")
}

/// Verifies a token's signature and expiry, returning its claims. Signature
/// comparison runs through `Mac::verify_slice`, which is constant-time in
/// the tag length, rather than a `==` on the encoded strings.
pub fn verify_token(secret: &str, token: &str, now: i64) -> Result<Claims, ApiError> {
    let (payload, signature) = token.split_once('.').ok_or(ApiError::Unauthenticated)?;
    let signature_bytes = b64_decode(signature).ok_or(ApiError::Unauthenticated)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature_bytes).map_err(|_| ApiError::Unauthenticated)?;
    let bytes = b64_decode(payload).ok_or(ApiError::Unauthenticated)?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| ApiError::Unauthenticated)?;
    if claims.exp < now {
        return Err(ApiError::TokenExpired);
    }
    Ok(claims)
}

/// Pulls the bearer token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// `axum::middleware::from_fn_with_state` layer: verifies the bearer
/// token on every request and inserts the decoded [`Claims`] as a request
/// extension for handlers (and [`crate::authz`]) to read, per §4.3.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)?;
    let claims = verify_token(&state.config.api_server.secret, token, now_unix())?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_valid_token() {
        let token = issue_token("secret", "alice", 1_000);
        let claims = verify_token("secret", &token, 500).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn rejects_expired_token() {
        let token = issue_token("secret", "alice", 100);
        let err = verify_token("secret", &token, 500).unwrap_err();
        assert!(matches!(err, ApiError::TokenExpired));
    }

    #[test]
    fn rejects_tampered_signature() {
        let token = issue_token("secret", "alice", 1_000);
        let tampered = format!("{}x", token);
        let err = verify_token("secret", &tampered, 500).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }
}
