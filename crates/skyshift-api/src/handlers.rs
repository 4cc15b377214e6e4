//! One generic handler set per verb, parameterized over `T: KindObject`,
//! instead of a hand-written function per kind — the Rust expression of
//! §9's "uniform CRUD+watch surface" design note. [`crate::routes`]
//! instantiates each of these once per concrete kind type.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use skyshift_store::Entry;
use skyshift_types::{Kind, KindObject, Validate, ValidationError, WatchEvent};

use crate::auth::Claims;
use crate::authz::authorize;
use crate::content::{decode, encode, negotiate};
use crate::error::ApiError;
use crate::keys;
use crate::AppState;

#[derive(Debug, Default, serde::Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub watch: bool,
    #[serde(default)]
    pub all_namespaces: bool,
}

fn namespace_param(params: &HashMap<String, String>) -> Option<String> {
    params.get("namespace").cloned()
}

fn name_param(params: &HashMap<String, String>) -> String {
    params
        .get("name")
        .cloned()
        .expect("route registration always supplies a {name} path parameter here")
}

async fn namespace_exists(state: &AppState, namespace: &str) -> bool {
    state.store.get(&keys::object_key(Kind::Namespace, None, namespace)).await.is_some()
}

fn stamp_revision<T: KindObject>(mut object: T, revision: i64) -> T {
    object.metadata_mut().resource_version = revision;
    object
}

fn decode_entry<T: DeserializeOwned + KindObject>(entry: &Entry) -> Result<T, ApiError> {
    let object: T =
        serde_json::from_value(entry.value.clone()).map_err(|e| ApiError::Malformed { message: e.to_string() })?;
    Ok(stamp_revision(object, entry.revision))
}

/// `POST /<K>` for cluster-scoped kinds, `POST /<namespace>/<K>` for
/// namespaced kinds (§4.3).
pub async fn create<T>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(params): Path<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError>
where
    T: KindObject + Serialize + DeserializeOwned,
{
    let namespace = namespace_param(&params);
    authorize(&state, &claims.sub, T::KIND, "create", namespace.as_deref()).await?;

    let format = negotiate(&headers)?;
    let mut object: T = decode(format, &body)?;
    if T::KIND.namespaced() {
        let ns = namespace.clone().ok_or(ValidationError::MissingNamespace)?;
        object.metadata_mut().namespace = Some(ns);
    }
    object.validate()?;

    let object_namespace = object.metadata().namespace.clone();
    if T::KIND.namespaced() {
        let ns = object_namespace.as_deref().ok_or(ValidationError::MissingNamespace)?;
        if !namespace_exists(&state, ns).await {
            return Err(ApiError::NoSuchNamespace { namespace: ns.to_string() });
        }
    }

    let key = keys::object_key(T::KIND, object_namespace.as_deref(), &object.metadata().name);
    if state.store.get(&key).await.is_some() {
        return Err(ApiError::AlreadyExists { key });
    }

    if let Some(conflict_key) = object.conflict_key() {
        let siblings = state.store.range(&keys::prefix(T::KIND, object_namespace.as_deref())).await;
        for entry in &siblings {
            let existing: T = decode_entry(entry)?;
            if existing.conflict_key().as_deref() == Some(conflict_key.as_str()) {
                return Err(ApiError::AlreadyExists { key: entry.key.clone() });
            }
        }
    }

    let value = serde_json::to_value(&object).map_err(|e| ApiError::Malformed { message: e.to_string() })?;
    let entry = state.store.put(&key, value).await?;
    let created = stamp_revision(object, entry.revision);

    let (content_type, bytes) = encode(format, &created);
    Ok(([(axum::http::header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// `GET /<K>` (cluster-scoped kinds, or namespaced kinds with
/// `?all_namespaces=true`), `GET /<namespace>/<K>`, or either with
/// `?watch=true` (§4.3).
pub async fn list<T>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError>
where
    T: KindObject + Serialize + DeserializeOwned,
{
    let namespace = namespace_param(&params);
    let effective_namespace = if T::KIND.namespaced() {
        if query.all_namespaces {
            None
        } else {
            Some(namespace.clone().ok_or(ValidationError::MissingNamespace)?)
        }
    } else {
        None
    };
    authorize(&state, &claims.sub, T::KIND, "get", effective_namespace.as_deref()).await?;

    let prefix = keys::prefix(T::KIND, effective_namespace.as_deref());

    if query.watch {
        return Ok(watch_response::<T>(&state, prefix, None));
    }

    let entries = state.store.range(&prefix).await;
    let mut objects = Vec::with_capacity(entries.len());
    for entry in &entries {
        objects.push(decode_entry::<T>(entry)?);
    }
    Ok(axum::Json(T::into_list(objects)).into_response())
}

/// `GET /<K>/<name>`, `GET /<namespace>/<K>/<name>`, or either with
/// `?watch=true` (§4.3).
pub async fn get<T>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError>
where
    T: KindObject + Serialize + DeserializeOwned,
{
    let namespace = namespace_param(&params);
    let name = name_param(&params);
    authorize(&state, &claims.sub, T::KIND, "get", namespace.as_deref()).await?;

    let key = keys::object_key(T::KIND, namespace.as_deref(), &name);

    if query.watch {
        return Ok(watch_response::<T>(&state, String::new(), Some(key)));
    }

    let entry = state.store.get(&key).await.ok_or_else(|| ApiError::NotFound { key: key.clone() })?;
    Ok(axum::Json(decode_entry::<T>(&entry)?).into_response())
}

/// `PUT /<K>/<name>` or `PUT /<namespace>/<K>/<name>` (§4.3): compare-and-swap
/// when the body carries `metadata.resource_version`, unconditional
/// overwrite otherwise (unless `strict_updates` is set — §9 open question).
pub async fn update<T>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(params): Path<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError>
where
    T: KindObject + Serialize + DeserializeOwned,
{
    let namespace = namespace_param(&params);
    let name = name_param(&params);
    authorize(&state, &claims.sub, T::KIND, "update", namespace.as_deref()).await?;

    let format = negotiate(&headers)?;
    let raw: serde_json::Value = decode(format, &body)?;
    let requested_revision = raw.get("metadata").and_then(|m| m.get("resource_version")).and_then(|v| v.as_i64());

    let mut object: T = serde_json::from_value(raw).map_err(|e| ApiError::Malformed { message: e.to_string() })?;
    if T::KIND.namespaced() {
        object.metadata_mut().namespace = namespace.clone();
    }
    object.metadata_mut().name = name.clone();
    object.validate()?;

    let key = keys::object_key(T::KIND, namespace.as_deref(), &name);
    if state.store.get(&key).await.is_none() {
        return Err(ApiError::NotFound { key });
    }

    let value = serde_json::to_value(&object).map_err(|e| ApiError::Malformed { message: e.to_string() })?;
    let entry = match requested_revision {
        Some(expected) => state.store.compare_and_put(&key, value, expected).await?,
        None if state.config.api_server.strict_updates => return Err(ApiError::MissingRevision),
        None => state.store.put(&key, value).await?,
    };

    let updated = stamp_revision(object, entry.revision);
    let (content_type, bytes) = encode(format, &updated);
    Ok(([(axum::http::header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// `DELETE /<K>/<name>` or `DELETE /<namespace>/<K>/<name>` (§4.3): immediate
/// and final, no finalizer chain.
pub async fn delete<T>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Response, ApiError>
where
    T: KindObject + Serialize + DeserializeOwned,
{
    let namespace = namespace_param(&params);
    let name = name_param(&params);
    authorize(&state, &claims.sub, T::KIND, "delete", namespace.as_deref()).await?;

    let key = keys::object_key(T::KIND, namespace.as_deref(), &name);
    let entry = state.store.delete(&key).await.ok_or_else(|| ApiError::NotFound { key: key.clone() })?;
    Ok(axum::Json(decode_entry::<T>(&entry)?).into_response())
}

/// Builds the `application/x-ndjson` streaming response for a watch
/// request, deriving each line's `ADD`/`UPDATE`/`DELETE` event type from
/// the store's raw notification (§4.1, §6). Exactly one of `prefix`/`key`
/// is used: a non-empty `key` subscribes to one object, otherwise
/// `prefix` subscribes to every key under it.
fn watch_response<T>(state: &AppState, prefix: String, key: Option<String>) -> Response
where
    T: KindObject + DeserializeOwned,
{
    let watcher = match key {
        Some(key) => state.store.watch_key(&key),
        None => state.store.watch(&prefix),
    };

    let stream = watcher.into_stream().filter_map(|notification| async move {
        let object: T = serde_json::from_value(notification.entry.value.clone()).ok()?;
        let object = stamp_revision(object, notification.entry.revision);
        let event = WatchEvent::new(notification.event_type, object);
        let mut line = serde_json::to_vec(&event).ok()?;
        line.push(b'\n');
        Some(Ok::<_, Infallible>(Bytes::from(line)))
    });

    Response::builder()
        .header(axum::http::header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(stream))
        .expect("a streaming ndjson response always builds")
}
