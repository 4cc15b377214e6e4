//! A typed HTTP client for the Skyshift REST API, one small `Client`
//! wrapping `reqwest` with generic CRUD methods per [`KindObject`], plus a
//! reconnecting watch stream (§5, §6).

mod watch;

pub use watch::Watch;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::{ResultExt, Snafu};

use skyshift_types::{Kind, KindObject};

#[derive(Debug, Snafu)]
pub enum ClientError {
    #[snafu(display("request to {url} failed"))]
    Request { url: String, source: reqwest::Error },

    #[snafu(display("failed to read response body from {url}"))]
    Body { url: String, source: reqwest::Error },

    #[snafu(display("server returned {status}: {detail}"))]
    Api { status: StatusCode, detail: String },

    #[snafu(display("failed to decode response body"))]
    Decode { source: serde_json::Error },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Pulls the `detail` field the API server puts on every error body,
/// falling back to the raw body text if it isn't JSON shaped that way.
fn extract_detail(bytes: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(str::to_string)))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

/// A handle to one Skyshift API server. Cheap to clone: the underlying
/// `reqwest::Client` is itself `Arc`-backed.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Client {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:50051`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), token: None }
    }

    /// Attaches a bearer token to every request this client makes.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn collection_url(&self, kind: Kind, namespace: Option<&str>) -> String {
        match (kind.namespaced(), namespace) {
            (true, Some(ns)) => format!("{}/{ns}/{}", self.base_url, kind.plural()),
            _ => format!("{}/{}", self.base_url, kind.plural()),
        }
    }

    /// The bare `/<K>?all_namespaces=true` collection URL (§4.3) — the only
    /// legitimate route a namespaced kind can be listed/watched under
    /// without a `{namespace}` path segment.
    fn all_namespaces_url(&self, kind: Kind) -> String {
        format!("{}/{}?all_namespaces=true", self.base_url, kind.plural())
    }

    fn object_url(&self, kind: Kind, namespace: Option<&str>, name: &str) -> String {
        format!("{}/{name}", self.collection_url(kind, namespace))
    }

    pub(crate) fn http_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.get(url)
    }

    pub(crate) fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<R: DeserializeOwned>(url: &str, builder: reqwest::RequestBuilder) -> Result<R> {
        let response = builder.send().await.context(RequestSnafu { url: url.to_string() })?;
        let status = response.status();
        let bytes = response.bytes().await.context(BodySnafu { url: url.to_string() })?;
        if !status.is_success() {
            return Err(ClientError::Api { status, detail: extract_detail(&bytes) });
        }
        serde_json::from_slice(&bytes).context(DecodeSnafu)
    }

    /// `POST`s a new object into `namespace` (ignored for cluster-scoped
    /// kinds) and returns the server's stored copy, including its assigned
    /// `resource_version`.
    pub async fn create<T>(&self, namespace: Option<&str>, object: &T) -> Result<T>
    where
        T: KindObject + Serialize + DeserializeOwned,
    {
        let url = self.collection_url(T::KIND, namespace);
        let builder = self.authed(self.http.post(&url).json(object));
        Self::send(&url, builder).await
    }

    /// Lists every object of `T`'s kind, scoped to `namespace` when given.
    /// For a namespaced kind, `namespace` must be `Some`; to list across
    /// every namespace use [`Client::list_all_namespaces`] instead (§4.3 has
    /// no bare, unscoped list route for namespaced kinds).
    pub async fn list<T>(&self, namespace: Option<&str>) -> Result<T::List>
    where
        T: KindObject + DeserializeOwned,
    {
        let url = self.collection_url(T::KIND, namespace);
        let builder = self.authed(self.http.get(&url));
        Self::send(&url, builder).await
    }

    /// Lists every object of `T`'s kind across every namespace, via
    /// `GET /<K>?all_namespaces=true` (§4.3). For cluster-scoped kinds this
    /// is equivalent to `list(None)`.
    pub async fn list_all_namespaces<T>(&self) -> Result<T::List>
    where
        T: KindObject + DeserializeOwned,
    {
        let url = self.all_namespaces_url(T::KIND);
        let builder = self.authed(self.http.get(&url));
        Self::send(&url, builder).await
    }

    pub async fn get<T>(&self, namespace: Option<&str>, name: &str) -> Result<T>
    where
        T: KindObject + DeserializeOwned,
    {
        let url = self.object_url(T::KIND, namespace, name);
        let builder = self.authed(self.http.get(&url));
        Self::send(&url, builder).await
    }

    /// `PUT`s the full object back; the server does an unconditional
    /// overwrite unless `object.metadata().resource_version` is nonzero, in
    /// which case it's a compare-and-swap (§4.3).
    pub async fn update<T>(&self, namespace: Option<&str>, object: &T) -> Result<T>
    where
        T: KindObject + Serialize + DeserializeOwned,
    {
        let url = self.object_url(T::KIND, namespace, &object.metadata().name);
        let builder = self.authed(self.http.put(&url).json(object));
        Self::send(&url, builder).await
    }

    /// Deletes the named object, returning the value it had just before
    /// deletion.
    pub async fn delete<T>(&self, namespace: Option<&str>, name: &str) -> Result<T>
    where
        T: KindObject + DeserializeOwned,
    {
        let url = self.object_url(T::KIND, namespace, name);
        let builder = self.authed(self.http.delete(&url));
        Self::send(&url, builder).await
    }

    /// Opens a reconnecting watch over every object of `T`'s kind, scoped
    /// to `namespace` when given. For a namespaced kind, `namespace` must be
    /// `Some`; to watch across every namespace use
    /// [`Client::watch_all_namespaces`] instead. A dropped connection is
    /// logged and retried with backoff, mirroring the source's
    /// `Watcher.watch()` generator, up to a retry limit (see
    /// [`crate::watch`]).
    pub fn watch<T>(&self, namespace: Option<&str>) -> Watch<T>
    where
        T: KindObject + DeserializeOwned + Send + 'static,
    {
        let url = format!("{}?watch=true", self.collection_url(T::KIND, namespace));
        Watch::new(self.clone(), url)
    }

    /// Opens a reconnecting watch across every namespace of `T`'s kind, via
    /// `GET /<K>?all_namespaces=true&watch=true` (§4.3).
    pub fn watch_all_namespaces<T>(&self) -> Watch<T>
    where
        T: KindObject + DeserializeOwned + Send + 'static,
    {
        let url = format!("{}&watch=true", self.all_namespaces_url(T::KIND));
        Watch::new(self.clone(), url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_detail_from_error_body() {
        let body = br#"{"detail": "object not found"}"#;
        assert_eq!(extract_detail(body), "object not found");
    }

    #[test]
    fn falls_back_to_raw_text_when_not_json() {
        assert_eq!(extract_detail(b"internal server error"), "internal server error");
    }

    #[test]
    fn collection_url_is_namespaced_for_namespaced_kinds() {
        let client = Client::new("http://localhost:50051");
        assert_eq!(
            client.collection_url(Kind::Job, Some("default")),
            "http://localhost:50051/default/jobs"
        );
        assert_eq!(client.collection_url(Kind::Cluster, Some("default")), "http://localhost:50051/clusters");
    }

    #[test]
    fn all_namespaces_url_is_bare_with_query_flag() {
        let client = Client::new("http://localhost:50051");
        assert_eq!(client.all_namespaces_url(Kind::Job), "http://localhost:50051/jobs?all_namespaces=true");
    }
}
