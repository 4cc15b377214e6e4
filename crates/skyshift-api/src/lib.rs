//! The Skyshift REST API server: a thin axum layer over [`skyshift_store`]
//! giving every object kind a uniform CRUD+watch surface, guarded by
//! bearer-token authentication and role-based authorization (§4.3, §6).

pub mod auth;
pub mod authz;
pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod routes;

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tower_http::trace::TraceLayer;

use skyshift_store::Store;
use skyshift_types::{Kind, Namespace};

pub use config::Config;

/// Shared state handed to every handler: the KV store and the server's
/// configuration (cheap to clone — both are `Arc`-backed or small).
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        Self { store, config: Arc::new(config) }
    }
}

/// Ensures the `default` namespace exists, matching the source's
/// lazily-created default namespace on API server startup (§6).
pub async fn bootstrap(state: &AppState) {
    let key = keys::object_key(Kind::Namespace, None, skyshift_types::DEFAULT_NAMESPACE);
    if state.store.get(&key).await.is_some() {
        return;
    }
    let namespace = Namespace::new(skyshift_types::DEFAULT_NAMESPACE);
    let value = serde_json::to_value(&namespace).expect("Namespace always serializes");
    let _ = state.store.put(&key, value).await;
}

/// Builds the full router: the object routes wrapped in the auth
/// middleware and the tracing layer the rest of the workspace's
/// binaries use.
pub fn app(state: AppState) -> Router {
    routes::router()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use skyshift_types::Metadata;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let store = Store::new();
        let config = Config {
            api_server: config::ApiServerSection {
                host: "127.0.0.1".into(),
                port: 0,
                secret: "test-secret".into(),
                strict_updates: false,
            },
        };
        let state = AppState::new(store, config);
        bootstrap(&state).await;
        state
    }

    #[tokio::test]
    async fn bootstrap_creates_default_namespace() {
        let state = test_state().await;
        let key = keys::object_key(Kind::Namespace, None, "default");
        assert!(state.store.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn unauthenticated_request_is_rejected() {
        let state = test_state().await;
        let app = app(state);
        let response = app
            .oneshot(Request::builder().uri("/default/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_request_with_role_succeeds() {
        let state = test_state().await;
        let role = skyshift_types::Role {
            kind: "Role".to_string(),
            metadata: Metadata::new("admin"),
            rules: vec![skyshift_types::Rule {
                resources: vec!["*".into()],
                actions: vec!["*".into()],
                namespaces: vec!["*".into()],
            }],
            users: vec!["alice".into()],
        };
        let value = serde_json::to_value(&role).unwrap();
        state.store.put(&keys::object_key(Kind::Role, None, "admin"), value).await.unwrap();

        let token = auth::issue_token(&state.config.api_server.secret, "alice", i64::MAX);
        let app = app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/default/jobs")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn admin_token(state: &AppState) -> String {
        let role = skyshift_types::Role {
            kind: "Role".to_string(),
            metadata: Metadata::new("admin"),
            rules: vec![skyshift_types::Rule {
                resources: vec!["*".into()],
                actions: vec!["*".into()],
                namespaces: vec!["*".into()],
            }],
            users: vec!["alice".into()],
        };
        let value = serde_json::to_value(&role).unwrap();
        state.store.put(&keys::object_key(Kind::Role, None, "admin"), value).await.unwrap();
        auth::issue_token(&state.config.api_server.secret, "alice", i64::MAX)
    }

    #[tokio::test]
    async fn second_link_between_same_pair_is_rejected() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let app = app(state);

        let post = |app: Router, body: &'static str| {
            let token = token.clone();
            async move {
                app.oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/links")
                        .header("Authorization", format!("Bearer {token}"))
                        .header("Content-Type", "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap()
            }
        };

        let first = post(
            app.clone(),
            r#"{"metadata":{"name":"a-b"},"spec":{"source_cluster":"a","target_cluster":"b"}}"#,
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let reversed = post(
            app.clone(),
            r#"{"metadata":{"name":"b-a"},"spec":{"source_cluster":"b","target_cluster":"a"}}"#,
        )
        .await;
        assert_eq!(reversed.status(), StatusCode::BAD_REQUEST);
    }
}
