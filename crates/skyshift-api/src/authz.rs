//! Per-request authorization: looks up every `Role` object naming the
//! authenticated user and checks whether any of its rules grants the
//! requested `(verb, kind, namespace)` triple, per §4.3.
//!
//! There is no caching layer here deliberately — small deployments, and
//! the spec does not ask for one; every request pays one `range` scan.

use skyshift_types::{Kind, Role};

use crate::error::ApiError;
use crate::keys;
use crate::AppState;

/// Loads every `Role` object from the store and checks whether any role
/// naming `username` grants `action` on `kind` within `namespace`
/// (`None` for cluster-scoped kinds).
pub async fn authorize(
    state: &AppState,
    username: &str,
    kind: Kind,
    action: &str,
    namespace: Option<&str>,
) -> Result<(), ApiError> {
    let entries = state.store.range(&keys::prefix(Kind::Role, None)).await;
    let grants = entries.into_iter().any(|entry| {
        let Ok(role) = serde_json::from_value::<Role>(entry.value) else {
            return false;
        };
        role.users.iter().any(|u| u == username) && role.grants(kind.plural(), action, namespace)
    });
    if grants {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skyshift_store::Store;

    async fn state_with_role(role: serde_json::Value) -> AppState {
        let store = Store::new();
        store.put(&keys::object_key(Kind::Role, None, "r1"), role).await.unwrap();
        AppState::new(store, crate::config::Config {
            api_server: crate::config::ApiServerSection {
                host: "127.0.0.1".into(),
                port: 0,
                secret: "s".into(),
                strict_updates: false,
            },
        })
    }

    #[tokio::test]
    async fn grants_when_role_matches() {
        let state = state_with_role(json!({
            "kind": "Role",
            "metadata": {"name": "r1"},
            "users": ["alice"],
            "rules": [{"resources": ["jobs"], "actions": ["get"], "namespaces": ["default"]}],
        }))
        .await;
        authorize(&state, "alice", Kind::Job, "get", Some("default")).await.unwrap();
    }

    #[tokio::test]
    async fn denies_unmatched_user() {
        let state = state_with_role(json!({
            "kind": "Role",
            "metadata": {"name": "r1"},
            "users": ["alice"],
            "rules": [{"resources": ["jobs"], "actions": ["get"], "namespaces": ["default"]}],
        }))
        .await;
        let err = authorize(&state, "bob", Kind::Job, "get", Some("default")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }
}
