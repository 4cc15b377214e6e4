//! Wires the eight kinds onto axum routes. Namespaced kinds get a
//! `/<namespace>/<kind>...` route for create/list/get/update/delete, plus a
//! bare `/<kind>` route that only answers `GET ?all_namespaces=true`
//! (§4.3's closed route table has no bare POST/item route for a namespaced
//! kind); cluster-scoped kinds get the bare form for every verb. One macro
//! invocation per kind avoids writing this twice-over per-kind boilerplate
//! by hand.

use axum::routing::get;
use axum::Router;

use skyshift_types::{Cluster, Endpoints, FilterPolicy, Job, Link, Namespace, Role, Service};

use crate::handlers;
use crate::AppState;

macro_rules! register_namespaced {
    ($router:expr, $ty:ty, $plural:literal) => {{
        let collection = concat!("/", $plural);
        let collection_ns = concat!("/{namespace}/", $plural);
        let item_ns = concat!("/{namespace}/", $plural, "/{name}");
        $router
            .route(collection, get(handlers::list::<$ty>))
            .route(collection_ns, get(handlers::list::<$ty>).post(handlers::create::<$ty>))
            .route(
                item_ns,
                get(handlers::get::<$ty>).put(handlers::update::<$ty>).delete(handlers::delete::<$ty>),
            )
    }};
}

macro_rules! register_cluster_scoped {
    ($router:expr, $ty:ty, $plural:literal) => {{
        let collection = concat!("/", $plural);
        let item = concat!("/", $plural, "/{name}");
        $router
            .route(collection, get(handlers::list::<$ty>).post(handlers::create::<$ty>))
            .route(item, get(handlers::get::<$ty>).put(handlers::update::<$ty>).delete(handlers::delete::<$ty>))
    }};
}

/// Builds the unauthenticated route table (the auth/authz layers are
/// applied around this router in [`crate::app`]).
pub fn router() -> Router<AppState> {
    let router = Router::new();
    let router = register_namespaced!(router, Job, "jobs");
    let router = register_namespaced!(router, FilterPolicy, "filterpolicies");
    let router = register_namespaced!(router, Service, "services");
    let router = register_namespaced!(router, Endpoints, "endpoints");
    let router = register_cluster_scoped!(router, Cluster, "clusters");
    let router = register_cluster_scoped!(router, Namespace, "namespaces");
    let router = register_cluster_scoped!(router, Link, "links");
    register_cluster_scoped!(router, Role, "roles")
}
