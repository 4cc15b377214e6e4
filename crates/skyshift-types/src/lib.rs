//! The Skyshift object model: the envelope shared by every kind, the closed
//! set of kinds themselves, and the static registry that knows how to
//! validate and route each one.
//!
//! This crate has no knowledge of HTTP, the KV store, or controllers — it
//! is pure data plus validation, consumed by `skyshift-store`,
//! `skyshift-api`, `skyshift-client`, and everything built on top of them.

pub mod cluster;
pub mod endpoints;
pub mod filter_policy;
pub mod job;
pub mod kind;
pub mod link;
pub mod meta;
pub mod namespace;
pub mod object;
pub mod resource;
pub mod role;
pub mod service;
pub mod validation;
pub mod watch;

pub use cluster::{Cluster, ClusterList, ClusterSpec, ClusterStatus, ClusterStatusPhase};
pub use endpoints::{Endpoints, EndpointsList, EndpointsSpec, EndpointsStatus};
pub use filter_policy::{ClusterFilter, FilterPolicy, FilterPolicyList, FilterPolicySpec, FilterPolicyStatus};
pub use job::{Job, JobList, JobSpec, JobStatus, JobStatusPhase, RestartPolicy, TaskStatus};
pub use kind::{Kind, KindInfo};
pub use link::{Link, LinkList, LinkSpec, LinkStatus, LinkStatusPhase};
pub use meta::{Condition, Metadata};
pub use namespace::{Namespace, NamespaceList, NamespaceStatus};
pub use object::KindObject;
pub use resource::{Accelerator, ResourceKind, ResourceVector};
pub use role::{Action, Role, RoleList, Rule};
pub use service::{Service, ServiceList, ServicePort, ServiceSpec, ServiceStatus, ServiceType};
pub use validation::{Validate, ValidationError};
pub use watch::{WatchEvent, WatchEventType};

/// The DNS-label-ish name pattern every object's `metadata.name` must match.
pub const NAME_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

/// The namespace created automatically at API server bootstrap.
pub const DEFAULT_NAMESPACE: &str = "default";
