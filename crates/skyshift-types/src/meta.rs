use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata shared by every object kind, namespaced or cluster-scoped.
///
/// `resource_version` is set by the store on write; clients should treat it
/// as opaque and only round-trip it for optimistic updates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub resource_version: i64,
}

impl Metadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }
}

/// An append-only condition entry. Every kind that models a phase
/// transition (`Cluster.status`, `Job.status`, `Link.status`, ...) appends
/// one of these whenever the phase actually changes, never mutating a prior
/// entry in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    pub transition_time: String,
}

impl Condition {
    pub fn new(type_: impl Into<String>, now: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            transition_time: now.into(),
        }
    }
}

/// Appends a condition iff the incoming phase differs from the most recent
/// one, matching the "transitions are append-only" invariant (§3) observed
/// across `Cluster`/`Job`/`FilterPolicy` in the source templates.
pub fn push_condition_if_changed(conditions: &mut Vec<Condition>, phase: &str, now: &str) {
    let changed = conditions.last().is_none_or(|c| c.type_ != phase);
    if changed {
        conditions.push(Condition::new(phase, now));
    }
}
