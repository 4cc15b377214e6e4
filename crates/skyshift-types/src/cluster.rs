use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::meta::{Condition, Metadata};

/// `Cluster.status.status`, per §3's invariant
/// `{INIT, PROVISIONING, READY, ERROR, DELETING}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum ClusterStatusPhase {
    Init,
    Provisioning,
    Ready,
    Error,
    Deleting,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Which backend manager this cluster's adapter speaks, e.g.
    /// `"k8s"`/`"slurm"`/`"ray"`/`"cloud"`. The core never interprets this
    /// beyond passing it to a `ClusterAdapter` implementation (out of scope).
    #[serde(default)]
    pub manager: String,
}

/// `node -> (resource_type -> amount)`, a two-level capacity map per §3.
pub type NodeCapacity = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(default = "cluster_init_phase")]
    pub status: ClusterStatusPhase,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub capacity: NodeCapacity,

    #[serde(default)]
    pub allocatable_capacity: NodeCapacity,

    #[serde(default)]
    pub network_enabled: bool,
}

fn cluster_init_phase() -> ClusterStatusPhase {
    ClusterStatusPhase::Init
}

impl Default for ClusterStatus {
    fn default() -> Self {
        Self {
            status: cluster_init_phase(),
            conditions: Vec::new(),
            capacity: BTreeMap::new(),
            allocatable_capacity: BTreeMap::new(),
            network_enabled: false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default = "cluster_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ClusterSpec,
    #[serde(default)]
    pub status: ClusterStatus,
}

fn cluster_kind() -> String {
    "Cluster".to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterList {
    #[serde(default = "cluster_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Cluster>,
}

fn cluster_list_kind() -> String {
    "ClusterList".to_string()
}
