use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::meta::Metadata;

/// `Link.status.phase`, per §4.10.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum LinkStatusPhase {
    Init,
    Active,
    Failed,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source_cluster: String,
    pub target_cluster: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkStatus {
    #[serde(default = "link_init_phase")]
    pub phase: LinkStatusPhase,
}

fn link_init_phase() -> LinkStatusPhase {
    LinkStatusPhase::Init
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self { phase: link_init_phase() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default = "link_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: LinkSpec,
    #[serde(default)]
    pub status: LinkStatus,
}

fn link_kind() -> String {
    "Link".to_string()
}

impl Link {
    /// The unordered pair key used to enforce "at most one Link between any
    /// unordered pair {A,B}" (§3).
    pub fn unordered_pair(&self) -> (String, String) {
        let a = self.spec.source_cluster.clone();
        let b = self.spec.target_cluster.clone();
        if a <= b { (a, b) } else { (b, a) }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkList {
    #[serde(default = "link_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Link>,
}

fn link_list_kind() -> String {
    "LinkList".to_string()
}
