use serde::{Deserialize, Serialize};

use crate::meta::Metadata;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamespaceStatus {
    #[serde(default = "active")]
    pub status: String,
}

fn active() -> String {
    "ACTIVE".to_string()
}

impl Default for NamespaceStatus {
    fn default() -> Self {
        Self { status: active() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(default = "namespace_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub status: NamespaceStatus,
}

fn namespace_kind() -> String {
    "Namespace".to_string()
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: namespace_kind(),
            metadata: Metadata::new(name),
            status: NamespaceStatus::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NamespaceList {
    #[serde(default = "namespace_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Namespace>,
}

fn namespace_list_kind() -> String {
    "NamespaceList".to_string()
}
