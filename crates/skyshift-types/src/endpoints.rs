use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::meta::Metadata;

/// Per-cluster endpoint record: how many local pods back the service, and
/// whether this cluster has exposed it to the inter-cluster mesh (§4.9's
/// Endpoints Controller / Proxy Controller contract).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointRecord {
    #[serde(default)]
    pub num_endpoints: u32,
    #[serde(default)]
    pub exposed_to_mesh: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointsSpec {
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
    /// `cluster_name -> EndpointRecord`.
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointRecord>,
    #[serde(default)]
    pub primary_cluster: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointsStatus {}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "endpoints_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: EndpointsSpec,
    #[serde(default)]
    pub status: EndpointsStatus,
}

fn endpoints_kind() -> String {
    "Endpoints".to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointsList {
    #[serde(default = "endpoints_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Endpoints>,
}

fn endpoints_list_kind() -> String {
    "EndpointsList".to_string()
}
