use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::meta::Metadata;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum ServiceType {
    ClusterIP,
    LoadBalancer,
    ExternalName,
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::ClusterIP
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: u16,
    pub target_port: u16,
    #[serde(default = "tcp")]
    pub protocol: String,
}

fn tcp() -> String {
    "TCP".to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
    /// The cluster that owns this service's `Endpoints` object (§3).
    #[serde(default)]
    pub primary_cluster: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub external_ip: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Service {
    #[serde(default = "service_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ServiceSpec,
    #[serde(default)]
    pub status: ServiceStatus,
}

fn service_kind() -> String {
    "Service".to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceList {
    #[serde(default = "service_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Service>,
}

fn service_list_kind() -> String {
    "ServiceList".to_string()
}
