use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::meta::{Condition, Metadata};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterPolicySpec {
    #[serde(default)]
    pub cluster_filter: ClusterFilter,
    #[serde(default)]
    pub labels_selector: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterPolicyStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "active")]
    pub status: String,
}

fn active() -> String {
    "ACTIVE".to_string()
}

impl Default for FilterPolicyStatus {
    fn default() -> Self {
        Self { conditions: Vec::new(), status: active() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterPolicy {
    #[serde(default = "filter_policy_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: FilterPolicySpec,
    #[serde(default)]
    pub status: FilterPolicyStatus,
}

fn filter_policy_kind() -> String {
    "FilterPolicy".to_string()
}

impl FilterPolicy {
    /// Whether this policy's label selector is a subset of the job's
    /// labels, per §4.7.
    pub fn matches_labels(&self, job_labels: &BTreeMap<String, String>) -> bool {
        if self.spec.labels_selector.is_empty() {
            return false;
        }
        self.spec
            .labels_selector
            .iter()
            .all(|(k, v)| job_labels.get(k) == Some(v))
    }

    /// Whether this policy's label selector matches the job's labels, with
    /// an empty selector matching every job. This is the eviction-time
    /// reading of a selector, grounded on
    /// `original_source/skyflow/utils/utils.py`'s `match_labels` - distinct
    /// from [`FilterPolicy::matches_labels`], which an empty selector
    /// matches nothing for the affinity plugin's own purposes.
    pub fn matches_labels_or_empty(&self, job_labels: &BTreeMap<String, String>) -> bool {
        self.spec
            .labels_selector
            .iter()
            .all(|(k, v)| job_labels.get(k) == Some(v))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterPolicyList {
    #[serde(default = "filter_policy_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<FilterPolicy>,
}

fn filter_policy_list_kind() -> String {
    "FilterPolicyList".to_string()
}
