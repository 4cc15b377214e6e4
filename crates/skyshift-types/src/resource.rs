use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of generic resource types a node/job can express capacity
/// or a request in, per §3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpus,
    Memory,
    Gpus,
    Disk,
}

/// The closed set of named accelerator tags, carried alongside `gpus` as a
/// more specific resource dimension (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize)]
pub enum Accelerator {
    T4,
    L4,
    V100,
    A100,
    P100,
    K80,
    H100,
}

/// A flat `resource_type -> amount` map used both for a job's per-replica
/// request and for a single node's capacity/allocatable entry.
///
/// Keys are free-form strings at the wire level (matching the source's
/// `Dict[str, float]`) but are validated against [`ResourceKind`] or
/// [`Accelerator`] by [`crate::validation`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(pub BTreeMap<String, f64>);

impl ResourceVector {
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn is_subset_and_smaller(&self, other: &ResourceVector) -> bool {
        other.0.keys().all(|k| self.0.contains_key(k)) && other.0.iter().all(|(k, v)| *v <= self.get(k))
    }

    pub fn subtract_in_place(&mut self, other: &ResourceVector) {
        for (key, amount) in &other.0 {
            if let Some(existing) = self.0.get_mut(key) {
                *existing -= amount;
            }
        }
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_and_smaller() {
        let mut node = ResourceVector::default();
        node.0.insert("cpus".into(), 4.0);
        node.0.insert("memory".into(), 1024.0);

        let mut request = ResourceVector::default();
        request.0.insert("cpus".into(), 1.0);

        assert!(node.is_subset_and_smaller(&request));

        request.0.insert("gpus".into(), 1.0);
        assert!(!node.is_subset_and_smaller(&request));
    }

    #[test]
    fn subtract_leaves_remainder() {
        let mut node = ResourceVector::default();
        node.0.insert("cpus".into(), 4.0);

        let mut request = ResourceVector::default();
        request.0.insert("cpus".into(), 1.0);

        node.subtract_in_place(&request);
        assert_eq!(node.get("cpus"), 3.0);
    }
}
