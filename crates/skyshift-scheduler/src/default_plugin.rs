//! The default filter/score/spread plugin, grounded line-for-line on
//! `original_source/skyflow/scheduler/plugins/default_plugin.py`.

use std::collections::BTreeMap;

use skyshift_types::{Accelerator, Cluster, Job, ResourceKind, ResourceVector};

use crate::plugin::{SchedulerPlugin, SchedulingContext};
use crate::status::PluginStatus;

pub struct DefaultPlugin;

impl SchedulerPlugin for DefaultPlugin {
    fn name(&self) -> &'static str {
        "DefaultPlugin"
    }

    /// SUCCESS iff some node in the cluster has per-resource allocatable
    /// greater than or equal to the job's per-replica request (§4.7).
    fn filter(&self, cluster: &Cluster, job: &Job, _ctx: &SchedulingContext) -> PluginStatus {
        let request = &job.spec.resources;
        for node_resources in cluster.status.allocatable_capacity.values() {
            let node = ResourceVector(node_resources.clone());
            if node.is_subset_and_smaller(request) {
                return PluginStatus::success("sufficient capacity");
            }
        }
        PluginStatus::unschedulable("insufficient capacity")
    }

    /// `sum(cpu_available) + 10 * sum(gpu_and_accelerator_available)`.
    fn score(&self, cluster: &Cluster, _job: &Job) -> (f64, PluginStatus) {
        let mut score = 0.0;
        for node_resources in cluster.status.allocatable_capacity.values() {
            for (resource_type, amount) in node_resources {
                if resource_type.parse::<ResourceKind>() == Ok(ResourceKind::Cpus) {
                    score += amount;
                } else if resource_type.parse::<ResourceKind>() == Ok(ResourceKind::Gpus)
                    || resource_type.parse::<Accelerator>().is_ok()
                {
                    score += 10.0 * amount;
                }
            }
        }
        (score, PluginStatus::success("score computed"))
    }

    /// Greedily packs replicas into nodes in ranked cluster order,
    /// subtracting the job's per-replica request from each node's
    /// allocatable capacity until either it's exhausted or the job's
    /// replica count is met.
    fn spread(&self, clusters: &[Cluster], job: &Job) -> (BTreeMap<String, u32>, PluginStatus) {
        let job_replicas = job.spec.replicas;
        let job_resource = &job.spec.resources;
        let mut assignment = BTreeMap::new();
        let mut total = 0u32;

        for cluster in clusters {
            let mut cluster_replicas = 0u32;
            let mut remaining: BTreeMap<String, ResourceVector> = cluster
                .status
                .allocatable_capacity
                .iter()
                .map(|(node, resources)| (node.clone(), ResourceVector(resources.clone())))
                .collect();

            'nodes: for node_capacity in remaining.values_mut() {
                while total < job_replicas {
                    if node_capacity.is_subset_and_smaller(job_resource) {
                        node_capacity.subtract_in_place(job_resource);
                        total += 1;
                        cluster_replicas += 1;
                    } else {
                        continue 'nodes;
                    }
                }
                break;
            }

            assignment.insert(cluster.metadata.name.clone(), cluster_replicas);
            if total == job_replicas {
                break;
            }
        }

        if total < job_replicas {
            return (BTreeMap::new(), PluginStatus::unschedulable("insufficient capacity"));
        }

        assignment.retain(|_, replicas| *replicas > 0);
        (assignment, PluginStatus::success("spread computed"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use skyshift_types::{ClusterSpec, ClusterStatus, JobSpec, Metadata};

    use super::*;

    fn cluster_with_capacity(name: &str, nodes: &[(&str, &[(&str, f64)])]) -> Cluster {
        let mut capacity = BTreeMap::new();
        for (node, resources) in nodes {
            let mut map = BTreeMap::new();
            for (resource, amount) in *resources {
                map.insert((*resource).to_string(), *amount);
            }
            capacity.insert((*node).to_string(), map);
        }
        Cluster {
            kind: "Cluster".into(),
            metadata: Metadata::new(name),
            spec: ClusterSpec::default(),
            status: ClusterStatus { allocatable_capacity: capacity, ..ClusterStatus::default() },
        }
    }

    fn job_requesting(replicas: u32, resources: &[(&str, f64)]) -> Job {
        let mut map = BTreeMap::new();
        for (resource, amount) in resources {
            map.insert((*resource).to_string(), *amount);
        }
        Job {
            kind: "Job".into(),
            metadata: Metadata::namespaced("j", "default"),
            spec: JobSpec { replicas, resources: ResourceVector(map), ..JobSpec::default() },
            status: Default::default(),
        }
    }

    #[test]
    fn filter_succeeds_when_a_node_has_capacity() {
        let cluster = cluster_with_capacity("a", &[("n1", &[("cpus", 2.0)])]);
        let job = job_requesting(1, &[("cpus", 1.0)]);
        let status = DefaultPlugin.filter(&cluster, &job, &SchedulingContext::default());
        assert!(status.is_successful());
    }

    #[test]
    fn filter_fails_when_no_node_fits() {
        let cluster = cluster_with_capacity("a", &[("n1", &[("cpus", 0.5)])]);
        let job = job_requesting(1, &[("cpus", 1.0)]);
        let status = DefaultPlugin.filter(&cluster, &job, &SchedulingContext::default());
        assert!(status.is_unschedulable());
    }

    #[test]
    fn score_weights_gpus_ten_times_cpus() {
        let cluster = cluster_with_capacity("a", &[("n1", &[("cpus", 1.0), ("gpus", 1.0)])]);
        let (score, status) = DefaultPlugin.score(&cluster, &job_requesting(1, &[]));
        assert!(status.is_successful());
        assert_eq!(score, 11.0);
    }

    #[test]
    fn spread_exact_fit_single_cluster() {
        let clusters = vec![cluster_with_capacity("a", &[("n1", &[("cpus", 1.0)])])];
        let job = job_requesting(1, &[("cpus", 1.0)]);
        let (assignment, status) = DefaultPlugin.spread(&clusters, &job);
        assert!(status.is_successful());
        assert_eq!(assignment.get("a"), Some(&1));
    }

    #[test]
    fn spread_splits_across_two_clusters() {
        let clusters = vec![
            cluster_with_capacity("a", &[("n1", &[("cpus", 2.0)])]),
            cluster_with_capacity("b", &[("n1", &[("cpus", 2.0)])]),
        ];
        let job = job_requesting(3, &[("cpus", 1.0)]);
        let (assignment, status) = DefaultPlugin.spread(&clusters, &job);
        assert!(status.is_successful());
        let total: u32 = assignment.values().sum();
        assert_eq!(total, 3);
        assert_eq!(assignment.get("a"), Some(&2));
        assert_eq!(assignment.get("b"), Some(&1));
    }

    #[test]
    fn spread_fails_when_capacity_insufficient() {
        let clusters = vec![cluster_with_capacity("a", &[("n1", &[("cpus", 1.0)])])];
        let job = job_requesting(5, &[("cpus", 1.0)]);
        let (assignment, status) = DefaultPlugin.spread(&clusters, &job);
        assert!(!status.is_successful());
        assert!(assignment.is_empty());
    }
}
