//! The cluster-affinity filter plugin, grounded line-for-line on
//! `original_source/skyflow/scheduler/plugins/cluster_affinity.py`.

use skyshift_types::{Cluster, FilterPolicy, Job};

use crate::plugin::{SchedulerPlugin, SchedulingContext};
use crate::status::PluginStatus;

pub struct ClusterAffinityPlugin;

impl SchedulerPlugin for ClusterAffinityPlugin {
    fn name(&self) -> &'static str {
        "ClusterAffinityPlugin"
    }

    /// Narrows `ctx.filter_policies` down to the ones whose label selector is
    /// a subset of the job's labels, then requires the cluster's name to
    /// appear in every matching policy's include list and in none of their
    /// exclude lists. An empty include list therefore admits no cluster,
    /// matching the source's literal `c_name not in include_list` check.
    fn filter(&self, cluster: &Cluster, job: &Job, ctx: &SchedulingContext) -> PluginStatus {
        let matching: Vec<&FilterPolicy> = ctx
            .filter_policies
            .iter()
            .filter(|policy| policy.matches_labels(&job.metadata.labels))
            .collect();

        if matching.is_empty() {
            return PluginStatus::success("No filter policies found.");
        }

        let cluster_name = &cluster.metadata.name;
        for policy in matching {
            let include = &policy.spec.cluster_filter.include;
            let exclude = &policy.spec.cluster_filter.exclude;
            if !include.contains(cluster_name) {
                return PluginStatus::unschedulable("Cluster not in include list.");
            }
            if exclude.contains(cluster_name) {
                return PluginStatus::unschedulable("Cluster in exclude list.");
            }
        }
        PluginStatus::success("Cluster satisfies filter policies.")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use skyshift_types::{ClusterFilter, ClusterSpec, ClusterStatus, FilterPolicySpec, JobSpec, Metadata};

    use super::*;

    fn cluster_named(name: &str) -> Cluster {
        Cluster {
            kind: "Cluster".into(),
            metadata: Metadata::new(name),
            spec: ClusterSpec::default(),
            status: ClusterStatus::default(),
        }
    }

    fn job_with_labels(labels: &[(&str, &str)]) -> Job {
        let mut map = BTreeMap::new();
        for (k, v) in labels {
            map.insert((*k).to_string(), (*v).to_string());
        }
        let mut metadata = Metadata::namespaced("j", "default");
        metadata.labels = map;
        Job { kind: "Job".into(), metadata, spec: JobSpec::default(), status: Default::default() }
    }

    fn policy_for(labels: &[(&str, &str)], include: &[&str], exclude: &[&str]) -> FilterPolicy {
        let mut selector = BTreeMap::new();
        for (k, v) in labels {
            selector.insert((*k).to_string(), (*v).to_string());
        }
        FilterPolicy {
            kind: "FilterPolicy".into(),
            metadata: Metadata::namespaced("p", "default"),
            spec: FilterPolicySpec {
                cluster_filter: ClusterFilter {
                    include: include.iter().map(|s| s.to_string()).collect(),
                    exclude: exclude.iter().map(|s| s.to_string()).collect(),
                },
                labels_selector: selector,
            },
            status: Default::default(),
        }
    }

    #[test]
    fn no_matching_policies_succeeds() {
        let ctx = SchedulingContext::default();
        let status = ClusterAffinityPlugin.filter(&cluster_named("a"), &job_with_labels(&[]), &ctx);
        assert!(status.is_successful());
    }

    #[test]
    fn cluster_must_be_in_include_list() {
        let ctx = SchedulingContext {
            filter_policies: vec![policy_for(&[("team", "infra")], &["b"], &[])],
        };
        let job = job_with_labels(&[("team", "infra")]);
        let status = ClusterAffinityPlugin.filter(&cluster_named("a"), &job, &ctx);
        assert!(status.is_unschedulable());

        let status = ClusterAffinityPlugin.filter(&cluster_named("b"), &job, &ctx);
        assert!(status.is_successful());
    }

    #[test]
    fn cluster_in_exclude_list_is_rejected() {
        let ctx = SchedulingContext {
            filter_policies: vec![policy_for(&[("team", "infra")], &["a", "b"], &["b"])],
        };
        let job = job_with_labels(&[("team", "infra")]);
        assert!(ClusterAffinityPlugin.filter(&cluster_named("a"), &job, &ctx).is_successful());
        assert!(ClusterAffinityPlugin.filter(&cluster_named("b"), &job, &ctx).is_unschedulable());
    }

    #[test]
    fn policy_with_non_matching_labels_is_ignored() {
        let ctx = SchedulingContext {
            filter_policies: vec![policy_for(&[("team", "other")], &["b"], &[])],
        };
        let job = job_with_labels(&[("team", "infra")]);
        let status = ClusterAffinityPlugin.filter(&cluster_named("a"), &job, &ctx);
        assert!(status.is_successful());
    }
}
