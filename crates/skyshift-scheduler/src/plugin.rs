//! The plugin interface, per §4.7: any subset of `filter`/`score`/`spread`.
//! Methods that a plugin does not implement keep the base default, which
//! reports `Error` — matching `BasePlugin`'s "not implemented" bodies in
//! the source this crate is grounded on.

use std::collections::BTreeMap;

use skyshift_types::{Cluster, FilterPolicy, Job};

use crate::status::PluginStatus;

/// Read-only state a filter plugin may need beyond the single cluster/job
/// pair it's being asked about. Currently just the job-namespace's
/// `FilterPolicy` objects, snapshotted by the controller from its informer
/// cache before a scheduling pass (§4.7's `ClusterAffinityPlugin`).
#[derive(Default)]
pub struct SchedulingContext {
    pub filter_policies: Vec<FilterPolicy>,
}

/// A scheduler plugin. Every method is optional; a plugin that only scores
/// leaves `filter`/`spread` at their default (error) bodies, and the
/// controller simply never calls them for that role.
pub trait SchedulerPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn filter(&self, _cluster: &Cluster, _job: &Job, _ctx: &SchedulingContext) -> PluginStatus {
        PluginStatus::error("filtering not implemented")
    }

    /// Score a cluster for a job. A score of 0 with a `Success` status is
    /// a legitimate ("no preference") result; only `Unschedulable`/`Error`
    /// from a score plugin zero the total for that cluster (§4.6).
    fn score(&self, _cluster: &Cluster, _job: &Job) -> (f64, PluginStatus) {
        (0.0, PluginStatus::error("score not implemented"))
    }

    /// Spread a job's replicas across an already filtered+ranked cluster
    /// list. Only the designated spread plugin (`plugins[0]`, §4.6) is
    /// ever asked for this.
    fn spread(&self, _clusters: &[Cluster], _job: &Job) -> (BTreeMap<String, u32>, PluginStatus) {
        (BTreeMap::new(), PluginStatus::error("spread not implemented"))
    }
}
