use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::meta::{Condition, Metadata};
use crate::resource::ResourceVector;

/// Aggregate status of a job, written by the scheduler controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum JobStatusPhase {
    Init,
    Active,
    Complete,
    Failed,
}

/// Status of one task within a job's replica set, written by the per-cluster
/// job (status) sub-controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize)]
pub enum TaskStatus {
    Init,
    Pending,
    Running,
    Completed,
    Failed,
    Evicted,
    Deleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum RestartPolicy {
    Never,
    Always,
    OnFailure,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy::Always
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default)]
    pub resources: ResourceVector,

    #[serde(default)]
    pub run: String,

    #[serde(default)]
    pub envs: BTreeMap<String, String>,

    #[serde(default)]
    pub ports: Vec<u16>,

    #[serde(default = "default_replicas")]
    pub replicas: u32,

    #[serde(default)]
    pub restart_policy: RestartPolicy,
}

fn default_image() -> String {
    "ubuntu:latest".to_string()
}

fn default_replicas() -> u32 {
    1
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            image: default_image(),
            resources: ResourceVector::default(),
            run: String::new(),
            envs: BTreeMap::new(),
            ports: Vec::new(),
            replicas: default_replicas(),
            restart_policy: RestartPolicy::default(),
        }
    }
}

/// `cluster_name -> (task_state -> count)`, per §3's invariant that the
/// summed counts equal `spec.replicas` once scheduling succeeds.
pub type ReplicaStatus = BTreeMap<String, BTreeMap<TaskStatus, u32>>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub replica_status: ReplicaStatus,

    /// `cluster_name -> backend_job_id`, present iff a submission has been
    /// acked by that cluster's flow controller (§3).
    #[serde(default)]
    pub job_ids: BTreeMap<String, String>,

    /// `cluster_name -> (container_name -> status)`, written by the job
    /// controller alongside `replica_status` (§4.9).
    #[serde(default)]
    pub container_status: BTreeMap<String, BTreeMap<String, TaskStatus>>,
}

impl JobStatus {
    /// Sums task-state counts across all clusters, used by the scheduler to
    /// detect newly-created jobs (empty) and eviction-triggered reschedules
    /// (any `EVICTED` count), grounded on
    /// `original_source/skyflow/scheduler/scheduler_controller.py::aggregate_job_status`.
    pub fn aggregate_status(&self) -> BTreeMap<TaskStatus, u32> {
        let mut merged = BTreeMap::new();
        for per_cluster in self.replica_status.values() {
            for (status, count) in per_cluster {
                *merged.entry(*status).or_insert(0) += count;
            }
        }
        merged
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default = "job_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: JobSpec,
    #[serde(default)]
    pub status: JobStatus,
}

fn job_kind() -> String {
    "Job".to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default = "job_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Job>,
}

fn job_list_kind() -> String {
    "JobList".to_string()
}
