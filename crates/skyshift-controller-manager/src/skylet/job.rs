//! Reflects a cluster backend's per-task job status onto the `Job` objects
//! scheduled to it, grounded on
//! `original_source/skyflow/skylet/job_controller.py`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use skyshift_client::{Client, ClientError};
use skyshift_types::{Job, TaskStatus};
use snafu::{ResultExt, Snafu};

use crate::adapter::{AdapterError, ClusterAdapter};
use crate::runloop::run_heartbeat_loop;

const DEFAULT_HEARTBEAT_TIME: Duration = Duration::from_secs(3);
const DEFAULT_RETRY_LIMIT: u32 = 3;

#[derive(Debug, Snafu)]
pub enum JobControllerError {
    #[snafu(display("failed to query cluster backend"))]
    Adapter { source: AdapterError },
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
}

/// Polls the cluster backend for task state and writes the aggregated
/// per-status counts back onto each job this cluster is running.
pub struct JobController {
    name: String,
    client: Client,
    adapter: Arc<dyn ClusterAdapter>,
    heartbeat_interval: Duration,
    retry_limit: u32,
}

impl JobController {
    pub fn new(name: impl Into<String>, client: Client, adapter: Arc<dyn ClusterAdapter>) -> Self {
        Self {
            name: name.into(),
            client,
            adapter,
            heartbeat_interval: DEFAULT_HEARTBEAT_TIME,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    pub async fn run(self) {
        tracing::info!(cluster = %self.name, "running job controller");
        run_heartbeat_loop("job", self.heartbeat_interval, self.retry_limit, || self.tick()).await;
    }

    async fn tick(&self) -> Result<(), JobControllerError> {
        let report = self.adapter.jobs_status().await.context(AdapterSnafu)?;
        let jobs = self.client.list_all_namespaces::<Job>().await.context(ClientSnafu)?;
        let cached: BTreeMap<String, Job> =
            jobs.objects.into_iter().map(|job| (job.metadata.name.clone(), job)).collect();

        for (job_name, tasks) in &report.tasks {
            // A job the backend knows about but the API server doesn't is a
            // leftover from a prior cluster generation; skip it.
            let Some(mut job) = cached.get(job_name).cloned() else {
                continue;
            };

            let mut counts: BTreeMap<TaskStatus, u32> = BTreeMap::new();
            for status in tasks.values() {
                *counts.entry(*status).or_insert(0) += 1;
            }
            job.status.replica_status.insert(self.name.clone(), counts);
            if let Some(containers) = report.containers.get(job_name) {
                job.status.container_status.insert(self.name.clone(), containers.clone());
            }
            self.client.update(job.metadata.namespace.as_deref(), &job).await.context(ClientSnafu)?;
        }
        Ok(())
    }
}
