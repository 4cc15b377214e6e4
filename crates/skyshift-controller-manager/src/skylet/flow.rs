//! Submits and evicts jobs on this cluster in response to job and
//! filter-policy events, grounded on
//! `original_source/skyflow/skylet/flow_controller.py`.

use std::sync::Arc;

use skyshift_client::{Client, ClientError};
use skyshift_types::{FilterPolicy, Job, TaskStatus};
use snafu::{ResultExt, Snafu};
use tokio::sync::mpsc;

use crate::adapter::{AdapterError, ClusterAdapter};
use crate::runloop::run_event_loop;

#[derive(Debug, Snafu)]
pub enum FlowControllerError {
    #[snafu(display("failed to talk to the cluster backend"))]
    Adapter { source: AdapterError },
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
}

enum FlowEvent {
    JobSubmitted(Job),
    JobDeleted(Job),
    PolicyChanged(FilterPolicy),
}

struct JobHandler {
    name: String,
    tx: mpsc::UnboundedSender<FlowEvent>,
}

impl skyshift_informer::InformerHandler<Job> for JobHandler {
    fn on_update(&self, _old: &Job, new: &Job) {
        let scheduled_here = new.status.replica_status.contains_key(&self.name);
        let already_submitted = new.status.job_ids.contains_key(&self.name);
        if scheduled_here && !already_submitted {
            let _ = self.tx.send(FlowEvent::JobSubmitted(new.clone()));
        }
    }

    fn on_delete(&self, object: &Job) {
        if object.status.replica_status.contains_key(&self.name) {
            let _ = self.tx.send(FlowEvent::JobDeleted(object.clone()));
        }
    }
}

struct PolicyHandler {
    tx: mpsc::UnboundedSender<FlowEvent>,
}

impl skyshift_informer::InformerHandler<FilterPolicy> for PolicyHandler {
    fn on_add(&self, object: &FilterPolicy) {
        let _ = self.tx.send(FlowEvent::PolicyChanged(object.clone()));
    }

    fn on_update(&self, _old: &FilterPolicy, new: &FilterPolicy) {
        let _ = self.tx.send(FlowEvent::PolicyChanged(new.clone()));
    }
}

/// Watches jobs scheduled to this cluster and filter policies, submitting
/// newly scheduled jobs to the backend and evicting jobs a policy change
/// disallows.
pub struct FlowController {
    name: String,
    client: Client,
    adapter: Arc<dyn ClusterAdapter>,
}

impl FlowController {
    pub fn new(name: impl Into<String>, client: Client, adapter: Arc<dyn ClusterAdapter>) -> Self {
        Self { name: name.into(), client, adapter }
    }

    pub async fn run(self) {
        tracing::info!(cluster = %self.name, "running flow controller");

        let (tx, mut rx) = mpsc::unbounded_channel();

        let job_informer =
            match skyshift_informer::Informer::start_all_namespaces(self.client.clone(), JobHandler {
                name: self.name.clone(),
                tx: tx.clone(),
            })
            .await
            {
                Ok(informer) => informer,
                Err(error) => {
                    tracing::error!(%error, "flow controller failed to start job informer");
                    return;
                }
            };

        let policy_informer =
            match skyshift_informer::Informer::start_all_namespaces(self.client.clone(), PolicyHandler { tx }).await {
                Ok(informer) => informer,
                Err(error) => {
                    tracing::error!(%error, "flow controller failed to start filter policy informer");
                    return;
                }
            };

        run_event_loop("flow", || async {
            let event = match rx.recv().await {
                Some(event) => event,
                None => return Ok(()),
            };
            self.handle_event(event, &job_informer).await
        })
        .await;

        policy_informer.stop();
    }

    async fn handle_event(
        &self,
        event: FlowEvent,
        job_informer: &skyshift_informer::Informer<Job>,
    ) -> Result<(), FlowControllerError> {
        match event {
            FlowEvent::JobSubmitted(mut job) => {
                match self.adapter.submit_job(&job).await {
                    Ok(backend_id) => {
                        job.status.job_ids.insert(self.name.clone(), backend_id);
                    }
                    Err(error) => {
                        tracing::error!(%error, job = %job.metadata.name, "failed to submit job, marking failed");
                        let count = task_count(&job, &self.name);
                        job.status
                            .replica_status
                            .insert(self.name.clone(), [(TaskStatus::Failed, count)].into_iter().collect());
                    }
                }
                self.client.update(job.metadata.namespace.as_deref(), &job).await.context(ClientSnafu)?;
            }
            FlowEvent::JobDeleted(job) => {
                self.adapter.delete_job(&job).await.context(AdapterSnafu)?;
            }
            FlowEvent::PolicyChanged(policy) => {
                let allowed: Vec<&String> =
                    policy.spec.cluster_filter.include.iter().filter(|c| !policy.spec.cluster_filter.exclude.contains(c)).collect();
                if allowed.iter().any(|c| **c == self.name) {
                    return Ok(());
                }

                let cached = job_informer.cache().await;
                for mut job in cached.into_values() {
                    if !job.status.replica_status.contains_key(&self.name) {
                        continue;
                    }
                    if !policy.matches_labels_or_empty(&job.metadata.labels) {
                        continue;
                    }

                    let count = task_count(&job, &self.name);
                    self.adapter.delete_job(&job).await.context(AdapterSnafu)?;
                    job.status.job_ids.remove(&self.name);
                    job.status.replica_status.insert(self.name.clone(), [(TaskStatus::Evicted, count)].into_iter().collect());
                    self.client.update(job.metadata.namespace.as_deref(), &job).await.context(ClientSnafu)?;
                }
            }
        }
        Ok(())
    }
}

fn task_count(job: &Job, cluster: &str) -> u32 {
    job.status.replica_status.get(cluster).map(|counts| counts.values().sum()).unwrap_or(0)
}
