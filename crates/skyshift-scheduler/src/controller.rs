//! Drives the filter -> score -> spread pipeline over newly-arrived or
//! evicted jobs, grounded on
//! `original_source/skyflow/scheduler/scheduler_controller.py`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use skyshift_client::{Client, ClientError};
use skyshift_types::meta::push_condition_if_changed;
use skyshift_types::{Cluster, ClusterStatusPhase, Job, JobStatusPhase, NodeCapacity, TaskStatus};

use skyshift_informer::{Informer, InformerHandler};

use crate::affinity_plugin::ClusterAffinityPlugin;
use crate::default_plugin::DefaultPlugin;
use crate::plugin::{SchedulerPlugin, SchedulingContext};
use crate::queue::WorkloadQueue;

/// What wakes the scheduling loop: either a job that needs placing, or a
/// capacity change that may make a previously unschedulable job placeable.
enum SchedulingEvent {
    NewJob(Job),
    ClusterChanged,
}

struct JobHandler {
    tx: tokio::sync::mpsc::UnboundedSender<SchedulingEvent>,
}

impl InformerHandler<Job> for JobHandler {
    /// Only newly created jobs - those without a replica status yet - are
    /// queued for scheduling.
    fn on_add(&self, object: &Job) {
        if object.status.replica_status.is_empty() {
            let _ = self.tx.send(SchedulingEvent::NewJob(object.clone()));
        }
    }

    /// A job whose aggregate task status includes any evicted replicas needs
    /// rescheduling.
    fn on_update(&self, _old: &Job, new: &Job) {
        if new.status.aggregate_status().contains_key(&TaskStatus::Evicted) {
            let _ = self.tx.send(SchedulingEvent::NewJob(new.clone()));
        }
    }
}

struct ClusterHandler {
    tx: tokio::sync::mpsc::UnboundedSender<SchedulingEvent>,
    prev_allocatable: Mutex<HashMap<String, NodeCapacity>>,
}

impl ClusterHandler {
    fn note_capacity_change(&self, name: &str, allocatable: &NodeCapacity) {
        let mut prev = self.prev_allocatable.lock().expect("lock not poisoned");
        if prev.get(name) != Some(allocatable) {
            prev.insert(name.to_string(), allocatable.clone());
            let _ = self.tx.send(SchedulingEvent::ClusterChanged);
        }
    }
}

impl InformerHandler<Cluster> for ClusterHandler {
    fn on_add(&self, object: &Cluster) {
        self.note_capacity_change(&object.metadata.name, &object.status.allocatable_capacity);
    }

    fn on_update(&self, _old: &Cluster, new: &Cluster) {
        self.note_capacity_change(&new.metadata.name, &new.status.allocatable_capacity);
    }
}

/// Determines which cluster, or spread of clusters, a job should be placed
/// on. Schedules at the job level rather than the task level, so gang
/// scheduling and colocation requirements fall out of the spread plugin
/// rather than needing a separate mechanism.
pub struct SchedulerController {
    client: Client,
    plugins: Vec<Box<dyn SchedulerPlugin>>,
    workload_queue: WorkloadQueue,
}

impl SchedulerController {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            plugins: vec![Box::new(DefaultPlugin), Box::new(ClusterAffinityPlugin)],
            workload_queue: WorkloadQueue::default(),
        }
    }

    /// Starts the cluster/job informers and runs the scheduling loop until
    /// the process is torn down.
    pub async fn run(mut self) -> Result<(), ClientError> {
        tracing::info!("running scheduler controller");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let job_handler = JobHandler { tx: tx.clone() };
        let _job_informer = Informer::<Job>::start_all_namespaces(self.client.clone(), job_handler).await?;

        let cluster_handler =
            ClusterHandler { tx: tx.clone(), prev_allocatable: Mutex::new(HashMap::new()) };
        let _cluster_informer = Informer::<Cluster>::start(self.client.clone(), None, cluster_handler).await?;
        drop(tx);

        while let Some(event) = rx.recv().await {
            match event {
                SchedulingEvent::NewJob(job) => self.workload_queue.push(job),
                SchedulingEvent::ClusterChanged => {}
            }

            if self.workload_queue.is_empty() {
                continue;
            }

            let clusters: Vec<Cluster> = _cluster_informer.cache().await.into_values().collect();
            if let Some(job) = self.workload_queue.pop_front() {
                self.schedule_one(job, &clusters).await?;
            }
        }

        Ok(())
    }

    /// Runs the filter/score/spread pipeline for a single job and writes the
    /// outcome back to the store.
    async fn schedule_one(&self, mut job: Job, clusters: &[Cluster]) -> Result<(), ClientError> {
        let live_clusters: Vec<Cluster> = clusters
            .iter()
            .filter(|c| c.status.status != ClusterStatusPhase::Error)
            .cloned()
            .collect();

        let namespace = job.metadata.namespace.clone().unwrap_or_default();
        let filter_policies = self.client.list::<skyshift_types::FilterPolicy>(Some(&namespace)).await?;
        let ctx = SchedulingContext { filter_policies: filter_policies.objects };

        let filtered = self.apply_filter_plugins(&job, &live_clusters, &ctx);
        let ranked = self.apply_score_plugins(&job, filtered);
        let spread = self.apply_spread_plugins(&job, &ranked);

        match spread {
            Some(assignment) if !assignment.is_empty() => {
                let replica_status = assignment
                    .into_iter()
                    .map(|(cluster, replicas)| {
                        let mut task_counts = BTreeMap::new();
                        task_counts.insert(TaskStatus::Init, replicas);
                        (cluster, task_counts)
                    })
                    .collect();
                job.status.replica_status = replica_status;
                let now = now_rfc3339();
                push_condition_if_changed(&mut job.status.conditions, &JobStatusPhase::Active.to_string(), &now);
                tracing::info!(job = %job.metadata.name, "scheduled job");
            }
            _ => {
                let now = now_rfc3339();
                push_condition_if_changed(&mut job.status.conditions, &JobStatusPhase::Failed.to_string(), &now);
                tracing::info!(job = %job.metadata.name, "unable to schedule job, marking failed");
            }
        }

        let namespace = job.metadata.namespace.clone();
        self.client.update(namespace.as_deref(), &job).await?;
        Ok(())
    }

    fn apply_filter_plugins(&self, job: &Job, clusters: &[Cluster], ctx: &SchedulingContext) -> Vec<Cluster> {
        clusters
            .iter()
            .filter(|cluster| {
                !self
                    .plugins
                    .iter()
                    .any(|plugin| plugin.filter(cluster, job, ctx).is_unschedulable())
            })
            .cloned()
            .collect()
    }

    fn apply_score_plugins(&self, job: &Job, clusters: Vec<Cluster>) -> Vec<Cluster> {
        let mut scored: Vec<(Cluster, f64)> = clusters
            .into_iter()
            .map(|cluster| {
                let mut total = 0.0;
                for plugin in &self.plugins {
                    let (score, status) = plugin.score(&cluster, job);
                    if status.is_successful() {
                        total += score;
                    } else if status.is_unschedulable() {
                        total = 0.0;
                        break;
                    }
                }
                (cluster, total)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.metadata.name.cmp(&b.0.metadata.name)));
        scored.into_iter().map(|(cluster, _)| cluster).collect()
    }

    /// Only the first configured plugin is ever asked to spread.
    fn apply_spread_plugins(&self, job: &Job, clusters: &[Cluster]) -> Option<BTreeMap<String, u32>> {
        let spread_plugin = self.plugins.first()?;
        let (assignment, status) = spread_plugin.spread(clusters, job);
        status.is_successful().then_some(assignment)
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
