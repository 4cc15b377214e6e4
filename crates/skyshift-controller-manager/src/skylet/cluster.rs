//! Polls a cluster's backend for capacity/status and writes it back,
//! grounded on `original_source/skyflow/skylet/cluster_controller.py`.

use std::sync::Arc;
use std::time::Duration;

use skyshift_client::{Client, ClientError};
use skyshift_types::{Cluster, ClusterStatusPhase};
use snafu::{ResultExt, Snafu};

use crate::adapter::{AdapterError, ClusterAdapter};
use crate::runloop::run_heartbeat_loop;

const DEFAULT_HEARTBEAT_TIME: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_LIMIT: u32 = 2;

#[derive(Debug, Snafu)]
pub enum ClusterControllerError {
    #[snafu(display("failed to query cluster backend"))]
    Adapter { source: AdapterError },
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
}

/// Regularly polls the cluster backend for its status (capacity,
/// allocatable capacity, health) and reflects it onto the `Cluster` object.
pub struct ClusterController {
    name: String,
    client: Client,
    adapter: Arc<dyn ClusterAdapter>,
    heartbeat_interval: Duration,
    retry_limit: u32,
}

impl ClusterController {
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
        tracing::info!(cluster = %self.name, "running cluster controller");
        run_heartbeat_loop("cluster", self.heartbeat_interval, self.retry_limit, || self.tick()).await;
    }

    async fn tick(&self) -> Result<(), ClusterControllerError> {
        let report = self.adapter.cluster_status().await.context(AdapterSnafu)?;
        if report.status == ClusterStatusPhase::Error {
            self.mark_unhealthy().await?;
            return Ok(());
        }

        let mut cluster: Cluster = self.client.get(None, &self.name).await.context(ClientSnafu)?;
        cluster.status.status = report.status;
        cluster.status.capacity = report.capacity;
        cluster.status.allocatable_capacity = report.allocatable_capacity;
        self.client.update(None, &cluster).await.context(ClientSnafu)?;
        Ok(())
    }

    /// When the backend itself is unreachable/unhealthy, the cluster is
    /// marked `ERROR` but the controller keeps running - it may reconnect.
    async fn mark_unhealthy(&self) -> Result<(), ClusterControllerError> {
        let mut cluster: Cluster = self.client.get(None, &self.name).await.context(ClientSnafu)?;
        cluster.status.status = ClusterStatusPhase::Error;
        self.client.update(None, &cluster).await.context(ClientSnafu)?;
        Ok(())
    }
}
