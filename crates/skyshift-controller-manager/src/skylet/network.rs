//! Ensures the cluster-link software is installed and healthy, grounded on
//! `original_source/skyflow/skylet/network_controller.py`. Unlike the other
//! heartbeat controllers, this one has a real retry limit: past it, the
//! controller shuts down rather than retrying forever.

use std::sync::Arc;
use std::time::Duration;

use skyshift_client::{Client, ClientError};
use skyshift_types::Cluster;
use snafu::{ResultExt, Snafu};

use crate::adapter::{AdapterError, ClusterAdapter};
use crate::runloop::run_heartbeat_loop;

const DEFAULT_HEARTBEAT_TIME: Duration = Duration::from_secs(300);
const DEFAULT_RETRY_LIMIT: u32 = 5;

#[derive(Debug, Snafu)]
pub enum NetworkControllerError {
    #[snafu(display("failed to query or install cluster link software"))]
    Adapter { source: AdapterError },
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
}

pub struct NetworkController {
    name: String,
    client: Client,
    adapter: Arc<dyn ClusterAdapter>,
    heartbeat_interval: Duration,
    retry_limit: u32,
}

impl NetworkController {
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
        tracing::info!(cluster = %self.name, "running network controller");
        run_heartbeat_loop("network", self.heartbeat_interval, self.retry_limit, || self.tick()).await;
    }

    async fn tick(&self) -> Result<(), NetworkControllerError> {
        match self.adapter.network_status().await {
            Ok(true) => self.update_network_state(true).await,
            Ok(false) => {
                tracing::info!(cluster = %self.name, "installing cluster link software");
                if let Err(source) = self.adapter.launch_network().await {
                    let _ = self.update_network_state(false).await;
                    return Err(NetworkControllerError::Adapter { source });
                }
                self.update_network_state(true).await
            }
            Err(source) => {
                let _ = self.update_network_state(false).await;
                Err(NetworkControllerError::Adapter { source })
            }
        }
    }

    async fn update_network_state(&self, enabled: bool) -> Result<(), NetworkControllerError> {
        let mut cluster: Cluster = self.client.get(None, &self.name).await.context(ClientSnafu)?;
        if cluster.status.network_enabled != enabled {
            cluster.status.network_enabled = enabled;
            self.client.update(None, &cluster).await.context(ClientSnafu)?;
        }
        Ok(())
    }
}
