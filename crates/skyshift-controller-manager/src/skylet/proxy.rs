//! Exposes local services to the inter-cluster mesh and imports remote
//! ones, grounded on `original_source/skyflow/skylet/proxy_controller.py`.

use std::sync::Arc;

use skyshift_client::{Client, ClientError};
use skyshift_types::{Endpoints, Service};
use snafu::{ResultExt, Snafu};
use tokio::sync::mpsc;

use crate::adapter::{AdapterError, ClusterAdapter};
use crate::runloop::run_event_loop;

#[derive(Debug, Snafu)]
pub enum ProxyControllerError {
    #[snafu(display("failed to talk to the cluster backend"))]
    Adapter { source: AdapterError },
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
}

enum ProxyEvent {
    Updated(Endpoints),
    Deleted(Endpoints),
}

struct EndpointsHandler {
    name: String,
    tx: mpsc::UnboundedSender<ProxyEvent>,
}

impl skyshift_informer::InformerHandler<Endpoints> for EndpointsHandler {
    fn on_update(&self, old: &Endpoints, new: &Endpoints) {
        if new.spec.primary_cluster.as_deref() == Some(self.name.as_str()) {
            let _ = self.tx.send(ProxyEvent::Updated(new.clone()));
            return;
        }

        let old_record = old.spec.endpoints.get(&self.name);
        let new_record = new.spec.endpoints.get(&self.name);
        let changed = match (old_record, new_record) {
            (None, Some(_)) | (Some(_), None) => true,
            (Some(old), Some(new)) => old.num_endpoints != new.num_endpoints || !new.exposed_to_mesh,
            (None, None) => false,
        };
        if changed {
            let _ = self.tx.send(ProxyEvent::Updated(new.clone()));
        }
    }

    fn on_delete(&self, object: &Endpoints) {
        let _ = self.tx.send(ProxyEvent::Deleted(object.clone()));
    }
}

/// Reacts to `Endpoints` changes by importing a service on its primary
/// cluster or exporting it on every other cluster that backs it.
pub struct ProxyController {
    name: String,
    client: Client,
    adapter: Arc<dyn ClusterAdapter>,
}

impl ProxyController {
    pub fn new(name: impl Into<String>, client: Client, adapter: Arc<dyn ClusterAdapter>) -> Self {
        Self { name: name.into(), client, adapter }
    }

    pub async fn run(self) {
        tracing::info!(cluster = %self.name, "running proxy controller");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let endpoints_informer = match skyshift_informer::Informer::start_all_namespaces(
            self.client.clone(),
            EndpointsHandler { name: self.name.clone(), tx },
        )
        .await
        {
            Ok(informer) => informer,
            Err(error) => {
                tracing::error!(%error, "proxy controller failed to start endpoints informer");
                return;
            }
        };

        let service_informer = match skyshift_informer::Informer::start_all_namespaces(
            self.client.clone(),
            skyshift_informer::NoopHandler,
        )
        .await
        {
            Ok(informer) => informer,
            Err(error) => {
                tracing::error!(%error, "proxy controller failed to start service informer");
                endpoints_informer.stop();
                return;
            }
        };

        run_event_loop("proxy", || async {
            let event = match rx.recv().await {
                Some(event) => event,
                None => return Ok(()),
            };
            self.handle_event(event, &service_informer).await
        })
        .await;
    }

    async fn handle_event(
        &self,
        event: ProxyEvent,
        service_informer: &skyshift_informer::Informer<Service>,
    ) -> Result<(), ProxyControllerError> {
        match event {
            ProxyEvent::Deleted(endpoints) => {
                if endpoints.spec.primary_cluster.as_deref() == Some(self.name.as_str()) {
                    self.adapter.delete_endpoint_slice(&endpoints.metadata.name).await.context(AdapterSnafu)?;
                } else if endpoints.spec.endpoints.contains_key(&self.name) {
                    self.adapter.unexpose_service(&endpoints.metadata.name).await.context(AdapterSnafu)?;
                }
            }
            ProxyEvent::Updated(endpoints) => {
                let Some(service) = service_informer.get(&endpoints.metadata.name).await else {
                    tracing::warn!(service = %endpoints.metadata.name, "no matching service cached yet, skipping");
                    return Ok(());
                };
                let ports: Vec<u16> = service.spec.ports.iter().map(|port| port.port).collect();

                if endpoints.spec.primary_cluster.as_deref() == Some(self.name.as_str()) {
                    self.import_service(&endpoints, &ports).await?;
                } else if let Some(record) = endpoints.spec.endpoints.get(&self.name) {
                    if !record.exposed_to_mesh {
                        self.adapter
                            .export_service(&endpoints.metadata.name, &ports)
                            .await
                            .context(AdapterSnafu)?;
                        let mut endpoints = endpoints;
                        if let Some(record) = endpoints.spec.endpoints.get_mut(&self.name) {
                            record.exposed_to_mesh = true;
                        }
                        let namespace = endpoints.metadata.namespace.clone();
                        self.client.update(namespace.as_deref(), &endpoints).await.context(ClientSnafu)?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn import_service(&self, endpoints: &Endpoints, ports: &[u16]) -> Result<(), ProxyControllerError> {
        let primary = endpoints.spec.primary_cluster.as_deref();
        for (cluster_name, record) in &endpoints.spec.endpoints {
            if Some(cluster_name.as_str()) == primary || !record.exposed_to_mesh {
                continue;
            }
            let imported = self
                .adapter
                .import_service(&endpoints.metadata.name, cluster_name, ports)
                .await
                .context(AdapterSnafu)?;
            if imported {
                self.adapter
                    .create_endpoint_slice(&endpoints.metadata.name, cluster_name)
                    .await
                    .context(AdapterSnafu)?;
            }
        }
        Ok(())
    }
}
