//! Tracks how many pods back a service on this cluster and publishes that
//! count onto the service's shared `Endpoints` object, grounded on
//! `original_source/skyflow/skylet/endpoints_controller.py`.

use std::sync::Arc;
use std::time::Duration;

use skyshift_client::{Client, ClientError};
use skyshift_types::{Endpoints, EndpointsSpec, EndpointRecord, Metadata, Service};
use snafu::{ResultExt, Snafu};
use tokio::sync::mpsc;

use crate::adapter::{AdapterError, ClusterAdapter};
use crate::runloop::run_event_loop;

#[derive(Debug, Snafu)]
pub enum EndpointsControllerError {
    #[snafu(display("failed to talk to the cluster backend"))]
    Adapter { source: AdapterError },
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
    #[snafu(display("timed out waiting for endpoints object '{name}' to appear"))]
    EndpointsNotFound { name: String },
}

enum EndpointsEvent {
    Upserted(Service),
    Deleted(Service),
}

struct ServiceHandler {
    tx: mpsc::UnboundedSender<EndpointsEvent>,
}

impl skyshift_informer::InformerHandler<Service> for ServiceHandler {
    fn on_add(&self, object: &Service) {
        let _ = self.tx.send(EndpointsEvent::Upserted(object.clone()));
    }

    fn on_update(&self, old: &Service, new: &Service) {
        if old.spec.selector != new.spec.selector || old.spec.primary_cluster != new.spec.primary_cluster {
            let _ = self.tx.send(EndpointsEvent::Upserted(new.clone()));
        }
    }

    fn on_delete(&self, object: &Service) {
        let _ = self.tx.send(EndpointsEvent::Deleted(object.clone()));
    }
}

/// Keeps each service's `Endpoints` object in sync with this cluster's local
/// pod count, creating the object when this cluster is the primary.
pub struct EndpointsController {
    name: String,
    client: Client,
    adapter: Arc<dyn ClusterAdapter>,
}

impl EndpointsController {
    pub fn new(name: impl Into<String>, client: Client, adapter: Arc<dyn ClusterAdapter>) -> Self {
        Self { name: name.into(), client, adapter }
    }

    pub async fn run(self) {
        tracing::info!(cluster = %self.name, "running endpoints controller");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let informer =
            match skyshift_informer::Informer::start_all_namespaces(self.client.clone(), ServiceHandler { tx }).await {
                Ok(informer) => informer,
                Err(error) => {
                    tracing::error!(%error, "endpoints controller failed to start service informer");
                    return;
                }
            };

        run_event_loop("endpoints", || async {
            let event = match rx.recv().await {
                Some(event) => event,
                None => return Ok(()),
            };
            self.handle_event(event).await
        })
        .await;

        informer.stop();
    }

    async fn handle_event(&self, event: EndpointsEvent) -> Result<(), EndpointsControllerError> {
        match event {
            EndpointsEvent::Upserted(service) => {
                let endpoints = self.create_or_update_endpoint(&service).await?;
                let namespace = endpoints.metadata.namespace.clone();
                self.client.update(namespace.as_deref(), &endpoints).await.context(ClientSnafu)?;
            }
            EndpointsEvent::Deleted(service) => {
                if service.spec.primary_cluster.as_deref() == Some(self.name.as_str()) {
                    let namespace = service.metadata.namespace.clone();
                    let _: Result<Endpoints, ClientError> =
                        self.client.delete(namespace.as_deref(), &service.metadata.name).await;
                }
                self.adapter.delete_service(&service).await.context(AdapterSnafu)?;
            }
        }
        Ok(())
    }

    async fn create_or_update_endpoint(&self, service: &Service) -> Result<Endpoints, EndpointsControllerError> {
        let namespace = service.metadata.namespace.clone();
        let is_primary = service.spec.primary_cluster.as_deref() == Some(self.name.as_str());

        let mut endpoints = if is_primary {
            let existing = self.client.list::<Endpoints>(namespace.as_deref()).await.context(ClientSnafu)?;
            let already_exists = existing.objects.iter().any(|e| e.metadata.name == service.metadata.name);
            if already_exists {
                self.fetch_endpoints_with_retry(&service.metadata.name, namespace.as_deref()).await?
            } else {
                let endpoints = Endpoints {
                    kind: "Endpoints".to_string(),
                    metadata: Metadata::namespaced(
                        service.metadata.name.clone(),
                        namespace.clone().unwrap_or_default(),
                    ),
                    spec: EndpointsSpec { primary_cluster: Some(self.name.clone()), ..Default::default() },
                    status: Default::default(),
                };
                let created = self.client.create(namespace.as_deref(), &endpoints).await.context(ClientSnafu)?;
                self.adapter.create_or_update_service(service).await.context(AdapterSnafu)?;
                created
            }
        } else {
            self.fetch_endpoints_with_retry(&service.metadata.name, namespace.as_deref()).await?
        };

        let num_endpoints = self.adapter.endpoint_count(&service.spec.selector).await.context(AdapterSnafu)?;
        let current = endpoints.spec.endpoints.get(&self.name).map(|record| record.num_endpoints);

        if num_endpoints > 0 {
            if current != Some(num_endpoints) {
                if current.is_none() {
                    self.adapter.create_or_update_service(service).await.context(AdapterSnafu)?;
                }
                endpoints
                    .spec
                    .endpoints
                    .insert(self.name.clone(), EndpointRecord { num_endpoints, exposed_to_mesh: false });
            }
        } else if current.is_some() {
            endpoints.spec.endpoints.remove(&self.name);
            self.adapter.delete_service(service).await.context(AdapterSnafu)?;
        }

        Ok(endpoints)
    }

    async fn fetch_endpoints_with_retry(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Endpoints, EndpointsControllerError> {
        for attempt in 0..10 {
            match self.client.get::<Endpoints>(namespace, name).await {
                Ok(endpoints) => return Ok(endpoints),
                Err(error) => {
                    tracing::warn!(%error, name, attempt, "could not fetch endpoints object, retrying");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
        EndpointsNotFoundSnafu { name }.fail()
    }
}
