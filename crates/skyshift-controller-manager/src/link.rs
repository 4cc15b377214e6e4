//! Creates and tears down inter-cluster links, grounded on
//! `original_source/skyflow/controllers/link_controller.py`. Unlike the
//! skylet sub-controllers, this one is global: it isn't bound to a single
//! cluster, so it resolves a per-cluster adapter through a factory instead
//! of holding one adapter directly.

use skyshift_client::{Client, ClientError};
use skyshift_types::{Link, LinkStatusPhase};
use snafu::{ResultExt, Snafu};
use tokio::sync::mpsc;

use crate::adapter::{AdapterError, AdapterFactory};
use crate::runloop::run_event_loop;

#[derive(Debug, Snafu)]
pub enum LinkControllerError {
    #[snafu(display("failed to talk to the api server"))]
    Client { source: ClientError },
}

enum LinkEvent {
    Created(Link),
    Deleted(Link),
}

struct LinkHandler {
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl skyshift_informer::InformerHandler<Link> for LinkHandler {
    fn on_add(&self, object: &Link) {
        let _ = self.tx.send(LinkEvent::Created(object.clone()));
    }

    fn on_delete(&self, object: &Link) {
        let _ = self.tx.send(LinkEvent::Deleted(object.clone()));
    }
}

/// Establishes a link between two clusters when a `Link` object is added,
/// and tears it down when the object is deleted.
pub struct LinkController {
    client: Client,
    adapter_factory: AdapterFactory,
}

impl LinkController {
    pub fn new(client: Client, adapter_factory: AdapterFactory) -> Self {
        Self { client, adapter_factory }
    }

    pub async fn run(self) {
        tracing::info!("running link controller");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let informer = match skyshift_informer::Informer::start(self.client.clone(), None, LinkHandler { tx }).await {
            Ok(informer) => informer,
            Err(error) => {
                tracing::error!(%error, "link controller failed to start link informer");
                return;
            }
        };

        run_event_loop("link", || async {
            let event = match rx.recv().await {
                Some(event) => event,
                None => return Ok(()),
            };
            self.handle_event(event).await
        })
        .await;

        informer.stop();
    }

    async fn handle_event(&self, event: LinkEvent) -> Result<(), LinkControllerError> {
        match event {
            LinkEvent::Created(mut link) => {
                tracing::info!(source = %link.spec.source_cluster, target = %link.spec.target_cluster, "creating link");
                let phase = match self.create_link(&link.spec.source_cluster, &link.spec.target_cluster).await {
                    Ok(()) => LinkStatusPhase::Active,
                    Err(error) => {
                        tracing::error!(%error, "failed to create link between clusters");
                        LinkStatusPhase::Failed
                    }
                };
                link.status.phase = phase;
                let namespace = link.metadata.namespace.clone();
                self.client.update(namespace.as_deref(), &link).await.context(ClientSnafu)?;
            }
            LinkEvent::Deleted(link) => {
                tracing::info!(source = %link.spec.source_cluster, target = %link.spec.target_cluster, "deleting link");
                if let Err(error) = self.delete_link(&link.spec.source_cluster, &link.spec.target_cluster).await {
                    tracing::error!(%error, "failed to delete link between clusters");
                }
                // No status write-back on delete: the object is already gone.
            }
        }
        Ok(())
    }

    async fn create_link(&self, source: &str, target: &str) -> Result<(), AdapterError> {
        (self.adapter_factory)(source).create_link(target).await?;
        (self.adapter_factory)(target).create_link(source).await?;
        Ok(())
    }

    async fn delete_link(&self, source: &str, target: &str) -> Result<(), AdapterError> {
        (self.adapter_factory)(source).delete_link(target).await?;
        (self.adapter_factory)(target).delete_link(source).await?;
        Ok(())
    }
}
