//! Keeps a local cache of one kind's objects in sync with the API server
//! via a watch, so controllers read through a cache instead of paying one
//! HTTP round trip per read (§5).

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use skyshift_client::{Client, ClientError, Watch};
use skyshift_types::{KindObject, WatchEvent, WatchEventType};

/// Callbacks an [`Informer`] invokes as it observes changes, mirroring the
/// optional `add`/`update`/`delete` callback slots the source's
/// `Informer.add_event_callbacks` wires up. Every method defaults to a
/// no-op so callers only implement the transitions they care about.
pub trait InformerHandler<T: KindObject>: Send + Sync {
    fn on_add(&self, _object: &T) {}
    fn on_update(&self, _old: &T, _new: &T) {}
    fn on_delete(&self, _object: &T) {}
}

/// A handler that does nothing, for callers that only want the cache.
pub struct NoopHandler;

impl<T: KindObject> InformerHandler<T> for NoopHandler {}

/// Watches one kind's collection and keeps a name-keyed cache up to date,
/// dispatching to an [`InformerHandler`] on every transition.
///
/// Runs two tasks internally, matching the source's reflector +
/// event-controller thread split: one drains the watch stream into a
/// channel, the other consumes the channel, updates the cache, and calls
/// back.
pub struct Informer<T: KindObject> {
    cache: Arc<RwLock<HashMap<String, T>>>,
    reflector: JoinHandle<()>,
    controller: JoinHandle<()>,
}

impl<T> Informer<T>
where
    T: KindObject + serde::de::DeserializeOwned,
{
    /// Lists the current state to seed the cache (the source's
    /// `sync_cache`), then starts watching for further changes.
    pub async fn start<H>(client: Client, namespace: Option<String>, handler: H) -> Result<Self, ClientError>
    where
        H: InformerHandler<T> + 'static,
    {
        let initial = client.list::<T>(namespace.as_deref()).await?;
        let watch = client.watch::<T>(namespace.as_deref());
        Self::start_from(initial, watch, handler).await
    }

    /// Like [`Informer::start`], but seeds and watches across every
    /// namespace via `?all_namespaces=true` (§4.3) instead of a single
    /// namespace — for kinds like `Job` that controllers must observe
    /// fleet-wide regardless of which namespace they were submitted into.
    pub async fn start_all_namespaces<H>(client: Client, handler: H) -> Result<Self, ClientError>
    where
        H: InformerHandler<T> + 'static,
    {
        let initial = client.list_all_namespaces::<T>().await?;
        let watch = client.watch_all_namespaces::<T>();
        Self::start_from(initial, watch, handler).await
    }

    async fn start_from<H>(initial: T::List, mut watch: Watch<T>, handler: H) -> Result<Self, ClientError>
    where
        H: InformerHandler<T> + 'static,
    {
        let mut seeded = HashMap::new();
        for object in T::from_list(initial) {
            seeded.insert(object.metadata().name.clone(), object);
        }
        let cache = Arc::new(RwLock::new(seeded));

        let (tx, rx) = mpsc::channel(1024);
        let reflector = tokio::spawn(async move {
            while let Some(event) = watch.next().await {
                match event {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => tracing::warn!(%error, "informer watch event failed to decode"),
                }
            }
        });

        let handler = Arc::new(handler);
        let controller_cache = Arc::clone(&cache);
        let controller = tokio::spawn(run_event_controller(rx, controller_cache, handler));

        Ok(Self { cache, reflector, controller })
    }

    /// A snapshot of the cache at this instant.
    pub async fn cache(&self) -> HashMap<String, T> {
        self.cache.read().await.clone()
    }

    /// Looks up a single cached object by name.
    pub async fn get(&self, name: &str) -> Option<T> {
        self.cache.read().await.get(name).cloned()
    }

    /// Stops the reflector and event-controller tasks.
    pub fn stop(&self) {
        self.reflector.abort();
        self.controller.abort();
    }
}

impl<T: KindObject> Drop for Informer<T> {
    fn drop(&mut self) {
        self.reflector.abort();
        self.controller.abort();
    }
}

async fn run_event_controller<T, H>(
    mut rx: mpsc::Receiver<WatchEvent<T>>,
    cache: Arc<RwLock<HashMap<String, T>>>,
    handler: Arc<H>,
) where
    T: KindObject,
    H: InformerHandler<T> + 'static,
{
    while let Some(event) = rx.recv().await {
        let name = event.object.metadata().name.clone();
        match event.event_type {
            WatchEventType::Add => {
                cache.write().await.insert(name, event.object.clone());
                handler.on_add(&event.object);
            }
            WatchEventType::Update => {
                let old = cache.write().await.insert(name, event.object.clone());
                if let Some(old) = old {
                    handler.on_update(&old, &event.object);
                }
            }
            WatchEventType::Delete => {
                cache.write().await.remove(&name);
                handler.on_delete(&event.object);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyshift_types::Namespace;

    struct RecordingHandler {
        adds: std::sync::Mutex<Vec<String>>,
    }

    impl InformerHandler<Namespace> for RecordingHandler {
        fn on_add(&self, object: &Namespace) {
            self.adds.lock().expect("lock not poisoned").push(object.metadata.name.clone());
        }
    }

    #[tokio::test]
    async fn add_event_populates_cache_and_calls_handler() {
        let cache = Arc::new(RwLock::new(HashMap::new()));
        let handler = Arc::new(RecordingHandler { adds: std::sync::Mutex::new(Vec::new()) });
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(run_event_controller(rx, Arc::clone(&cache), Arc::clone(&handler)));

        let namespace = Namespace::new("team-a");
        tx.send(WatchEvent::new(WatchEventType::Add, namespace)).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(cache.read().await.contains_key("team-a"));
        assert_eq!(handler.adds.lock().unwrap().as_slice(), ["team-a"]);
    }

    #[tokio::test]
    async fn delete_event_removes_from_cache() {
        let mut seed = HashMap::new();
        seed.insert("team-a".to_string(), Namespace::new("team-a"));
        let cache = Arc::new(RwLock::new(seed));
        let handler = Arc::new(NoopHandler);
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(run_event_controller(rx, Arc::clone(&cache), handler));

        tx.send(WatchEvent::new(WatchEventType::Delete, Namespace::new("team-a"))).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(!cache.read().await.contains_key("team-a"));
    }
}
