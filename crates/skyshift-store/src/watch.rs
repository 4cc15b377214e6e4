use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::warn;

use skyshift_types::watch::WatchEventType;

use crate::Entry;

/// One ADD/UPDATE/DELETE notification delivered to a [`Watcher`].
#[derive(Clone, Debug)]
pub struct Notification {
    pub event_type: WatchEventType,
    pub entry: Entry,
}

/// What a [`Watcher`] matches incoming keys against: either every key
/// under a prefix (list watches) or one exact key (single-object
/// watches). A plain prefix match would let `watch("jobs/default/hello")`
/// also pick up `jobs/default/hello2`, so single-object watches need
/// their own exact variant.
#[derive(Clone, Debug)]
enum Filter {
    Prefix(String),
    Key(String),
}

impl Filter {
    fn matches(&self, key: &str) -> bool {
        match self {
            Filter::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Filter::Key(exact) => key == exact,
        }
    }

    fn label(&self) -> &str {
        match self {
            Filter::Prefix(p) => p,
            Filter::Key(k) => k,
        }
    }
}

/// A live subscription to writes under a key prefix or to one exact key.
///
/// Backed by a `tokio::sync::broadcast` channel shared across every
/// watcher of the store; a slow consumer that falls behind the channel's
/// buffer silently skips the events it missed rather than blocking
/// writers, logging a warning so the gap is visible.
pub struct Watcher {
    rx: broadcast::Receiver<Notification>,
    filter: Filter,
}

impl Watcher {
    pub(crate) fn for_prefix(rx: broadcast::Receiver<Notification>, prefix: String) -> Self {
        Self { rx, filter: Filter::Prefix(prefix) }
    }

    pub(crate) fn for_key(rx: broadcast::Receiver<Notification>, key: String) -> Self {
        Self { rx, filter: Filter::Key(key) }
    }

    /// Wait for the next notification matching this watcher's filter.
    /// Returns `None` once the underlying broadcast sender (the store
    /// itself) has been dropped.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(notification) if self.filter.matches(&notification.entry.key) => {
                    return Some(notification);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, filter = %self.filter.label(), "watcher fell behind, dropping skipped events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Adapt this watcher into a [`Stream`] of notifications, for use in
    /// ndjson streaming responses.
    pub fn into_stream(self) -> WatchStream {
        WatchStream { inner: BroadcastStream::new(self.rx), filter: self.filter }
    }
}

/// A [`Stream`] adapter over [`Watcher`], yielding only notifications
/// matching the watcher's filter and silently resuming past lagged gaps.
pub struct WatchStream {
    inner: BroadcastStream<Notification>,
    filter: Filter,
}

impl Stream for WatchStream {
    type Item = Notification;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;
        loop {
            match std::pin::Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(notification))) => {
                    if self.filter.matches(&notification.entry.key) {
                        return Poll::Ready(Some(notification));
                    }
                }
                Poll::Ready(Some(Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, filter = %self.filter.label(), "watch stream fell behind, dropping skipped events");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
