use serde::{Deserialize, Serialize};
use strum::Display;

/// The semantic event type a raw store `(op, revision, prev_revision)`
/// tuple is derived into, per §4.1: `PUT` with `revision == 1` is an ADD,
/// `PUT` with a higher revision is an UPDATE, and `DELETE` is a DELETE
/// carrying the previous value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventType {
    Add,
    Update,
    Delete,
}

/// The wire record streamed as one ndjson line per event (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchEvent<T> {
    pub event_type: WatchEventType,
    pub object: T,
}

impl<T> WatchEvent<T> {
    pub fn new(event_type: WatchEventType, object: T) -> Self {
        Self { event_type, object }
    }
}
