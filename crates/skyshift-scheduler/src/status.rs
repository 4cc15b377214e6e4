//! The three-valued result every plugin method returns, mirroring
//! `skyflow.scheduler.plugins.base_plugin.PluginStatus`/`StatusCode` (§4.7).

/// The outcome of a single plugin call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Code {
    Success,
    Unschedulable,
    Error,
}

/// A plugin's verdict plus a human-readable reason, carried back up to the
/// scheduler controller for logging.
#[derive(Clone, Debug)]
pub struct PluginStatus {
    pub code: Code,
    pub message: String,
}

impl PluginStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self { code: Code::Success, message: message.into() }
    }

    pub fn unschedulable(message: impl Into<String>) -> Self {
        Self { code: Code::Unschedulable, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { code: Code::Error, message: message.into() }
    }

    pub fn is_successful(&self) -> bool {
        self.code == Code::Success
    }

    pub fn is_unschedulable(&self) -> bool {
        self.code == Code::Unschedulable
    }
}
