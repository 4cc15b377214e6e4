//! Determines which cluster, or spread of clusters, a job should be placed
//! on. Schedules at the job level rather than the task level, so gang
//! scheduling, colocation, and governance requirements fall out of the
//! plugin pipeline instead of needing a separate mechanism layered on top of
//! a per-task scheduler.

pub mod affinity_plugin;
pub mod controller;
pub mod default_plugin;
pub mod plugin;
pub mod queue;
pub mod status;

pub use affinity_plugin::ClusterAffinityPlugin;
pub use controller::SchedulerController;
pub use default_plugin::DefaultPlugin;
pub use plugin::{SchedulerPlugin, SchedulingContext};
pub use queue::WorkloadQueue;
pub use status::{Code, PluginStatus};
