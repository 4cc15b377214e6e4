pub mod adapter;
pub mod link;
pub mod runloop;
pub mod skylet;
pub mod skylet_supervisor;

pub use adapter::{AdapterError, AdapterFactory, ClusterAdapter, NullAdapter};
pub use link::LinkController;
pub use skylet::Skylet;
pub use skylet_supervisor::SkyletSupervisor;
