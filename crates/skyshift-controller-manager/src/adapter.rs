//! The interface every out-of-scope backend (Kubernetes/Slurm/Ray/cloud)
//! implements, grounded on `setup_cluster_manager`'s `manager_api` surface
//! used throughout `original_source/skyflow/skylet/*_controller.py`. The
//! core ships no real implementation, only this trait and [`NullAdapter`]
//! for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use snafu::Snafu;

use skyshift_types::{Accelerator, ClusterStatusPhase, Job, NodeCapacity, Service, TaskStatus};

#[derive(Debug, Snafu)]
pub enum AdapterError {
    #[snafu(display("cluster backend operation failed: {message}"))]
    Backend { message: String },
}

/// Resolves the adapter to use for a given cluster name. Shared by the link
/// controller and the skylet supervisor, both of which need an adapter for
/// clusters they don't otherwise hold a handle to.
pub type AdapterFactory = std::sync::Arc<dyn Fn(&str) -> std::sync::Arc<dyn ClusterAdapter> + Send + Sync>;

/// What `ClusterController` polls for, mirroring `manager_api.get_cluster_status()`.
#[derive(Clone, Debug)]
pub struct ClusterStatusReport {
    pub status: ClusterStatusPhase,
    pub capacity: NodeCapacity,
    pub allocatable_capacity: NodeCapacity,
}

/// What `JobController` polls for, mirroring `manager_api.get_jobs_status()`:
/// `job_name -> task_id -> status`, plus a parallel per-container breakdown.
#[derive(Clone, Debug, Default)]
pub struct JobsStatusReport {
    pub tasks: BTreeMap<String, BTreeMap<String, TaskStatus>>,
    /// `job_name -> container_name -> status`, mirroring the `containers` key
    /// of `manager_api.get_jobs_status()`.
    pub containers: BTreeMap<String, BTreeMap<String, TaskStatus>>,
}

/// The compatibility layer every per-cluster sub-controller drives instead
/// of talking to a backend directly. Kubernetes/Slurm/Ray/cloud
/// implementations are explicitly out of scope; this crate only defines the
/// contract.
#[async_trait]
pub trait ClusterAdapter: Send + Sync {
    async fn cluster_status(&self) -> Result<ClusterStatusReport, AdapterError>;

    async fn accelerator_types(&self) -> Result<Vec<Accelerator>, AdapterError>;

    async fn jobs_status(&self) -> Result<JobsStatusReport, AdapterError>;

    /// Submits a job to the backend, returning its backend-assigned id.
    async fn submit_job(&self, job: &Job) -> Result<String, AdapterError>;

    async fn delete_job(&self, job: &Job) -> Result<(), AdapterError>;

    /// Whether the cluster-link software is installed and healthy.
    async fn network_status(&self) -> Result<bool, AdapterError>;

    async fn launch_network(&self) -> Result<(), AdapterError>;

    async fn create_or_update_service(&self, service: &Service) -> Result<(), AdapterError>;

    async fn delete_service(&self, service: &Service) -> Result<(), AdapterError>;

    /// Number of backend pods/tasks matching a selector, feeding the
    /// endpoints controller's per-cluster `num_endpoints` count.
    async fn endpoint_count(&self, selector: &BTreeMap<String, String>) -> Result<u32, AdapterError>;

    async fn create_endpoint_slice(&self, name: &str, remote_cluster: &str) -> Result<(), AdapterError>;

    async fn delete_endpoint_slice(&self, name: &str) -> Result<(), AdapterError>;

    /// Exposes a locally-backed service to the inter-cluster mesh.
    async fn export_service(&self, name: &str, ports: &[u16]) -> Result<(), AdapterError>;

    /// Imports a service exported by `remote_cluster`. Returns whether the
    /// import succeeded (mirroring the source's `import_service` boolean).
    async fn import_service(&self, name: &str, remote_cluster: &str, ports: &[u16]) -> Result<bool, AdapterError>;

    async fn unexpose_service(&self, name: &str) -> Result<(), AdapterError>;

    /// Establishes this cluster's side of a link to `peer_cluster`.
    async fn create_link(&self, peer_cluster: &str) -> Result<(), AdapterError>;

    async fn delete_link(&self, peer_cluster: &str) -> Result<(), AdapterError>;
}

/// A no-op adapter: reports a healthy, empty cluster and succeeds every
/// mutation without talking to any backend. Used by tests and as the
/// default wiring for a cluster whose `spec.manager` has no registered
/// implementation.
#[derive(Default)]
pub struct NullAdapter;

#[async_trait]
impl ClusterAdapter for NullAdapter {
    async fn cluster_status(&self) -> Result<ClusterStatusReport, AdapterError> {
        Ok(ClusterStatusReport {
            status: ClusterStatusPhase::Ready,
            capacity: NodeCapacity::new(),
            allocatable_capacity: NodeCapacity::new(),
        })
    }

    async fn accelerator_types(&self) -> Result<Vec<Accelerator>, AdapterError> {
        Ok(Vec::new())
    }

    async fn jobs_status(&self) -> Result<JobsStatusReport, AdapterError> {
        Ok(JobsStatusReport::default())
    }

    async fn submit_job(&self, _job: &Job) -> Result<String, AdapterError> {
        Ok("null-adapter-job".to_string())
    }

    async fn delete_job(&self, _job: &Job) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn network_status(&self) -> Result<bool, AdapterError> {
        Ok(true)
    }

    async fn launch_network(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn create_or_update_service(&self, _service: &Service) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn delete_service(&self, _service: &Service) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn endpoint_count(&self, _selector: &BTreeMap<String, String>) -> Result<u32, AdapterError> {
        Ok(0)
    }

    async fn create_endpoint_slice(&self, _name: &str, _remote_cluster: &str) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn delete_endpoint_slice(&self, _name: &str) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn export_service(&self, _name: &str, _ports: &[u16]) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn import_service(&self, _name: &str, _remote_cluster: &str, _ports: &[u16]) -> Result<bool, AdapterError> {
        Ok(true)
    }

    async fn unexpose_service(&self, _name: &str) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn create_link(&self, _peer_cluster: &str) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn delete_link(&self, _peer_cluster: &str) -> Result<(), AdapterError> {
        Ok(())
    }
}
