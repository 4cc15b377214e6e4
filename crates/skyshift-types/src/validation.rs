use regex::Regex;
use snafu::Snafu;
use std::sync::OnceLock;

use crate::job::RestartPolicy;
use crate::resource::{Accelerator, ResourceKind};
use crate::{Cluster, Endpoints, FilterPolicy, Job, Link, Namespace, Role, Service, NAME_PATTERN};

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ValidationError {
    #[snafu(display("metadata.name is empty"))]
    EmptyName,

    #[snafu(display("metadata.name '{name}' does not match pattern {NAME_PATTERN}"))]
    InvalidName { name: String },

    #[snafu(display("spec.replicas must be >= 1, got {replicas}"))]
    InvalidReplicas { replicas: u32 },

    #[snafu(display("port {port} is out of range [1, 65535]"))]
    InvalidPort { port: u32 },

    #[snafu(display("resource '{resource}' must be non-negative, got {value}"))]
    NegativeResource { resource: String, value: f64 },

    #[snafu(display("unknown resource type '{resource}'"))]
    UnknownResourceType { resource: String },

    #[snafu(display("metadata.namespace is required for this kind"))]
    MissingNamespace,

    #[snafu(display("namespace '{namespace}' does not exist"))]
    NoSuchNamespace { namespace: String },

    #[snafu(display("link source_cluster and target_cluster must differ"))]
    SelfLink,

    #[snafu(display("unknown restart_policy"))]
    InvalidRestartPolicy,
}

type Result<T, E = ValidationError> = std::result::Result<T, E>;

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("NAME_PATTERN is a valid regex"))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !name_regex().is_match(name) {
        return Err(ValidationError::InvalidName { name: name.to_string() });
    }
    Ok(())
}

fn validate_resource_vector(resources: &crate::resource::ResourceVector) -> Result<()> {
    for (resource, value) in &resources.0 {
        let is_known = resource.parse::<ResourceKind>().is_ok() || resource.parse::<Accelerator>().is_ok();
        if !is_known {
            return Err(ValidationError::UnknownResourceType { resource: resource.clone() });
        }
        if *value < 0.0 {
            return Err(ValidationError::NegativeResource { resource: resource.clone(), value: *value });
        }
    }
    Ok(())
}

/// Structural, value, and cross-field validation for one kind, per §4.2.
/// Implementors check only what can be known from the object itself;
/// cross-object invariants that need store state (name uniqueness within
/// scope, namespace existence) are layered on top by the API server.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for Job {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)?;
        if self.spec.replicas < 1 {
            return Err(ValidationError::InvalidReplicas { replicas: self.spec.replicas });
        }
        for port in &self.spec.ports {
            let port = u32::from(*port);
            if port == 0 || port > 65535 {
                return Err(ValidationError::InvalidPort { port });
            }
        }
        validate_resource_vector(&self.spec.resources)?;
        let _: RestartPolicy = self.spec.restart_policy;
        Ok(())
    }
}

impl Validate for Cluster {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)?;
        for node in self.status.capacity.values().chain(self.status.allocatable_capacity.values()) {
            for (resource, value) in node {
                let is_known = resource.parse::<ResourceKind>().is_ok() || resource.parse::<Accelerator>().is_ok();
                if !is_known {
                    return Err(ValidationError::UnknownResourceType { resource: resource.clone() });
                }
                if *value < 0.0 {
                    return Err(ValidationError::NegativeResource { resource: resource.clone(), value: *value });
                }
            }
        }
        Ok(())
    }
}

impl Validate for Namespace {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)
    }
}

impl Validate for Link {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)?;
        if self.spec.source_cluster == self.spec.target_cluster {
            return Err(ValidationError::SelfLink);
        }
        Ok(())
    }
}

impl Validate for Role {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)
    }
}

impl Validate for FilterPolicy {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)
    }
}

impl Validate for Service {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)?;
        for port in &self.spec.ports {
            for p in [port.port, port.target_port] {
                let port = u32::from(p);
                if port == 0 || port > 65535 {
                    return Err(ValidationError::InvalidPort { port });
                }
            }
        }
        Ok(())
    }
}

impl Validate for Endpoints {
    fn validate(&self) -> Result<()> {
        validate_name(&self.metadata.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Metadata;
    use crate::JobSpec;
    use rstest::rstest;

    fn job_with_name(name: &str) -> Job {
        Job {
            kind: "Job".into(),
            metadata: Metadata::namespaced(name, "default"),
            spec: JobSpec::default(),
            status: Default::default(),
        }
    }

    #[rstest]
    #[case("hello-world_1.0")]
    #[case("a")]
    fn valid_names_pass(#[case] name: &str) {
        assert!(job_with_name(name).validate().is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("has a space")]
    #[case("has/slash")]
    fn invalid_names_fail(#[case] name: &str) {
        assert!(job_with_name(name).validate().is_err());
    }

    #[test]
    fn replicas_must_be_positive() {
        let mut job = job_with_name("hello");
        job.spec.replicas = 0;
        assert_eq!(job.validate(), Err(ValidationError::InvalidReplicas { replicas: 0 }));
    }

    #[test]
    fn self_link_is_rejected() {
        let link = Link {
            kind: "Link".into(),
            metadata: Metadata::new("l1"),
            spec: crate::LinkSpec { source_cluster: "a".into(), target_cluster: "a".into() },
            status: Default::default(),
        };
        assert_eq!(link.validate(), Err(ValidationError::SelfLink));
    }

    #[test]
    fn unknown_resource_type_is_rejected() {
        let mut job = job_with_name("hello");
        job.spec.resources.0.insert("bogus".into(), 1.0);
        assert!(matches!(job.validate(), Err(ValidationError::UnknownResourceType { .. })));
    }
}
