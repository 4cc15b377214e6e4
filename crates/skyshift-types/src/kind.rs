use strum::{Display, EnumString};

/// The closed set of object kinds Skyshift knows about. Unlike the source's
/// reflective `ALL_OBJECTS` dict keyed by string, this is a static Rust
/// enum: adding a kind is a compile-time change, not a registry mutation
/// (§9's design note on dynamic dispatch over kinds).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
pub enum Kind {
    Job,
    FilterPolicy,
    Service,
    Endpoints,
    Cluster,
    Namespace,
    Link,
    Role,
}

/// Static facts about a [`Kind`] the API server and KV key layout need:
/// whether it's namespaced, and its plural wire-path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindInfo {
    pub kind: Kind,
    pub namespaced: bool,
    /// The path segment used in `/skyshift/<kind>/...` and in the REST
    /// routes (`jobs`, `clusters`, ...), matching the source's
    /// `NAMESPACED_OBJECTS`/`NON_NAMESPACED_OBJECTS` keys.
    pub plural: &'static str,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Job,
        Kind::FilterPolicy,
        Kind::Service,
        Kind::Endpoints,
        Kind::Cluster,
        Kind::Namespace,
        Kind::Link,
        Kind::Role,
    ];

    pub const fn info(self) -> KindInfo {
        match self {
            Kind::Job => KindInfo { kind: self, namespaced: true, plural: "jobs" },
            Kind::FilterPolicy => KindInfo { kind: self, namespaced: true, plural: "filterpolicies" },
            Kind::Service => KindInfo { kind: self, namespaced: true, plural: "services" },
            Kind::Endpoints => KindInfo { kind: self, namespaced: true, plural: "endpoints" },
            Kind::Cluster => KindInfo { kind: self, namespaced: false, plural: "clusters" },
            Kind::Namespace => KindInfo { kind: self, namespaced: false, plural: "namespaces" },
            Kind::Link => KindInfo { kind: self, namespaced: false, plural: "links" },
            Kind::Role => KindInfo { kind: self, namespaced: false, plural: "roles" },
        }
    }

    pub fn namespaced(self) -> bool {
        self.info().namespaced
    }

    pub fn plural(self) -> &'static str {
        self.info().plural
    }

    /// Looks up a kind by its wire path segment (`"jobs"`, `"clusters"`, ...).
    pub fn from_plural(plural: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.plural() == plural)
    }

    /// The matching list kind's wire name, e.g. `JobList`.
    pub fn list_kind_name(self) -> String {
        format!("{self}List")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_plural() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_plural(kind.plural()), Some(kind));
        }
    }

    #[test]
    fn namespacing_matches_spec() {
        assert!(Kind::Job.namespaced());
        assert!(Kind::FilterPolicy.namespaced());
        assert!(Kind::Service.namespaced());
        assert!(Kind::Endpoints.namespaced());
        assert!(!Kind::Cluster.namespaced());
        assert!(!Kind::Namespace.namespaced());
        assert!(!Kind::Link.namespaced());
        assert!(!Kind::Role.namespaced());
    }
}
