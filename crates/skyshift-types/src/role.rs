use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::meta::Metadata;

/// The verbs a [`Rule`] can grant, per §4.3's authorization contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Get,
    Update,
    Patch,
    Delete,
}

/// A single authorization rule: `{resources, actions, namespaces}`, each
/// list either an explicit enumeration or the wildcard `"*"`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<String>,
}

impl Rule {
    fn list_matches(list: &[String], value: &str) -> bool {
        list.iter().any(|entry| entry == "*" || entry == value)
    }

    /// Whether this rule grants `action` on `kind_plural` within `namespace`
    /// (cluster-scoped kinds pass `namespace = None`).
    pub fn grants(&self, kind_plural: &str, action: &str, namespace: Option<&str>) -> bool {
        if !Self::list_matches(&self.resources, kind_plural) {
            return false;
        }
        if !Self::list_matches(&self.actions, action) {
            return false;
        }
        match namespace {
            Some(ns) => Self::list_matches(&self.namespaces, ns),
            None => true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Role {
    #[serde(default = "role_kind")]
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Usernames this role applies to.
    #[serde(default)]
    pub users: Vec<String>,
}

fn role_kind() -> String {
    "Role".to_string()
}

impl Role {
    pub fn grants(&self, kind_plural: &str, action: &str, namespace: Option<&str>) -> bool {
        self.rules.iter().any(|rule| rule.grants(kind_plural, action, namespace))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoleList {
    #[serde(default = "role_list_kind")]
    pub kind: String,
    #[serde(default)]
    pub objects: Vec<Role>,
}

fn role_list_kind() -> String {
    "RoleList".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_rule_grants_everything() {
        let rule = Rule {
            resources: vec!["*".into()],
            actions: vec!["*".into()],
            namespaces: vec!["*".into()],
        };
        assert!(rule.grants("jobs", "delete", Some("default")));
    }

    #[test]
    fn namespace_is_scoped() {
        let rule = Rule {
            resources: vec!["jobs".into()],
            actions: vec!["get".into()],
            namespaces: vec!["team-a".into()],
        };
        assert!(rule.grants("jobs", "get", Some("team-a")));
        assert!(!rule.grants("jobs", "get", Some("team-b")));
    }

    #[test]
    fn cluster_scoped_kind_ignores_namespace() {
        let rule = Rule {
            resources: vec!["clusters".into()],
            actions: vec!["get".into()],
            namespaces: vec![],
        };
        assert!(rule.grants("clusters", "get", None));
    }
}
