use skyshift_types::Kind;

/// Builds the KV prefix all objects of `kind` (optionally scoped to
/// `namespace`) live under: `<plural>/<namespace>/` for namespaced kinds,
/// `<plural>/` otherwise, matching the source's `link_header` convention.
pub fn prefix(kind: Kind, namespace: Option<&str>) -> String {
    match (kind.namespaced(), namespace) {
        (true, Some(ns)) => format!("{}/{ns}/", kind.plural()),
        _ => format!("{}/", kind.plural()),
    }
}

/// The exact key a single named object of `kind` lives at.
pub fn object_key(kind: Kind, namespace: Option<&str>, name: &str) -> String {
    format!("{}{name}", prefix(kind, namespace))
}
