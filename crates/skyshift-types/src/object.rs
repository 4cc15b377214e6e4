//! The uniform shape the API server, client, and informer drive every kind
//! through, so none of them need a hand-written case per kind (mirroring
//! the Python source's `ALL_OBJECTS` dispatch table, but closed and
//! type-checked instead of a runtime dict of classes).

use crate::meta::Metadata;
use crate::validation::Validate;
use crate::{
    Cluster, ClusterList, Endpoints, EndpointsList, FilterPolicy, FilterPolicyList, Job, JobList, Kind, Link,
    LinkList, Namespace, NamespaceList, Role, RoleList, Service, ServiceList,
};

/// A single kind's envelope: the CRUD surface, the informer, and the
/// scheduler all operate on this trait instead of each kind's concrete
/// type directly.
pub trait KindObject: Validate + Clone + Send + Sync + 'static {
    /// The `{Kind}List` wrapper this kind serializes to for list/watch-all
    /// responses.
    type List: Default + Send + Sync + 'static;

    const KIND: Kind;

    fn metadata(&self) -> &Metadata;
    fn metadata_mut(&mut self) -> &mut Metadata;

    fn into_list(items: Vec<Self>) -> Self::List;

    /// The inverse of [`KindObject::into_list`]: unwraps a list response
    /// back into its objects, for callers (the informer's cache sync) that
    /// need the items rather than the wire envelope.
    fn from_list(list: Self::List) -> Vec<Self>;

    /// A key identifying the cross-object uniqueness group this object
    /// belongs to, or `None` if the kind has no such constraint beyond its
    /// name. Used by the API server to reject a create that would collide
    /// with an existing object under a different name (e.g. `Link`'s "at
    /// most one per unordered cluster pair", §3).
    fn conflict_key(&self) -> Option<String> {
        None
    }
}

macro_rules! impl_kind_object {
    ($ty:ty, $list:ty, $kind:expr, $field:ident) => {
        impl KindObject for $ty {
            type List = $list;

            const KIND: Kind = $kind;

            fn metadata(&self) -> &Metadata {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut Metadata {
                &mut self.metadata
            }

            fn into_list(items: Vec<Self>) -> Self::List {
                <$list>::default().with_objects(items)
            }

            fn from_list(list: Self::List) -> Vec<Self> {
                list.$field
            }
        }

        impl $list {
            fn with_objects(mut self, items: Vec<$ty>) -> Self {
                self.$field = items;
                self
            }
        }
    };
}

impl_kind_object!(Job, JobList, Kind::Job, objects);
impl_kind_object!(FilterPolicy, FilterPolicyList, Kind::FilterPolicy, objects);
impl_kind_object!(Service, ServiceList, Kind::Service, objects);
impl_kind_object!(Endpoints, EndpointsList, Kind::Endpoints, objects);
impl_kind_object!(Cluster, ClusterList, Kind::Cluster, objects);
impl_kind_object!(Namespace, NamespaceList, Kind::Namespace, objects);
impl_kind_object!(Role, RoleList, Kind::Role, objects);

impl KindObject for Link {
    type List = LinkList;

    const KIND: Kind = Kind::Link;

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn into_list(items: Vec<Self>) -> Self::List {
        LinkList { objects: items, ..Default::default() }
    }

    fn from_list(list: Self::List) -> Vec<Self> {
        list.objects
    }

    fn conflict_key(&self) -> Option<String> {
        let (a, b) = self.unordered_pair();
        Some(format!("{a}\0{b}"))
    }
}
